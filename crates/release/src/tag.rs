//! Version tag naming.
//!
//! Root module tags are bare versions (`v1.2.3`); submodule tags carry the
//! module short name as a path prefix (`libA/v1.2.3`, `a/b/v1.2.3`).

use crate::version::Version;
use std::collections::BTreeMap;

/// Format the tag for a module version.
#[must_use]
pub fn format_tag(short_name: &str, version: &Version) -> String {
    if short_name.is_empty() {
        version.to_tag_string()
    } else {
        format!("{short_name}/{}", version.to_tag_string())
    }
}

/// Split a tag into its module short name and version.
///
/// Returns `None` for tags that do not end in a `v`-prefixed semantic version.
#[must_use]
pub fn parse_tag(tag: &str) -> Option<(String, Version)> {
    let (short_name, raw) = match tag.rsplit_once('/') {
        Some((prefix, raw)) if !prefix.is_empty() => (prefix, raw),
        Some(_) => return None,
        None => ("", tag),
    };

    if !raw.starts_with('v') {
        return None;
    }
    let version = raw.parse().ok()?;
    Some((short_name.to_string(), version))
}

/// Latest version per module short name across a set of tags.
///
/// Tags that do not parse are ignored. Versions are returned `v`-prefixed.
pub fn latest_versions<'a, I>(tags: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut latest: BTreeMap<String, Version> = BTreeMap::new();
    for (short_name, version) in tags.into_iter().filter_map(parse_tag) {
        match latest.get(&short_name) {
            Some(current) if *current >= version => {}
            _ => {
                latest.insert(short_name, version);
            }
        }
    }

    latest
        .into_iter()
        .map(|(name, version)| (name, version.to_tag_string()))
        .collect()
}
