//! `go.mod` reading and version pin rewriting.
//!
//! Only the parts the release engine needs are understood: the `module`
//! directive and `require` entries, in both single-line and block form.
//! Rewriting touches nothing but the version token of matching entries.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Manifest file name of a Go module.
pub const GO_MOD: &str = "go.mod";

static REQUIRE_ENTRY: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<lead>\s*(?:require\s+)?)(?P<path>[^\s()]+)(?P<gap>\s+)(?P<version>v[^\s/]+)(?P<rest>.*)$",
    )
    .ok()
});

/// A parsed `go.mod` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoMod {
    /// The `module` directive.
    pub module: String,
    /// Direct (non-`// indirect`) requirements with their pinned versions.
    pub requires: Vec<Requirement>,
}

/// A single `require` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Required module path.
    pub path: String,
    /// Pinned version.
    pub version: String,
}

/// Strip a `//` comment and surrounding whitespace.
fn strip_comment(line: &str) -> (&str, Option<&str>) {
    match line.find("//") {
        Some(idx) => (line[..idx].trim(), Some(line[idx + 2..].trim())),
        None => (line.trim(), None),
    }
}

fn unquote(token: &str) -> &str {
    token
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .or_else(|| token.strip_prefix('`').and_then(|t| t.strip_suffix('`')))
        .unwrap_or(token)
}

fn parse_requirement(
    spec: &str,
    comment: Option<&str>,
    line_no: usize,
) -> Result<Option<Requirement>, String> {
    if comment.is_some_and(|c| c.split(';').any(|part| part.trim() == "indirect")) {
        return Ok(None);
    }

    let mut tokens = spec.split_whitespace();
    match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(path), Some(version), None) => Ok(Some(Requirement {
            path: unquote(path).to_string(),
            version: version.to_string(),
        })),
        _ => Err(format!("line {line_no}: malformed require entry '{spec}'")),
    }
}

/// Parse the content of a `go.mod` file.
///
/// # Errors
///
/// Returns a message describing the first malformed line, or a missing
/// `module` directive.
pub fn parse(content: &str) -> Result<GoMod, String> {
    let mut module = None;
    let mut requires = Vec::new();
    let mut in_require_block = false;
    let mut in_other_block = false;

    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let (line, comment) = strip_comment(raw);
        if line.is_empty() {
            continue;
        }

        if in_require_block {
            if line == ")" {
                in_require_block = false;
            } else if let Some(req) = parse_requirement(line, comment, line_no)? {
                requires.push(req);
            }
            continue;
        }

        if in_other_block {
            if line == ")" {
                in_other_block = false;
            }
            continue;
        }

        let (keyword, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(k, r)| (k, r.trim()));

        match keyword {
            "module" => {
                if rest.is_empty() {
                    return Err(format!("line {line_no}: module directive has no path"));
                }
                module = Some(unquote(rest).to_string());
            }
            "require" if rest == "(" => in_require_block = true,
            "require" => {
                if let Some(req) = parse_requirement(rest, comment, line_no)? {
                    requires.push(req);
                }
            }
            _ if rest.ends_with('(') => in_other_block = true,
            _ => {}
        }
    }

    if in_require_block || in_other_block {
        return Err("unterminated block".to_string());
    }

    let module = module.ok_or_else(|| "missing module directive".to_string())?;
    Ok(GoMod { module, requires })
}

/// Rewrite the version pins of internal requirements.
///
/// `versions` maps a module short name (relative to `root_identifier`, empty
/// for the root module itself) to its new `v`-prefixed version. Every line
/// that is not a matching `require` entry is returned unchanged, as is every
/// byte of a matching line other than its version token.
#[must_use]
pub fn update_requirements(
    content: &str,
    root_identifier: &str,
    versions: &BTreeMap<String, String>,
) -> String {
    let mut output = String::with_capacity(content.len());
    let mut in_require_block = false;

    for line in content.split_inclusive('\n') {
        let (body, newline) = split_newline(line);
        let (code, _) = strip_comment(body);

        let is_entry = if in_require_block {
            if code == ")" {
                in_require_block = false;
            }
            code != ")"
        } else if code.starts_with("require") && code.trim_start_matches("require").trim() == "(" {
            in_require_block = true;
            false
        } else {
            code.starts_with("require ") || code.starts_with("require\t")
        };

        if is_entry && let Some(rewritten) = rewrite_entry(body, root_identifier, versions) {
            output.push_str(&rewritten);
            output.push_str(newline);
        } else {
            output.push_str(line);
        }
    }

    output
}

fn split_newline(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

fn rewrite_entry(
    line: &str,
    root_identifier: &str,
    versions: &BTreeMap<String, String>,
) -> Option<String> {
    let caps = REQUIRE_ENTRY.as_ref()?.captures(line)?;
    let path = unquote(&caps["path"]);
    let short_name = short_name_for(root_identifier, path)?;
    let new_version = versions.get(short_name)?;
    if new_version == &caps["version"] {
        return None;
    }

    Some(format!(
        "{}{}{}{}{}",
        &caps["lead"], &caps["path"], &caps["gap"], new_version, &caps["rest"]
    ))
}

/// Short name of `identifier` relative to `root_identifier`.
///
/// Returns `Some("")` for the root itself and `None` for identifiers outside
/// the repository.
#[must_use]
pub fn short_name_for<'a>(root_identifier: &str, identifier: &'a str) -> Option<&'a str> {
    if identifier == root_identifier {
        return Some("");
    }
    identifier
        .strip_prefix(root_identifier)
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|rest| !rest.is_empty())
}
