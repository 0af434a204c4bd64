//! Human-readable changeset ids.
//!
//! Ids are three lowercase words joined by `-` (`adjective-adjective-noun`),
//! drawn from fixed word lists with a caller-supplied random source so tests
//! can seed it.

use rand::Rng;

const ADJECTIVES: &[&str] = &[
    "brave", "calm", "clever", "cozy", "crisp", "curly", "dapper", "eager", "fancy", "fluffy",
    "gentle", "giddy", "golden", "happy", "hungry", "jolly", "kind", "lazy", "lively", "lucky",
    "mellow", "merry", "mighty", "nimble", "odd", "plain", "polite", "proud", "quick", "quiet",
    "rapid", "shiny", "silent", "silly", "sleepy", "slow", "smart", "snappy", "soft", "spicy",
    "stale", "steady", "sturdy", "sunny", "swift", "tall", "tame", "tidy", "tiny", "warm", "wild",
    "wise", "witty", "young", "zesty",
];

const NOUNS: &[&str] = &[
    "ants", "badgers", "bats", "bears", "bees", "birds", "bobcats", "camels", "cats", "clouds",
    "cobras", "crabs", "crows", "deer", "dogs", "doves", "ducks", "eagles", "eels", "falcons",
    "ferrets", "foxes", "frogs", "geese", "goats", "hawks", "horses", "ibises", "koalas",
    "lemurs", "lions", "llamas", "moles", "moose", "newts", "otters", "owls", "pandas", "parrots",
    "pumas", "rabbits", "ravens", "seals", "sharks", "sheep", "snails", "swans", "tigers",
    "toads", "trees", "turtles", "walruses", "wolves", "yaks", "zebras",
];

/// Generate a three-word id such as `brave-quiet-otters`.
pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> String {
    let first = pick(rng, ADJECTIVES);
    let second = pick(rng, ADJECTIVES);
    let noun = pick(rng, NOUNS);
    format!("{first}-{second}-{noun}")
}

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, words: &[&'a str]) -> &'a str {
    words[rng.random_range(0..words.len())]
}
