//! Entity identifiers.
//!
//! Identifiers are plain strings of the form `<kind>-<epochMillis>-<suffix>`,
//! where the suffix is nine random base-36 characters. They are opaque on the
//! wire and never parsed back; only uniqueness and stability matter.
//!
//! Collisions are accepted as negligible at this scale (hundreds of entities,
//! one writer per edit).

use rand::Rng;
use strum::{AsRefStr, Display, EnumString};

/// Length of the random base-36 suffix.
const SUFFIX_LEN: usize = 9;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// The kinds of entity that receive generated identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum EntityKind {
    Person,
    Union,
    Ward,
    Region,
}

impl EntityKind {
    /// Generate a fresh identifier prefixed with this kind.
    pub fn new_id(self) -> String {
        generate_id(self.as_ref())
    }
}

/// Generate `"<prefix>-<epochMillis>-<suffix>"`.
///
/// The prefix is not validated.
pub fn generate_id(prefix: &str) -> String {
    format!("{prefix}-{}-{}", crate::now_millis(), random_suffix())
}

pub fn person_id() -> String {
    EntityKind::Person.new_id()
}

pub fn union_id() -> String {
    EntityKind::Union.new_id()
}

pub fn ward_id() -> String {
    EntityKind::Ward.new_id()
}

pub fn region_id() -> String {
    EntityKind::Region.new_id()
}

fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}
