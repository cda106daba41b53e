use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::str::FromStr;
use std::{fmt::Display, ops::Deref};

/// Identifier of a knowledge entry.
///
/// A ULID: millisecond timestamp prefix followed by random bits, so two entries
/// saved within the same millisecond still get distinct ids.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(transparent)]
pub struct EntryId(String);

impl Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntryId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(EntryId(s.to_string()))
    }
}

impl Deref for EntryId {
    type Target = String;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<&str> for EntryId {
    fn from(fr: &str) -> Self {
        EntryId(fr.to_string())
    }
}

impl From<EntryId> for String {
    fn from(fr: EntryId) -> Self {
        fr.0
    }
}

impl EntryId {
    #[inline]
    pub fn generate() -> EntryId {
        EntryId(rusty_ulid::generate_ulid_string())
    }
}
