//! Session identifiers.
//!
//! A session id is a short opaque token: eight lowercase characters from the
//! Crockford base-32 alphabet, drawn from the random half of a fresh ULID.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Number of characters in a session token.
pub const SESSION_ID_LEN: usize = 8;

const ALPHABET: &str = "0123456789abcdefghjkmnpqrstvwxyz";

/// Error returned when parsing an ID from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse.
    pub id_type: &'static str,
    /// The reason for the parse failure.
    pub reason: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {}: {}", self.id_type, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

/// Identifier of an active or archived conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Generates a new random session token.
    #[must_use]
    pub fn generate() -> Self {
        let encoded = Ulid::new().to_string().to_ascii_lowercase();
        // The last 16 characters of a ULID encode its 80 random bits.
        let token = &encoded[encoded.len() - SESSION_ID_LEN..];
        Self(token.to_string())
    }

    /// Generates a token that `in_use` rejects as taken.
    ///
    /// Used to keep a token unique among every conversation still reachable.
    #[must_use]
    pub fn generate_unused(mut in_use: impl FnMut(&SessionId) -> bool) -> Self {
        loop {
            let candidate = Self::generate();
            if !in_use(&candidate) {
                return candidate;
            }
        }
    }

    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::generate()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SessionId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        if normalized.chars().count() != SESSION_ID_LEN {
            return Err(ParseIdError {
                id_type: "SessionId",
                reason: format!("expected {SESSION_ID_LEN} characters, got '{s}'"),
            });
        }
        if let Some(bad) = normalized.chars().find(|c| !ALPHABET.contains(*c)) {
            return Err(ParseIdError {
                id_type: "SessionId",
                reason: format!("invalid character '{bad}'"),
            });
        }
        Ok(Self(normalized))
    }
}

impl TryFrom<String> for SessionId {
    type Error = ParseIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}
