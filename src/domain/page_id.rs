//! UUID-based page identity with prefix extraction and serialization.

use serde::Serialize;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use uuid::Uuid;

/// The stable identity of a page, read from its `scms-uuid` marker.
///
/// Ordering follows the numeric value of the UUID, which makes every
/// id-keyed collection iterate deterministically.
///
/// # Examples
///
/// ```
/// use scms::domain::PageId;
///
/// let id: PageId = "11111111-2222-3333-4444-555555555555".parse().unwrap();
/// assert_eq!(id.prefix(), "11111111");
/// assert_eq!(id.to_string(), "11111111-2222-3333-4444-555555555555");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageId(Uuid);

impl PageId {
    /// Creates a new random PageId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a PageId from a raw 128-bit value (useful for testing).
    pub fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    /// Returns the first 8 hex characters of the id.
    pub fn prefix(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for PageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl fmt::Debug for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PageId(\"{}\")", self.0.hyphenated())
    }
}

/// Error returned when parsing an invalid UUID string.
#[derive(Debug, Clone)]
pub struct ParseIdError {
    value: String,
    reason: String,
}

impl ParseIdError {
    /// Returns the invalid value that caused this error.
    pub fn invalid_value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid UUID '{}': {}", self.value, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

/// Byte offsets of the separators in the 8-4-4-4-12 form.
const HYPHEN_POSITIONS: [usize; 4] = [8, 13, 18, 23];

fn is_hyphenated(s: &str) -> bool {
    s.len() == 36 && HYPHEN_POSITIONS.iter().all(|&i| s.as_bytes()[i] == b'-')
}

impl FromStr for PageId {
    type Err = ParseIdError;

    /// Accepts only the hyphenated form; simple, braced and URN forms are
    /// rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if !is_hyphenated(trimmed) {
            return Err(ParseIdError {
                value: s.to_string(),
                reason: "expected the hyphenated 8-4-4-4-12 form".to_string(),
            });
        }
        Uuid::parse_str(trimmed)
            .map(PageId)
            .map_err(|e| ParseIdError {
                value: s.to_string(),
                reason: e.to_string(),
            })
    }
}

impl Serialize for PageId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
