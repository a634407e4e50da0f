use core::fmt;
use core::str::FromStr;

use crate::CoreError;

/// Stable identifier of a backend model.
///
/// The backend keys most models by integer primary key, but a few resources
/// (uploads, rate collections) use opaque string ids. Both compare and hash
/// by value; an integer id never equals a string id, even when the string
/// holds the same digits. Use [`EntityId::parse`] to normalize user input.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum EntityId {
    Int(i64),
    Str(String),
}

impl EntityId {
    /// Parse text into an id, preferring the integer form.
    pub fn parse(text: &str) -> Result<Self, CoreError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidId {
                value: text.to_string(),
            });
        }
        Ok(match trimmed.parse::<i64>() {
            Ok(n) => EntityId::Int(n),
            Err(_) => EntityId::Str(trimmed.to_string()),
        })
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            EntityId::Int(n) => Some(*n),
            EntityId::Str(_) => None,
        }
    }
}

impl FromStr for EntityId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityId::parse(s)
    }
}

impl From<i64> for EntityId {
    fn from(n: i64) -> Self {
        EntityId::Int(n)
    }
}

impl From<i32> for EntityId {
    fn from(n: i32) -> Self {
        EntityId::Int(i64::from(n))
    }
}

impl From<u32> for EntityId {
    fn from(n: u32) -> Self {
        EntityId::Int(i64::from(n))
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        EntityId::Str(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        EntityId::Str(s)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Int(n) => write!(f, "EntityId({n})"),
            EntityId::Str(s) => write!(f, "EntityId({s:?})"),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Int(n) => write!(f, "{n}"),
            EntityId::Str(s) => write!(f, "{s}"),
        }
    }
}
