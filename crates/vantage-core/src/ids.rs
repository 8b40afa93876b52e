//! Branded ID newtypes for type safety.
//!
//! Every identity in the session core has a distinct ID type implemented
//! as a newtype wrapper around `String`. This prevents accidentally
//! passing a correlation ID where a message ID is expected.
//!
//! Freshly generated IDs are UUID v7 (time-ordered) via
//! [`uuid::Uuid::now_v7`]. [`BlockId`] is the one non-string ID: it is a
//! composite of the owning turn's [`MessageId`] and a block-local ID, so
//! two turns that each emit a block `"0"` never collide.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Generate a new UUID v7 string (time-ordered).
fn new_v7() -> String {
    Uuid::now_v7().to_string()
}

macro_rules! branded_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new random ID (UUID v7, time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(new_v7())
            }

            /// Create from an existing string value.
            #[must_use]
            pub fn from_string(s: String) -> Self {
                Self(s)
            }

            /// Return the inner string as a slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

branded_id! {
    /// Stable identifier for one client instance. Generated once at
    /// construction and owned by the session; never process-global.
    ClientId
}

branded_id! {
    /// Ties a submitted query to its eventual terminal event. A fresh
    /// one is minted per submission and doubles as the wire `thread_id`.
    CorrelationId
}

branded_id! {
    /// Unique identifier for a transcript message. The assistant message
    /// ID of a turn also identifies the turn itself.
    MessageId
}

// ─────────────────────────────────────────────────────────────────────────────
// BlockId — composite turn + local key
// ─────────────────────────────────────────────────────────────────────────────

/// Identifier for a result block, composite of the owning turn and a
/// block-local ID.
///
/// Backends number blocks locally within a turn (`"0"`, `"1"`, …), so a
/// turn-scoped key is required for global uniqueness. Serializes as
/// `"<turn>/<local>"`; the turn component is a UUID and never contains
/// `/`, so the split is unambiguous.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlockId {
    turn: MessageId,
    local: String,
}

impl BlockId {
    /// Compose a block ID from the owning turn and the backend's local ID.
    #[must_use]
    pub fn new(turn: MessageId, local: impl Into<String>) -> Self {
        Self {
            turn,
            local: local.into(),
        }
    }

    /// The owning turn's message ID.
    #[must_use]
    pub fn turn(&self) -> &MessageId {
        &self.turn
    }

    /// The block-local ID as assigned by the backend.
    #[must_use]
    pub fn local(&self) -> &str {
        &self.local
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.turn, self.local)
    }
}

/// Error returned when parsing a [`BlockId`] from a string without a
/// `/` separator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseBlockIdError;

impl fmt::Display for ParseBlockIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("block id must have the form <turn>/<local>")
    }
}

impl std::error::Error for ParseBlockIdError {}

impl FromStr for BlockId {
    type Err = ParseBlockIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (turn, local) = s.split_once('/').ok_or(ParseBlockIdError)?;
        if turn.is_empty() || local.is_empty() {
            return Err(ParseBlockIdError);
        }
        Ok(Self {
            turn: MessageId::from(turn),
            local: local.to_owned(),
        })
    }
}

impl Serialize for BlockId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BlockId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_id_new_is_uuid_v7() {
        let id = ClientId::new();
        let parsed = Uuid::parse_str(id.as_str()).expect("should be valid UUID");
        assert_eq!(parsed.get_version(), Some(uuid::Version::SortRand));
    }

    #[test]
    fn correlation_id_new_is_uuid_v7() {
        let id = CorrelationId::new();
        let parsed = Uuid::parse_str(id.as_str()).expect("should be valid UUID");
        assert_eq!(parsed.get_version(), Some(uuid::Version::SortRand));
    }

    #[test]
    fn ids_are_unique() {
        let a = MessageId::new();
        let b = MessageId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn from_string() {
        let id = MessageId::from_string("custom-id".to_owned());
        assert_eq!(id.as_str(), "custom-id");
    }

    #[test]
    fn deref_to_str() {
        let id = CorrelationId::from("hello");
        let s: &str = &id;
        assert_eq!(s, "hello");
    }

    #[test]
    fn display() {
        let id = ClientId::from("display-me");
        assert_eq!(format!("{id}"), "display-me");
    }

    #[test]
    fn serde_roundtrip() {
        let id = MessageId::from("serde-test");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"serde-test\"");
        let back: MessageId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn default_creates_new() {
        let id1 = CorrelationId::default();
        let id2 = CorrelationId::default();
        assert_ne!(id1, id2, "default should create unique IDs");
    }

    #[test]
    fn block_id_composite_display() {
        let id = BlockId::new(MessageId::from("turn-1"), "0");
        assert_eq!(format!("{id}"), "turn-1/0");
    }

    #[test]
    fn block_id_same_local_different_turn_are_distinct() {
        let a = BlockId::new(MessageId::from("turn-1"), "0");
        let b = BlockId::new(MessageId::from("turn-2"), "0");
        assert_ne!(a, b);
    }

    #[test]
    fn block_id_parse_roundtrip() {
        let id = BlockId::new(MessageId::new(), "3");
        let parsed: BlockId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn block_id_parse_rejects_missing_separator() {
        let err = "no-separator".parse::<BlockId>();
        assert_eq!(err, Err(ParseBlockIdError));
    }

    #[test]
    fn block_id_parse_rejects_empty_components() {
        assert!("/0".parse::<BlockId>().is_err());
        assert!("turn/".parse::<BlockId>().is_err());
    }

    #[test]
    fn block_id_serde_is_composite_string() {
        let id = BlockId::new(MessageId::from("t"), "7");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"t/7\"");
        let back: BlockId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn block_id_hash_distinct_in_set() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        let _ = set.insert(BlockId::new(MessageId::from("a"), "0"));
        let _ = set.insert(BlockId::new(MessageId::from("b"), "0"));
        let _ = set.insert(BlockId::new(MessageId::from("a"), "0"));
        assert_eq!(set.len(), 2);
    }
}
