use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// A unique identifier for an entity or relationship.
/// UUID v4 in hyphenated form, used as the ref path component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a full UUID string. Anything else is a malformed identifier.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| CoreError::MalformedIdentifier(s.to_string()))
    }

    /// The 2-char prefix used for fanout in refs/engram/entities/<ab>/<full-id>
    pub fn fanout_prefix(&self) -> String {
        self.0.as_simple().to_string()[..2].to_string()
    }

    pub fn to_hyphenated(&self) -> String {
        self.0.as_hyphenated().to_string()
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.as_hyphenated())
    }
}

impl From<Uuid> for EntityId {
    fn from(u: Uuid) -> Self {
        Self(u)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_generation_and_prefix() {
        let id = EntityId::new();
        assert_eq!(id.to_hyphenated().len(), 36);
        assert_eq!(id.fanout_prefix().len(), 2);
    }

    #[test]
    fn test_parse_roundtrip() {
        let id = EntityId::new();
        let parsed = EntityId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            EntityId::parse("not-a-uuid"),
            Err(CoreError::MalformedIdentifier(_))
        ));
        assert!(EntityId::parse("").is_err());
    }
}
