use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a cart and its orchestrator instance.
///
/// One orchestrator instance exists per cart, so the cart identifier
/// doubles as the workflow instance identifier. Wraps a UUID to keep
/// it distinct from other UUID-based identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartId(Uuid);

impl CartId {
    /// Creates a new random cart ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a cart ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for CartId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CartId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for CartId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<CartId> for Uuid {
    fn from(id: CartId) -> Self {
        id.0
    }
}

impl std::str::FromStr for CartId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_creates_unique_ids() {
        let id1 = CartId::new();
        let id2 = CartId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_from_uuid_preserves_value() {
        let uuid = Uuid::new_v4();
        let id = CartId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), uuid);
    }

    #[test]
    fn test_parses_from_string() {
        let id = CartId::new();
        let parsed: CartId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let id = CartId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: CartId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
