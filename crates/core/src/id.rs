//! Random identifiers shared by every persisted entity.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Opaque, globally unique entity identifier.
///
/// Random (UUIDv4, RFC 4122 variant bits) and rendered in the hyphenated
/// lowercase form, which is also the form persisted by the store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Generate a fresh identifier from the OS random source.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Parse an identifier, naming the owning type in the error message.
    pub fn parse_named(s: &str, name: &str) -> Result<Self, DomainError> {
        Uuid::from_str(s)
            .map(Self)
            .map_err(|e| DomainError::invalid_id(format!("{name}: {e}")))
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for EntityId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl From<Uuid> for EntityId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<EntityId> for Uuid {
    fn from(value: EntityId) -> Self {
        value.0
    }
}

impl FromStr for EntityId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_named(s, "EntityId")
    }
}
