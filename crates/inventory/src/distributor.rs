use core::str::FromStr;

use serde::{Deserialize, Serialize};

use madmin_core::{DomainError, EntityId};

/// Distributor identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DistributorId(pub EntityId);

impl DistributorId {
    pub fn generate() -> Self {
        Self(EntityId::new())
    }
}

impl core::fmt::Display for DistributorId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for DistributorId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityId::parse_named(s, "DistributorId").map(Self)
    }
}

/// A named supplier that stock items may reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distributor {
    id: DistributorId,
    name: String,
}

impl Distributor {
    /// Create a distributor with a fresh random id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: DistributorId::generate(),
            name: name.into(),
        }
    }

    /// Rebuild a distributor from persisted values.
    pub fn restore(id: DistributorId, name: String) -> Self {
        Self { id, name }
    }

    pub fn id_typed(&self) -> DistributorId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }
}
