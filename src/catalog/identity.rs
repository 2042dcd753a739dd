use anyhow::{Result, bail};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::catalog::model::Capability;

/// Stable identifier for a capability (one trait registered in a catalog).
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityId(pub String);

impl CapabilityId {
    /// Identifier declared by the capability trait `C`.
    pub fn of<C: Capability + ?Sized>() -> Self {
        CapabilityId(C::ID.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CapabilityId {
    fn from(value: &str) -> Self {
        CapabilityId(value.to_string())
    }
}

impl fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One operation of a capability, written `Capability.operation`.
///
/// The capability half scopes the name so two traits may both declare an
/// operation called `sound` without colliding during dispatch.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct OperationId {
    pub capability: CapabilityId,
    pub name: String,
}

impl OperationId {
    pub fn new(capability: impl Into<CapabilityId>, name: impl Into<String>) -> Self {
        Self {
            capability: capability.into(),
            name: name.into(),
        }
    }

    /// Operation `name` of the capability trait `C`.
    pub fn of<C: Capability + ?Sized>(name: &str) -> Self {
        Self::new(CapabilityId::of::<C>(), name)
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.capability, self.name)
    }
}

impl FromStr for OperationId {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let Some((capability, name)) = value.rsplit_once('.') else {
            bail!("operation '{value}' must be written as Capability.operation");
        };
        if capability.is_empty() || name.is_empty() {
            bail!("operation '{value}' has an empty capability or operation name");
        }
        Ok(OperationId::new(capability, name))
    }
}

impl Serialize for OperationId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for OperationId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}
