//! Capability definitions as the catalog sees them.
//!
//! A capability is a `dyn Trait` type implementing [`Capability`]. The trait
//! supplies the id and operation names the catalog indexes, plus a dynamic
//! entry point so operations can be invoked by name with JSON arguments.
//! [`CapabilityDef`] is the erased record kept per capability id.

use crate::catalog::identity::CapabilityId;
use serde::Serialize;
use serde_json::Value;
use std::any::TypeId;

/// Implemented for `dyn Trait` types that should be aggregatable.
///
/// ```ignore
/// impl Capability for dyn Animal {
///     const ID: &'static str = "Animal";
///     const OPERATIONS: &'static [&'static str] = &["sound"];
///
///     fn invoke(target: &Self, operation: &str, _args: &Value) -> anyhow::Result<Value> {
///         match operation {
///             "sound" => Ok(Value::from(target.sound())),
///             other => anyhow::bail!("Animal has no operation {other}"),
///         }
///     }
/// }
/// ```
pub trait Capability: 'static {
    const ID: &'static str;
    const OPERATIONS: &'static [&'static str];

    /// Run `operation` against `target`. Only called with names listed in
    /// `OPERATIONS` that the target's registration services.
    fn invoke(target: &Self, operation: &str, args: &Value) -> anyhow::Result<Value>;
}

#[derive(Clone, Debug)]
/// Catalog record for one capability.
pub struct CapabilityDef {
    pub id: CapabilityId,
    pub operations: Vec<String>,
    pub(crate) type_id: TypeId,
    pub(crate) type_name: &'static str,
}

impl CapabilityDef {
    pub(crate) fn of<C: Capability + ?Sized>() -> Self {
        Self {
            id: CapabilityId::of::<C>(),
            operations: C::OPERATIONS.iter().map(|op| op.to_string()).collect(),
            type_id: TypeId::of::<C>(),
            type_name: std::any::type_name::<C>(),
        }
    }
}

/// Serializable summary of one capability and the types implementing it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct CapabilitySnapshot {
    pub id: CapabilityId,
    pub operations: Vec<String>,
    pub implementors: Vec<String>,
}
