//! Capability catalog wiring.
//!
//! The catalog replaces runtime protocol discovery: capabilities are Rust
//! traits implementing [`Capability`], and each target type declares which of
//! them it implements when it is registered. Callers use
//! [`CapabilityCatalog`] for lookups and [`CatalogBuilder`] to assemble one.

mod binding;
pub mod identity;
pub mod model;
pub mod repository;

pub use identity::{CapabilityId, OperationId};
pub use model::{Capability, CapabilityDef, CapabilitySnapshot};
pub use repository::{CapabilityCatalog, CatalogBuilder, CatalogRegistration, TypeRegistration};
