//! Composite-behavior proxy.
//!
//! An [`Aggregate`] is built from an ordered list of delegate [`Target`]s and
//! presents itself as supporting the union of the capabilities they
//! implement. Each operation is forwarded to the first target, in list order,
//! that services it; the result comes back untouched.
//!
//! Capabilities are Rust traits registered in a [`CapabilityCatalog`], either
//! built explicitly or assembled process-wide from `inventory` registrations.
//! The aggregate caches the union of its targets' capabilities and rebuilds
//! it lazily after the target list is replaced.

pub mod aggregate;
pub mod catalog;
pub mod dispatch;
pub mod error;
pub mod index;
pub mod options;
pub mod target;

pub use aggregate::Aggregate;
pub use catalog::{
    Capability, CapabilityCatalog, CapabilityDef, CapabilityId, CapabilitySnapshot,
    CatalogBuilder, CatalogRegistration, OperationId, TypeRegistration,
};
pub use dispatch::{BASELINE_CAPABILITY, BASELINE_OPERATIONS, Resolver};
pub use error::AggregateError;
pub use index::CapabilityIndex;
pub use options::{AggregateOptions, UnregisteredTargetPolicy};
pub use target::{Target, TargetList};

// Re-exported so downstream crates can submit catalog registrations without
// depending on `inventory` directly.
pub use inventory;
