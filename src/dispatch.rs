//! Priority-ordered resolution of operations to targets.
//!
//! Every query walks the target list from index 0 and stops at the first
//! target the catalog says can service the operation, so when several
//! targets overlap the earliest one always wins.

use crate::catalog::{Capability, CapabilityCatalog, OperationId};
use crate::target::Target;

/// Capability every aggregate satisfies by itself, whatever its targets.
pub const BASELINE_CAPABILITY: &str = "Object";

/// Introspection operations the aggregate answers when no target does.
pub const BASELINE_OPERATIONS: &[&str] = &["type_name", "target_count", "capabilities"];

pub fn is_baseline_operation(operation: &OperationId) -> bool {
    operation.capability.as_str() == BASELINE_CAPABILITY
        && BASELINE_OPERATIONS.contains(&operation.name.as_str())
}

/// Borrowed view of a catalog and a target list for one lookup.
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    catalog: &'a CapabilityCatalog,
    targets: &'a [Target],
}

impl<'a> Resolver<'a> {
    pub fn new(catalog: &'a CapabilityCatalog, targets: &'a [Target]) -> Self {
        Self { catalog, targets }
    }

    /// Priority position of the first target servicing `operation`.
    pub fn resolve_index(&self, operation: &OperationId) -> Option<usize> {
        let position = self
            .targets
            .iter()
            .position(|target| self.catalog.object_supports(target.object(), operation));
        tracing::trace!(%operation, ?position, "resolved operation");
        position
    }

    pub fn resolve(&self, operation: &OperationId) -> Option<&'a Target> {
        self.resolve_index(operation).map(|idx| &self.targets[idx])
    }

    /// First target conforming to `C`, viewed through it.
    pub fn resolve_as<C: Capability + ?Sized>(&self) -> Option<&'a C> {
        let catalog = self.catalog;
        self.targets
            .iter()
            .find_map(|target| catalog.project::<C>(target.object()))
    }

    /// First target servicing `C.operation`, viewed through `C`.
    pub fn resolve_operation_as<C: Capability + ?Sized>(&self, operation: &str) -> Option<&'a C> {
        let target = self.resolve(&OperationId::of::<C>(operation))?;
        self.catalog.project::<C>(target.object())
    }
}
