//! The aggregate: one object standing in for an ordered list of targets.
//!
//! Capability-level questions go through the cached [`CapabilityIndex`];
//! operation-level questions and forwarding go through a fresh
//! [`Resolver`] scan of the current target list. Downstream code makes the
//! aggregate usable as a trait object by implementing each capability trait
//! for `Aggregate` with bodies that call [`Aggregate::forward_with`].

use crate::catalog::{Capability, CapabilityCatalog, CapabilityId, OperationId};
use crate::dispatch::{BASELINE_CAPABILITY, Resolver, is_baseline_operation};
use crate::error::AggregateError;
use crate::index::CapabilityIndex;
use crate::options::AggregateOptions;
use crate::target::{Target, TargetList};
use anyhow::Result;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

pub struct Aggregate {
    catalog: Arc<CapabilityCatalog>,
    targets: TargetList,
    index: CapabilityIndex,
    options: AggregateOptions,
}

impl Aggregate {
    pub fn new(catalog: Arc<CapabilityCatalog>, targets: impl Into<TargetList>) -> Self {
        Self::with_options(catalog, targets, AggregateOptions::default())
    }

    pub fn with_options(
        catalog: Arc<CapabilityCatalog>,
        targets: impl Into<TargetList>,
        options: AggregateOptions,
    ) -> Self {
        let aggregate = Self {
            catalog,
            targets: targets.into(),
            index: CapabilityIndex::new(),
            options,
        };
        aggregate.refresh_if_eager();
        aggregate
    }

    /// Aggregate backed by [`CapabilityCatalog::global`].
    pub fn with_global(targets: impl Into<TargetList>) -> Result<Self> {
        Ok(Self::new(CapabilityCatalog::global()?, targets))
    }

    pub fn catalog(&self) -> &Arc<CapabilityCatalog> {
        &self.catalog
    }

    pub fn options(&self) -> &AggregateOptions {
        &self.options
    }

    /// Current targets in priority order.
    pub fn targets(&self) -> &[Target] {
        self.targets.as_slice()
    }

    /// Replace the whole target list and invalidate the capability index.
    /// Returns the previous list.
    pub fn set_targets(&mut self, targets: impl Into<TargetList>) -> Vec<Target> {
        let previous = std::mem::replace(&mut self.targets, targets.into()).into_vec();
        self.index.invalidate();
        tracing::debug!(
            previous = previous.len(),
            current = self.targets.len(),
            "replaced aggregate targets"
        );
        self.refresh_if_eager();
        previous
    }

    /// Whether the next capability read will rebuild the index.
    pub fn index_is_stale(&self) -> bool {
        self.index.is_stale()
    }

    /// Union of the targets' capabilities. Excludes the baseline capability.
    pub fn capabilities(&self) -> Arc<BTreeSet<CapabilityId>> {
        self.index.capabilities(
            &self.catalog,
            self.targets.as_slice(),
            self.options.unregistered_targets,
        )
    }

    /// Whether some target implements `capability`, or it is the baseline.
    pub fn supports(&self, capability: &CapabilityId) -> bool {
        capability.as_str() == BASELINE_CAPABILITY
            || self.index.contains(
                &self.catalog,
                self.targets.as_slice(),
                self.options.unregistered_targets,
                capability,
            )
    }

    pub fn conforms_to<C: Capability + ?Sized>(&self) -> bool {
        self.supports(&CapabilityId::of::<C>())
    }

    /// Whether `operation` can be forwarded, to a target or to the baseline.
    pub fn supports_operation(&self, operation: &OperationId) -> bool {
        self.resolver().resolve_index(operation).is_some() || is_baseline_operation(operation)
    }

    /// Highest-priority target servicing `operation`.
    pub fn resolve(&self, operation: &OperationId) -> Option<&Target> {
        self.resolver().resolve(operation)
    }

    pub fn resolve_index(&self, operation: &OperationId) -> Option<usize> {
        self.resolver().resolve_index(operation)
    }

    pub fn resolve_as<C: Capability + ?Sized>(&self) -> Option<&C> {
        self.resolver().resolve_as::<C>()
    }

    pub fn resolve_operation_as<C: Capability + ?Sized>(&self, operation: &str) -> Option<&C> {
        self.resolver().resolve_operation_as::<C>(operation)
    }

    /// Invoke `operation` on the highest-priority target servicing it and
    /// return that target's result as is.
    pub fn forward(&self, operation: &OperationId, args: &Value) -> Result<Value, AggregateError> {
        if let Some(target) = self.resolve(operation) {
            return match self.catalog.invoke(target.object(), operation, args) {
                Some(result) => result.map_err(AggregateError::Target),
                None => Err(AggregateError::unsupported(operation.clone())),
            };
        }
        if is_baseline_operation(operation) {
            return Ok(self.baseline(&operation.name));
        }
        Err(AggregateError::unsupported(operation.clone()))
    }

    /// Typed forwarding: call `f` on the highest-priority target servicing
    /// `C.operation`.
    pub fn forward_with<C, R>(
        &self,
        operation: &str,
        f: impl FnOnce(&C) -> R,
    ) -> Result<R, AggregateError>
    where
        C: Capability + ?Sized,
    {
        self.resolve_operation_as::<C>(operation)
            .map(f)
            .ok_or_else(|| AggregateError::unsupported(OperationId::of::<C>(operation)))
    }

    fn baseline(&self, operation: &str) -> Value {
        match operation {
            "type_name" => Value::from(std::any::type_name::<Self>()),
            "target_count" => Value::from(self.targets.len()),
            "capabilities" => Value::from_iter(
                self.capabilities()
                    .iter()
                    .map(|id| Value::from(id.as_str())),
            ),
            _ => Value::Null,
        }
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.catalog, self.targets.as_slice())
    }

    fn refresh_if_eager(&self) {
        if self.options.eager_index {
            self.capabilities();
        }
    }
}

impl fmt::Debug for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aggregate")
            .field("targets", &self.targets.as_slice())
            .field("index_stale", &self.index.is_stale())
            .finish_non_exhaustive()
    }
}
