//! Cached union of the capabilities implemented by an aggregate's targets.
//!
//! The cache records presence only. It is invalidated wholesale whenever the
//! target list is replaced and rebuilt on the next read; there is no
//! incremental update. The recompute runs under the state lock so concurrent
//! readers never observe a half-built set.

use crate::catalog::{CapabilityCatalog, CapabilityId};
use crate::options::UnregisteredTargetPolicy;
use crate::target::Target;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug)]
struct IndexState {
    stale: bool,
    capabilities: Arc<BTreeSet<CapabilityId>>,
}

#[derive(Debug)]
pub struct CapabilityIndex {
    state: Mutex<IndexState>,
}

impl Default for CapabilityIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl CapabilityIndex {
    /// A stale, empty index.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(IndexState {
                stale: true,
                capabilities: Arc::new(BTreeSet::new()),
            }),
        }
    }

    /// Mark the cache untrustworthy. Requires exclusive access, which is what
    /// replacing the target list already holds.
    pub fn invalidate(&mut self) {
        self.state.get_mut().stale = true;
    }

    pub fn is_stale(&self) -> bool {
        self.state.lock().stale
    }

    /// Current capability set, rebuilt first if stale.
    pub fn capabilities(
        &self,
        catalog: &CapabilityCatalog,
        targets: &[Target],
        policy: UnregisteredTargetPolicy,
    ) -> Arc<BTreeSet<CapabilityId>> {
        let mut state = self.state.lock();
        if state.stale {
            state.capabilities = Arc::new(collect_capabilities(catalog, targets, policy));
            state.stale = false;
            tracing::debug!(
                targets = targets.len(),
                capabilities = state.capabilities.len(),
                "recomputed capability index"
            );
        }
        Arc::clone(&state.capabilities)
    }

    pub fn contains(
        &self,
        catalog: &CapabilityCatalog,
        targets: &[Target],
        policy: UnregisteredTargetPolicy,
        id: &CapabilityId,
    ) -> bool {
        self.capabilities(catalog, targets, policy).contains(id)
    }
}

fn collect_capabilities(
    catalog: &CapabilityCatalog,
    targets: &[Target],
    policy: UnregisteredTargetPolicy,
) -> BTreeSet<CapabilityId> {
    let mut capabilities = BTreeSet::new();
    for (position, target) in targets.iter().enumerate() {
        if !catalog.is_registered(target.object()) {
            // Unknown types degrade to "supports nothing" so one stray target
            // cannot break aggregation for the rest.
            match policy {
                UnregisteredTargetPolicy::Warn => tracing::warn!(
                    position,
                    type_name = target.type_name(),
                    "target type is not registered in the capability catalog"
                ),
                UnregisteredTargetPolicy::Ignore => tracing::debug!(
                    position,
                    type_name = target.type_name(),
                    "skipping unregistered target type"
                ),
            }
            continue;
        }
        capabilities.extend(catalog.capabilities_of(target.object()).cloned());
    }
    capabilities
}
