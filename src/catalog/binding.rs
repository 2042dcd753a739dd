//! Type-erased glue between a concrete target type and one capability.
//!
//! A [`Binding`] remembers which operations the type services and carries two
//! erased entry points: dynamic invocation by operation name, and projection
//! of the target to `&C` for typed forwarding.

use crate::catalog::identity::CapabilityId;
use crate::catalog::model::Capability;
use serde_json::Value;
use std::any::Any;
use std::collections::BTreeSet;

type Invoker = Box<
    dyn Fn(&(dyn Any + Send + Sync), &str, &Value) -> Option<anyhow::Result<Value>> + Send + Sync,
>;

/// Downcasts an erased target and coerces it to the capability trait object.
pub(crate) trait Project<C: ?Sized>: Send + Sync {
    fn project<'a>(&self, target: &'a (dyn Any + Send + Sync)) -> Option<&'a C>;
}

struct Projector<T, C: ?Sized> {
    cast: fn(&T) -> &C,
}

impl<T: Any, C: ?Sized + 'static> Project<C> for Projector<T, C> {
    fn project<'a>(&self, target: &'a (dyn Any + Send + Sync)) -> Option<&'a C> {
        target.downcast_ref::<T>().map(self.cast)
    }
}

pub(crate) struct Binding {
    pub(crate) capability: CapabilityId,
    pub(crate) operations: BTreeSet<String>,
    invoker: Invoker,
    // Holds a `Box<dyn Project<C>>`; recovered by `projector::<C>`.
    projector: Box<dyn Any + Send + Sync>,
}

impl Binding {
    pub(crate) fn new<T, C>(cast: fn(&T) -> &C, operations: BTreeSet<String>) -> Self
    where
        T: Any + Send + Sync,
        C: Capability + ?Sized,
    {
        let invoker: Invoker = Box::new(
            move |target: &(dyn Any + Send + Sync), operation: &str, args: &Value| {
                target
                    .downcast_ref::<T>()
                    .map(|concrete| C::invoke(cast(concrete), operation, args))
            },
        );
        let projector: Box<dyn Project<C>> = Box::new(Projector { cast });
        Self {
            capability: CapabilityId::of::<C>(),
            operations,
            invoker,
            projector: Box::new(projector),
        }
    }

    pub(crate) fn services(&self, operation: &str) -> bool {
        self.operations.contains(operation)
    }

    /// `None` when `target` is not the type this binding was built for.
    pub(crate) fn invoke(
        &self,
        target: &(dyn Any + Send + Sync),
        operation: &str,
        args: &Value,
    ) -> Option<anyhow::Result<Value>> {
        (self.invoker)(target, operation, args)
    }

    pub(crate) fn projector<C: ?Sized + 'static>(&self) -> Option<&dyn Project<C>> {
        self.projector
            .downcast_ref::<Box<dyn Project<C>>>()
            .map(|boxed| boxed.as_ref())
    }
}
