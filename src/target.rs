//! Delegate handles and the priority-ordered list the aggregate forwards to.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Shared, type-erased handle to one delegate object.
///
/// Cloning a `Target` clones the `Arc`; the same object may appear in several
/// aggregates, or several times in one list.
#[derive(Clone)]
pub struct Target {
    object: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Target {
    /// Wrap an owned object. To share an object that is already behind an
    /// `Arc`, use [`Target::from_arc`]; passing the `Arc` here would register
    /// `Arc<T>` as the target type, which no catalog knows.
    pub fn new<T: Any + Send + Sync>(object: T) -> Self {
        debug_assert!(
            !std::any::type_name::<T>().starts_with("alloc::sync::Arc<"),
            "Target::new given {}; use Target::from_arc for shared objects",
            std::any::type_name::<T>()
        );
        Self::from_arc(Arc::new(object))
    }

    /// Wrap an object the caller keeps using elsewhere.
    pub fn from_arc<T: Any + Send + Sync>(object: Arc<T>) -> Self {
        Self {
            object,
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn object(&self) -> &(dyn Any + Send + Sync) {
        self.object.as_ref()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.object.downcast_ref()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether both handles point at the same object.
    pub fn ptr_eq(&self, other: &Target) -> bool {
        Arc::ptr_eq(&self.object, &other.object)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Target").field(&self.type_name).finish()
    }
}

/// Ordered delegates; index 0 has the highest priority.
///
/// The list is only ever replaced as a whole and is never reordered.
#[derive(Clone, Debug, Default)]
pub struct TargetList {
    targets: Vec<Target>,
}

impl TargetList {
    pub fn new(targets: Vec<Target>) -> Self {
        Self { targets }
    }

    pub fn as_slice(&self) -> &[Target] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn into_vec(self) -> Vec<Target> {
        self.targets
    }
}

impl From<Vec<Target>> for TargetList {
    fn from(targets: Vec<Target>) -> Self {
        Self::new(targets)
    }
}

impl FromIterator<Target> for TargetList {
    fn from_iter<I: IntoIterator<Item = Target>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
