//! The capability catalog: which capabilities exist and which registered
//! target types implement which of their operations.
//!
//! Catalogs are assembled with [`CatalogBuilder`] and are immutable once
//! built, so one `Arc<CapabilityCatalog>` can back any number of aggregates.
//! The process-wide catalog collects every [`CatalogRegistration`] submitted
//! through `inventory`.

use crate::catalog::binding::Binding;
use crate::catalog::identity::{CapabilityId, OperationId};
use crate::catalog::model::{Capability, CapabilityDef, CapabilitySnapshot};
use crate::dispatch::BASELINE_CAPABILITY;
use anyhow::{Result, anyhow, bail};
use serde_json::Value;
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::marker::PhantomData;
use std::sync::{Arc, LazyLock};

/// Compile-time contribution to [`CapabilityCatalog::global`].
///
/// ```ignore
/// fn register_animals(catalog: &mut CatalogBuilder) {
///     catalog.register::<Dog>().implements::<dyn Animal>(|dog| dog);
/// }
/// inventory::submit! { CatalogRegistration(register_animals) }
/// ```
pub struct CatalogRegistration(pub fn(&mut CatalogBuilder));
inventory::collect!(CatalogRegistration);

static GLOBAL_CATALOG: LazyLock<Result<Arc<CapabilityCatalog>, String>> = LazyLock::new(|| {
    let mut builder = CatalogBuilder::new();
    for registration in inventory::iter::<CatalogRegistration> {
        (registration.0)(&mut builder);
    }
    builder
        .build()
        .map(Arc::new)
        .map_err(|err| format!("{err:#}"))
});

struct TypeEntry {
    type_name: &'static str,
    bindings: Vec<Binding>,
}

impl TypeEntry {
    fn binding(&self, capability: &CapabilityId) -> Option<&Binding> {
        self.bindings.iter().find(|b| &b.capability == capability)
    }
}

/// Immutable registry answering the catalog contract for erased targets.
pub struct CapabilityCatalog {
    definitions: BTreeMap<CapabilityId, CapabilityDef>,
    types: HashMap<TypeId, TypeEntry>,
}

impl CapabilityCatalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    /// Catalog assembled from every `inventory`-submitted registration.
    ///
    /// Built once per process; a registration error is reported on every call.
    pub fn global() -> Result<Arc<CapabilityCatalog>> {
        GLOBAL_CATALOG
            .as_ref()
            .map(Arc::clone)
            .map_err(|err| anyhow!("global capability catalog is invalid: {err}"))
    }

    pub fn definition(&self, id: &CapabilityId) -> Option<&CapabilityDef> {
        self.definitions.get(id)
    }

    /// Capability ids in stable order.
    pub fn ids(&self) -> impl Iterator<Item = &CapabilityId> {
        self.definitions.keys()
    }

    /// Whether the concrete type behind `object` was registered.
    pub fn is_registered(&self, object: &(dyn Any + Send + Sync)) -> bool {
        self.types.contains_key(&object.type_id())
    }

    /// Names of every registered target type, sorted.
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.types.values().map(|entry| entry.type_name).collect();
        names.sort_unstable();
        names
    }

    /// Every capability `object` implements. Unregistered types implement
    /// nothing.
    pub fn capabilities_of<'a>(
        &'a self,
        object: &(dyn Any + Send + Sync),
    ) -> impl Iterator<Item = &'a CapabilityId> + use<'a> {
        self.entry(object)
            .into_iter()
            .flat_map(|entry| entry.bindings.iter().map(|b| &b.capability))
    }

    pub fn object_conforms(&self, object: &(dyn Any + Send + Sync), id: &CapabilityId) -> bool {
        self.entry(object)
            .is_some_and(|entry| entry.binding(id).is_some())
    }

    pub fn object_supports(&self, object: &(dyn Any + Send + Sync), operation: &OperationId) -> bool {
        self.entry(object)
            .and_then(|entry| entry.binding(&operation.capability))
            .is_some_and(|binding| binding.services(&operation.name))
    }

    /// Perform `operation` on `object`. `None` when the object does not
    /// service it; otherwise the object's own result, untouched.
    pub fn invoke(
        &self,
        object: &(dyn Any + Send + Sync),
        operation: &OperationId,
        args: &Value,
    ) -> Option<Result<Value>> {
        let binding = self.entry(object)?.binding(&operation.capability)?;
        if !binding.services(&operation.name) {
            return None;
        }
        binding.invoke(object, &operation.name, args)
    }

    /// View `object` through capability `C`.
    pub fn project<'a, C: Capability + ?Sized>(
        &self,
        object: &'a (dyn Any + Send + Sync),
    ) -> Option<&'a C> {
        self.entry(object)?
            .binding(&CapabilityId::of::<C>())?
            .projector::<C>()?
            .project(object)
    }

    /// Serializable summary of every capability and its implementors.
    pub fn snapshot(&self) -> Vec<CapabilitySnapshot> {
        self.definitions
            .values()
            .map(|def| {
                let mut implementors: Vec<String> = self
                    .types
                    .values()
                    .filter(|entry| entry.binding(&def.id).is_some())
                    .map(|entry| entry.type_name.to_string())
                    .collect();
                implementors.sort();
                CapabilitySnapshot {
                    id: def.id.clone(),
                    operations: def.operations.clone(),
                    implementors,
                }
            })
            .collect()
    }

    fn entry(&self, object: &(dyn Any + Send + Sync)) -> Option<&TypeEntry> {
        self.types.get(&object.type_id())
    }
}

impl std::fmt::Debug for CapabilityCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityCatalog")
            .field("capabilities", &self.definitions.keys().collect::<Vec<_>>())
            .field("types", &self.type_names())
            .finish()
    }
}

/// Collects capability definitions and type registrations.
///
/// Problems are recorded as they are found and reported together by
/// [`CatalogBuilder::build`].
#[derive(Default)]
pub struct CatalogBuilder {
    definitions: BTreeMap<CapabilityId, CapabilityDef>,
    types: HashMap<TypeId, TypeEntry>,
    errors: Vec<String>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare capability `C` without registering an implementor.
    pub fn define<C: Capability + ?Sized>(&mut self) -> &mut Self {
        let def = CapabilityDef::of::<C>();
        self.insert_definition(def);
        self
    }

    /// Start registering the capabilities implemented by target type `T`.
    pub fn register<T: Any + Send + Sync>(&mut self) -> TypeRegistration<'_, T> {
        self.types
            .entry(TypeId::of::<T>())
            .or_insert_with(|| TypeEntry {
                type_name: std::any::type_name::<T>(),
                bindings: Vec::new(),
            });
        TypeRegistration {
            builder: self,
            _target: PhantomData,
        }
    }

    pub fn build(self) -> Result<CapabilityCatalog> {
        if !self.errors.is_empty() {
            bail!(
                "capability catalog has {} problem(s):\n{}",
                self.errors.len(),
                self.errors.join("\n")
            );
        }
        Ok(CapabilityCatalog {
            definitions: self.definitions,
            types: self.types,
        })
    }

    fn insert_definition(&mut self, def: CapabilityDef) {
        if let Some(existing) = self.definitions.get(&def.id) {
            if existing.type_id != def.type_id {
                self.errors.push(format!(
                    "capability id '{}' claimed by both {} and {}",
                    def.id, existing.type_name, def.type_name
                ));
            }
            return;
        }
        if definition_problems(&def, &mut self.errors) {
            return;
        }
        self.definitions.insert(def.id.clone(), def);
    }

    fn bind<T: Any + Send + Sync, C: Capability + ?Sized>(
        &mut self,
        cast: fn(&T) -> &C,
        only: Option<&[&str]>,
    ) {
        let def = CapabilityDef::of::<C>();
        let id = def.id.clone();
        let type_name = std::any::type_name::<T>();
        self.insert_definition(def);

        let mut operations = BTreeSet::new();
        match only {
            None => operations.extend(C::OPERATIONS.iter().map(|op| op.to_string())),
            Some(subset) => {
                for op in subset {
                    if !C::OPERATIONS.contains(op) {
                        self.errors.push(format!(
                            "{type_name} lists operation '{op}' which capability '{id}' does not declare"
                        ));
                        continue;
                    }
                    operations.insert(op.to_string());
                }
            }
        }

        let Some(entry) = self.types.get_mut(&TypeId::of::<T>()) else {
            return;
        };
        if entry.binding(&id).is_some() {
            self.errors
                .push(format!("{type_name} registers capability '{id}' more than once"));
            return;
        }
        entry.bindings.push(Binding::new(cast, operations));
    }
}

fn definition_problems(def: &CapabilityDef, errors: &mut Vec<String>) -> bool {
    let before = errors.len();
    let id = def.id.as_str();
    if id.trim().is_empty() {
        errors.push(format!("{} declares an empty capability id", def.type_name));
    }
    if id.contains('.') {
        errors.push(format!("capability id '{id}' must not contain '.'"));
    }
    if id == BASELINE_CAPABILITY {
        errors.push(format!(
            "capability id '{id}' is reserved for the aggregate baseline"
        ));
    }
    let mut seen = BTreeSet::new();
    for op in &def.operations {
        if op.trim().is_empty() {
            errors.push(format!("capability '{id}' declares an empty operation name"));
        } else if !seen.insert(op.as_str()) {
            errors.push(format!("capability '{id}' declares operation '{op}' twice"));
        }
    }
    errors.len() > before
}

/// Chained registration of one target type's capabilities.
pub struct TypeRegistration<'b, T> {
    builder: &'b mut CatalogBuilder,
    _target: PhantomData<fn(T)>,
}

impl<T: Any + Send + Sync> TypeRegistration<'_, T> {
    /// `T` services every operation of `C`. `cast` is usually `|t| t`.
    pub fn implements<C: Capability + ?Sized>(self, cast: fn(&T) -> &C) -> Self {
        self.builder.bind(cast, None);
        self
    }

    /// `T` conforms to `C` but services only `operations`.
    pub fn implements_only<C: Capability + ?Sized>(
        self,
        cast: fn(&T) -> &C,
        operations: &[&str],
    ) -> Self {
        self.builder.bind(cast, Some(operations));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter {
        fn greet(&self) -> String;
        fn farewell(&self) -> String;
    }

    impl Capability for dyn Greeter {
        const ID: &'static str = "Greeter";
        const OPERATIONS: &'static [&'static str] = &["greet", "farewell"];

        fn invoke(target: &Self, operation: &str, _args: &Value) -> Result<Value> {
            match operation {
                "greet" => Ok(Value::from(target.greet())),
                "farewell" => Ok(Value::from(target.farewell())),
                other => bail!("Greeter has no operation {other}"),
            }
        }
    }

    trait Impostor {}

    impl Capability for dyn Impostor {
        const ID: &'static str = "Greeter";
        const OPERATIONS: &'static [&'static str] = &[];

        fn invoke(_target: &Self, operation: &str, _args: &Value) -> Result<Value> {
            bail!("Impostor has no operation {operation}")
        }
    }

    trait Reserved {}

    impl Capability for dyn Reserved {
        const ID: &'static str = "Object";
        const OPERATIONS: &'static [&'static str] = &[];

        fn invoke(_target: &Self, operation: &str, _args: &Value) -> Result<Value> {
            bail!("Reserved has no operation {operation}")
        }
    }

    struct Host;

    impl Greeter for Host {
        fn greet(&self) -> String {
            "hello".into()
        }
        fn farewell(&self) -> String {
            "bye".into()
        }
    }

    impl Impostor for Host {}
    impl Reserved for Host {}

    struct Doorman;

    impl Greeter for Doorman {
        fn greet(&self) -> String {
            "welcome".into()
        }
        fn farewell(&self) -> String {
            unreachable!("never registered for farewell")
        }
    }

    fn catalog() -> CapabilityCatalog {
        let mut builder = CapabilityCatalog::builder();
        builder.register::<Host>().implements::<dyn Greeter>(|h| h);
        builder
            .register::<Doorman>()
            .implements_only::<dyn Greeter>(|d| d, &["greet"]);
        builder.build().expect("valid catalog")
    }

    #[test]
    fn unregistered_objects_support_nothing() {
        let catalog = catalog();
        let stranger = 42u32;
        assert!(!catalog.is_registered(&stranger));
        assert_eq!(catalog.capabilities_of(&stranger).count(), 0);
        assert!(!catalog.object_supports(&stranger, &OperationId::new("Greeter", "greet")));
        assert!(
            catalog
                .invoke(&stranger, &OperationId::new("Greeter", "greet"), &Value::Null)
                .is_none()
        );
    }

    #[test]
    fn partial_conformance_limits_operations() {
        let catalog = catalog();
        let doorman = Doorman;
        let greeter = CapabilityId::from("Greeter");
        assert!(catalog.object_conforms(&doorman, &greeter));
        assert!(catalog.object_supports(&doorman, &OperationId::new("Greeter", "greet")));
        assert!(!catalog.object_supports(&doorman, &OperationId::new("Greeter", "farewell")));
        assert!(
            catalog
                .invoke(&doorman, &OperationId::new("Greeter", "farewell"), &Value::Null)
                .is_none()
        );
    }

    #[test]
    fn invoke_and_project_reach_the_target() {
        let catalog = catalog();
        let host = Host;
        let value = catalog
            .invoke(&host, &OperationId::new("Greeter", "farewell"), &Value::Null)
            .expect("host services farewell")
            .unwrap();
        assert_eq!(value, Value::from("bye"));

        let greeter = catalog.project::<dyn Greeter>(&host).expect("host is a greeter");
        assert_eq!(greeter.greet(), "hello");
    }

    #[test]
    fn build_collects_every_problem() {
        let mut builder = CapabilityCatalog::builder();
        builder
            .register::<Host>()
            .implements::<dyn Greeter>(|h| h)
            .implements::<dyn Greeter>(|h| h)
            .implements::<dyn Impostor>(|h| h)
            .implements::<dyn Reserved>(|h| h);
        builder
            .register::<Doorman>()
            .implements_only::<dyn Greeter>(|d| d, &["greet", "wave"]);
        let err = builder.build().expect_err("invalid catalog").to_string();
        assert!(err.contains("more than once"), "{err}");
        assert!(err.contains("claimed by both"), "{err}");
        assert!(err.contains("reserved"), "{err}");
        assert!(err.contains("'wave'"), "{err}");
    }

    #[test]
    fn snapshot_lists_implementors() {
        let snapshot = catalog().snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, CapabilityId::from("Greeter"));
        assert_eq!(snapshot[0].operations, vec!["greet", "farewell"]);
        assert_eq!(snapshot[0].implementors.len(), 2);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json[0]["id"], "Greeter");
    }

    // Marker capabilities that only exist to trip the definition rules.
    macro_rules! marker_capability {
        ($name:ident, $id:expr, [$($op:expr),*]) => {
            trait $name {}

            impl Capability for dyn $name {
                const ID: &'static str = $id;
                const OPERATIONS: &'static [&'static str] = &[$($op),*];

                fn invoke(_target: &Self, operation: &str, _args: &Value) -> Result<Value> {
                    bail!("{} has no operation {operation}", $id)
                }
            }
        };
    }

    marker_capability!(Audit, "Audit", ["record"]);
    marker_capability!(Dotted, "a.b", ["x"]);
    marker_capability!(Blank, " ", ["x"]);
    marker_capability!(Silent, "Silent", ["speak", " "]);
    marker_capability!(Echo, "Echo", ["say", "say"]);
    marker_capability!(Broken, "c.d", ["x", "x", ""]);

    fn build_error(define: fn(&mut CatalogBuilder)) -> String {
        let mut builder = CapabilityCatalog::builder();
        define(&mut builder);
        builder.build().expect_err("invalid catalog").to_string()
    }

    #[test]
    fn define_only_capability_has_no_implementors() {
        let mut builder = CapabilityCatalog::builder();
        builder.define::<dyn Audit>();
        builder.register::<Host>().implements::<dyn Greeter>(|h| h);
        let catalog = Arc::new(builder.build().expect("valid catalog"));

        let audit = catalog
            .definition(&CapabilityId::from("Audit"))
            .expect("defined without implementors");
        assert_eq!(audit.operations, vec!["record"]);
        assert!(catalog.definition(&CapabilityId::from("Missing")).is_none());

        let snapshot = catalog.snapshot();
        let entry = snapshot
            .iter()
            .find(|entry| entry.id.as_str() == "Audit")
            .expect("audit in snapshot");
        assert!(entry.implementors.is_empty());

        let agg = crate::Aggregate::new(Arc::clone(&catalog), vec![crate::Target::new(Host)]);
        assert!(!agg.conforms_to::<dyn Audit>());
        assert!(!agg.capabilities().contains(&CapabilityId::from("Audit")));
        assert!(agg.conforms_to::<dyn Greeter>());
    }

    #[test]
    fn type_names_are_sorted() {
        let names = catalog().type_names();
        assert_eq!(names.len(), 2);
        assert!(names[0].ends_with("Doorman"), "{names:?}");
        assert!(names[1].ends_with("Host"), "{names:?}");
    }

    #[test]
    fn rejects_dotted_capability_id() {
        let err = build_error(|b| {
            b.define::<dyn Dotted>();
        });
        assert!(err.contains("'a.b' must not contain '.'"), "{err}");
    }

    #[test]
    fn rejects_empty_capability_id() {
        let err = build_error(|b| {
            b.define::<dyn Blank>();
        });
        assert!(err.contains("empty capability id"), "{err}");
    }

    #[test]
    fn rejects_empty_operation_name() {
        let err = build_error(|b| {
            b.define::<dyn Silent>();
        });
        assert!(err.contains("'Silent' declares an empty operation name"), "{err}");
    }

    #[test]
    fn rejects_duplicate_operation_name() {
        let err = build_error(|b| {
            b.define::<dyn Echo>();
        });
        assert!(err.contains("'Echo' declares operation 'say' twice"), "{err}");
    }

    #[test]
    fn reports_every_rule_one_capability_breaks() {
        let err = build_error(|b| {
            b.define::<dyn Broken>();
        });
        assert!(err.contains("has 3 problem(s)"), "{err}");
        assert!(err.contains("'c.d' must not contain '.'"), "{err}");
        assert!(err.contains("declares operation 'x' twice"), "{err}");
        assert!(err.contains("declares an empty operation name"), "{err}");
    }
}
