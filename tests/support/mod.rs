use aggregate::{Aggregate, Capability, CapabilityCatalog, CatalogBuilder, CatalogRegistration};
use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::sync::Arc;

pub trait Animal {
    fn sound(&self) -> String;
}

pub trait EggLayer {
    fn lay_egg(&self) -> String;
}

pub trait Swimmer {
    fn paddle(&self, strokes: u64) -> String;
    fn dive(&self) -> Result<String>;
}

impl Capability for dyn Animal {
    const ID: &'static str = "Animal";
    const OPERATIONS: &'static [&'static str] = &["sound"];

    fn invoke(target: &Self, operation: &str, _args: &Value) -> Result<Value> {
        match operation {
            "sound" => Ok(Value::from(target.sound())),
            other => bail!("Animal has no operation {other}"),
        }
    }
}

impl Capability for dyn EggLayer {
    const ID: &'static str = "EggLayer";
    const OPERATIONS: &'static [&'static str] = &["lay_egg"];

    fn invoke(target: &Self, operation: &str, _args: &Value) -> Result<Value> {
        match operation {
            "lay_egg" => Ok(Value::from(target.lay_egg())),
            other => bail!("EggLayer has no operation {other}"),
        }
    }
}

impl Capability for dyn Swimmer {
    const ID: &'static str = "Swimmer";
    const OPERATIONS: &'static [&'static str] = &["paddle", "dive"];

    fn invoke(target: &Self, operation: &str, args: &Value) -> Result<Value> {
        match operation {
            "paddle" => {
                let strokes = args
                    .get("strokes")
                    .and_then(Value::as_u64)
                    .context("paddle requires a numeric 'strokes' argument")?;
                Ok(Value::from(target.paddle(strokes)))
            }
            "dive" => target.dive().map(Value::from),
            other => bail!("Swimmer has no operation {other}"),
        }
    }
}

pub struct Dog;

impl Animal for Dog {
    fn sound(&self) -> String {
        "Bark!".to_string()
    }
}

pub struct Duck;

impl Animal for Duck {
    fn sound(&self) -> String {
        "Quack!".to_string()
    }
}

impl EggLayer for Duck {
    fn lay_egg(&self) -> String {
        "Five fresh eggs!".to_string()
    }
}

impl Swimmer for Duck {
    fn paddle(&self, strokes: u64) -> String {
        format!("duck paddled {strokes} strokes")
    }

    fn dive(&self) -> Result<String> {
        bail!("ducks registered without dive")
    }
}

pub struct Otter;

impl Swimmer for Otter {
    fn paddle(&self, strokes: u64) -> String {
        format!("otter paddled {strokes} strokes")
    }

    fn dive(&self) -> Result<String> {
        bail!("water too cold")
    }
}

pub fn register_fixtures(catalog: &mut CatalogBuilder) {
    catalog.register::<Dog>().implements::<dyn Animal>(|dog| dog);
    catalog
        .register::<Duck>()
        .implements::<dyn Animal>(|duck| duck)
        .implements::<dyn EggLayer>(|duck| duck)
        .implements_only::<dyn Swimmer>(|duck| duck, &["paddle"]);
    catalog
        .register::<Otter>()
        .implements::<dyn Swimmer>(|otter| otter);
}

aggregate::inventory::submit! { CatalogRegistration(register_fixtures) }

pub fn catalog() -> Arc<CapabilityCatalog> {
    let mut builder = CapabilityCatalog::builder();
    register_fixtures(&mut builder);
    Arc::new(builder.build().expect("fixture catalog is valid"))
}

// Lets an aggregate stand in wherever the fixtures expect a trait object.
impl Animal for Aggregate {
    fn sound(&self) -> String {
        self.forward_with::<dyn Animal, _>("sound", |animal| animal.sound())
            .unwrap_or_else(|err| panic!("{err}"))
    }
}

impl EggLayer for Aggregate {
    fn lay_egg(&self) -> String {
        self.forward_with::<dyn EggLayer, _>("lay_egg", |layer| layer.lay_egg())
            .unwrap_or_else(|err| panic!("{err}"))
    }
}
