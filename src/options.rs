//! Aggregate behaviour knobs.
//!
//! Options come from a JSON file (`AggregateOptions::load`) or from the
//! environment (`AggregateOptions::from_env`). Neither changes dispatch
//! results; they only control when the capability index is built and how
//! loudly unregistered targets are reported.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

pub const EAGER_INDEX_ENV: &str = "AGGREGATE_EAGER_INDEX";
pub const UNREGISTERED_TARGETS_ENV: &str = "AGGREGATE_UNREGISTERED_TARGETS";

/// How the capability index reports targets whose type the catalog does not
/// know. Such targets always count as supporting nothing.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnregisteredTargetPolicy {
    #[default]
    Warn,
    Ignore,
}

impl UnregisteredTargetPolicy {
    fn parse(value: &str) -> Result<Self> {
        match value.trim() {
            "warn" => Ok(Self::Warn),
            "ignore" => Ok(Self::Ignore),
            other => bail!("unknown unregistered target policy '{other}' (expected warn or ignore)"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AggregateOptions {
    /// Build the capability index on construction and after every
    /// `set_targets` instead of on first read.
    pub eager_index: bool,
    pub unregistered_targets: UnregisteredTargetPolicy,
}

impl AggregateOptions {
    /// Read options from a JSON file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let data =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))
    }

    /// Defaults overridden by `AGGREGATE_EAGER_INDEX` and
    /// `AGGREGATE_UNREGISTERED_TARGETS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut options = Self::default();
        if let Some(value) = lookup(EAGER_INDEX_ENV) {
            options.eager_index = !value.trim().is_empty() && value != "0";
        }
        if let Some(value) = lookup(UNREGISTERED_TARGETS_ENV) {
            options.unregistered_targets = UnregisteredTargetPolicy::parse(&value)
                .with_context(|| format!("invalid {UNREGISTERED_TARGETS_ENV}"))?;
        }
        Ok(options)
    }
}
