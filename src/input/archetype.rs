//! Code for reading the `archetypes` block.
//!
//! Archetype `spec` entries name the behaviours prototypes may configure. All behaviours
//! ship with the simulator, so `path` and `lib` are accepted for compatibility but do not
//! load anything; `name` must match the built-in registry.
use anyhow::{Result, ensure};
use indexmap::IndexMap;
use serde::Deserialize;

/// Behaviours that ship with the simulator
const BUILTIN_ARCHETYPES: [&str; 4] = ["Region", "Institution", "Source", "Sink"];

/// The raw contents of a `spec` entry
#[derive(Debug, Deserialize, PartialEq)]
pub struct SpecDoc {
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    lib: Option<String>,
    name: String,
    #[serde(default)]
    alias: Option<String>,
}

/// The raw contents of the `archetypes` block
#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct ArchetypesDoc {
    #[serde(default, rename = "spec")]
    specs: Vec<SpecDoc>,
}

/// The archetypes available to prototypes: alias (or name) to registered name
pub type ArchetypeMap = IndexMap<String, String>;

/// Resolve the declared archetypes against the built-in registry
pub fn convert_archetypes(doc: &ArchetypesDoc) -> Result<ArchetypeMap> {
    let mut archetypes = ArchetypeMap::new();
    for spec in &doc.specs {
        ensure!(
            BUILTIN_ARCHETYPES.contains(&spec.name.as_str()),
            "Unknown archetype {}; available archetypes are {}",
            spec.name,
            BUILTIN_ARCHETYPES.join(", ")
        );

        let alias = spec.alias.as_ref().unwrap_or(&spec.name);
        ensure!(
            archetypes
                .insert(alias.clone(), spec.name.clone())
                .is_none(),
            "Archetype alias {alias} declared twice"
        );
    }

    Ok(archetypes)
}
