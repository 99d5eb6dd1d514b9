//! Fixtures for tests
use crate::agent::{AgentConfig, Prototype, PrototypeMap, SinkConfig, SourceConfig};
use crate::input::archetype::ArchetypeMap;
use crate::resource::{Basis, Composition, NuclideId, RecipeMap};
use indexmap::IndexMap;
use rstest::fixture;
use std::rc::Rc;

#[fixture]
pub fn natural_uranium() -> Rc<Composition> {
    Composition::new(
        Basis::Mass,
        IndexMap::from([(NuclideId(922350), 0.711), (NuclideId(922380), 99.289)]),
    )
    .unwrap()
}

#[fixture]
pub fn recipes(natural_uranium: Rc<Composition>) -> RecipeMap {
    RecipeMap::from([("natural_u".into(), natural_uranium)])
}

#[fixture]
pub fn source_config() -> SourceConfig {
    SourceConfig {
        commodity: "fresh_fuel".into(),
        recipe: "natural_u".into(),
        throughput: 5.0,
        inventory: None,
    }
}

#[fixture]
pub fn sink_config() -> SinkConfig {
    SinkConfig {
        commodity: "fresh_fuel".into(),
        capacity: 2.0,
        max_inventory: None,
    }
}

#[fixture]
pub fn archetypes() -> ArchetypeMap {
    ["Region", "Institution", "Source", "Sink"]
        .into_iter()
        .map(|name| (name.to_string(), name.to_string()))
        .collect()
}

#[fixture]
pub fn prototypes(source_config: SourceConfig, sink_config: SinkConfig) -> PrototypeMap {
    [
        ("region", AgentConfig::Region),
        ("utility", AgentConfig::Institution),
        ("mine", AgentConfig::Source(source_config)),
        ("repository", AgentConfig::Sink(sink_config)),
    ]
    .into_iter()
    .map(|(name, config)| {
        (
            name.into(),
            Prototype {
                id: name.into(),
                lifetime: None,
                config,
            },
        )
    })
    .collect()
}
