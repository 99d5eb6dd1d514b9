//! Integration tests which load the bundled example scenarios.
use cyclus::agent::AgentConfig;
use cyclus::input::load_scenario;
use std::path::{Path, PathBuf};

/// Get the path to the named example scenario.
fn get_scenario_path(name: &str) -> PathBuf {
    Path::new("demos").join(name).join("scenario.xml")
}

#[test]
fn test_load_simple_scenario() {
    let scenario = load_scenario(&get_scenario_path("simple")).unwrap();
    assert_eq!(scenario.info.duration, 12);
    assert_eq!(scenario.agents.len(), 5);
}

#[test]
fn test_load_fuel_cycle_scenario() {
    let scenario = load_scenario(&get_scenario_path("fuel_cycle")).unwrap();
    assert_eq!(scenario.info.duration, 24);
    assert_eq!(scenario.commodities.len(), 2);
    assert_eq!(scenario.info.handle.as_deref(), Some("fuel_cycle_demo"));

    // The fabricator carries a finite inventory and the pad a lifetime
    let fab = &scenario.prototypes["fuel_fab"];
    let AgentConfig::Source(source) = &fab.config else {
        panic!("expected a source config");
    };
    assert_eq!(source.inventory, Some(30.0));
    assert_eq!(scenario.prototypes["spent_fuel_pad"].lifetime, Some(18));
}
