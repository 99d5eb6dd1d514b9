//! Common routines for reading scenario input.
//!
//! A scenario is a single XML document with a `simulation` root. Parsing is two-phase:
//! serde builds the raw document structs defined by the submodules here, then each block
//! is converted into its validated domain form, with cross references (prototypes,
//! recipes, parents) checked once everything has been read.
use crate::agent::PrototypeMap;
use crate::commodity::CommodityMap;
use crate::resource::RecipeMap;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

pub mod agent;
pub mod archetype;
pub mod commodity;
pub mod control;
pub mod prototype;
pub mod recipe;

use agent::{AgentDoc, AgentSpec, convert_agents};
use archetype::{ArchetypesDoc, convert_archetypes};
use commodity::{CommodityDoc, convert_commodities};
use control::{ControlDoc, SimInfo, convert_control};
use prototype::{PrototypeDoc, convert_prototypes};
use recipe::{RecipeDoc, convert_recipes};

/// Format an error message to include the file path. To be used with `anyhow::Context`.
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().to_string_lossy())
}

/// Parse an XML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the XML file
pub fn read_xml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let xml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let xml_data = quick_xml::de::from_str(&xml_str).with_context(|| input_err_msg(file_path))?;
    Ok(xml_data)
}

/// The raw contents of a scenario document
#[derive(Debug, Deserialize, PartialEq)]
struct SimulationDoc {
    control: ControlDoc,
    #[serde(default, rename = "commodity")]
    commodities: Vec<CommodityDoc>,
    archetypes: ArchetypesDoc,
    #[serde(default, rename = "prototype")]
    prototypes: Vec<PrototypeDoc>,
    #[serde(default, rename = "agent")]
    agents: Vec<AgentDoc>,
    #[serde(default, rename = "recipe")]
    recipes: Vec<RecipeDoc>,
}

/// A fully validated scenario
#[derive(Debug, PartialEq)]
pub struct Scenario {
    /// Timing and bookkeeping parameters from the `control` block
    pub info: SimInfo,
    /// Declared commodities with their solution priorities
    pub commodities: CommodityMap,
    /// Agent templates
    pub prototypes: PrototypeMap,
    /// Agents to instantiate, in declaration order
    pub agents: Vec<AgentSpec>,
    /// Material recipes
    pub recipes: RecipeMap,
}

/// Read and validate a scenario from the XML file at `path`
pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let doc: SimulationDoc = read_xml(path)?;
    build_scenario(doc).with_context(|| input_err_msg(path))
}

fn build_scenario(doc: SimulationDoc) -> Result<Scenario> {
    let info = convert_control(doc.control)?;
    let commodities = convert_commodities(doc.commodities)?;
    let archetypes = convert_archetypes(&doc.archetypes)?;
    let recipes = convert_recipes(doc.recipes)?;
    let prototypes = convert_prototypes(doc.prototypes, &archetypes, &recipes)?;
    let agents = convert_agents(doc.agents, &prototypes)?;

    Ok(Scenario {
        info,
        commodities,
        prototypes,
        agents,
        recipes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentKind;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    /// A small but complete scenario document
    const SCENARIO_XML: &str = r#"<simulation>
  <control>
    <duration>3</duration>
    <startmonth>1</startmonth>
    <startyear>2030</startyear>
  </control>
  <commodity>
    <name>fresh_fuel</name>
    <solution_priority>2.0</solution_priority>
  </commodity>
  <archetypes>
    <spec><name>Region</name></spec>
    <spec><name>Institution</name></spec>
    <spec><name>Source</name></spec>
    <spec><name>Sink</name></spec>
  </archetypes>
  <prototype>
    <name>region</name>
    <config><region/></config>
  </prototype>
  <prototype>
    <name>utility</name>
    <config><institution/></config>
  </prototype>
  <prototype>
    <name>mine</name>
    <config>
      <source>
        <commodity>fresh_fuel</commodity>
        <recipe>natural_u</recipe>
        <throughput>1.0</throughput>
      </source>
    </config>
  </prototype>
  <prototype>
    <name>repository</name>
    <config>
      <sink>
        <commodity>fresh_fuel</commodity>
        <capacity>0.5</capacity>
      </sink>
    </config>
  </prototype>
  <agent><name>usa</name><prototype>region</prototype></agent>
  <agent><name>exelon</name><prototype>utility</prototype><parent>usa</parent></agent>
  <agent><name>mine1</name><prototype>mine</prototype><parent>exelon</parent></agent>
  <agent><name>repo1</name><prototype>repository</prototype><parent>exelon</parent></agent>
  <recipe>
    <name>natural_u</name>
    <basis>mass</basis>
    <nuclide><id>922350</id><comp>0.711</comp></nuclide>
    <nuclide><id>922380</id><comp>99.289</comp></nuclide>
  </recipe>
</simulation>"#;

    #[test]
    fn test_load_scenario() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("scenario.xml");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "{SCENARIO_XML}").unwrap();
        }

        let scenario = load_scenario(&file_path).unwrap();
        assert_eq!(scenario.info.duration, 3);
        assert_eq!(scenario.commodities.len(), 1);
        assert_eq!(scenario.prototypes.len(), 4);
        assert_eq!(scenario.agents.len(), 4);
        assert_eq!(scenario.recipes.len(), 1);

        let mine = &scenario.prototypes["mine"];
        assert_eq!(mine.config.kind(), AgentKind::Facility);
    }

    #[test]
    fn test_load_scenario_missing_file() {
        let dir = tempdir().unwrap();
        assert!(load_scenario(&dir.path().join("nope.xml")).is_err());
    }
}
