//! Code for reading `prototype` blocks.
use super::archetype::ArchetypeMap;
use crate::agent::{AgentConfig, Prototype, PrototypeID, PrototypeMap};
use crate::resource::RecipeMap;
use anyhow::{Result, ensure};
use serde::Deserialize;

/// The raw contents of a prototype's `config` element.
///
/// The single child element selects the archetype and carries its parameters.
#[derive(Debug, Deserialize, PartialEq)]
pub struct ConfigDoc {
    #[serde(rename = "$value")]
    choice: AgentConfig,
}

/// The raw contents of a `prototype` block
#[derive(Debug, Deserialize, PartialEq)]
pub struct PrototypeDoc {
    name: String,
    #[serde(default)]
    lifetime: Option<u32>,
    config: ConfigDoc,
}

/// Validate the declared prototypes, preserving declaration order.
///
/// Each prototype's configured archetype must be declared in the `archetypes` block, and
/// a source's recipe must exist.
pub fn convert_prototypes(
    docs: Vec<PrototypeDoc>,
    archetypes: &ArchetypeMap,
    recipes: &RecipeMap,
) -> Result<PrototypeMap> {
    let mut prototypes = PrototypeMap::new();
    for doc in docs {
        let config = doc.config.choice;
        ensure!(
            archetypes
                .values()
                .any(|name| name == config.archetype_name()),
            "Prototype {} is configured as {}, which the `archetypes` block does not declare",
            doc.name,
            config.archetype_name()
        );
        if let AgentConfig::Source(source) = &config {
            ensure!(
                recipes.contains_key(&source.recipe),
                "Prototype {} names unknown recipe {}",
                doc.name,
                source.recipe
            );
        }
        if let Some(lifetime) = doc.lifetime {
            ensure!(
                lifetime >= 1,
                "Prototype {} has a zero lifetime",
                doc.name
            );
        }

        let id = PrototypeID::from(doc.name);
        let prototype = Prototype {
            id: id.clone(),
            lifetime: doc.lifetime,
            config,
        };
        ensure!(
            prototypes.insert(id, prototype).is_none(),
            "Duplicate prototype name"
        );
    }

    Ok(prototypes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{archetypes, recipes};
    use crate::resource::RecipeID;
    use rstest::rstest;

    fn doc(xml: &str) -> PrototypeDoc {
        quick_xml::de::from_str(xml).unwrap()
    }

    #[rstest]
    fn test_parse_source_prototype(archetypes: ArchetypeMap, recipes: RecipeMap) {
        let prototypes = convert_prototypes(
            vec![doc(
                "<prototype>
                    <name>mine</name>
                    <lifetime>10</lifetime>
                    <config>
                        <source>
                            <commodity>fresh_fuel</commodity>
                            <recipe>natural_u</recipe>
                            <throughput>1.5</throughput>
                        </source>
                    </config>
                </prototype>",
            )],
            &archetypes,
            &recipes,
        )
        .unwrap();

        let mine = &prototypes[&PrototypeID::from("mine")];
        assert_eq!(mine.lifetime, Some(10));
        let AgentConfig::Source(source) = &mine.config else {
            panic!("expected a source config");
        };
        assert_eq!(source.throughput, 1.5);
        assert_eq!(source.inventory, None);
    }

    #[rstest]
    fn test_parse_pass_through_prototype(archetypes: ArchetypeMap, recipes: RecipeMap) {
        let prototypes = convert_prototypes(
            vec![doc(
                "<prototype><name>region</name><config><region/></config></prototype>",
            )],
            &archetypes,
            &recipes,
        )
        .unwrap();
        assert_eq!(
            prototypes[&PrototypeID::from("region")].config,
            AgentConfig::Region
        );
    }

    #[rstest]
    fn test_undeclared_archetype(recipes: RecipeMap) {
        let result = convert_prototypes(
            vec![doc(
                "<prototype><name>region</name><config><region/></config></prototype>",
            )],
            &ArchetypeMap::new(),
            &recipes,
        );
        assert!(result.is_err());
    }

    #[rstest]
    fn test_unknown_recipe(archetypes: ArchetypeMap) {
        let result = convert_prototypes(
            vec![doc(
                "<prototype>
                    <name>mine</name>
                    <config>
                        <source>
                            <commodity>fresh_fuel</commodity>
                            <recipe>natural_u</recipe>
                            <throughput>1.5</throughput>
                        </source>
                    </config>
                </prototype>",
            )],
            &archetypes,
            &RecipeMap::new(),
        );
        assert!(result.is_err());
    }

    #[rstest]
    fn test_duplicate_prototype(archetypes: ArchetypeMap, recipes: RecipeMap) {
        let entry = "<prototype><name>region</name><config><region/></config></prototype>";
        let result = convert_prototypes(vec![doc(entry), doc(entry)], &archetypes, &recipes);
        assert!(result.is_err());
    }
}
