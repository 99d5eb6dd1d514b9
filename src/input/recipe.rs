//! Code for reading `recipe` blocks.
use crate::resource::{Basis, Composition, NuclideId, RecipeID, RecipeMap};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use serde::Deserialize;

/// The raw contents of a `nuclide` entry
#[derive(Debug, Deserialize, PartialEq)]
pub struct NuclideDoc {
    id: u32,
    comp: f64,
}

/// The raw contents of a `recipe` block
#[derive(Debug, Deserialize, PartialEq)]
pub struct RecipeDoc {
    name: String,
    basis: Basis,
    #[serde(default, rename = "nuclide")]
    nuclides: Vec<NuclideDoc>,
}

/// Validate the declared recipes, preserving declaration order.
///
/// Fractions are normalised to sum to one; duplicate nuclides and nonpositive fractions
/// are rejected.
pub fn convert_recipes(docs: Vec<RecipeDoc>) -> Result<RecipeMap> {
    let mut recipes = RecipeMap::new();
    for doc in docs {
        let mut fractions = IndexMap::new();
        for nuclide in &doc.nuclides {
            ensure!(
                fractions.insert(NuclideId(nuclide.id), nuclide.comp).is_none(),
                "Recipe {} lists nuclide {} twice",
                doc.name,
                nuclide.id
            );
        }
        let composition = Composition::new(doc.basis, fractions)
            .with_context(|| format!("Error in recipe {}", doc.name))?;

        ensure!(
            recipes.insert(RecipeID::from(doc.name), composition).is_none(),
            "Duplicate recipe name"
        );
    }

    Ok(recipes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_parse_recipe_block() {
        let doc: RecipeDoc = quick_xml::de::from_str(
            "<recipe>
                <name>natural_u</name>
                <basis>mass</basis>
                <nuclide><id>922350</id><comp>0.711</comp></nuclide>
                <nuclide><id>922380</id><comp>99.289</comp></nuclide>
            </recipe>",
        )
        .unwrap();
        assert_eq!(doc.name, "natural_u");
        assert_eq!(doc.basis, Basis::Mass);
        assert_eq!(doc.nuclides.len(), 2);

        let recipes = convert_recipes(vec![doc]).unwrap();
        let composition = &recipes[&RecipeID::from("natural_u")];
        assert_approx_eq!(f64, composition.fraction(NuclideId(922350)), 0.00711);
    }

    #[test]
    fn test_duplicate_nuclide() {
        let result = convert_recipes(vec![RecipeDoc {
            name: "natural_u".into(),
            basis: Basis::Mass,
            nuclides: vec![
                NuclideDoc {
                    id: 922350,
                    comp: 0.5,
                },
                NuclideDoc {
                    id: 922350,
                    comp: 0.5,
                },
            ],
        }]);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_recipe() {
        let result = convert_recipes(vec![RecipeDoc {
            name: "empty".into(),
            basis: Basis::Atom,
            nuclides: Vec::new(),
        }]);
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_recipe() {
        let doc = || RecipeDoc {
            name: "natural_u".into(),
            basis: Basis::Mass,
            nuclides: vec![NuclideDoc {
                id: 922350,
                comp: 1.0,
            }],
        };
        assert!(convert_recipes(vec![doc(), doc()]).is_err());
    }
}
