//! Code for reading `commodity` declarations.
use crate::commodity::{Commodity, CommodityID, CommodityMap};
use anyhow::{Context, Result, ensure};
use serde::Deserialize;

/// The raw contents of a `commodity` block
#[derive(Debug, Deserialize, PartialEq)]
pub struct CommodityDoc {
    name: String,
    #[serde(default)]
    solution_priority: Option<f64>,
    /// Legacy spelling, rejected with a pointer at the replacement
    #[serde(default)]
    solution_order: Option<f64>,
}

/// Validate the declared commodities, preserving declaration order
pub fn convert_commodities(docs: Vec<CommodityDoc>) -> Result<CommodityMap> {
    let mut commodities = CommodityMap::new();
    for doc in docs {
        ensure!(
            doc.solution_order.is_none(),
            "`solution_order` is no longer accepted; declare `solution_priority` on commodity {}",
            doc.name
        );
        let solution_priority = doc
            .solution_priority
            .with_context(|| format!("Commodity {} must declare `solution_priority`", doc.name))?;
        ensure!(
            solution_priority.is_finite(),
            "Commodity {} has non-finite solution priority",
            doc.name
        );

        let id = CommodityID::from(doc.name);
        let commodity = Commodity {
            id: id.clone(),
            solution_priority,
        };
        ensure!(
            commodities.insert(id, commodity).is_none(),
            "Duplicate commodity name"
        );
    }

    Ok(commodities)
}
