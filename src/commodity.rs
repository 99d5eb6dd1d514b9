//! Commodities and the priorities that order their resolution.
use crate::id::define_id_type;
use indexmap::IndexMap;

define_id_type!(CommodityID);

/// A commodity traded on the exchange
#[derive(Clone, Debug, PartialEq)]
pub struct Commodity {
    /// Unique identifier for the commodity (e.g. "fresh_fuel")
    pub id: CommodityID,
    /// Weight used to order this commodity's requests during trade resolution.
    ///
    /// Requests for higher-priority commodities are matched first.
    pub solution_priority: f64,
}

/// Commodities, keyed by ID and kept in declaration order
pub type CommodityMap = IndexMap<CommodityID, Commodity>;

/// Priority applied to commodities traded without a declaration
pub const DEFAULT_SOLUTION_PRIORITY: f64 = 1.0;

/// The solution priority for `id`, whether or not the commodity was declared
pub fn solution_priority(commodities: &CommodityMap, id: &CommodityID) -> f64 {
    commodities
        .get(id)
        .map_or(DEFAULT_SOLUTION_PRIORITY, |commodity| {
            commodity.solution_priority
        })
}
