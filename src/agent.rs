//! Agents in the region / institution / facility hierarchy.
//!
//! Regions and institutions only structure the hierarchy; facilities carry a [`Trader`]
//! that is driven through the timestep loop. Two built-in behaviours are provided: a
//! source that produces a commodity from a recipe and a sink that accumulates one.
use crate::commodity::CommodityID;
use crate::exchange::portfolio::DEFAULT_PREFERENCE;
use crate::exchange::tolerance::is_pos;
use crate::exchange::{BidPortfolio, CapacityConstraint, RequestPortfolio, Trade};
use crate::id::define_id_type;
use crate::resource::{Composition, Material, RecipeID, RecipeMap, Resource};
use anyhow::{Context, Result, bail};
use indexmap::IndexMap;
use serde::Deserialize;
use std::rc::Rc;

define_id_type!(AgentID);
define_id_type!(PrototypeID);

/// The level an agent occupies in the hierarchy
#[derive(Clone, Copy, Debug, Eq, PartialEq, derive_more::Display)]
pub enum AgentKind {
    /// A top-level geographic grouping
    Region,
    /// An operator of facilities within a region
    Institution,
    /// A plant that trades resources
    Facility,
}

impl AgentKind {
    /// The kind an agent of this kind may have as parent, if any
    pub fn parent_kind(self) -> Option<AgentKind> {
        match self {
            Self::Region => None,
            Self::Institution => Some(Self::Region),
            Self::Facility => Some(Self::Institution),
        }
    }
}

/// Configuration for a facility that produces a commodity from a recipe
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SourceConfig {
    /// The commodity offered
    pub commodity: CommodityID,
    /// The recipe produced material is built from
    pub recipe: RecipeID,
    /// Maximum quantity supplied per timestep
    pub throughput: f64,
    /// Total quantity the facility can ever supply; unlimited if absent
    pub inventory: Option<f64>,
}

/// Configuration for a facility that accumulates a commodity
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SinkConfig {
    /// The commodity requested
    pub commodity: CommodityID,
    /// Maximum quantity accepted per timestep
    pub capacity: f64,
    /// Total quantity the facility can ever hold; unlimited if absent
    pub max_inventory: Option<f64>,
}

/// The behaviour a prototype gives to agents built from it.
///
/// Doubles as the schema for a prototype's `config` element: the variant is selected by
/// the element name.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AgentConfig {
    /// A pass-through region
    Region,
    /// A pass-through institution
    Institution,
    /// A producing facility
    Source(SourceConfig),
    /// A consuming facility
    Sink(SinkConfig),
}

impl AgentConfig {
    /// The hierarchy level agents with this configuration occupy
    pub fn kind(&self) -> AgentKind {
        match self {
            Self::Region => AgentKind::Region,
            Self::Institution => AgentKind::Institution,
            Self::Source(_) | Self::Sink(_) => AgentKind::Facility,
        }
    }

    /// The name this behaviour is registered under in the `archetypes` block
    pub fn archetype_name(&self) -> &'static str {
        match self {
            Self::Region => "Region",
            Self::Institution => "Institution",
            Self::Source(_) => "Source",
            Self::Sink(_) => "Sink",
        }
    }
}

/// A template from which agents are instantiated
#[derive(Clone, Debug, PartialEq)]
pub struct Prototype {
    /// Unique identifier for the prototype
    pub id: PrototypeID,
    /// Number of timesteps agents built from this prototype trade for; unlimited if absent
    pub lifetime: Option<u32>,
    /// The behaviour agents built from this prototype carry
    pub config: AgentConfig,
}

/// Prototypes, keyed by ID and kept in declaration order
pub type PrototypeMap = IndexMap<PrototypeID, Prototype>;

/// Trading behaviour of a facility over the timestep loop
pub trait Trader {
    /// Called at the start of each timestep, before portfolios are gathered
    fn tick(&mut self, _time: u32) {}

    /// The requests this facility publishes for the timestep's resolution
    fn request_portfolios(&mut self) -> Vec<RequestPortfolio> {
        Vec::new()
    }

    /// The bids this facility publishes against the timestep's published requests
    fn bid_portfolios(&mut self, _requests: &[RequestPortfolio]) -> Result<Vec<BidPortfolio>> {
        Ok(Vec::new())
    }

    /// Produce the resource owed under a matched trade
    fn supply(&mut self, trade: &Trade) -> Result<Resource>;

    /// Take delivery of the resource received under a matched trade
    fn receive(&mut self, trade: &Trade, resource: Resource) -> Result<()>;

    /// Called at the end of each timestep, after trades have been settled
    fn tock(&mut self, _time: u32) {}
}

/// An agent in the simulation
pub struct Agent {
    /// Unique identifier for the agent
    pub id: AgentID,
    /// The prototype the agent was built from
    pub prototype: PrototypeID,
    /// The hierarchy level the agent occupies
    pub kind: AgentKind,
    /// The agent one level up the hierarchy, if any
    pub parent: Option<AgentID>,
    /// Number of timesteps the agent participates for; unlimited if absent
    pub lifetime: Option<u32>,
    /// Trading behaviour; facilities only
    pub trader: Option<Box<dyn Trader>>,
}

impl Agent {
    /// Whether the agent still participates at `time`
    pub fn is_active(&self, time: u32) -> bool {
        self.lifetime.is_none_or(|lifetime| time < lifetime)
    }
}

/// Agents, keyed by ID and kept in creation order
pub type AgentMap = IndexMap<AgentID, Agent>;

/// Instantiate the trading behaviour for an agent built from `prototype`
pub fn build_trader(
    id: &AgentID,
    prototype: &Prototype,
    recipes: &RecipeMap,
) -> Result<Option<Box<dyn Trader>>> {
    let trader: Box<dyn Trader> = match &prototype.config {
        AgentConfig::Region | AgentConfig::Institution => return Ok(None),
        AgentConfig::Source(config) => {
            let recipe = recipes
                .get(&config.recipe)
                .with_context(|| format!("Unknown recipe {}", config.recipe))?;
            Box::new(Source::new(id.clone(), config, Rc::clone(recipe)))
        }
        AgentConfig::Sink(config) => Box::new(Sink::new(id.clone(), config)),
    };

    Ok(Some(trader))
}

/// A facility that produces a commodity from a recipe
pub struct Source {
    id: AgentID,
    commodity: CommodityID,
    recipe: Rc<Composition>,
    throughput: f64,
    /// Remaining finite stock; `None` means unlimited
    stock: Option<Resource>,
}

impl Source {
    /// Create a source facility named `id`
    pub fn new(id: AgentID, config: &SourceConfig, recipe: Rc<Composition>) -> Self {
        let stock = config
            .inventory
            .map(|qty| Resource::Material(Material::new(qty, Rc::clone(&recipe))));
        Self {
            id,
            commodity: config.commodity.clone(),
            recipe,
            throughput: config.throughput,
            stock,
        }
    }

    /// The most the source can still offer this timestep
    fn available(&self) -> f64 {
        let stocked = self
            .stock
            .as_ref()
            .map_or(f64::INFINITY, Resource::quantity);
        self.throughput.min(stocked)
    }
}

impl Trader for Source {
    fn bid_portfolios(&mut self, requests: &[RequestPortfolio]) -> Result<Vec<BidPortfolio>> {
        let available = self.available();
        if !is_pos(available) {
            return Ok(Vec::new());
        }

        let mut portfolio = BidPortfolio::new();
        for published in requests {
            for request in published.requests() {
                if request.commodity != self.commodity {
                    continue;
                }

                let offered = request.exemplar.quantity().min(available);
                let offer = Resource::Material(Material::new(offered, Rc::clone(&self.recipe)));
                portfolio.add_bid(self.id.clone(), request, offer)?;
            }
        }

        if portfolio.bids().is_empty() {
            return Ok(Vec::new());
        }

        // However many bids are taken up, no more than `available` leaves the facility
        portfolio.add_constraint(CapacityConstraint::new(available, Box::new(|_| 1.0)));
        Ok(vec![portfolio])
    }

    fn supply(&mut self, trade: &Trade) -> Result<Resource> {
        match &mut self.stock {
            None => Ok(Resource::Material(Material::new(
                trade.qty,
                Rc::clone(&self.recipe),
            ))),
            Some(stock) => stock.extract(trade.qty),
        }
    }

    fn receive(&mut self, _trade: &Trade, _resource: Resource) -> Result<()> {
        bail!("Source facility {} does not take deliveries", self.id)
    }
}

/// A facility that accumulates a commodity
pub struct Sink {
    id: AgentID,
    commodity: CommodityID,
    capacity: f64,
    max_inventory: Option<f64>,
    inventory: Option<Resource>,
}

impl Sink {
    /// Create a sink facility named `id`
    pub fn new(id: AgentID, config: &SinkConfig) -> Self {
        Self {
            id,
            commodity: config.commodity.clone(),
            capacity: config.capacity,
            max_inventory: config.max_inventory,
            inventory: None,
        }
    }

    /// The quantity held so far
    pub fn stored(&self) -> f64 {
        self.inventory.as_ref().map_or(0.0, Resource::quantity)
    }

    /// The quantity the facility can still hold
    fn space(&self) -> f64 {
        self.max_inventory
            .map_or(f64::INFINITY, |max| (max - self.stored()).max(0.0))
    }
}

impl Trader for Sink {
    fn request_portfolios(&mut self) -> Vec<RequestPortfolio> {
        let amount = self.capacity.min(self.space());
        if !is_pos(amount) {
            return Vec::new();
        }

        let mut portfolio = RequestPortfolio::new(self.id.clone(), amount);
        portfolio.add_request(
            self.commodity.clone(),
            Resource::Material(Material::blank(amount)),
            DEFAULT_PREFERENCE,
        );
        vec![portfolio]
    }

    fn supply(&mut self, _trade: &Trade) -> Result<Resource> {
        bail!("Sink facility {} does not supply resources", self.id)
    }

    fn receive(&mut self, _trade: &Trade, resource: Resource) -> Result<()> {
        match &mut self.inventory {
            None => {
                self.inventory = Some(resource);
                Ok(())
            }
            Some(held) => held.absorb(resource),
        }
    }
}
