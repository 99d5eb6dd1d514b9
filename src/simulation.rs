//! Functionality for running the simulation.
//!
//! Time advances in discrete steps. Each step, facilities are ticked, their portfolios
//! gathered and handed to the exchange, the matched trades settled by moving resources
//! from bidders to requesters, and the facilities tocked. Exactly one resolution runs per
//! timestep and its graph is discarded afterwards.
use crate::agent::{Agent, AgentID, AgentMap, Trader, build_trader};
use crate::commodity::{CommodityMap, solution_priority};
use crate::exchange::{RequestPortfolio, Trade, resolve_exchange};
use crate::input::Scenario;
use crate::output::DataWriter;
use crate::resource::Resource;
use anyhow::{Context, Result};
use log::{debug, info};
use std::path::Path;

/// Totals accumulated over a whole run
#[derive(Debug, Default, PartialEq)]
pub struct RunSummary {
    /// Number of trades committed across all timesteps
    pub trades_matched: usize,
    /// Total quantity moved across all timesteps
    pub quantity_traded: f64,
}

/// Run the simulation described by `scenario`, writing results under `output_path`
pub fn run(scenario: &Scenario, output_path: &Path) -> Result<RunSummary> {
    let mut writer = DataWriter::create(output_path)?;
    let mut agents = build_agents(scenario)?;

    let mut summary = RunSummary::default();
    for time in 0..scenario.info.duration {
        info!("Timestep {time} ({})", scenario.info.calendar(time));
        let trades = step(time, &mut agents, &scenario.commodities, &mut writer)?;
        summary.trades_matched += trades.len();
        summary.quantity_traded += trades.iter().map(|trade| trade.qty).sum::<f64>();
    }

    writer.flush()?;
    info!(
        "{} trades matched over {} timesteps",
        summary.trades_matched, scenario.info.duration
    );
    Ok(summary)
}

/// Instantiate the scenario's agents in declaration order
pub fn build_agents(scenario: &Scenario) -> Result<AgentMap> {
    let mut agents = AgentMap::new();
    for spec in &scenario.agents {
        let prototype = &scenario.prototypes[&spec.prototype];
        let trader = build_trader(&spec.name, prototype, &scenario.recipes)
            .with_context(|| format!("Failed to build agent {}", spec.name))?;

        agents.insert(
            spec.name.clone(),
            Agent {
                id: spec.name.clone(),
                prototype: prototype.id.clone(),
                kind: prototype.config.kind(),
                parent: spec.parent.clone(),
                lifetime: prototype.lifetime,
                trader,
            },
        );
    }

    Ok(agents)
}

/// Advance the simulation by one timestep, returning the trades settled in it
fn step(
    time: u32,
    agents: &mut AgentMap,
    commodities: &CommodityMap,
    writer: &mut DataWriter,
) -> Result<Vec<Trade>> {
    for agent in agents.values() {
        if agent.lifetime == Some(time) {
            info!("{} reached the end of its lifetime", agent.id);
        }
    }

    for trader in active_traders(agents, time) {
        trader.tick(time);
    }

    // Requests for higher-priority commodities are put to the exchange first; the sort is
    // stable, so equal priorities keep facility creation order
    let mut requests: Vec<_> = active_traders(agents, time)
        .flat_map(|trader| trader.request_portfolios())
        .collect();
    requests.sort_by(|a, b| {
        portfolio_priority(commodities, b).total_cmp(&portfolio_priority(commodities, a))
    });

    let mut bids = Vec::new();
    for trader in active_traders(agents, time) {
        bids.extend(trader.bid_portfolios(&requests)?);
    }

    let trades = resolve_exchange(&requests, &bids)?;
    debug!(
        "{} requests and {} bids resolved into {} trades",
        requests.len(),
        bids.len(),
        trades.len()
    );

    for trade in &trades {
        let resource = trader_for(agents, &trade.bidder)?
            .supply(trade)
            .with_context(|| format!("{} failed to supply {}", trade.bidder, trade.commodity))?;
        deliver(agents, trade, resource)?;
    }
    writer.write_trades(time, &trades)?;

    for trader in active_traders(agents, time) {
        trader.tock(time);
    }

    Ok(trades)
}

/// The trading behaviours of all facilities active at `time`, in creation order
fn active_traders(agents: &mut AgentMap, time: u32) -> impl Iterator<Item = &mut Box<dyn Trader>> {
    agents
        .values_mut()
        .filter(move |agent| agent.is_active(time))
        .filter_map(|agent| agent.trader.as_mut())
}

/// The priority a portfolio resolves at: the highest priority among its commodities
fn portfolio_priority(commodities: &CommodityMap, portfolio: &RequestPortfolio) -> f64 {
    portfolio
        .requests()
        .iter()
        .map(|request| solution_priority(commodities, &request.commodity))
        .fold(f64::NEG_INFINITY, f64::max)
}

/// Hand `resource` to the requesting facility of `trade`
fn deliver(agents: &mut AgentMap, trade: &Trade, resource: Resource) -> Result<()> {
    trader_for(agents, &trade.requester)?
        .receive(trade, resource)
        .with_context(|| {
            format!(
                "{} failed to take delivery of {}",
                trade.requester, trade.commodity
            )
        })
}

/// The trading behaviour of the named trade party
fn trader_for<'a>(agents: &'a mut AgentMap, id: &AgentID) -> Result<&'a mut Box<dyn Trader>> {
    agents
        .get_mut(id)
        .with_context(|| format!("Trade names unknown agent {id}"))?
        .trader
        .as_mut()
        .with_context(|| format!("Trade names non-trading agent {id}"))
}
