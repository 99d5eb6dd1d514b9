//! Mapping between domain portfolios and the exchange graph.
//!
//! Construction walks the published portfolios in order: every request portfolio becomes a
//! request group (its constraint capacities plus the portfolio's target quantity), every
//! bid portfolio a supply group, and every bid an arc from the node of the request it
//! answers to its own bid node. Coefficient vectors come from applying each portfolio's
//! converters to the resource that would flow on the arc. After matching, the match log is
//! read back out into trade records through the node maps kept here.
use super::ExchangeError;
use super::graph::{ExchangeArc, ExchangeGraph, NodeId};
use super::matcher;
use super::portfolio::{Bid, BidPortfolio, Request, RequestPortfolio};
use crate::agent::AgentID;
use crate::commodity::CommodityID;
use itertools::Itertools;
use std::collections::HashMap;
use std::rc::Rc;

/// A committed transfer of `qty` units of a commodity from bidder to requester.
///
/// Producing or acquiring the actual resource is the facilities' business, not the
/// exchange's.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Trade {
    /// The facility receiving the resource
    pub requester: AgentID,
    /// The facility supplying the resource
    pub bidder: AgentID,
    /// The commodity traded
    pub commodity: CommodityID,
    /// The quantity traded
    pub qty: f64,
}

/// A graph built from one round of portfolios, with the node maps needed to read the
/// match log back out
pub struct Translation {
    /// The graph to hand to the matcher
    pub graph: ExchangeGraph,
    requests: HashMap<NodeId, Rc<Request>>,
    bids: HashMap<NodeId, Rc<Bid>>,
}

/// Build the exchange graph for one round of portfolios.
///
/// Within a request portfolio, nodes are created in descending preference order (stable,
/// so equal preferences keep their insertion order); arcs are created in bid portfolio
/// order. Those orders are exactly the matcher's visit orders.
pub fn build_graph(
    request_portfolios: &[RequestPortfolio],
    bid_portfolios: &[BidPortfolio],
) -> Result<Translation, ExchangeError> {
    let mut graph = ExchangeGraph::new();
    let mut requests = HashMap::new();
    let mut bids = HashMap::new();

    // Request pointer -> its node and the index of its owning portfolio
    let mut request_nodes: HashMap<*const Request, (NodeId, usize)> = HashMap::new();
    for (index, portfolio) in request_portfolios.iter().enumerate() {
        let capacities = portfolio
            .constraints()
            .iter()
            .map(|constraint| constraint.capacity)
            .collect();
        let group = graph.add_request_group(capacities, portfolio.qty());

        let ordered = portfolio
            .requests()
            .iter()
            .sorted_by(|a, b| b.preference.total_cmp(&a.preference));
        for request in ordered {
            let node = graph.add_node();
            graph.add_to_group(group, node)?;
            request_nodes.insert(Rc::as_ptr(request), (node, index));
            requests.insert(node, Rc::clone(request));
        }
    }

    for portfolio in bid_portfolios {
        let capacities = portfolio
            .constraints()
            .iter()
            .map(|constraint| constraint.capacity)
            .collect();
        let group = graph.add_supply_group(capacities);

        for bid in portfolio.bids() {
            let node = graph.add_node();
            graph.add_to_group(group, node)?;
            bids.insert(node, Rc::clone(bid));

            let &(request_node, index) = request_nodes
                .get(&Rc::as_ptr(&bid.request))
                .ok_or_else(|| ExchangeError::UnknownRequest(bid.request.commodity.to_string()))?;
            let requested_by = &request_portfolios[index];

            let arc = ExchangeArc {
                request: request_node,
                bid: node,
            };
            let request_rates = requested_by
                .constraints()
                .iter()
                .map(|constraint| constraint.convert(&bid.offer))
                .collect();
            let bid_rates = portfolio
                .constraints()
                .iter()
                .map(|constraint| constraint.convert(&bid.offer))
                .collect();
            graph.set_unit_capacities(request_node, arc, request_rates);
            graph.set_unit_capacities(node, arc, bid_rates);
            graph.add_arc(arc)?;

            if requested_by.is_exclusive() {
                graph.mark_exclusive(arc);
            }
        }
    }

    Ok(Translation {
        graph,
        requests,
        bids,
    })
}

/// Read the match log back out as trade records, in match order
pub fn translate_matches(translation: &Translation) -> Vec<Trade> {
    translation
        .graph
        .matches()
        .iter()
        .map(|&(arc, qty)| {
            let request = &translation.requests[&arc.request];
            let bid = &translation.bids[&arc.bid];
            Trade {
                requester: request.requester.clone(),
                bidder: bid.bidder.clone(),
                commodity: request.commodity.clone(),
                qty,
            }
        })
        .collect()
}

/// Resolve one round of portfolios into the timestep's trade schedule
pub fn resolve_exchange(
    request_portfolios: &[RequestPortfolio],
    bid_portfolios: &[BidPortfolio],
) -> Result<Vec<Trade>, ExchangeError> {
    let mut translation = build_graph(request_portfolios, bid_portfolios)?;
    matcher::resolve(&mut translation.graph)?;
    Ok(translate_matches(&translation))
}
