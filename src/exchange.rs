//! The dynamic resource exchange.
//!
//! Each timestep, facilities publish portfolios of resource requests and bids. This module
//! turns those portfolios into a bipartite graph of request and bid nodes joined by arcs,
//! tracks the residual capacity of every constraint shared by a group of nodes, and greedily
//! assigns flow to arcs in priority order to produce the timestep's trade schedule.
pub mod capacity;
pub mod graph;
pub mod matcher;
pub mod portfolio;
pub mod tolerance;
pub mod translation;

pub use graph::{ExchangeArc, ExchangeGraph, GroupId, Match, NodeId};
pub use portfolio::{Bid, BidPortfolio, CapacityConstraint, Request, RequestPortfolio};
pub use translation::{Trade, build_graph, resolve_exchange, translate_matches};

use thiserror::Error;

/// Errors surfaced at the boundaries of the resource exchange.
///
/// The first three variants indicate a malformed graph, the next two an update that was not
/// sized to fit, and the rest a portfolio construction violation. None are caught internally;
/// a failed exchange leaves its graph in an undefined state and the caller must discard it.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// A node was queried or updated without a containing group
    #[error("node {0} does not belong to a group")]
    DetachedNode(NodeId),

    /// A node was added to a second group
    #[error("node {0} already belongs to a group")]
    AlreadyGrouped(NodeId),

    /// A node's unit capacity vector does not line up with its group's capacities
    #[error("node {node} has {actual} unit capacities but its group has {expected} dimensions")]
    DimensionMismatch {
        /// The offending node
        node: NodeId,
        /// Number of unit capacities recorded on the node for the arc
        actual: usize,
        /// Number of capacity dimensions on the node's group
        expected: usize,
    },

    /// A negative quantity was passed to a capacity update
    #[error("negative quantity {0} passed to a capacity update")]
    NegativeQuantity(f64),

    /// An update would drive a capacity below zero beyond tolerance
    #[error(
        "insufficient capacity on node {node}: dimension {dimension} holds {remaining} \
         but the update consumes {consumed}"
    )]
    InsufficientCapacity {
        /// The node whose group ran out of capacity
        node: NodeId,
        /// The constraint dimension that was exhausted
        dimension: usize,
        /// Capacity remaining in that dimension before the update
        remaining: f64,
        /// Capacity the update would have consumed
        consumed: f64,
    },

    /// A bid from one bidder was added to another bidder's portfolio
    #[error("bid from {actual} added to a portfolio belonging to {expected}")]
    BidderMismatch {
        /// The bidder the portfolio belongs to
        expected: String,
        /// The bidder the offending bid came from
        actual: String,
    },

    /// Two bids in one portfolio reference the same request
    #[error("a request may be bid on at most once per portfolio")]
    DuplicateRequest,

    /// A bid references a request from none of the published portfolios
    #[error("bid references an unpublished request for commodity {0}")]
    UnknownRequest(String),
}

impl ExchangeError {
    /// Whether this error indicates a graph construction bug
    pub fn is_state_error(&self) -> bool {
        matches!(
            self,
            Self::DetachedNode(_) | Self::AlreadyGrouped(_) | Self::DimensionMismatch { .. }
        )
    }

    /// Whether this error indicates an update that was not sized to fit
    pub fn is_value_error(&self) -> bool {
        matches!(
            self,
            Self::NegativeQuantity(_) | Self::InsufficientCapacity { .. }
        )
    }

    /// Whether this error indicates a portfolio construction violation
    pub fn is_key_error(&self) -> bool {
        matches!(
            self,
            Self::BidderMismatch { .. } | Self::DuplicateRequest | Self::UnknownRequest(_)
        )
    }
}
