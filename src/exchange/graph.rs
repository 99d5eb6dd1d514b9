//! Graph topology for the resource exchange.
//!
//! The graph is bipartite: request nodes on one side, bid nodes on the other, joined by
//! arcs. Nodes are owned by the graph and referenced by integer handles; each node belongs
//! to at most one group, which holds the pool of constraint capacities its members draw on.
//! Insertion order is part of the contract — the matcher visits request groups, member
//! nodes and incident arcs in exactly the order they were added.
use super::ExchangeError;
use std::collections::{HashMap, HashSet};

/// Handle to a node owned by an [`ExchangeGraph`]
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, derive_more::Display)]
pub struct NodeId(u32);

/// Handle to a node group owned by an [`ExchangeGraph`]
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, derive_more::Display)]
pub struct GroupId(u32);

/// A participant on one side of a potential trade
#[derive(Debug, Default)]
pub struct ExchangeNode {
    /// The group this node belongs to
    group: Option<GroupId>,
    /// Units of each group constraint consumed per unit of flow, per incident arc
    unit_capacities: HashMap<ExchangeArc, Vec<f64>>,
}

impl ExchangeNode {
    /// The group this node belongs to, if it has been added to one
    pub fn group(&self) -> Option<GroupId> {
        self.group
    }

    /// The unit capacity coefficients this node carries for `arc`
    pub fn unit_capacities(&self, arc: ExchangeArc) -> Option<&[f64]> {
        self.unit_capacities.get(&arc).map(Vec::as_slice)
    }
}

/// A group of nodes drawing on a shared pool of constraint capacities
#[derive(Debug)]
pub struct NodeGroup {
    /// Residual capacity in each constraint dimension.
    ///
    /// An empty vector means the group imposes no constraint on flow through its members.
    pub capacities: Vec<f64>,
    /// Member nodes in insertion order
    pub members: Vec<NodeId>,
    /// Total quantity requested across all member nodes; `None` on the supply side
    pub demand: Option<f64>,
}

/// Directed edge from a request node to a bid node.
///
/// Arcs are values: two arcs with the same endpoints compare equal, and arcs are copied
/// freely through the match log. An arc carries no state of its own — its capacity is
/// derived from its endpoints' coefficients and their groups' capacities.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ExchangeArc {
    /// The request-side node
    pub request: NodeId,
    /// The bid-side node
    pub bid: NodeId,
}

/// A committed trade quantity on an arc
pub type Match = (ExchangeArc, f64);

/// The bipartite graph consumed by the matcher.
///
/// Owns all nodes and groups, the node → incident arcs index and the append-only match
/// log. Built once per timestep from the published portfolios and discarded after the
/// matches have been translated out.
#[derive(Debug, Default)]
pub struct ExchangeGraph {
    nodes: Vec<ExchangeNode>,
    groups: Vec<NodeGroup>,
    request_groups: Vec<GroupId>,
    supply_groups: Vec<GroupId>,
    node_arcs: HashMap<NodeId, Vec<ExchangeArc>>,
    arcs: Vec<ExchangeArc>,
    exclusive: HashSet<ExchangeArc>,
    matches: Vec<Match>,
}

impl ExchangeGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new node, initially belonging to no group
    pub fn add_node(&mut self) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).expect("too many exchange nodes"));
        self.nodes.push(ExchangeNode::default());
        id
    }

    /// Create a demand-side group requiring at most `demand` units of flow in total
    pub fn add_request_group(&mut self, capacities: Vec<f64>, demand: f64) -> GroupId {
        let id = self.push_group(capacities, Some(demand));
        self.request_groups.push(id);
        id
    }

    /// Create a supply-side group
    pub fn add_supply_group(&mut self, capacities: Vec<f64>) -> GroupId {
        let id = self.push_group(capacities, None);
        self.supply_groups.push(id);
        id
    }

    fn push_group(&mut self, capacities: Vec<f64>, demand: Option<f64>) -> GroupId {
        let id = GroupId(u32::try_from(self.groups.len()).expect("too many exchange groups"));
        self.groups.push(NodeGroup {
            capacities,
            members: Vec::new(),
            demand,
        });
        id
    }

    /// Add `node` to `group`.
    ///
    /// Fails if the node already belongs to a group; nodes cannot be moved once attached.
    pub fn add_to_group(&mut self, group: GroupId, node: NodeId) -> Result<(), ExchangeError> {
        let entry = &mut self.nodes[node.0 as usize];
        if entry.group.is_some() {
            return Err(ExchangeError::AlreadyGrouped(node));
        }

        entry.group = Some(group);
        self.groups[group.0 as usize].members.push(node);
        Ok(())
    }

    /// Record the unit capacity coefficients `node` carries for `arc`
    pub fn set_unit_capacities(&mut self, node: NodeId, arc: ExchangeArc, coefficients: Vec<f64>) {
        self.nodes[node.0 as usize]
            .unit_capacities
            .insert(arc, coefficients);
    }

    /// Register an arc with both of its endpoints.
    ///
    /// Checks that each grouped endpoint carries one unit capacity per dimension of its
    /// group. Arcs are appended to each endpoint's incidence list in call order, which is
    /// the order the matcher will visit them in.
    pub fn add_arc(&mut self, arc: ExchangeArc) -> Result<(), ExchangeError> {
        for node in [arc.request, arc.bid] {
            let entry = &self.nodes[node.0 as usize];
            let Some(group) = entry.group else {
                continue;
            };

            let expected = self.groups[group.0 as usize].capacities.len();
            let actual = entry.unit_capacities.get(&arc).map_or(0, Vec::len);
            if actual != expected {
                return Err(ExchangeError::DimensionMismatch {
                    node,
                    actual,
                    expected,
                });
            }
        }

        self.arcs.push(arc);
        for node in [arc.request, arc.bid] {
            self.node_arcs.entry(node).or_default().push(arc);
        }
        Ok(())
    }

    /// Flag `arc` as all-or-nothing for the matcher
    pub fn mark_exclusive(&mut self, arc: ExchangeArc) {
        self.exclusive.insert(arc);
    }

    /// Whether `arc` must trade its full request quantity or nothing
    pub fn is_exclusive(&self, arc: ExchangeArc) -> bool {
        self.exclusive.contains(&arc)
    }

    /// Append a committed `(arc, quantity)` pair to the match log.
    ///
    /// Capacity bookkeeping is the matcher's responsibility; this only records the match.
    pub fn add_match(&mut self, arc: ExchangeArc, qty: f64) {
        self.matches.push((arc, qty));
    }

    /// The node behind a handle
    pub fn node(&self, id: NodeId) -> &ExchangeNode {
        &self.nodes[id.0 as usize]
    }

    /// The group behind a handle
    pub fn group(&self, id: GroupId) -> &NodeGroup {
        &self.groups[id.0 as usize]
    }

    /// Demand-side groups in insertion order
    pub fn request_groups(&self) -> &[GroupId] {
        &self.request_groups
    }

    /// Supply-side groups in insertion order
    pub fn supply_groups(&self) -> &[GroupId] {
        &self.supply_groups
    }

    /// All arcs in insertion order
    pub fn arcs(&self) -> &[ExchangeArc] {
        &self.arcs
    }

    /// Arcs incident to `node`, in the order they were added
    pub fn arcs_for(&self, node: NodeId) -> &[ExchangeArc] {
        self.node_arcs.get(&node).map_or(&[], Vec::as_slice)
    }

    /// The match log, in the order matches were committed
    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    /// Split borrow used by the capacity engine: a node together with its mutable group
    pub(crate) fn node_and_group_mut(
        &mut self,
        node: NodeId,
    ) -> Result<(&ExchangeNode, &mut NodeGroup), ExchangeError> {
        let entry = &self.nodes[node.0 as usize];
        let group = entry.group.ok_or(ExchangeError::DetachedNode(node))?;
        Ok((entry, &mut self.groups[group.0 as usize]))
    }
}
