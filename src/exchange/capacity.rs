//! Residual-capacity queries and updates across the constraints of a node's group.
//!
//! Each constraint dimension is an independent budget (mass, throughput, ...) and a node's
//! unit capacity coefficients are rates: budget consumed per unit of flow on an arc. The
//! flow an arc can still carry through a node is therefore the tightest budget divided by
//! its rate, and committing flow debits every budget by rate times quantity.
use super::ExchangeError;
use super::graph::{ExchangeArc, ExchangeGraph, NodeId};
use super::tolerance::is_neg;

/// The flow `node` can still accept on `arc`.
///
/// A group with no capacities imposes no constraint, and a zero coefficient leaves the
/// corresponding dimension unconstrained; both contribute `+∞`. Fails if the node has not
/// been added to a group.
pub fn node_capacity(
    graph: &ExchangeGraph,
    node: NodeId,
    arc: ExchangeArc,
) -> Result<f64, ExchangeError> {
    let entry = graph.node(node);
    let group = entry.group().ok_or(ExchangeError::DetachedNode(node))?;
    let capacities = &graph.group(group).capacities;
    if capacities.is_empty() {
        return Ok(f64::INFINITY);
    }

    let coefficients = entry.unit_capacities(arc).unwrap_or(&[]);
    check_dimensions(node, coefficients.len(), capacities.len())?;

    let ratios = capacities
        .iter()
        .zip(coefficients)
        .map(|(&capacity, &rate)| {
            if rate == 0.0 {
                f64::INFINITY
            } else {
                capacity / rate
            }
        });
    Ok(ratios.fold(f64::INFINITY, f64::min))
}

/// The flow `arc` can still carry given both of its endpoints
pub fn arc_capacity(graph: &ExchangeGraph, arc: ExchangeArc) -> Result<f64, ExchangeError> {
    let request = node_capacity(graph, arc.request, arc)?;
    let bid = node_capacity(graph, arc.bid, arc)?;
    Ok(request.min(bid))
}

/// Debit `qty` units of flow on `arc` from every constraint dimension of `node`'s group.
///
/// Dimensions are updated in place as they are checked, so a failure partway through rolls
/// nothing back. Callers must only commit quantities already sized to fit (`qty` at most
/// [`node_capacity`]); an error here means the caller has a bug, not a recoverable
/// condition. Residuals within tolerance of zero are clamped to zero.
pub fn update_node_capacity(
    graph: &mut ExchangeGraph,
    node: NodeId,
    arc: ExchangeArc,
    qty: f64,
) -> Result<(), ExchangeError> {
    if qty < 0.0 {
        return Err(ExchangeError::NegativeQuantity(qty));
    }

    let (entry, group) = graph.node_and_group_mut(node)?;
    if group.capacities.is_empty() {
        return Ok(());
    }

    let coefficients = entry.unit_capacities(arc).unwrap_or(&[]);
    check_dimensions(node, coefficients.len(), group.capacities.len())?;

    for (dimension, (&rate, capacity)) in coefficients
        .iter()
        .zip(group.capacities.iter_mut())
        .enumerate()
    {
        let consumed = rate * qty;
        let remaining = *capacity - consumed;
        if is_neg(remaining) {
            return Err(ExchangeError::InsufficientCapacity {
                node,
                dimension,
                remaining: *capacity,
                consumed,
            });
        }

        *capacity = remaining.max(0.0);
    }

    Ok(())
}

/// Debit `qty` units of flow on `arc` from both endpoints, request side first
pub fn update_arc_capacity(
    graph: &mut ExchangeGraph,
    arc: ExchangeArc,
    qty: f64,
) -> Result<(), ExchangeError> {
    update_node_capacity(graph, arc.request, arc, qty)?;
    update_node_capacity(graph, arc.bid, arc, qty)
}

fn check_dimensions(node: NodeId, actual: usize, expected: usize) -> Result<(), ExchangeError> {
    if actual != expected {
        return Err(ExchangeError::DimensionMismatch {
            node,
            actual,
            expected,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::tolerance::EPS;
    use float_cmp::assert_approx_eq;

    /// A graph with one arc whose endpoints each belong to their own group
    fn single_arc_graph(
        request_capacities: Vec<f64>,
        request_rates: Vec<f64>,
        bid_capacities: Vec<f64>,
        bid_rates: Vec<f64>,
    ) -> (ExchangeGraph, ExchangeArc) {
        let mut graph = ExchangeGraph::new();
        let request_group = graph.add_request_group(request_capacities, 10.0);
        let bid_group = graph.add_supply_group(bid_capacities);
        let request = graph.add_node();
        let bid = graph.add_node();
        graph.add_to_group(request_group, request).unwrap();
        graph.add_to_group(bid_group, bid).unwrap();

        let arc = ExchangeArc { request, bid };
        graph.set_unit_capacities(request, arc, request_rates);
        graph.set_unit_capacities(bid, arc, bid_rates);
        graph.add_arc(arc).unwrap();

        (graph, arc)
    }

    #[test]
    fn test_no_capacities_is_unbounded() {
        let (graph, arc) = single_arc_graph(vec![], vec![], vec![], vec![]);
        assert_eq!(
            node_capacity(&graph, arc.request, arc).unwrap(),
            f64::INFINITY
        );
        assert_eq!(node_capacity(&graph, arc.bid, arc).unwrap(), f64::INFINITY);
        assert_eq!(arc_capacity(&graph, arc).unwrap(), f64::INFINITY);
    }

    #[test]
    fn test_detached_node() {
        let mut graph = ExchangeGraph::new();
        let request = graph.add_node();
        let bid = graph.add_node();
        let arc = ExchangeArc { request, bid };
        graph.add_arc(arc).unwrap();

        assert!(matches!(
            node_capacity(&graph, request, arc),
            Err(ExchangeError::DetachedNode(n)) if n == request
        ));
        assert!(matches!(
            update_node_capacity(&mut graph, request, arc, 1.0),
            Err(ExchangeError::DetachedNode(_))
        ));
    }

    #[test]
    fn test_single_constraint() {
        let (mut graph, arc) = single_arc_graph(vec![1.5], vec![1.0], vec![], vec![]);
        assert_approx_eq!(f64, node_capacity(&graph, arc.request, arc).unwrap(), 1.5);

        update_node_capacity(&mut graph, arc.request, arc, 1.0).unwrap();
        assert_approx_eq!(f64, node_capacity(&graph, arc.request, arc).unwrap(), 0.5);
    }

    #[test]
    fn test_min_ratio_over_dimensions() {
        let (mut graph, arc) = single_arc_graph(
            vec![10.0, 5.0, 3.0, 1.0],
            vec![2.1, 1.7, 0.07, 0.01],
            vec![],
            vec![],
        );
        assert_approx_eq!(
            f64,
            node_capacity(&graph, arc.request, arc).unwrap(),
            5.0 / 1.7
        );

        update_node_capacity(&mut graph, arc.request, arc, 1.5).unwrap();
        assert_approx_eq!(
            f64,
            node_capacity(&graph, arc.request, arc).unwrap(),
            (5.0 - 1.5 * 1.7) / 1.7
        );
    }

    #[test]
    fn test_zero_rate_is_unbounded_dimension() {
        let (graph, arc) = single_arc_graph(vec![4.0, 7.0], vec![0.0, 2.0], vec![], vec![]);
        assert_approx_eq!(f64, node_capacity(&graph, arc.request, arc).unwrap(), 3.5);
    }

    #[test]
    fn test_zero_capacity_with_positive_rate() {
        let (graph, arc) = single_arc_graph(vec![0.0], vec![2.0], vec![], vec![]);
        assert_eq!(node_capacity(&graph, arc.request, arc).unwrap(), 0.0);
    }

    #[test]
    fn test_over_allocation() {
        let qty = 2.0;
        let rate = 1.5;
        let (mut graph, arc) = single_arc_graph(
            vec![qty * rate - EPS * (1.0 + EPS) * 2.0],
            vec![rate],
            vec![],
            vec![],
        );

        assert!(matches!(
            update_node_capacity(&mut graph, arc.request, arc, qty),
            Err(ExchangeError::InsufficientCapacity { dimension: 0, .. })
        ));
    }

    #[test]
    fn test_negative_quantity() {
        let (mut graph, arc) = single_arc_graph(vec![1.0], vec![1.0], vec![], vec![]);
        assert!(matches!(
            update_node_capacity(&mut graph, arc.request, arc, -1.0),
            Err(ExchangeError::NegativeQuantity(_))
        ));
    }

    #[test]
    fn test_residual_clamped_to_zero() {
        let (mut graph, arc) = single_arc_graph(vec![1.0], vec![1.0], vec![], vec![]);
        update_node_capacity(&mut graph, arc.request, arc, 1.0 + EPS / 2.0).unwrap();
        assert_eq!(node_capacity(&graph, arc.request, arc).unwrap(), 0.0);
    }

    #[test]
    fn test_arc_capacity_is_min_of_endpoints() {
        let (mut graph, arc) = single_arc_graph(vec![1.5], vec![1.0], vec![0.5], vec![0.5]);
        assert_approx_eq!(f64, arc_capacity(&graph, arc).unwrap(), 1.0);

        update_node_capacity(&mut graph, arc.request, arc, 1.0).unwrap();
        assert_approx_eq!(f64, arc_capacity(&graph, arc).unwrap(), 0.5);

        update_node_capacity(&mut graph, arc.bid, arc, 1.0).unwrap();
        assert_eq!(arc_capacity(&graph, arc).unwrap(), 0.0);
    }

    #[test]
    fn test_zero_flow_update_is_noop() {
        let (mut graph, arc) = single_arc_graph(vec![2.0, 3.0], vec![1.0, 0.5], vec![], vec![]);
        let before = node_capacity(&graph, arc.request, arc).unwrap();
        update_node_capacity(&mut graph, arc.request, arc, 0.0).unwrap();
        assert_eq!(node_capacity(&graph, arc.request, arc).unwrap(), before);
    }

    #[test]
    fn test_updates_compose_linearly() {
        let (mut split, arc) = single_arc_graph(vec![9.0, 4.0], vec![1.2, 0.3], vec![], vec![]);
        let (mut whole, _) = single_arc_graph(vec![9.0, 4.0], vec![1.2, 0.3], vec![], vec![]);

        update_node_capacity(&mut split, arc.request, arc, 1.25).unwrap();
        update_node_capacity(&mut split, arc.request, arc, 2.5).unwrap();
        update_node_capacity(&mut whole, arc.request, arc, 3.75).unwrap();

        assert_approx_eq!(
            f64,
            node_capacity(&split, arc.request, arc).unwrap(),
            node_capacity(&whole, arc.request, arc).unwrap(),
            epsilon = EPS
        );
    }
}
