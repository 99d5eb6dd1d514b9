//! Greedy, priority-ordered assignment of flow to arcs.
//!
//! Request groups are visited in the order they were added to the graph, member nodes in
//! insertion order and each node's incident arcs in the order they were registered.
//! Callers encode preference entirely through that construction order, so two runs over
//! identically built graphs produce identical match logs.
use super::ExchangeError;
use super::capacity::{arc_capacity, update_arc_capacity};
use super::graph::ExchangeGraph;
use super::tolerance::EPS;

/// Assign flow to the graph's arcs, appending the committed matches to its match log.
///
/// Each arc receives the lesser of its residual capacity and the request group's
/// outstanding quantity; arcs marked exclusive receive the full outstanding quantity or
/// nothing. A group finishes when its quantity is exhausted within tolerance or its arcs
/// run out of capacity. Under-fulfilment is legal and silent.
///
/// Only a malformed graph produces an error; the graph should then be discarded.
pub fn resolve(graph: &mut ExchangeGraph) -> Result<(), ExchangeError> {
    // Handles are copied out up front so capacities can be updated mid-iteration
    let request_groups = graph.request_groups().to_vec();
    for group in request_groups {
        let mut remaining = graph.group(group).demand.unwrap_or(0.0);
        let members = graph.group(group).members.clone();

        'group: for node in members {
            for arc in graph.arcs_for(node).to_vec() {
                if remaining <= EPS {
                    break 'group;
                }

                let capacity = arc_capacity(graph, arc)?;
                if capacity <= EPS {
                    continue;
                }

                let qty = if graph.is_exclusive(arc) {
                    // All-or-nothing: only trade if the full outstanding quantity fits
                    if remaining > capacity {
                        continue;
                    }
                    remaining
                } else {
                    capacity.min(remaining)
                };

                update_arc_capacity(graph, arc, qty)?;
                remaining -= qty;
                graph.add_match(arc, qty);
            }
        }
    }

    Ok(())
}
