//! Light cones and directed causal distance.
//!
//! Unlike emergent distance, these follow edge direction: the future cone
//! of an event is everything it can influence, the past cone everything
//! that can influence it.

use std::collections::VecDeque;

use spacetime_types::{ConeDirection, EventId};

use crate::causal_graph::CausalGraph;
use crate::error::GraphError;

/// Events within `depth` directed hops of `origin`, origin included, in id
/// order.
///
/// # Errors
///
/// Returns [`GraphError::EventNotFound`] if `origin` is unknown.
pub fn light_cone(
    graph: &CausalGraph,
    origin: EventId,
    depth: u32,
    direction: ConeDirection,
) -> Result<Vec<EventId>, GraphError> {
    let hops = directed_hops(graph, origin, direction, Some(depth))?;
    Ok(hops
        .iter()
        .enumerate()
        .filter(|(_, h)| h.is_some())
        .filter_map(|(index, _)| EventId::from_index(index))
        .collect())
}

/// Fewest forward hops from `from` to `to`, or `None` if `to` is not in the
/// future of `from`. `causal_distance(a, a)` is `Some(0)`.
///
/// # Errors
///
/// Returns [`GraphError::EventNotFound`] if either id is unknown.
pub fn causal_distance(
    graph: &CausalGraph,
    from: EventId,
    to: EventId,
) -> Result<Option<u32>, GraphError> {
    graph.require(to)?;
    let hops = directed_hops(graph, from, ConeDirection::Future, None)?;
    Ok(hops.get(to.index()).copied().flatten())
}

/// Forward hop count from `origin` to every event, indexed by id.
///
/// # Errors
///
/// Returns [`GraphError::EventNotFound`] if `origin` is unknown.
pub fn causal_distances_from(
    graph: &CausalGraph,
    origin: EventId,
) -> Result<Vec<Option<u32>>, GraphError> {
    directed_hops(graph, origin, ConeDirection::Future, None)
}

fn directed_hops(
    graph: &CausalGraph,
    origin: EventId,
    direction: ConeDirection,
    limit: Option<u32>,
) -> Result<Vec<Option<u32>>, GraphError> {
    graph.require(origin)?;
    let mut hops: Vec<Option<u32>> = vec![None; graph.event_count()];
    if let Some(slot) = hops.get_mut(origin.index()) {
        *slot = Some(0);
    }

    let mut queue = VecDeque::from([(origin, 0_u32)]);
    while let Some((current, depth)) = queue.pop_front() {
        if limit.is_some_and(|max| depth >= max) {
            continue;
        }
        let next = depth.saturating_add(1);
        let neighbors: Vec<EventId> = match direction {
            ConeDirection::Future => graph.successors(current).collect(),
            ConeDirection::Past => graph.predecessors(current).collect(),
        };
        for neighbor in neighbors {
            if let Some(slot) = hops.get_mut(neighbor.index())
                && slot.is_none()
            {
                *slot = Some(next);
                queue.push_back((neighbor, next));
            }
        }
    }
    Ok(hops)
}
