//! Emergent time: longest-causal-chain layering.
//!
//! An event with no causes sits at time 0; every other event sits one step
//! after its latest cause. Because edges always point forward in generation
//! order, a single pass over the graph's topological order suffices.

use spacetime_types::EventId;

use crate::causal_graph::CausalGraph;

/// Emergent time of every event in a graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmergentOrder {
    /// Emergent time, indexed by event id.
    times: Vec<u32>,
    /// Largest emergent time.
    depth: u32,
}

impl EmergentOrder {
    /// Layer every event of `graph`.
    pub fn compute(graph: &CausalGraph) -> Self {
        let mut times = vec![0_u32; graph.event_count()];
        for id in graph.topological_order() {
            let time = graph
                .predecessors(*id)
                .filter_map(|p| times.get(p.index()).copied())
                .max()
                .map_or(0, |latest| latest.saturating_add(1));
            if let Some(slot) = times.get_mut(id.index()) {
                *slot = time;
            }
        }
        let depth = times.iter().copied().max().unwrap_or(0);
        Self { times, depth }
    }

    /// Emergent time of `id`, or `None` if the id is unknown.
    pub fn time(&self, id: EventId) -> Option<u32> {
        self.times.get(id.index()).copied()
    }

    /// All emergent times, indexed by event id.
    pub fn times(&self) -> &[u32] {
        &self.times
    }

    /// Maximum emergent time over all events.
    pub const fn depth(&self) -> u32 {
        self.depth
    }

    /// Events whose emergent time equals `time`, in id order.
    pub fn layer(&self, time: u32) -> Vec<EventId> {
        self.times
            .iter()
            .enumerate()
            .filter(|(_, t)| **t == time)
            .filter_map(|(index, _)| EventId::from_index(index))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use spacetime_types::{AmbientBounds, CausalEdge, Event, Position};

    use super::*;
    use crate::event_set::EventSet;

    fn graph(n: u32, edges: &[(u32, u32)]) -> CausalGraph {
        let events = (0..n)
            .map(|i| Event {
                id: EventId(i),
                position: Position::on_line(0.0),
                generation: i,
                energy: 0.0,
            })
            .collect();
        let set = EventSet::from_events(events, AmbientBounds::interval(0.0, 1.0)).unwrap();
        let edges = edges
            .iter()
            .map(|(s, t)| CausalEdge::unit(EventId(*s), EventId(*t)))
            .collect();
        CausalGraph::from_parts(set, edges).unwrap()
    }

    #[test]
    fn roots_are_at_time_zero() {
        let order = EmergentOrder::compute(&graph(3, &[]));
        assert_eq!(order.times(), &[0, 0, 0]);
        assert_eq!(order.depth(), 0);
    }

    #[test]
    fn longest_chain_wins() {
        // 0 -> 1 -> 2 -> 3 and a shortcut 0 -> 3.
        let order = EmergentOrder::compute(&graph(4, &[(0, 1), (1, 2), (2, 3), (0, 3)]));
        assert_eq!(order.time(EventId(3)), Some(3));
        assert_eq!(order.depth(), 3);
    }

    #[test]
    fn layers_partition_events() {
        let order = EmergentOrder::compute(&graph(5, &[(0, 2), (1, 2), (2, 4)]));
        assert_eq!(order.layer(0), vec![EventId(0), EventId(1), EventId(3)]);
        assert_eq!(order.layer(1), vec![EventId(2)]);
        assert_eq!(order.layer(2), vec![EventId(4)]);
        assert!(order.layer(3).is_empty());
    }

    #[test]
    fn unknown_event_has_no_time() {
        let order = EmergentOrder::compute(&graph(2, &[(0, 1)]));
        assert_eq!(order.time(EventId(5)), None);
    }
}
