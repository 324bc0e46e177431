//! Headline statistics of a run.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use spacetime_graph::{CausalGraph, EmergentOrder};
use spacetime_types::EventId;

/// Aggregate view of one run's graph and emergent time.
///
/// Ties are broken towards the lowest event id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RunSummary {
    /// Number of events.
    pub event_count: usize,
    /// Number of causal edges.
    pub edge_count: usize,
    /// Number of events with positive energy.
    pub source_count: usize,
    /// Connected components of the undirected graph.
    pub component_count: usize,
    /// Average undirected degree `2|E| / N`.
    pub average_degree: f64,
    /// Largest emergent time.
    pub max_emergent_time: u32,
    /// Event with the most direct effects.
    pub densest: Option<EventId>,
    /// Event with the fewest direct effects.
    pub sparsest: Option<EventId>,
    /// Energy source with the largest energy, if there is any source.
    pub most_massive: Option<EventId>,
}

impl RunSummary {
    /// Summarize a linked graph.
    pub fn compute(graph: &CausalGraph, order: &EmergentOrder) -> Self {
        let densities: Vec<(EventId, usize)> = graph
            .events()
            .iter()
            .map(|e| (e.id, graph.out_degree(e.id)))
            .collect();

        let densest = densities
            .iter()
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
            .map(|(id, _)| *id);
        let sparsest = densities
            .iter()
            .min_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)))
            .map(|(id, _)| *id);
        let most_massive = graph
            .sources()
            .max_by(|a, b| a.energy.total_cmp(&b.energy).then(b.id.cmp(&a.id)))
            .map(|e| e.id);

        Self {
            event_count: graph.event_count(),
            edge_count: graph.edge_count(),
            source_count: graph.sources().count(),
            component_count: graph.component_count(),
            average_degree: graph.average_degree(),
            max_emergent_time: order.depth(),
            densest,
            sparsest,
            most_massive,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use spacetime_graph::EventSet;
    use spacetime_types::{AmbientBounds, CausalEdge, Event, Position};

    use super::*;

    #[test]
    fn picks_extremes_with_lowest_id_ties() {
        let energies = [0.0, 2.0, 0.0, 2.0];
        let events = energies
            .iter()
            .enumerate()
            .map(|(i, energy)| {
                let i = u32::try_from(i).unwrap();
                Event {
                    id: EventId(i),
                    position: Position::on_line(f64::from(i)),
                    generation: i,
                    energy: *energy,
                }
            })
            .collect();
        let set = EventSet::from_events(events, AmbientBounds::interval(0.0, 4.0)).unwrap();
        let edges = vec![
            CausalEdge::unit(EventId(1), EventId(2)),
            CausalEdge::unit(EventId(1), EventId(3)),
            CausalEdge::unit(EventId(2), EventId(3)),
        ];
        let graph = CausalGraph::from_parts(set, edges).unwrap();
        let summary = RunSummary::compute(&graph, &EmergentOrder::compute(&graph));

        assert_eq!(summary.edge_count, 3);
        assert_eq!(summary.source_count, 2);
        assert_eq!(summary.component_count, 2);
        assert_eq!(summary.max_emergent_time, 2);
        assert_eq!(summary.densest, Some(EventId(1)));
        assert_eq!(summary.sparsest, Some(EventId(0)));
        assert_eq!(summary.most_massive, Some(EventId(1)));
    }
}
