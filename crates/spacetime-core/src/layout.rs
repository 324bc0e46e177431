//! Layered layout of a graph around an origin event.
//!
//! Each event's layer is its directed causal distance from the origin.
//! Events outside the origin's future share one extra layer placed after
//! every reachable one (numbered with the event count). Within a layer,
//! events take consecutive rows in id order. The result is plain data for
//! an external renderer.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use spacetime_graph::{CausalGraph, GraphError, cone};
use spacetime_types::EventId;

/// Placement of one event in a [`CausalLayout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LayoutCell {
    /// The placed event.
    pub event: EventId,
    /// Directed hops from the origin, or the event count if unreachable.
    pub layer: u32,
    /// Position within the layer.
    pub row: u32,
}

/// Layered coordinates for every event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CausalLayout {
    /// The event every layer is measured from.
    pub origin: EventId,
    /// Layer assigned to events outside the origin's future.
    pub unreachable_layer: u32,
    /// One cell per event, in id order.
    pub cells: Vec<LayoutCell>,
}

impl CausalLayout {
    /// Lay out `graph` around `origin`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::EventNotFound`] if `origin` is unknown.
    pub fn compute(graph: &CausalGraph, origin: EventId) -> Result<Self, GraphError> {
        let hops = cone::causal_distances_from(graph, origin)?;
        let unreachable_layer = u32::try_from(graph.event_count()).unwrap_or(u32::MAX);

        let mut rows_used: Vec<u32> = Vec::new();
        let mut cells = Vec::with_capacity(hops.len());
        for (event, hop) in graph.events().iter().map(|e| e.id).zip(hops) {
            let layer = hop.unwrap_or(unreachable_layer);
            let slot = usize::try_from(layer).unwrap_or(usize::MAX).min(graph.event_count());
            if rows_used.len() <= slot {
                rows_used.resize(slot.saturating_add(1), 0);
            }
            let row = rows_used.get(slot).copied().unwrap_or(0);
            if let Some(count) = rows_used.get_mut(slot) {
                *count = count.saturating_add(1);
            }
            cells.push(LayoutCell { event, layer, row });
        }

        Ok(Self {
            origin,
            unreachable_layer,
            cells,
        })
    }

    /// The cell of one event.
    pub fn cell(&self, event: EventId) -> Option<&LayoutCell> {
        self.cells.get(event.index())
    }

    /// Number of distinct layers in use.
    pub fn layer_count(&self) -> usize {
        let mut layers: Vec<u32> = self.cells.iter().map(|c| c.layer).collect();
        layers.sort_unstable();
        layers.dedup();
        layers.len()
    }
}
