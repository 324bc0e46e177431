//! The causal graph: events as nodes, causal edges as directed links.
//!
//! [`CausalGraph`] is read-only once built. Internally, adjacency vectors
//! index outbound and inbound edges per event so that both directed
//! (light-cone) and undirected (emergent-distance) traversals are cheap.
//!
//! Acyclicity is never checked by search: every edge must point forward in
//! generation order, which rules out cycles by construction.

use std::collections::{BTreeSet, VecDeque};

use spacetime_types::{AmbientBounds, CausalEdge, Event, EventId};

use crate::error::GraphError;
use crate::event_set::EventSet;

/// Directed acyclic graph of events and causal edges.
#[derive(Debug, Clone, PartialEq)]
pub struct CausalGraph {
    /// Events indexed by id.
    events: Vec<Event>,
    /// Ambient box of the underlying event set.
    bounds: AmbientBounds,
    /// All edges, sorted by `(target, source)`.
    edges: Vec<CausalEdge>,
    /// Outbound adjacency: event index -> edge indices leaving it.
    outbound: Vec<Vec<usize>>,
    /// Inbound adjacency: event index -> edge indices arriving at it.
    inbound: Vec<Vec<usize>>,
    /// Event ids sorted by `(generation, id)`; a topological order.
    order: Vec<EventId>,
}

impl CausalGraph {
    /// Assemble a graph from an event set and a list of edges.
    ///
    /// Edge weights are stored as given; they are checked when an
    /// [`EmergentMetric`](crate::metric::EmergentMetric) is built.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidConfiguration`] if an edge references a
    /// missing event, does not point forward in generation order, or
    /// duplicates another edge.
    pub fn from_parts(set: EventSet, mut edges: Vec<CausalEdge>) -> Result<Self, GraphError> {
        let (events, bounds) = set.into_parts();

        let mut seen = BTreeSet::new();
        for edge in &edges {
            let source = events
                .get(edge.source.index())
                .ok_or_else(|| GraphError::invalid(format!("edge source {} does not exist", edge.source)))?;
            let target = events
                .get(edge.target.index())
                .ok_or_else(|| GraphError::invalid(format!("edge target {} does not exist", edge.target)))?;
            if source.generation >= target.generation {
                return Err(GraphError::invalid(format!(
                    "edge {} -> {} points backward in generation order ({} >= {})",
                    edge.source, edge.target, source.generation, target.generation
                )));
            }
            if !seen.insert((edge.source, edge.target)) {
                return Err(GraphError::invalid(format!(
                    "duplicate edge {} -> {}",
                    edge.source, edge.target
                )));
            }
        }

        edges.sort_by_key(|e| (e.target, e.source));

        let mut outbound = vec![Vec::new(); events.len()];
        let mut inbound = vec![Vec::new(); events.len()];
        for (index, edge) in edges.iter().enumerate() {
            if let Some(out) = outbound.get_mut(edge.source.index()) {
                out.push(index);
            }
            if let Some(inc) = inbound.get_mut(edge.target.index()) {
                inc.push(index);
            }
        }

        let mut order: Vec<EventId> = events.iter().map(|e| e.id).collect();
        order.sort_by_key(|id| {
            let generation = events.get(id.index()).map_or(0, |e| e.generation);
            (generation, *id)
        });

        Ok(Self {
            events,
            bounds,
            edges,
            outbound,
            inbound,
            order,
        })
    }

    // -------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------

    /// Number of events.
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// All events, indexed by id.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Look up one event.
    pub fn event(&self, id: EventId) -> Option<&Event> {
        self.events.get(id.index())
    }

    /// Whether `id` belongs to this graph.
    pub fn contains(&self, id: EventId) -> bool {
        id.index() < self.events.len()
    }

    /// Look up one event or fail with [`GraphError::EventNotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::EventNotFound`] for an unknown id.
    pub fn require(&self, id: EventId) -> Result<&Event, GraphError> {
        self.event(id).ok_or(GraphError::EventNotFound(id))
    }

    /// The ambient box the events were placed in.
    pub const fn bounds(&self) -> &AmbientBounds {
        &self.bounds
    }

    /// Event ids in a topological order (generation, then id).
    pub fn topological_order(&self) -> &[EventId] {
        &self.order
    }

    /// Events with positive energy.
    pub fn sources(&self) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(|e| e.is_source())
    }

    // -------------------------------------------------------------------
    // Edges
    // -------------------------------------------------------------------

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// All edges, sorted by `(target, source)`.
    pub fn edges(&self) -> &[CausalEdge] {
        &self.edges
    }

    /// Whether a direct edge `source -> target` exists.
    pub fn has_edge(&self, source: EventId, target: EventId) -> bool {
        self.outgoing(source).any(|e| e.target == target)
    }

    /// Edges leaving `id`.
    pub fn outgoing(&self, id: EventId) -> impl Iterator<Item = &CausalEdge> {
        self.outbound
            .get(id.index())
            .into_iter()
            .flatten()
            .filter_map(|i| self.edges.get(*i))
    }

    /// Edges arriving at `id`.
    pub fn incoming(&self, id: EventId) -> impl Iterator<Item = &CausalEdge> {
        self.inbound
            .get(id.index())
            .into_iter()
            .flatten()
            .filter_map(|i| self.edges.get(*i))
    }

    /// Direct causes of `id`.
    pub fn predecessors(&self, id: EventId) -> impl Iterator<Item = EventId> + '_ {
        self.incoming(id).map(|e| e.source)
    }

    /// Direct effects of `id`.
    pub fn successors(&self, id: EventId) -> impl Iterator<Item = EventId> + '_ {
        self.outgoing(id).map(|e| e.target)
    }

    /// Neighbors in the undirected connectivity graph with edge weights.
    pub fn undirected_neighbors(&self, id: EventId) -> impl Iterator<Item = (EventId, f64)> + '_ {
        self.outgoing(id)
            .map(|e| (e.target, e.weight))
            .chain(self.incoming(id).map(|e| (e.source, e.weight)))
    }

    /// Number of direct causes.
    pub fn in_degree(&self, id: EventId) -> usize {
        self.inbound.get(id.index()).map_or(0, Vec::len)
    }

    /// Number of direct effects (the event's local density).
    pub fn out_degree(&self, id: EventId) -> usize {
        self.outbound.get(id.index()).map_or(0, Vec::len)
    }

    /// Undirected degree.
    pub fn degree(&self, id: EventId) -> usize {
        self.in_degree(id).saturating_add(self.out_degree(id))
    }

    /// Whether every edge has weight exactly 1.
    #[allow(clippy::float_cmp)]
    pub fn has_unit_weights(&self) -> bool {
        self.edges.iter().all(|e| e.weight == 1.0)
    }

    /// Mean edge weight, or 1 for an edgeless graph.
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_weight(&self) -> f64 {
        if self.edges.is_empty() {
            return 1.0;
        }
        self.edges.iter().map(|e| e.weight).sum::<f64>() / self.edges.len() as f64
    }

    /// Average undirected degree `2|E| / N`.
    #[allow(clippy::cast_precision_loss)]
    pub fn average_degree(&self) -> f64 {
        if self.events.is_empty() {
            return 0.0;
        }
        2.0 * self.edges.len() as f64 / self.events.len() as f64
    }

    // -------------------------------------------------------------------
    // Connectivity
    // -------------------------------------------------------------------

    /// Number of connected components of the undirected graph.
    pub fn component_count(&self) -> usize {
        let mut visited = vec![false; self.events.len()];
        let mut components: usize = 0;
        for start in &self.order {
            if visited.get(start.index()).copied().unwrap_or(true) {
                continue;
            }
            components = components.saturating_add(1);
            let mut queue = VecDeque::from([*start]);
            if let Some(slot) = visited.get_mut(start.index()) {
                *slot = true;
            }
            while let Some(current) = queue.pop_front() {
                for (neighbor, _) in self.undirected_neighbors(current) {
                    if let Some(slot) = visited.get_mut(neighbor.index())
                        && !*slot
                    {
                        *slot = true;
                        queue.push_back(neighbor);
                    }
                }
            }
        }
        components
    }

    /// Whether every event is reachable from every other, ignoring direction.
    pub fn is_connected(&self) -> bool {
        self.component_count() <= 1
    }
}
