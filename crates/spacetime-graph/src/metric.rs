//! Emergent distance: shortest undirected causal paths.
//!
//! Direction is ignored when measuring distance; only connectivity counts.
//! Unit-weight graphs are expanded breadth-first (the distance is a hop
//! count); weighted graphs use Dijkstra with a `BTreeSet` as the priority
//! queue. The all-pairs mode runs one expansion per source event on the
//! rayon pool, each writing its own row.

use std::cmp::Ordering;
use std::collections::{BTreeSet, VecDeque};

use rayon::prelude::*;
use tracing::debug;

use spacetime_types::{Distance, EventId};

use crate::causal_graph::CausalGraph;
use crate::error::GraphError;

/// Slack used when comparing accumulated path lengths against a radius.
const RADIUS_TOLERANCE: f64 = 1e-9;

/// Validated view of a graph for distance queries.
#[derive(Debug, Clone, Copy)]
pub struct EmergentMetric<'g> {
    graph: &'g CausalGraph,
    unit_weights: bool,
}

impl<'g> EmergentMetric<'g> {
    /// Check every edge weight and prepare for queries.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidWeight`] for the first negative or
    /// non-finite weight. The graph itself is never modified.
    pub fn new(graph: &'g CausalGraph) -> Result<Self, GraphError> {
        if let Some(bad) = graph
            .edges()
            .iter()
            .find(|e| !e.weight.is_finite() || e.weight < 0.0)
        {
            return Err(GraphError::InvalidWeight {
                from: bad.source,
                to: bad.target,
                weight: bad.weight,
            });
        }
        Ok(Self {
            graph,
            unit_weights: graph.has_unit_weights(),
        })
    }

    /// The measured graph.
    pub const fn graph(&self) -> &'g CausalGraph {
        self.graph
    }

    /// Whether distances are plain hop counts.
    pub const fn is_unit_weighted(&self) -> bool {
        self.unit_weights
    }

    /// Emergent distance between two events.
    ///
    /// `distance(a, a)` is 0; events in different components are
    /// [`Distance::Unreachable`].
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::EventNotFound`] if either id is unknown.
    pub fn distance(&self, a: EventId, b: EventId) -> Result<Distance, GraphError> {
        self.graph.require(a)?;
        self.graph.require(b)?;
        let row = self.expand(a, Some(b));
        Ok(row.get(b.index()).copied().flatten().into())
    }

    /// Distances from `origin` to every event, indexed by event id.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::EventNotFound`] if `origin` is unknown.
    pub fn single_source(&self, origin: EventId) -> Result<Vec<Distance>, GraphError> {
        self.graph.require(origin)?;
        Ok(self
            .expand(origin, None)
            .into_iter()
            .map(Distance::from)
            .collect())
    }

    /// Number of events within distance `radius` of `origin`, itself included.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::EventNotFound`] if `origin` is unknown.
    pub fn ball(&self, origin: EventId, radius: f64) -> Result<usize, GraphError> {
        self.graph.require(origin)?;
        Ok(count_within(
            self.expand(origin, None).into_iter().flatten(),
            radius,
        ))
    }

    /// Every pairwise distance, computed in parallel.
    pub fn all_pairs(&self) -> DistanceMatrix {
        let rows: Vec<Vec<Distance>> = self
            .graph
            .events()
            .par_iter()
            .map(|origin| {
                self.expand(origin.id, None)
                    .into_iter()
                    .map(Distance::from)
                    .collect()
            })
            .collect();
        debug!(
            events = rows.len(),
            unit_weights = self.unit_weights,
            "all-pairs emergent distances computed"
        );
        DistanceMatrix { rows }
    }

    /// Shortest lengths from `origin`, stopping early once `goal` settles.
    fn expand(&self, origin: EventId, goal: Option<EventId>) -> Vec<Option<f64>> {
        if self.unit_weights {
            self.breadth_first(origin, goal)
        } else {
            self.dijkstra(origin, goal)
        }
    }

    fn breadth_first(&self, origin: EventId, goal: Option<EventId>) -> Vec<Option<f64>> {
        let mut hops: Vec<Option<u32>> = vec![None; self.graph.event_count()];
        if let Some(slot) = hops.get_mut(origin.index()) {
            *slot = Some(0);
        }
        let mut queue = VecDeque::from([(origin, 0_u32)]);
        while let Some((current, depth)) = queue.pop_front() {
            if goal == Some(current) {
                break;
            }
            let next = depth.saturating_add(1);
            for (neighbor, _) in self.graph.undirected_neighbors(current) {
                if let Some(slot) = hops.get_mut(neighbor.index())
                    && slot.is_none()
                {
                    *slot = Some(next);
                    queue.push_back((neighbor, next));
                }
            }
        }
        hops.into_iter().map(|h| h.map(f64::from)).collect()
    }

    fn dijkstra(&self, origin: EventId, goal: Option<EventId>) -> Vec<Option<f64>> {
        let mut dist: Vec<Option<f64>> = vec![None; self.graph.event_count()];
        let mut queue: BTreeSet<(Length, EventId)> = BTreeSet::new();

        if let Some(slot) = dist.get_mut(origin.index()) {
            *slot = Some(0.0);
        }
        queue.insert((Length(0.0), origin));

        while let Some((Length(current_dist), current)) = queue.pop_first() {
            if goal == Some(current) {
                break;
            }
            for (neighbor, weight) in self.graph.undirected_neighbors(current) {
                let candidate = current_dist + weight;
                let Some(slot) = dist.get_mut(neighbor.index()) else {
                    continue;
                };
                let is_shorter = slot.is_none_or(|existing| candidate < existing);
                if is_shorter {
                    if let Some(old) = *slot {
                        queue.remove(&(Length(old), neighbor));
                    }
                    *slot = Some(candidate);
                    queue.insert((Length(candidate), neighbor));
                }
            }
        }
        dist
    }
}

/// Priority-queue key: a validated, non-negative path length.
#[derive(Debug, Clone, Copy)]
struct Length(f64);

impl PartialEq for Length {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Length {}

impl PartialOrd for Length {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Length {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

fn count_within(lengths: impl Iterator<Item = f64>, radius: f64) -> usize {
    lengths.filter(|d| *d <= radius + RADIUS_TOLERANCE).count()
}

// ---------------------------------------------------------------------------
// DistanceMatrix
// ---------------------------------------------------------------------------

/// All pairwise emergent distances of one graph.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    /// `rows[a][b]` is the distance from `a` to `b`.
    rows: Vec<Vec<Distance>>,
}

impl DistanceMatrix {
    /// Number of events covered.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the matrix is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distance between `a` and `b`, or `None` if either id is unknown.
    pub fn get(&self, a: EventId, b: EventId) -> Option<Distance> {
        self.rows.get(a.index())?.get(b.index()).copied()
    }

    /// Distances from `a` to every event.
    pub fn row(&self, a: EventId) -> Option<&[Distance]> {
        self.rows.get(a.index()).map(Vec::as_slice)
    }

    /// Number of events within `radius` of `origin`, itself included.
    ///
    /// Returns 0 for an unknown id.
    pub fn ball(&self, origin: EventId, radius: f64) -> usize {
        self.row(origin).map_or(0, |row| {
            count_within(row.iter().filter_map(|d| d.as_finite()), radius)
        })
    }

    /// Events within `radius` of `origin`, itself included.
    pub fn neighborhood(&self, origin: EventId, radius: f64) -> Vec<EventId> {
        self.row(origin).map_or_else(Vec::new, |row| {
            row.iter()
                .enumerate()
                .filter(|(_, d)| {
                    d.as_finite()
                        .is_some_and(|d| d <= radius + RADIUS_TOLERANCE)
                })
                .filter_map(|(index, _)| EventId::from_index(index))
                .collect()
        })
    }
}
