//! The immutable result of one simulation run and its queries.
//!
//! A [`Run`] owns its causal graph and emergent time. The all-pairs distance
//! matrix and the per-event curvature are computed on first use and cached
//! in [`OnceLock`]s, so a `Run` can be shared across threads and queried
//! concurrently without recomputation.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use spacetime_graph::{
    CausalGraph, CurvatureEstimator, DistanceMatrix, EmergentMetric, EmergentOrder, GraphError,
    cone,
};
use spacetime_types::{CausalEdge, ConeDirection, Distance, Event, EventId, RunId};

use crate::config::RunConfig;
use crate::error::RunError;
use crate::layout::CausalLayout;
use crate::summary::RunSummary;

/// One finished run: configuration, graph, and annotations.
#[derive(Debug)]
pub struct Run {
    id: RunId,
    created_at: DateTime<Utc>,
    seed: u64,
    config: RunConfig,
    graph: CausalGraph,
    order: EmergentOrder,
    estimator: CurvatureEstimator,
    distances: OnceLock<Result<DistanceMatrix, GraphError>>,
    curvature: OnceLock<Vec<f64>>,
}

impl Run {
    /// Assemble a run from its computed parts.
    pub(crate) fn new(
        config: RunConfig,
        seed: u64,
        graph: CausalGraph,
        order: EmergentOrder,
        estimator: CurvatureEstimator,
    ) -> Self {
        Self {
            id: RunId::new(),
            created_at: Utc::now(),
            seed,
            config,
            graph,
            order,
            estimator,
            distances: OnceLock::new(),
            curvature: OnceLock::new(),
        }
    }

    // -------------------------------------------------------------------
    // Identity
    // -------------------------------------------------------------------

    /// Unique identifier of this run.
    pub const fn id(&self) -> RunId {
        self.id
    }

    /// When the run finished building.
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The seed actually used (drawn from entropy if the config had none).
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// The configuration the run was built from.
    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    // -------------------------------------------------------------------
    // Graph and annotations
    // -------------------------------------------------------------------

    /// The causal graph.
    pub const fn graph(&self) -> &CausalGraph {
        &self.graph
    }

    /// Emergent time of every event.
    pub const fn order(&self) -> &EmergentOrder {
        &self.order
    }

    /// Emergent time of one event.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::EventNotFound`] for an unknown id.
    pub fn emergent_time(&self, event: EventId) -> Result<u32, RunError> {
        Ok(self
            .order
            .time(event)
            .ok_or(GraphError::EventNotFound(event))?)
    }

    /// Emergent distance between two events.
    ///
    /// Uses the cached all-pairs matrix once it exists; before that, a
    /// single-pair search answers without building the matrix.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::EventNotFound`] for an unknown id or
    /// [`GraphError::InvalidWeight`] if an edge weight is invalid.
    pub fn distance(&self, a: EventId, b: EventId) -> Result<Distance, RunError> {
        self.graph.require(a)?;
        self.graph.require(b)?;
        if let Some(Ok(matrix)) = self.distances.get()
            && let Some(distance) = matrix.get(a, b)
        {
            return Ok(distance);
        }
        Ok(EmergentMetric::new(&self.graph)?.distance(a, b)?)
    }

    /// The all-pairs distance matrix, computed on first call.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidWeight`] if an edge weight is invalid.
    pub fn distance_matrix(&self) -> Result<&DistanceMatrix, RunError> {
        self.distances
            .get_or_init(|| EmergentMetric::new(&self.graph).map(|metric| metric.all_pairs()))
            .as_ref()
            .map_err(|err| RunError::from(err.clone()))
    }

    /// Curvature proxy of one event.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::EventNotFound`] for an unknown id, or any error
    /// of [`Run::distance_matrix`].
    pub fn curvature(&self, event: EventId) -> Result<f64, RunError> {
        self.graph.require(event)?;
        let values = self.curvatures()?;
        Ok(values
            .get(event.index())
            .copied()
            .ok_or(GraphError::EventNotFound(event))?)
    }

    /// Curvature of every event, indexed by id, computed on first call.
    ///
    /// # Errors
    ///
    /// Returns any error of [`Run::distance_matrix`].
    pub fn curvatures(&self) -> Result<&[f64], RunError> {
        let distances = self.distance_matrix()?;
        Ok(self
            .curvature
            .get_or_init(|| self.estimator.all(&self.graph, distances)))
    }

    // -------------------------------------------------------------------
    // Causal structure queries
    // -------------------------------------------------------------------

    /// Events within `depth` directed hops of `origin`, origin included.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::EventNotFound`] for an unknown origin.
    pub fn light_cone(
        &self,
        origin: EventId,
        depth: u32,
        direction: ConeDirection,
    ) -> Result<Vec<EventId>, RunError> {
        Ok(cone::light_cone(&self.graph, origin, depth, direction)?)
    }

    /// Fewest forward hops from `from` to `to`, `None` if `to` is not in
    /// the future of `from`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::EventNotFound`] for an unknown id.
    pub fn causal_distance(&self, from: EventId, to: EventId) -> Result<Option<u32>, RunError> {
        Ok(cone::causal_distance(&self.graph, from, to)?)
    }

    /// Number of direct effects of `event`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::EventNotFound`] for an unknown id.
    pub fn local_density(&self, event: EventId) -> Result<usize, RunError> {
        self.graph.require(event)?;
        Ok(self.graph.out_degree(event))
    }

    /// Headline statistics.
    pub fn summary(&self) -> RunSummary {
        RunSummary::compute(&self.graph, &self.order)
    }

    /// Layered layout around `origin`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::EventNotFound`] for an unknown origin.
    pub fn layout(&self, origin: EventId) -> Result<CausalLayout, RunError> {
        Ok(CausalLayout::compute(&self.graph, origin)?)
    }

    /// Serializable copy of the run, including curvature.
    ///
    /// # Errors
    ///
    /// Returns any error of [`Run::curvatures`].
    pub fn snapshot(&self) -> Result<RunSnapshot, RunError> {
        Ok(RunSnapshot {
            id: self.id,
            created_at: self.created_at,
            seed: self.seed,
            config: self.config.clone(),
            events: self.graph.events().to_vec(),
            edges: self.graph.edges().to_vec(),
            emergent_time: self.order.times().to_vec(),
            curvature: self.curvatures()?.to_vec(),
            summary: self.summary(),
        })
    }
}

/// A run flattened for JSON output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSnapshot {
    /// Run identifier.
    pub id: RunId,
    /// When the run was built.
    pub created_at: DateTime<Utc>,
    /// Effective seed.
    pub seed: u64,
    /// Configuration the run was built from.
    pub config: RunConfig,
    /// Events in id order.
    pub events: Vec<Event>,
    /// Edges sorted by `(target, source)`.
    pub edges: Vec<CausalEdge>,
    /// Emergent time, indexed by event id.
    pub emergent_time: Vec<u32>,
    /// Curvature proxy, indexed by event id.
    pub curvature: Vec<f64>,
    /// Headline statistics.
    pub summary: RunSummary,
}
