//! Causal-graph construction and emergent geometry.
//!
//! Events are linked only by causal influence: an earlier event may affect a
//! later one when their ambient separation fits in a finite light cone,
//! widened near energy sources. From that raw connectivity this crate derives
//! emergent time (longest causal chains), emergent distance (shortest
//! undirected causal paths), and a curvature proxy (ball growth against a
//! flat baseline).
//!
//! # Modules
//!
//! - [`event_set`] -- Seeded generation of events, positions, and energy
//!   sources.
//! - [`bias`] -- [`EnergyBias`]: validated `(distance, energy) -> multiplier`
//!   functions.
//! - [`linker`] -- [`CausalLinker`]: light-cone and admission rules that
//!   produce the graph.
//! - [`causal_graph`] -- [`CausalGraph`]: the read-only directed acyclic graph.
//! - [`order`] -- [`EmergentOrder`]: emergent time per event.
//! - [`metric`] -- [`EmergentMetric`] and the all-pairs [`DistanceMatrix`].
//! - [`curvature`] -- [`CurvatureEstimator`].
//! - [`cone`] -- Directed light cones and causal distance.
//! - [`seed`] -- Per-stream seed derivation.
//! - [`error`] -- [`GraphError`].

pub mod bias;
pub mod causal_graph;
pub mod cone;
pub mod curvature;
pub mod error;
pub mod event_set;
pub mod linker;
pub mod metric;
pub mod order;
pub mod seed;

// Re-export primary types at crate root.
pub use bias::{BiasSettings, BiasShape, EnergyBias};
pub use causal_graph::CausalGraph;
pub use curvature::{CurvatureEstimator, CurvatureScope, CurvatureSettings};
pub use error::GraphError;
pub use event_set::{
    EnergySource, EventSet, EventSetPlan, Placement, SourceAnchor, SpontaneousSources,
};
pub use linker::{Admission, CausalLinker, EdgeWeighting};
pub use metric::{DistanceMatrix, EmergentMetric};
pub use order::EmergentOrder;
