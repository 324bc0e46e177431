//! Causal linking: which events may directly influence which others.
//!
//! For every ordered pair `(i, j)` with `i.generation < j.generation` the
//! [`CausalLinker`] admits the edge `i -> j` when
//!
//! 1. the ambient separation fits in the light cone,
//!    `|x_i - x_j| <= horizon * (g_j - g_i) * m`, where `m` is the pair's
//!    energy multiplier if the bias stretches cones and 1 otherwise, and
//! 2. the admission rule accepts it: always in deterministic mode, with
//!    probability `min(1, base_probability * m)` in probabilistic mode.
//!
//! The pair multiplier is `max(b_i, b_j)`, where `b_e` is the bias evaluated
//! at `e`'s distance to its nearest energy source.
//!
//! Targets are processed in parallel. Each target owns a random stream
//! derived from the run seed and draws exactly one number per candidate
//! predecessor, so admission of a pair never depends on the horizon, on
//! other pairs, or on thread scheduling.

use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use spacetime_types::{CausalEdge, Event};

use crate::bias::EnergyBias;
use crate::causal_graph::CausalGraph;
use crate::error::GraphError;
use crate::event_set::EventSet;
use crate::seed::{self, ADMISSION_STREAM};

/// Rule deciding whether a pair inside the light cone is linked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Admission {
    /// Every pair inside the light cone is linked.
    #[default]
    Deterministic,
    /// Pairs are linked with probability `min(1, base_probability * m)`.
    Probabilistic {
        /// Admission probability far from any energy source.
        base_probability: f64,
    },
}

/// How an admitted edge's weight is derived from ambient separation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeWeighting {
    /// Every edge has length 1; emergent distance is a hop count.
    #[default]
    Unit,
    /// Edge length equals the ambient separation.
    Ambient,
    /// Edge length is `1 / (1 + separation)`.
    InverseAmbient,
}

impl EdgeWeighting {
    /// Weight of an edge spanning `separation` ambient units.
    pub fn weight(self, separation: f64) -> f64 {
        match self {
            Self::Unit => 1.0,
            Self::Ambient => separation,
            Self::InverseAmbient => 1.0 / (1.0 + separation),
        }
    }
}

/// Builds a [`CausalGraph`] from an [`EventSet`].
#[derive(Debug, Clone)]
pub struct CausalLinker {
    horizon: f64,
    bias: EnergyBias,
    admission: Admission,
    density_cap: Option<usize>,
    weighting: EdgeWeighting,
    seed: u64,
}

impl CausalLinker {
    /// A deterministic, uncapped, unit-weight linker.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidConfiguration`] if `horizon` is negative
    /// or not finite.
    pub fn new(horizon: f64, bias: EnergyBias) -> Result<Self, GraphError> {
        if !horizon.is_finite() || horizon < 0.0 {
            return Err(GraphError::invalid(format!(
                "horizon must be finite and non-negative, got {horizon}"
            )));
        }
        Ok(Self {
            horizon,
            bias,
            admission: Admission::Deterministic,
            density_cap: None,
            weighting: EdgeWeighting::Unit,
            seed: 0,
        })
    }

    /// Set the admission rule.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidConfiguration`] if the base probability
    /// lies outside `[0, 1]`.
    pub fn with_admission(mut self, admission: Admission) -> Result<Self, GraphError> {
        if let Admission::Probabilistic { base_probability } = admission
            && !(0.0..=1.0).contains(&base_probability)
        {
            return Err(GraphError::invalid(format!(
                "base admission probability must be in [0, 1], got {base_probability}"
            )));
        }
        self.admission = admission;
        Ok(self)
    }

    /// Keep at most `cap` nearest predecessors per event (`None` = keep all).
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidConfiguration`] for a cap of zero.
    pub fn with_density_cap(mut self, cap: Option<usize>) -> Result<Self, GraphError> {
        if cap == Some(0) {
            return Err(GraphError::invalid("density cap must be at least 1"));
        }
        self.density_cap = cap;
        Ok(self)
    }

    /// Set how edge weights are derived.
    #[must_use]
    pub const fn with_weighting(mut self, weighting: EdgeWeighting) -> Self {
        self.weighting = weighting;
        self
    }

    /// Seed for probabilistic admission.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// The light-cone horizon.
    pub const fn horizon(&self) -> f64 {
        self.horizon
    }

    /// The energy bias in use.
    pub const fn bias(&self) -> &EnergyBias {
        &self.bias
    }

    /// Link every admissible pair of `events`.
    ///
    /// An edgeless result (for example horizon 0 without coincident events)
    /// is a valid, degenerate graph.
    ///
    /// # Errors
    ///
    /// Only fails if the produced edges violate a graph invariant, which the
    /// generation-order rule prevents.
    pub fn build(&self, events: EventSet) -> Result<CausalGraph, GraphError> {
        let boosts = self.event_boosts(&events);
        let all = events.events();

        let per_target: Vec<Vec<CausalEdge>> = all
            .par_iter()
            .map(|target| self.link_target(target, all, &boosts))
            .collect();
        let edges: Vec<CausalEdge> = per_target.into_iter().flatten().collect();

        debug!(
            events = all.len(),
            edges = edges.len(),
            horizon = self.horizon,
            bias = self.bias.label(),
            density_cap = ?self.density_cap,
            "causal graph linked"
        );
        CausalGraph::from_parts(events, edges)
    }

    /// Bias multiplier of each event, from its nearest energy source.
    fn event_boosts(&self, events: &EventSet) -> Vec<f64> {
        let sources: Vec<&Event> = events.sources().collect();
        events
            .events()
            .iter()
            .map(|event| {
                sources
                    .iter()
                    .map(|s| (event.position.distance(&s.position), s.energy, s.id))
                    .min_by(|a, b| a.0.total_cmp(&b.0).then(a.2.cmp(&b.2)))
                    .map_or(1.0, |(distance, energy, _)| {
                        self.bias.multiplier(distance, energy)
                    })
            })
            .collect()
    }

    /// Admitted incoming edges of one target, sorted by source id.
    fn link_target(&self, target: &Event, all: &[Event], boosts: &[f64]) -> Vec<CausalEdge> {
        let mut rng = seed::stream_rng(self.seed, ADMISSION_STREAM, u64::from(target.id.0));
        let target_boost = boosts.get(target.id.index()).copied().unwrap_or(1.0);

        let mut admitted: Vec<(f64, &Event)> = Vec::new();
        for candidate in all {
            if candidate.id == target.id {
                continue;
            }
            let roll: f64 = match self.admission {
                Admission::Deterministic => 0.0,
                Admission::Probabilistic { .. } => rng.random(),
            };
            if candidate.generation >= target.generation {
                continue;
            }

            let boost = boosts
                .get(candidate.id.index())
                .copied()
                .unwrap_or(1.0)
                .max(target_boost);
            let separation = candidate.position.distance(&target.position);
            let gap = f64::from(target.generation.saturating_sub(candidate.generation));
            let stretch = if self.bias.stretches_cone() { boost } else { 1.0 };
            if separation > self.horizon * gap * stretch {
                continue;
            }

            if let Admission::Probabilistic { base_probability } = self.admission
                && roll >= (base_probability * boost).min(1.0)
            {
                continue;
            }
            admitted.push((separation, candidate));
        }

        if let Some(cap) = self.density_cap
            && admitted.len() > cap
        {
            admitted.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.id.cmp(&b.1.id)));
            admitted.truncate(cap);
            admitted.sort_by_key(|(_, e)| e.id);
        }

        admitted
            .into_iter()
            .map(|(separation, source)| CausalEdge {
                source: source.id,
                target: target.id,
                weight: self.weighting.weight(separation),
            })
            .collect()
    }
}
