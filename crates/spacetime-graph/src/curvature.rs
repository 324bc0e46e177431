//! Curvature proxy: how causal-ball growth deviates from a flat baseline.
//!
//! The baseline is the expected ball size in a uniformly linked graph with
//! the same number of events `N` and the same average degree `k`, modelled
//! as a finite branching process:
//!
//! ```text
//! B(0)     = 1
//! s(1)     = min(k, N - 1)
//! s(h + 1) = s(h) * max(k - 1, 0) * (N - B(h)) / (N - 1)
//! B(h)     = min(N, 1 + s(1) + ... + s(h))
//! ```
//!
//! The local deviation at radius `r` is `(B_obs - B_flat) / B_flat`, and an
//! event's curvature is the mean deviation over `r = step, 2 step, ...,
//! radius`. Balls denser than the baseline give positive values. At most `N`
//! radii are sampled; wider radii are spread evenly up to `radius`.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use spacetime_types::EventId;

use crate::causal_graph::CausalGraph;
use crate::error::GraphError;
use crate::metric::DistanceMatrix;

/// Slack used when stepping radii in floating point.
const STEP_TOLERANCE: f64 = 1e-9;

/// Region a curvature value summarizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CurvatureScope {
    /// The event's own ball-growth deviation.
    #[default]
    Local,
    /// Mean local value over events within `radius` of the event.
    Neighborhood {
        /// Emergent-distance radius of the averaging window.
        radius: f64,
    },
}

/// Configuration of the curvature proxy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvatureSettings {
    /// Largest ball radius compared against the baseline.
    #[serde(default = "default_radius")]
    pub radius: f64,

    /// Local value or neighborhood average.
    #[serde(default)]
    pub scope: CurvatureScope,
}

impl Default for CurvatureSettings {
    fn default() -> Self {
        Self {
            radius: default_radius(),
            scope: CurvatureScope::Local,
        }
    }
}

impl CurvatureSettings {
    /// Check the radii.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidConfiguration`] if the ball radius is not
    /// finite and positive, or the neighborhood radius is negative or not
    /// finite.
    pub fn validate(&self) -> Result<(), GraphError> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(GraphError::invalid(format!(
                "curvature radius must be finite and positive, got {}",
                self.radius
            )));
        }
        if let CurvatureScope::Neighborhood { radius } = self.scope
            && (!radius.is_finite() || radius < 0.0)
        {
            return Err(GraphError::invalid(format!(
                "curvature neighborhood radius must be finite and non-negative, got {radius}"
            )));
        }
        Ok(())
    }
}

const fn default_radius() -> f64 {
    2.0
}

/// Curvature proxy for every event of one graph.
#[derive(Debug, Clone)]
pub struct CurvatureEstimator {
    settings: CurvatureSettings,
    /// Length of one hop: the mean weight, or 1 for unit or vanishing weights.
    step: f64,
    /// Radii at which balls are compared.
    radii: Vec<f64>,
    /// Baseline ball size at each whole hop count.
    baseline: Vec<f64>,
}

impl CurvatureEstimator {
    /// Prepare the baseline for `graph`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidConfiguration`] if `settings` are invalid.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(graph: &CausalGraph, settings: CurvatureSettings) -> Result<Self, GraphError> {
        settings.validate()?;

        let mean_weight = graph.mean_weight();
        let step = if graph.has_unit_weights()
            || !mean_weight.is_finite()
            || mean_weight < STEP_TOLERANCE
        {
            1.0
        } else {
            mean_weight
        };

        // Hop balls saturate within `N - 1` hops; sample at most `N` radii.
        let hop_limit = graph.event_count().max(1) as f64;
        let exact_steps = settings.radius / step;
        let whole_steps = (exact_steps + STEP_TOLERANCE).floor().min(hop_limit);
        let radii: Vec<f64> = if whole_steps < 1.0 {
            vec![settings.radius]
        } else {
            let spacing = if exact_steps > hop_limit {
                settings.radius / whole_steps
            } else {
                step
            };
            (1..=whole_steps as u64).map(|i| i as f64 * spacing).collect()
        };

        let max_hops = exact_steps.ceil().min(hop_limit) as usize;
        let baseline = flat_baseline(
            graph.event_count() as f64,
            graph.average_degree(),
            max_hops.saturating_add(1),
        );

        Ok(Self {
            settings,
            step,
            radii,
            baseline,
        })
    }

    /// The settings in use.
    pub const fn settings(&self) -> &CurvatureSettings {
        &self.settings
    }

    /// Radii the local value averages over.
    pub fn radii(&self) -> &[f64] {
        &self.radii
    }

    /// Expected ball size of radius `radius` in the flat baseline.
    ///
    /// Fractional hop counts are interpolated linearly.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn baseline(&self, radius: f64) -> f64 {
        let hops = (radius / self.step).max(0.0);
        let lower = hops.floor();
        let frac = hops - lower;
        let last = self.baseline.last().copied().unwrap_or(1.0);
        let at = |h: usize| self.baseline.get(h).copied().unwrap_or(last);
        let lo = at(lower as usize);
        let hi = at((lower as usize).saturating_add(1));
        frac.mul_add(hi - lo, lo)
    }

    /// Ball-growth deviation of `event` alone, averaged over the radii.
    #[allow(clippy::cast_precision_loss)]
    pub fn local(&self, distances: &DistanceMatrix, event: EventId) -> f64 {
        if self.radii.is_empty() {
            return 0.0;
        }
        let total: f64 = self
            .radii
            .iter()
            .map(|r| {
                let expected = self.baseline(*r);
                let observed = distances.ball(event, *r) as f64;
                (observed - expected) / expected
            })
            .sum();
        total / self.radii.len() as f64
    }

    /// Curvature of `event` under the configured scope.
    #[allow(clippy::cast_precision_loss)]
    pub fn curvature(&self, distances: &DistanceMatrix, event: EventId) -> f64 {
        match self.settings.scope {
            CurvatureScope::Local => self.local(distances, event),
            CurvatureScope::Neighborhood { radius } => {
                let members = distances.neighborhood(event, radius);
                if members.is_empty() {
                    return 0.0;
                }
                let total: f64 = members.iter().map(|m| self.local(distances, *m)).sum();
                total / members.len() as f64
            }
        }
    }

    /// Curvature of every event, indexed by id, computed in parallel.
    pub fn all(&self, graph: &CausalGraph, distances: &DistanceMatrix) -> Vec<f64> {
        graph
            .events()
            .par_iter()
            .map(|e| self.curvature(distances, e.id))
            .collect()
    }
}

/// Baseline ball sizes `B(0..=hops)` for `n` events of average degree `k`.
fn flat_baseline(n: f64, k: f64, hops: usize) -> Vec<f64> {
    let mut sizes = Vec::with_capacity(hops.saturating_add(1));
    sizes.push(1.0);
    if n <= 1.0 {
        sizes.resize(hops.saturating_add(1), 1.0);
        return sizes;
    }

    let branching = (k - 1.0).max(0.0);
    let mut ball = 1.0;
    let mut shell = k.min(n - 1.0);
    for hop in 1..=hops {
        if hop > 1 {
            shell *= branching * (n - ball) / (n - 1.0);
        }
        ball = (ball + shell).min(n);
        sizes.push(ball);
    }
    sizes
}
