//! Core entity structs shared by every crate in the workspace.
//!
//! Covers the ambient coordinates used to seed causal adjacency, the
//! [`Event`] node, and the [`CausalEdge`] relation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::EventId;

// ---------------------------------------------------------------------------
// Ambient space
// ---------------------------------------------------------------------------

/// A coordinate in the abstract ambient space.
///
/// The ambient space is a generative convenience only: it decides which
/// events are close enough to be tested for causal linkage. It carries no
/// physical meaning once the graph is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Position(pub Vec<f64>);

impl Position {
    /// Create a position from its coordinates.
    pub const fn new(coords: Vec<f64>) -> Self {
        Self(coords)
    }

    /// A one-dimensional position.
    pub fn on_line(x: f64) -> Self {
        Self(vec![x])
    }

    /// Number of coordinates.
    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    /// Borrow the coordinates.
    pub fn coords(&self) -> &[f64] {
        &self.0
    }

    /// Euclidean distance to another position.
    ///
    /// Extra coordinates on the longer side are ignored; callers validate
    /// dimensions before positions ever meet.
    pub fn distance(&self, other: &Self) -> f64 {
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }
}

/// Axis-aligned box bounding the ambient space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AmbientBounds {
    /// Lower corner, one entry per dimension.
    pub min: Vec<f64>,
    /// Upper corner, one entry per dimension.
    pub max: Vec<f64>,
}

impl AmbientBounds {
    /// A one-dimensional interval `[min, max]`.
    pub fn interval(min: f64, max: f64) -> Self {
        Self {
            min: vec![min],
            max: vec![max],
        }
    }

    /// Number of dimensions (length of the lower corner).
    pub fn dimension(&self) -> usize {
        self.min.len()
    }

    /// Iterate `(min, max)` pairs per axis.
    pub fn axes(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.min.iter().copied().zip(self.max.iter().copied())
    }

    /// Whether a position lies inside the box (inclusive).
    pub fn contains(&self, position: &Position) -> bool {
        position.dimension() == self.dimension()
            && self
                .axes()
                .zip(position.coords())
                .all(|((lo, hi), x)| *x >= lo && *x <= hi)
    }
}

impl Default for AmbientBounds {
    fn default() -> Self {
        Self::interval(0.0, 10.0)
    }
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// One discrete occurrence in the causal substrate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Event {
    /// Unique identifier, equal to the creation index.
    pub id: EventId,
    /// Coordinate used to seed candidate causal adjacency.
    pub position: Position,
    /// Intrinsic creation-order index.
    pub generation: u32,
    /// Non-negative energy; positive for mass-like sources.
    pub energy: f64,
}

impl Event {
    /// Whether this event is an energy source.
    pub fn is_source(&self) -> bool {
        self.energy > 0.0
    }
}

// ---------------------------------------------------------------------------
// CausalEdge
// ---------------------------------------------------------------------------

/// A direct causal-influence relation `source -> target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CausalEdge {
    /// The influencing event.
    pub source: EventId,
    /// The influenced event.
    pub target: EventId,
    /// Length used by emergent-distance computations.
    pub weight: f64,
}

impl CausalEdge {
    /// An edge with unit weight.
    pub const fn unit(source: EventId, target: EventId) -> Self {
        Self {
            source,
            target,
            weight: 1.0,
        }
    }
}
