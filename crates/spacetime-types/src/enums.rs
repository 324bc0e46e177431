//! Enumeration types shared across the workspace.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Distance
// ---------------------------------------------------------------------------

/// Emergent distance between two events.
///
/// `Unreachable` is a normal outcome for events in causally isolated
/// components and is never conflated with a zero distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum Distance {
    /// Length of the shortest undirected causal path.
    Finite(f64),
    /// No causal path connects the two events.
    Unreachable,
}

impl Distance {
    /// Return the finite length, if any.
    pub const fn as_finite(self) -> Option<f64> {
        match self {
            Self::Finite(d) => Some(d),
            Self::Unreachable => None,
        }
    }

    /// Whether a path exists.
    pub const fn is_reachable(self) -> bool {
        matches!(self, Self::Finite(_))
    }
}

impl From<Option<f64>> for Distance {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Unreachable, Self::Finite)
    }
}

impl core::fmt::Display for Distance {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Finite(d) => write!(f, "{d}"),
            Self::Unreachable => write!(f, "unreachable"),
        }
    }
}

// ---------------------------------------------------------------------------
// Cone direction
// ---------------------------------------------------------------------------

/// Which half of an event's light cone to explore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum ConeDirection {
    /// Events the origin can influence (follow edges forward).
    Future,
    /// Events that can influence the origin (follow edges backward).
    Past,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_is_not_zero() {
        assert_ne!(Distance::Unreachable, Distance::Finite(0.0));
        assert_eq!(Distance::from(None), Distance::Unreachable);
        assert_eq!(Distance::from(Some(2.0)).as_finite(), Some(2.0));
    }

    #[test]
    fn distance_serde_shape() {
        let json = serde_json::to_string(&Distance::Unreachable).ok();
        assert_eq!(json.as_deref(), Some("\"unreachable\""));
        let json = serde_json::to_string(&Distance::Finite(1.5)).ok();
        assert_eq!(json.as_deref(), Some("{\"finite\":1.5}"));
    }
}
