//! Type-safe identifier wrappers.
//!
//! Events are identified by their creation index, which keeps graphs built
//! from the same seed bit-identical. Runs are identified by a UUID v7 so that
//! snapshots written by different processes never collide.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Identifier of an event inside one run's event set.
///
/// The wrapped value is the event's creation index, so it doubles as a dense
/// index into per-event vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EventId(pub u32);

impl EventId {
    /// Return the identifier as a vector index.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Build an identifier from a vector index.
    ///
    /// Returns `None` if the index does not fit in a `u32`.
    pub fn from_index(index: usize) -> Option<Self> {
        u32::try_from(index).ok().map(Self)
    }
}

impl core::fmt::Display for EventId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "e{}", self.0)
    }
}

impl From<u32> for EventId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

/// Unique identifier for one simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RunId(pub Uuid);

impl RunId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for RunId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}
