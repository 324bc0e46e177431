//! Error types for the `spacetime-graph` crate.
//!
//! All fallible operations in this crate return [`GraphError`]. Note that an
//! unreachable pair of events is *not* an error; it is reported through
//! [`Distance::Unreachable`](spacetime_types::Distance::Unreachable).

use spacetime_types::EventId;

/// Errors that can occur while building or measuring a causal graph.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// A parameter was rejected before any graph construction started.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },

    /// An edge carries a negative or non-finite weight.
    #[error("invalid weight {weight} on edge {from} -> {to}")]
    InvalidWeight {
        /// Edge source.
        from: EventId,
        /// Edge target.
        to: EventId,
        /// The offending weight.
        weight: f64,
    },

    /// An event identifier does not belong to the graph.
    #[error("event not found: {0}")]
    EventNotFound(EventId),
}

impl GraphError {
    /// Shorthand for [`GraphError::InvalidConfiguration`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}
