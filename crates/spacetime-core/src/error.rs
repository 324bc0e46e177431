//! Error types for running simulations.

use spacetime_graph::GraphError;

/// Errors that can occur while executing or querying a run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Graph construction or measurement failed.
    #[error("graph error: {source}")]
    Graph {
        /// The underlying graph error.
        #[from]
        source: GraphError,
    },

    /// The dedicated worker pool could not be created.
    #[error("failed to build worker pool: {source}")]
    ThreadPool {
        /// The underlying rayon error.
        #[from]
        source: rayon::ThreadPoolBuildError,
    },
}

impl RunError {
    /// The graph error behind this failure, if any.
    pub const fn graph(&self) -> Option<&GraphError> {
        match self {
            Self::Graph { source } => Some(source),
            Self::ThreadPool { .. } => None,
        }
    }
}
