//! Error types for the spacetime engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup, run execution, and snapshot output.

use std::path::PathBuf;

/// Top-level error for the spacetime engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: spacetime_core::ConfigError,
    },

    /// Engine setup, a run, or a run query failed.
    #[error("run error: {source}")]
    Run {
        /// The underlying run error.
        #[from]
        source: spacetime_core::RunError,
    },

    /// A snapshot could not be serialized.
    #[error("failed to serialize snapshot: {source}")]
    Serialize {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// A snapshot could not be written.
    #[error("failed to write snapshot {path}: {source}")]
    Write {
        /// Destination that failed.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
