//! Configuration, orchestration, and run queries for emergent-spacetime
//! simulations.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `spacetime-config.yaml` into
//!   strongly-typed structs.
//! - [`engine`] -- [`SimulationEngine`]: validates a run configuration and
//!   builds a [`Run`].
//! - [`run`] -- [`Run`]: the immutable result with lazily cached distances
//!   and curvature, plus its JSON [`RunSnapshot`].
//! - [`summary`] -- [`RunSummary`] headline statistics.
//! - [`layout`] -- [`CausalLayout`]: layers keyed on directed causal
//!   distance from an origin.
//! - [`error`] -- [`RunError`].
//!
//! [`RunSnapshot`]: run::RunSnapshot

pub mod config;
pub mod engine;
pub mod error;
pub mod layout;
pub mod run;
pub mod summary;

// Re-export primary types at crate root.
pub use config::{ConfigError, RunConfig, SpacetimeConfig};
pub use engine::{EngineOptions, SimulationEngine};
pub use error::RunError;
pub use layout::{CausalLayout, LayoutCell};
pub use run::{Run, RunSnapshot};
pub use summary::RunSummary;

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        use ts_rs::TS;

        let _ = crate::summary::RunSummary::export_all();
        let _ = crate::layout::LayoutCell::export_all();
        let _ = crate::layout::CausalLayout::export_all();
    }
}
