//! Command-line runner for emergent-spacetime simulations.
//!
//! Loads the configuration, executes every configured run, logs a summary
//! of each, and optionally writes a JSON snapshot per run.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from the path given as the first argument, the
//!    `SPACETIME_CONFIG` variable, or `spacetime-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Create the simulation engine (optionally with a dedicated pool)
//! 4. Execute the runs in order
//! 5. Log each run's summary and write its snapshot

mod error;
mod snapshot;

use std::path::PathBuf;

use spacetime_core::{Run, SimulationEngine, SpacetimeConfig};
use spacetime_types::ConeDirection;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Depth of the future cones reported for notable events.
const REPORT_CONE_DEPTH: u32 = 6;

/// Default configuration file name, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "spacetime-config.yaml";

/// Application entry point for the spacetime engine.
///
/// # Errors
///
/// Returns an error if configuration, any run, or snapshot output fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let (config, source) = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(
        source = %source.as_ref().map_or_else(|| "defaults".to_owned(), |p| p.display().to_string()),
        runs = config.runs.len(),
        threads = ?config.engine.threads,
        "spacetime-engine starting"
    );

    // 3. Create the engine.
    let engine = SimulationEngine::new(config.engine.options()).map_err(EngineError::from)?;

    // 4. Execute the runs.
    let runs = engine.run_many(&config.runs).map_err(EngineError::from)?;

    // 5. Report and persist.
    for run in &runs {
        report(run)?;
        if let Some(dir) = &config.output.snapshot_dir {
            let path = snapshot::write(dir, run, config.output.pretty)?;
            info!(run = %run.config().name, path = %path.display(), "snapshot written");
        }
    }

    info!(runs = runs.len(), "spacetime-engine finished");
    Ok(())
}

/// Resolve and load the configuration file.
///
/// An explicitly named file must exist; the default file is optional.
fn load_config() -> Result<(SpacetimeConfig, Option<PathBuf>), EngineError> {
    let explicit = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("SPACETIME_CONFIG").ok())
        .map(PathBuf::from);

    if let Some(path) = explicit {
        let config = SpacetimeConfig::from_file(&path)?;
        return Ok((config, Some(path)));
    }

    let path = PathBuf::from(DEFAULT_CONFIG_PATH);
    if path.exists() {
        let config = SpacetimeConfig::from_file(&path)?;
        Ok((config, Some(path)))
    } else {
        Ok((SpacetimeConfig::default(), None))
    }
}

/// Log the headline numbers of one run.
fn report(run: &Run) -> Result<(), EngineError> {
    let summary = run.summary();
    info!(
        run = %run.config().name,
        id = %run.id(),
        seed = run.seed(),
        events = summary.event_count,
        edges = summary.edge_count,
        sources = summary.source_count,
        components = summary.component_count,
        average_degree = summary.average_degree,
        max_emergent_time = summary.max_emergent_time,
        "run complete"
    );

    let notable = [
        ("densest", summary.densest),
        ("sparsest", summary.sparsest),
        ("most_massive", summary.most_massive),
    ];
    for (role, event) in notable {
        let Some(event) = event else {
            continue;
        };
        let cone = run.light_cone(event, REPORT_CONE_DEPTH, ConeDirection::Future)?;
        let curvature = run.curvature(event)?;
        info!(
            run = %run.config().name,
            role,
            event = %event,
            density = run.local_density(event)?,
            cone_size = cone.len(),
            curvature,
            "notable event"
        );
    }

    if summary.component_count > 1 {
        warn!(
            run = %run.config().name,
            components = summary.component_count,
            "graph is disconnected; some emergent distances are unreachable"
        );
    }
    Ok(())
}
