//! Run orchestration.
//!
//! [`SimulationEngine::run`] validates a [`RunConfig`] eagerly, then builds
//! the pipeline event set -> causal graph -> emergent time, and returns an
//! immutable [`Run`]. Distances and curvature are filled in lazily by the
//! run itself. Each call produces an independent run; nothing is shared
//! between runs except the optional worker pool.

use tracing::{debug, info};

use spacetime_graph::{CurvatureEstimator, EmergentMetric, EmergentOrder, EventSet};

use crate::config::RunConfig;
use crate::error::RunError;
use crate::run::Run;

/// Engine-wide settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    /// Size of a dedicated worker pool; `None` uses rayon's global pool.
    pub threads: Option<usize>,
}

/// Executes runs, optionally inside a dedicated rayon pool.
#[derive(Debug, Default)]
pub struct SimulationEngine {
    pool: Option<rayon::ThreadPool>,
}

impl SimulationEngine {
    /// Create an engine.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::ThreadPool`] if a dedicated pool was requested
    /// and could not be built.
    pub fn new(options: EngineOptions) -> Result<Self, RunError> {
        let pool = match options.threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("spacetime-worker-{i}"))
                    .build()?;
                info!(threads, "dedicated worker pool ready");
                Some(pool)
            }
            None => None,
        };
        Ok(Self { pool })
    }

    /// Generate events from `config` and build a run.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Graph`] with
    /// [`GraphError::InvalidConfiguration`](spacetime_graph::GraphError::InvalidConfiguration)
    /// if any parameter is invalid. Validation happens before anything is
    /// generated.
    pub fn run(&self, config: &RunConfig) -> Result<Run, RunError> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(rand::random);
        self.install(|| {
            let events = EventSet::generate(&config.event_plan(), seed)?;
            build(config, seed, events)
        })
    }

    /// Build a run from an existing event set, ignoring the config's event
    /// generation parameters.
    ///
    /// Scenarios use this to perturb energies between otherwise identical
    /// runs. The seed still drives probabilistic admission.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Graph`] if the linking or curvature parameters are
    /// invalid.
    pub fn run_with_events(&self, config: &RunConfig, events: EventSet) -> Result<Run, RunError> {
        config.linker(0)?;
        config.curvature.validate()?;
        let seed = config.seed.unwrap_or_else(rand::random);
        self.install(|| build(config, seed, events))
    }

    /// Execute several configurations in order.
    ///
    /// Every configuration is validated before the first run starts.
    ///
    /// # Errors
    ///
    /// Returns the first validation or run error.
    pub fn run_many(&self, configs: &[RunConfig]) -> Result<Vec<Run>, RunError> {
        for config in configs {
            config.validate()?;
        }
        configs.iter().map(|config| self.run(config)).collect()
    }

    fn install<T, F>(&self, work: F) -> T
    where
        F: FnOnce() -> T + Send,
        T: Send,
    {
        match &self.pool {
            Some(pool) => pool.install(work),
            None => work(),
        }
    }
}

fn build(config: &RunConfig, seed: u64, events: EventSet) -> Result<Run, RunError> {
    info!(
        run = %config.name,
        seed,
        events = events.len(),
        horizon = config.horizon,
        "configuration accepted"
    );

    let linker = config.linker(seed)?;
    let graph = linker.build(events)?;
    info!(
        run = %config.name,
        edges = graph.edge_count(),
        sources = graph.sources().count(),
        "causal graph linked"
    );

    EmergentMetric::new(&graph)?;
    let order = EmergentOrder::compute(&graph);
    let estimator = CurvatureEstimator::new(&graph, config.curvature)?;
    debug!(
        run = %config.name,
        depth = order.depth(),
        components = graph.component_count(),
        "annotations computed"
    );

    Ok(Run::new(config.clone(), seed, graph, order, estimator))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use spacetime_graph::GraphError;

    use super::*;

    #[test]
    fn runs_carry_effective_seed() {
        let engine = SimulationEngine::default();
        let mut config = RunConfig::new(20, 1.0);
        config.seed = Some(5);
        let run = engine.run(&config).unwrap();
        assert_eq!(run.seed(), 5);

        config.seed = None;
        let run = engine.run(&config).unwrap();
        assert_eq!(run.graph().event_count(), 20);
    }

    #[test]
    fn invalid_config_rejected_before_generation() {
        let engine = SimulationEngine::default();
        let err = engine.run(&RunConfig::new(0, 1.0)).unwrap_err();
        assert!(matches!(
            err.graph(),
            Some(GraphError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn dedicated_pool_runs() {
        let engine = SimulationEngine::new(EngineOptions { threads: Some(2) }).unwrap();
        let mut config = RunConfig::new(30, 1.0);
        config.seed = Some(1);
        let pooled = engine.run(&config).unwrap();
        let global = SimulationEngine::default().run(&config).unwrap();
        assert_eq!(pooled.graph(), global.graph());
    }

    #[test]
    fn run_many_preserves_order() {
        let engine = SimulationEngine::default();
        let configs: Vec<RunConfig> = [0.5, 1.0, 2.0]
            .iter()
            .map(|horizon| {
                let mut config = RunConfig::new(25, *horizon);
                config.seed = Some(9);
                config
            })
            .collect();
        let runs = engine.run_many(&configs).unwrap();
        let horizons: Vec<f64> = runs.iter().map(|r| r.config().horizon).collect();
        assert_eq!(horizons, vec![0.5, 1.0, 2.0]);
    }

    #[test]
    fn run_many_validates_everything_first() {
        let engine = SimulationEngine::default();
        let configs = vec![RunConfig::new(5, 1.0), RunConfig::new(5, -2.0)];
        assert!(engine.run_many(&configs).is_err());
    }
}
