//! Configuration loading and typed config structures for spacetime runs.
//!
//! The canonical configuration lives in `spacetime-config.yaml` at the
//! project root. Every section and field has a default, so an empty file (or
//! no file at all) describes a single small run.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use spacetime_graph::{
    Admission, BiasSettings, CausalLinker, CurvatureSettings, EdgeWeighting, EnergySource,
    EventSetPlan, GraphError, Placement, SpontaneousSources,
};
use spacetime_types::AmbientBounds;

use crate::engine::EngineOptions;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration file.
///
/// Mirrors the structure of `spacetime-config.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpacetimeConfig {
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Where run snapshots are written.
    #[serde(default)]
    pub output: OutputConfig,

    /// Thread-pool settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Runs to execute, in order.
    #[serde(default = "default_runs")]
    pub runs: Vec<RunConfig>,
}

impl Default for SpacetimeConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            output: OutputConfig::default(),
            engine: EngineConfig::default(),
            runs: default_runs(),
        }
    }
}

impl SpacetimeConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// An empty document yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is unset (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Snapshot output configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving one JSON snapshot per run; `None` disables output.
    #[serde(default)]
    pub snapshot_dir: Option<PathBuf>,

    /// Pretty-print snapshot JSON.
    #[serde(default)]
    pub pretty: bool,
}

/// Thread-pool configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Size of a dedicated worker pool; `None` uses the global pool.
    #[serde(default)]
    pub threads: Option<usize>,
}

impl EngineConfig {
    /// Engine options for this configuration.
    pub const fn options(&self) -> EngineOptions {
        EngineOptions {
            threads: self.threads,
        }
    }
}

// ---------------------------------------------------------------------------
// Run configuration
// ---------------------------------------------------------------------------

/// Parameters of a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Label used in logs and snapshot file names.
    #[serde(default = "default_run_name")]
    pub name: String,

    /// Number of events to generate.
    #[serde(default = "default_event_count")]
    pub event_count: usize,

    /// Ambient region the events are placed in.
    #[serde(default)]
    pub ambient_bounds: AmbientBounds,

    /// How positions are laid out.
    #[serde(default)]
    pub placement: Placement,

    /// Maximum ambient distance per unit of generation difference.
    #[serde(default = "default_horizon")]
    pub horizon: f64,

    /// Explicitly placed energy sources.
    #[serde(default)]
    pub energy_sources: Vec<EnergySource>,

    /// Optional randomly promoted sources.
    #[serde(default)]
    pub spontaneous_sources: Option<SpontaneousSources>,

    /// Global multiplier on every energy magnitude.
    #[serde(default = "default_energy_strength")]
    pub energy_strength: f64,

    /// Energy-bias shape and reach.
    #[serde(default)]
    pub bias: BiasSettings,

    /// Edge admission rule.
    #[serde(default)]
    pub admission: Admission,

    /// Maximum direct causes per event; `None` keeps every qualifying edge.
    #[serde(default)]
    pub density_cap: Option<usize>,

    /// How edge weights are derived.
    #[serde(default)]
    pub weighting: EdgeWeighting,

    /// Curvature proxy settings.
    #[serde(default)]
    pub curvature: CurvatureSettings,

    /// Run seed; drawn from OS entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new(default_event_count(), default_horizon())
    }
}

impl RunConfig {
    /// A run of `event_count` uniformly placed events with no sources.
    pub fn new(event_count: usize, horizon: f64) -> Self {
        Self {
            name: default_run_name(),
            event_count,
            ambient_bounds: AmbientBounds::default(),
            placement: Placement::Uniform,
            horizon,
            energy_sources: Vec::new(),
            spontaneous_sources: None,
            energy_strength: default_energy_strength(),
            bias: BiasSettings::default(),
            admission: Admission::Deterministic,
            density_cap: None,
            weighting: EdgeWeighting::Unit,
            curvature: CurvatureSettings::default(),
            seed: None,
        }
    }

    /// The event-generation part of this configuration.
    pub fn event_plan(&self) -> EventSetPlan {
        EventSetPlan {
            count: self.event_count,
            bounds: self.ambient_bounds.clone(),
            placement: self.placement.clone(),
            sources: self.energy_sources.clone(),
            spontaneous: self.spontaneous_sources.clone(),
            energy_strength: self.energy_strength,
        }
    }

    /// The linker described by this configuration, seeded with `seed`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidConfiguration`] for a bad horizon, bias,
    /// admission probability, or density cap.
    pub fn linker(&self, seed: u64) -> Result<CausalLinker, GraphError> {
        Ok(CausalLinker::new(self.horizon, self.bias.build()?)?
            .with_admission(self.admission)?
            .with_density_cap(self.density_cap)?
            .with_weighting(self.weighting)
            .with_seed(seed))
    }

    /// Check every parameter before anything is generated.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidConfiguration`] describing the first
    /// problem found.
    pub fn validate(&self) -> Result<(), GraphError> {
        self.event_plan().validate()?;
        self.linker(0)?;
        self.curvature.validate()
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_runs() -> Vec<RunConfig> {
    vec![RunConfig::default()]
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_run_name() -> String {
    "run".to_owned()
}

const fn default_event_count() -> usize {
    100
}

const fn default_horizon() -> f64 {
    1.0
}

const fn default_energy_strength() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use spacetime_graph::{BiasShape, CurvatureScope, SourceAnchor};
    use spacetime_types::Position;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SpacetimeConfig::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.runs.len(), 1);
        assert!(config.runs.iter().all(|run| run.validate().is_ok()));
        assert!(config.output.snapshot_dir.is_none());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r"
logging:
  level: debug
output:
  snapshot_dir: runs
  pretty: true
engine:
  threads: 2
runs:
  - name: baseline
    event_count: 200
    ambient_bounds: { min: [0.0, 0.0], max: [10.0, 10.0] }
    placement: { kind: lattice }
    horizon: 1.5
    energy_sources:
      - { anchor: 100, magnitude: 5.0 }
      - { anchor: [2.5, 7.5], magnitude: 1.0 }
    spontaneous_sources: { probability: 0.01, magnitudes: [2.0, 4.0] }
    energy_strength: 2.0
    bias:
      shape: { kind: inverse_square, gain: 2.0 }
      influence_radius: 2.0
      stretch_cone: false
    admission: { mode: probabilistic, base_probability: 0.3 }
    density_cap: 4
    weighting: inverse_ambient
    curvature: { radius: 3.0, scope: { kind: neighborhood, radius: 1.0 } }
    seed: 42
";
        let config = SpacetimeConfig::parse(yaml);
        assert!(config.is_ok(), "{config:?}");
        let config = config.ok().unwrap_or_default();

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.output.snapshot_dir, Some(PathBuf::from("runs")));
        assert!(config.output.pretty);
        assert_eq!(config.engine.options().threads, Some(2));

        let run = config.runs.first().cloned().unwrap_or_default();
        assert_eq!(run.name, "baseline");
        assert_eq!(run.event_count, 200);
        assert_eq!(run.placement, Placement::Lattice);
        assert_eq!(
            run.energy_sources.first().map(|s| s.anchor.clone()),
            Some(SourceAnchor::Index(100))
        );
        assert_eq!(
            run.energy_sources.get(1).map(|s| s.anchor.clone()),
            Some(SourceAnchor::Position(Position::new(vec![2.5, 7.5])))
        );
        assert_eq!(run.bias.shape, BiasShape::InverseSquare { gain: 2.0 });
        assert!(!run.bias.stretch_cone);
        assert_eq!(
            run.admission,
            Admission::Probabilistic {
                base_probability: 0.3
            }
        );
        assert_eq!(run.density_cap, Some(4));
        assert_eq!(run.weighting, EdgeWeighting::InverseAmbient);
        assert_eq!(run.curvature.scope, CurvatureScope::Neighborhood { radius: 1.0 });
        assert_eq!(run.seed, Some(42));
        assert!(run.validate().is_ok());
    }

    #[test]
    fn parse_minimal_run() {
        let yaml = "runs:\n  - horizon: 2.5\n    seed: 7\n";
        let config = SpacetimeConfig::parse(yaml);
        assert!(config.is_ok());
        let run = config
            .ok()
            .and_then(|c| c.runs.first().cloned())
            .unwrap_or_default();

        assert_eq!(run.seed, Some(7));
        assert!((run.horizon - 2.5).abs() < f64::EPSILON);
        // Everything else uses defaults.
        assert_eq!(run.event_count, 100);
        assert_eq!(run.name, "run");
        assert_eq!(run.admission, Admission::Deterministic);
    }

    #[test]
    fn parse_empty_yaml() {
        let config = SpacetimeConfig::parse("");
        assert!(config.is_ok());
        assert_eq!(config.ok().map(|c| c.runs.len()), Some(1));
    }

    #[test]
    fn malformed_yaml_is_reported() {
        let config = SpacetimeConfig::parse("runs: [ {event_count: many} ]");
        assert!(matches!(config, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn validation_catches_bad_parameters() {
        let mut run = RunConfig::new(10, -1.0);
        assert!(run.validate().is_err());

        run.horizon = 1.0;
        run.density_cap = Some(0);
        assert!(run.validate().is_err());

        run.density_cap = None;
        run.energy_sources.push(EnergySource {
            anchor: SourceAnchor::Index(10),
            magnitude: 1.0,
        });
        assert!(run.validate().is_err());

        run.energy_sources.clear();
        run.curvature.radius = 0.0;
        assert!(run.validate().is_err());
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("spacetime-config.yaml");
        if path.exists() {
            let config = SpacetimeConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
            let config = config.ok().unwrap_or_default();
            assert!(config.runs.iter().all(|run| run.validate().is_ok()));
        }
    }
}
