//! Configuration models for prisoners.
//!
//! All I^R (resolvable ignorance) is parameterized here.
//! The user resolves these unknowns at runtime via config file or CLI flags.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for prisoners.
///
/// Every section is optional; an empty file yields the canonical
/// 100 prisoners / 1000 runs setup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// What to simulate
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// How to execute trials
    #[serde(default)]
    pub execution: ExecutionConfig,

    /// How to report
    #[serde(default)]
    pub output: OutputConfig,
}

/// Simulation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of independent trials
    #[serde(default = "default_runs")]
    pub runs: u64,

    /// Number of prisoners (and boxes)
    #[serde(default = "default_prisoners")]
    pub prisoners: usize,

    /// Maximum boxes a prisoner may open. Defaults to `prisoners / 2`.
    #[serde(default)]
    pub open_limit: Option<usize>,

    /// Base seed. Drawn from OS randomness when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Search every prisoner without a limit and keep per-prisoner open counts
    #[serde(default)]
    pub diagnostics: bool,
}

fn default_runs() -> u64 {
    1000
}

fn default_prisoners() -> usize {
    100
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            runs: default_runs(),
            prisoners: default_prisoners(),
            open_limit: None,
            seed: None,
            diagnostics: false,
        }
    }
}

/// Execution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Number of parallel workers (1 = sequential)
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Trials handed to a worker at a time
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_workers() -> usize {
    1
}

fn default_batch_size() -> usize {
    crate::pipeline::DEFAULT_BATCH_SIZE
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            batch_size: default_batch_size(),
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Show a progress bar while trials run
    #[serde(default = "default_true")]
    pub progress: bool,

    /// Print the final summary as a JSON object
    #[serde(default)]
    pub json: bool,
}

fn default_true() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            progress: true,
            json: false,
        }
    }
}

/// Open limit derived from the prisoner count: `floor(n / 2)`.
///
/// Integer division on purpose. For odd `n` a prisoner may open strictly
/// fewer than half of the boxes, and the same limit decides both the bounded
/// search and the diagnostic "within limit" count.
pub fn default_open_limit(prisoners: usize) -> usize {
    prisoners / 2
}

/// A validated, immutable description of one experiment.
///
/// K_i: Once built, `runs >= 1`, `prisoners >= 2` and `open_limit >= 1`.
/// Fields are private and deserialization goes through [`ExperimentPlan::new`],
/// so no other route can produce a plan.
///
/// ```compile_fail
/// let plan = prisoners::ExperimentPlan { runs: 5, prisoners: 0, open_limit: 0, seed: 0, diagnostics: false };
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPlan")]
pub struct ExperimentPlan {
    runs: u64,
    prisoners: usize,
    open_limit: usize,
    seed: u64,
    diagnostics: bool,
}

/// Unchecked wire form of [`ExperimentPlan`].
#[derive(Deserialize)]
struct RawPlan {
    runs: u64,
    prisoners: usize,
    open_limit: usize,
    seed: u64,
    #[serde(default)]
    diagnostics: bool,
}

impl TryFrom<RawPlan> for ExperimentPlan {
    type Error = ConfigError;

    fn try_from(raw: RawPlan) -> Result<Self, Self::Error> {
        Ok(Self::new(raw.runs, raw.prisoners, raw.open_limit, raw.seed)?
            .with_diagnostics(raw.diagnostics))
    }
}

impl ExperimentPlan {
    /// Build a plan, rejecting degenerate parameters.
    pub fn new(
        runs: u64,
        prisoners: usize,
        open_limit: usize,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        if runs < 1 {
            return Err(ConfigError::TooFewRuns(runs));
        }
        if prisoners < 2 {
            return Err(ConfigError::TooFewPrisoners(prisoners));
        }
        if open_limit < 1 {
            return Err(ConfigError::ZeroOpenLimit);
        }
        Ok(Self {
            runs,
            prisoners,
            open_limit,
            seed,
            diagnostics: false,
        })
    }

    /// Keep per-prisoner open counts for every trial.
    pub fn with_diagnostics(mut self, diagnostics: bool) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn runs(&self) -> u64 {
        self.runs
    }

    pub fn prisoners(&self) -> usize {
        self.prisoners
    }

    /// Boxes each prisoner may open, always at least 1.
    pub fn open_limit(&self) -> usize {
        self.open_limit
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn diagnostics(&self) -> bool {
        self.diagnostics
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// B_i(file exists) → Result
    /// B_i(file is valid TOML) → Result
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_owned(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_owned(),
            source: e,
        })
    }

    /// Load from `path` if given, otherwise use defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    /// Open limit in effect: the explicit override or `floor(prisoners / 2)`.
    pub fn open_limit(&self) -> usize {
        self.simulation
            .open_limit
            .unwrap_or_else(|| default_open_limit(self.simulation.prisoners))
    }

    /// Check every parameter without drawing a seed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ExperimentPlan::new(
            self.simulation.runs,
            self.simulation.prisoners,
            self.open_limit(),
            0,
        )?;
        if self.execution.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        let max = crate::pool::max_workers();
        if self.execution.workers > max {
            return Err(ConfigError::TooManyWorkers {
                workers: self.execution.workers,
                max,
            });
        }
        if self.execution.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        Ok(())
    }

    /// Validate and freeze into an [`ExperimentPlan`].
    ///
    /// A missing seed is drawn here, so the returned plan is fully
    /// reproducible.
    pub fn plan(&self) -> Result<ExperimentPlan, ConfigError> {
        self.validate()?;
        let seed = self.simulation.seed.unwrap_or_else(rand::random);
        Ok(ExperimentPlan::new(
            self.simulation.runs,
            self.simulation.prisoners,
            self.open_limit(),
            seed,
        )?
        .with_diagnostics(self.simulation.diagnostics))
    }

    /// Commented example configuration.
    pub fn example() -> &'static str {
        EXAMPLE_CONFIG
    }
}

const EXAMPLE_CONFIG: &str = r#"# prisoners configuration file

[simulation]
runs = 1000
prisoners = 100
# open_limit = 50       # defaults to prisoners / 2 (rounded down)
# seed = 42             # omit for a fresh random seed (logged at start)
diagnostics = false     # keep per-prisoner open counts (slower)

[execution]
workers = 1             # > 1 runs trials on a blocking worker pool
batch_size = 256

[output]
progress = true
json = false
"#;

/// Configuration errors.
///
/// Epistemic origin:
/// - B_i falsified: File not found, parse error
/// - K_i guard: Parameters that make the experiment meaningless
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("runs must be at least 1 (got {0})")]
    TooFewRuns(u64),

    #[error("prisoners must be at least 2 (got {0})")]
    TooFewPrisoners(usize),

    #[error("open limit must be at least 1")]
    ZeroOpenLimit,

    #[error("workers must be at least 1")]
    NoWorkers,

    #[error("workers must be at most {max} on this machine (got {workers})")]
    TooManyWorkers { workers: usize, max: usize },

    #[error("batch_size must be at least 1")]
    ZeroBatchSize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_canonical_problem() {
        let config = Config::default();
        assert_eq!(config.simulation.runs, 1000);
        assert_eq!(config.simulation.prisoners, 100);
        assert_eq!(config.open_limit(), 50);
        assert_eq!(config.execution.workers, 1);
        assert!(config.output.progress);
    }

    #[test]
    fn test_odd_prisoner_count_rounds_limit_down() {
        assert_eq!(default_open_limit(7), 3);
        assert_eq!(default_open_limit(2), 1);
        assert_eq!(default_open_limit(3), 1);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[simulation]\nprisoners = 10\nseed = 7").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.simulation.prisoners, 10);
        assert_eq!(config.simulation.runs, 1000);
        assert_eq!(config.execution.batch_size, 256);

        let plan = config.plan().unwrap();
        assert_eq!(plan.open_limit(), 5);
        assert_eq!(plan.seed(), 7);
    }

    #[test]
    fn test_parse_error_names_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[simulation\nruns = ").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file(Path::new("/nonexistent/prisoners.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead { .. }));
    }

    #[test]
    fn test_rejects_degenerate_parameters() {
        let mut config = Config::default();
        config.simulation.runs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::TooFewRuns(0))));

        let mut config = Config::default();
        config.simulation.prisoners = 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TooFewPrisoners(1))
        ));

        let mut config = Config::default();
        config.simulation.open_limit = Some(0);
        assert!(matches!(config.validate(), Err(ConfigError::ZeroOpenLimit)));

        let mut config = Config::default();
        config.execution.workers = 0;
        assert!(matches!(config.validate(), Err(ConfigError::NoWorkers)));
    }

    #[test]
    fn test_rejects_absurd_worker_count() {
        let mut config = Config::default();
        config.execution.workers = usize::MAX;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TooManyWorkers { workers: usize::MAX, .. })
        ));

        config.execution.workers = crate::pool::max_workers();
        config.validate().unwrap();
    }

    #[test]
    fn test_deserialized_plan_is_validated() {
        let err = serde_json::from_str::<ExperimentPlan>(
            r#"{"runs":5,"prisoners":4,"open_limit":0,"seed":1,"diagnostics":false}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("open limit must be at least 1"));

        let err = serde_json::from_str::<ExperimentPlan>(
            r#"{"runs":5,"prisoners":0,"open_limit":1,"seed":1}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("prisoners must be at least 2"));

        let err = serde_json::from_str::<ExperimentPlan>(
            r#"{"runs":0,"prisoners":4,"open_limit":2,"seed":1}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("runs must be at least 1"));
    }

    #[test]
    fn test_plan_survives_json_round_trip() {
        let plan = ExperimentPlan::new(10, 6, 3, 42)
            .unwrap()
            .with_diagnostics(true);
        let json = serde_json::to_string(&plan).unwrap();
        let back: ExperimentPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(back, plan);
        assert!(back.diagnostics());
    }

    #[test]
    fn test_limit_override_larger_than_n_is_accepted() {
        let mut config = Config::default();
        config.simulation.prisoners = 4;
        config.simulation.open_limit = Some(10);
        assert_eq!(config.plan().unwrap().open_limit(), 10);
    }

    #[test]
    fn test_example_config_parses() {
        let config: Config = toml::from_str(Config::example()).unwrap();
        config.validate().unwrap();
        assert_eq!(config.simulation.prisoners, 100);
        assert!(config.simulation.seed.is_none());
    }
}
