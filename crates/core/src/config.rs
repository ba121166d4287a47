//! Run configuration.
//!
//! One immutable [`QuineConfig`] is built at startup (defaults, then an
//! optional JSON file, then environment overrides) and handed to every
//! component that needs it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "quine.json";

/// Substrings that mark a candidate as delegating to a built-in sort.
pub const DEFAULT_FORBIDDEN_PATTERNS: &[&str] = &[
    ".sort(",
    ".sort_unstable(",
    ".sort_by(",
    ".sort_by_key(",
    ".sort_by_cached_key(",
    ".sort_unstable_by(",
    ".sort_unstable_by_key(",
    "slice::sort",
    "BinaryHeap",
    "into_sorted_vec",
    "BTreeSet",
    "BTreeMap",
];

/// Errors raised while building the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Config file path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Serialization/deserialization error
    #[error("invalid config {path}: {source}")]
    Json {
        /// Config file path
        path: PathBuf,
        /// Underlying error
        source: serde_json::Error,
    },

    /// A value is out of range
    #[error("invalid setting `{field}`: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

/// Complete harness configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuineConfig {
    /// Acceptance policy and loop bound
    pub evolution: EvolutionSettings,
    /// Benchmark runner
    pub benchmark: BenchmarkSettings,
    /// Workload generator
    pub workload: WorkloadSettings,
    /// Forbidden-pattern gate
    pub gate: GateSettings,
    /// Candidate toolchain
    pub toolchain: ToolchainSettings,
    /// Persisted state
    pub storage: StorageSettings,
    /// Mutation proposer
    pub proposer: ProposerSettings,
}

/// Acceptance policy and loop bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionSettings {
    /// Multiplicative slack over the baseline that still counts as accepted
    pub tolerance: f64,
    /// Last generation index to run
    pub max_generations: u32,
}

impl Default for EvolutionSettings {
    fn default() -> Self {
        Self {
            tolerance: 1.05,
            max_generations: 200,
        }
    }
}

/// Benchmark runner settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkSettings {
    /// Untimed calls before measuring
    pub warmup_runs: u32,
    /// Timed calls averaged into the latency
    pub measured_runs: u32,
    /// Wall-clock bound for one candidate's benchmark phase
    pub timeout_secs: u64,
}

impl BenchmarkSettings {
    /// Wall-clock bound as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for BenchmarkSettings {
    fn default() -> Self {
        Self {
            warmup_runs: 3,
            measured_runs: 5,
            timeout_secs: 20,
        }
    }
}

/// Workload generator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadSettings {
    /// Generator seed
    pub seed: u64,
    /// Number of integers
    pub size: usize,
    /// Exclusive upper bound of each value
    pub bound: i32,
}

impl Default for WorkloadSettings {
    fn default() -> Self {
        Self {
            seed: 42,
            size: 10_000,
            bound: 100_000,
        }
    }
}

/// Forbidden-pattern gate settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateSettings {
    /// Disallowed substrings
    pub forbidden_patterns: Vec<String>,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            forbidden_patterns: DEFAULT_FORBIDDEN_PATTERNS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Candidate toolchain settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainSettings {
    /// Compiler executable
    pub rustc: String,
    /// `-C opt-level` value
    pub opt_level: String,
    /// Rust edition of candidates
    pub edition: String,
    /// Compiler diagnostics beyond this size are truncated
    pub max_diagnostic_bytes: usize,
}

impl Default for ToolchainSettings {
    fn default() -> Self {
        Self {
            rustc: "rustc".to_string(),
            opt_level: "3".to_string(),
            edition: "2021".to_string(),
            max_diagnostic_bytes: 16 * 1024,
        }
    }
}

/// Persisted state settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Root directory of the live slot and backup log
    pub root: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from(".quine"),
        }
    }
}

/// Mutation proposer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProposerSettings {
    /// Chat-completions endpoint
    pub api_url: String,
    /// Model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Bearer token (usually supplied through `API_KEY`)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for ProposerSettings {
    fn default() -> Self {
        Self {
            api_url: "https://dashscope.aliyuncs.com/compatible-mode/v1/chat/completions".to_string(),
            model: "qwen3-coder-plus".to_string(),
            temperature: 1.0,
            api_key: None,
        }
    }
}

impl QuineConfig {
    /// Build the configuration: defaults, then `path` (or `quine.json` when
    /// present), then the `API_KEY` environment variable.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file. Missing sections and fields keep defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("API_KEY").filter(|k| !k.is_empty()) {
            self.proposer.api_key = Some(key);
        }
    }

    /// Reject settings the harness cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.evolution.tolerance.is_finite() || self.evolution.tolerance < 1.0 {
            return Err(ConfigError::Invalid {
                field: "evolution.tolerance",
                reason: format!("must be a finite value >= 1.0, got {}", self.evolution.tolerance),
            });
        }
        if self.benchmark.measured_runs == 0 {
            return Err(ConfigError::Invalid {
                field: "benchmark.measured_runs",
                reason: "at least one measured run is required".to_string(),
            });
        }
        if self.benchmark.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "benchmark.timeout_secs",
                reason: "timeout must be positive".to_string(),
            });
        }
        if self.workload.size == 0 {
            return Err(ConfigError::Invalid {
                field: "workload.size",
                reason: "workload must not be empty".to_string(),
            });
        }
        if self.storage.root.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                field: "storage.root",
                reason: "root directory must not be empty".to_string(),
            });
        }
        if self.workload.bound <= 0 {
            return Err(ConfigError::Invalid {
                field: "workload.bound",
                reason: format!("must be positive, got {}", self.workload.bound),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = QuineConfig::default();
        assert_eq!(config.evolution.tolerance, 1.05);
        assert_eq!(config.evolution.max_generations, 200);
        assert_eq!(config.benchmark.warmup_runs, 3);
        assert_eq!(config.benchmark.measured_runs, 5);
        assert_eq!(config.benchmark.timeout(), Duration::from_secs(20));
        assert_eq!(config.workload.seed, 42);
        assert_eq!(config.workload.size, 10_000);
        assert!(config.gate.forbidden_patterns.iter().any(|p| p == ".sort_unstable("));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"evolution": {{"max_generations": 10}}, "benchmark": {{"timeout_secs": 2}}}}"#).unwrap();

        let config = QuineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.evolution.max_generations, 10);
        assert_eq!(config.evolution.tolerance, 1.05);
        assert_eq!(config.benchmark.timeout_secs, 2);
        assert_eq!(config.benchmark.measured_runs, 5);
    }

    #[test]
    fn test_invalid_json_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            QuineConfig::from_file(file.path()),
            Err(ConfigError::Json { .. })
        ));
    }

    #[test]
    fn test_env_overrides_api_key() {
        let mut config = QuineConfig::default();
        config.apply_env(|key| (key == "API_KEY").then(|| "sk-test".to_string()));
        assert_eq!(config.proposer.api_key.as_deref(), Some("sk-test"));

        let mut config = QuineConfig::default();
        config.apply_env(|_| Some(String::new()));
        assert!(config.proposer.api_key.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = QuineConfig::default();
        config.evolution.tolerance = 0.9;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "evolution.tolerance", .. })
        ));

        let mut config = QuineConfig::default();
        config.benchmark.measured_runs = 0;
        assert!(config.validate().is_err());

        let mut config = QuineConfig::default();
        config.workload.size = 0;
        assert!(config.validate().is_err());

        let mut config = QuineConfig::default();
        config.storage.root = std::path::PathBuf::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "storage.root", .. })
        ));
    }

    #[test]
    fn test_api_key_is_not_serialized() {
        let mut config = QuineConfig::default();
        config.proposer.api_key = Some("secret".to_string());
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}
