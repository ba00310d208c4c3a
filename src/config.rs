//! Configuration management for guardflow
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags (--max-call-depth, etc.)
//! 2. Environment variables (GUARDFLOW_MAX_CALL_DEPTH, etc.)
//! 3. Config file (guardflow.toml in the working directory or ~/.config/guardflow/config.toml)
//! 4. Built-in defaults
//!
//! # Example Config File (guardflow.toml)
//!
//! ```toml
//! [evaluator]
//! max_call_depth = 128
//! max_steps = 1000000
//!
//! [files]
//! root = "fixtures/data"
//!
//! [logging]
//! filter = "guardflow=debug"
//! ```
//!
//! # Environment Variables
//!
//! - GUARDFLOW_MAX_CALL_DEPTH
//! - GUARDFLOW_MAX_STEPS
//! - GUARDFLOW_FILES_ROOT
//! - GUARDFLOW_LOG
//! - GUARDFLOW_CONFIG_PATH (location of the config file itself)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub evaluator: EvaluatorConfig,

    #[serde(default)]
    pub files: FilesConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Evaluation limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorConfig {
    /// Deepest allowed nesting of fixture function calls
    #[serde(default = "default_max_call_depth")]
    pub max_call_depth: usize,

    /// Total VM steps a run may take; unlimited when absent
    #[serde(default)]
    pub max_steps: Option<u64>,
}

/// Upper bound on `max_call_depth`; every level reserves evaluator stack
pub const MAX_CALL_DEPTH: usize = 1024;

fn default_max_call_depth() -> usize {
    256
}

impl EvaluatorConfig {
    /// Call depth actually enforced, never above [`MAX_CALL_DEPTH`]
    pub fn call_depth(&self) -> usize {
        self.max_call_depth.min(MAX_CALL_DEPTH)
    }
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            max_call_depth: default_max_call_depth(),
            max_steps: None,
        }
    }
}

/// File capability configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilesConfig {
    /// Directory relative fixture paths are resolved against
    pub root: Option<PathBuf>,
}

/// Log output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when RUST_LOG is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Config {
    /// Load configuration with full priority chain:
    /// CLI flags → env vars → config file → defaults
    pub fn load() -> Result<Self> {
        Self::builder().build()
    }

    /// Load configuration from a specific file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_str = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;

        Ok(config)
    }

    /// Create a builder for constructing config with overrides
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for constructing Config with optional overrides
#[derive(Default)]
pub struct ConfigBuilder {
    config_path: Option<PathBuf>,
    max_call_depth: Option<usize>,
    max_steps: Option<u64>,
    files_root: Option<PathBuf>,
    log_filter: Option<String>,
}

impl ConfigBuilder {
    /// Override the config file path
    pub fn config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    pub fn max_call_depth(mut self, depth: Option<usize>) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn max_steps(mut self, steps: Option<u64>) -> Self {
        self.max_steps = steps;
        self
    }

    pub fn files_root(mut self, root: Option<PathBuf>) -> Self {
        self.files_root = root;
        self
    }

    pub fn log_filter(mut self, filter: Option<String>) -> Self {
        self.log_filter = filter;
        self
    }

    /// Build the final config by applying priority chain
    pub fn build(self) -> Result<Config> {
        // .env first, so real environment variables still win
        let _ = dotenvy::dotenv();

        let mut config = match self.load_from_file()? {
            Some(file_config) => file_config,
            None => Config::default(),
        };

        self.apply_env_vars(&mut config)?;
        self.apply_overrides(&mut config);

        if config.evaluator.max_call_depth == 0 {
            anyhow::bail!(
                "max_call_depth must be at least 1\n\n\
                Set it using one of:\n\
                  1. Config file: 'max_call_depth = 256' in the [evaluator] section of guardflow.toml\n\
                  2. Environment variable: GUARDFLOW_MAX_CALL_DEPTH=256\n\
                  3. CLI flag: --max-call-depth 256"
            );
        }

        if config.evaluator.max_call_depth > MAX_CALL_DEPTH {
            anyhow::bail!(
                "max_call_depth of {} is above the supported maximum of {}",
                config.evaluator.max_call_depth,
                MAX_CALL_DEPTH
            );
        }

        Ok(config)
    }

    /// Try to load config from file (searches default locations if no path specified)
    fn load_from_file(&self) -> Result<Option<Config>> {
        let config_path = if let Some(path) = &self.config_path {
            if !path.exists() {
                anyhow::bail!("Config file not found: {:?}", path);
            }
            Some(path.clone())
        } else if let Ok(path_str) = env::var("GUARDFLOW_CONFIG_PATH") {
            let path = PathBuf::from(path_str);
            if !path.exists() {
                anyhow::bail!("Config file not found: {:?}", path);
            }
            Some(path)
        } else {
            self.find_config_file()
        };

        match config_path {
            Some(path) => Ok(Some(Config::from_file(&path)?)),
            None => Ok(None),
        }
    }

    /// Search for config file in default locations
    fn find_config_file(&self) -> Option<PathBuf> {
        let project_config = PathBuf::from("guardflow.toml");
        if project_config.exists() {
            return Some(project_config);
        }

        if let Some(home) = env::var_os("HOME") {
            let user_config = PathBuf::from(home)
                .join(".config")
                .join("guardflow")
                .join("config.toml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        None
    }

    /// Apply environment variables to config
    ///
    /// Unlike file values, a malformed number here is an error rather than
    /// silently ignored.
    fn apply_env_vars(&self, config: &mut Config) -> Result<()> {
        if let Ok(depth) = env::var("GUARDFLOW_MAX_CALL_DEPTH") {
            config.evaluator.max_call_depth = depth
                .parse()
                .with_context(|| format!("Invalid GUARDFLOW_MAX_CALL_DEPTH: {:?}", depth))?;
        }

        if let Ok(steps) = env::var("GUARDFLOW_MAX_STEPS") {
            config.evaluator.max_steps = Some(
                steps
                    .parse()
                    .with_context(|| format!("Invalid GUARDFLOW_MAX_STEPS: {:?}", steps))?,
            );
        }

        if let Some(root) = env::var_os("GUARDFLOW_FILES_ROOT") {
            config.files.root = Some(PathBuf::from(root));
        }

        if let Ok(filter) = env::var("GUARDFLOW_LOG") {
            config.logging.filter = filter;
        }

        Ok(())
    }

    /// Apply CLI overrides (highest priority)
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(depth) = self.max_call_depth {
            config.evaluator.max_call_depth = depth;
        }

        if let Some(steps) = self.max_steps {
            config.evaluator.max_steps = Some(steps);
        }

        if let Some(root) = &self.files_root {
            config.files.root = Some(root.clone());
        }

        if let Some(filter) = &self.log_filter {
            config.logging.filter = filter.clone();
        }
    }
}
