//! Run configuration
//!
//! Settings are layered, lowest to highest precedence: built-in defaults, a
//! TOML config file, `PARSUM_*` environment variables, command line flags.
//! The exponent is the one setting with no default; it only ever comes from
//! the command line.

use crate::error::{ErrorCode, ParsumError, Result};
use crate::reduction::ReductionPlan;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

pub mod loader;

pub use loader::{load_config_file, resolve, resolve_with_env};

/// Number of terms summed when nothing else is configured
pub const DEFAULT_ITERATIONS: u64 = 1_000_000_000;

pub const CONFIG_FILE_NAME: &str = "parsum.toml";

pub const ENV_ITERATIONS: &str = "PARSUM_ITERATIONS";
pub const ENV_WORKERS: &str = "PARSUM_WORKERS";
pub const ENV_COORDINATOR: &str = "PARSUM_COORDINATOR";

/// Platform config directory, e.g. `~/.config/parsum` on Linux
pub fn config_dir() -> Option<PathBuf> {
    ProjectDirs::from("org", "parsum", "parsum").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Where `parsum.toml` is looked for when no `--config` is given
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// One worker per available CPU
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Contents of a `parsum.toml` file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub iterations: Option<u64>,
    pub workers: Option<usize>,
    pub coordinator: Option<usize>,
}

/// Values given explicitly on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub iterations: Option<u64>,
    pub workers: Option<usize>,
    pub coordinator: Option<usize>,
}

/// Fully resolved settings for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Exponent `n` of the zeta term `1 / i^n`
    pub exponent: u32,
    pub total_iterations: u64,
    pub workers: usize,
    pub coordinator: usize,
}

impl RunConfig {
    /// Defaults for everything except the exponent.
    pub fn new(exponent: u32) -> Self {
        Self {
            exponent,
            total_iterations: DEFAULT_ITERATIONS,
            workers: default_workers(),
            coordinator: 0,
        }
    }

    pub fn apply_file(&mut self, file: &ConfigFile) {
        if let Some(iterations) = file.iterations {
            self.total_iterations = iterations;
        }
        if let Some(workers) = file.workers {
            self.workers = workers;
        }
        if let Some(coordinator) = file.coordinator {
            self.coordinator = coordinator;
        }
    }

    /// Merge `PARSUM_*` variables from the process environment.
    pub fn merge_env_vars(&mut self) {
        self.merge_env_vars_from(|key| std::env::var(key).ok());
    }

    /// Merge `PARSUM_*` variables using `lookup` to read them.
    ///
    /// A value that does not parse is logged and ignored.
    pub fn merge_env_vars_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(iterations) = env_value(&lookup, ENV_ITERATIONS) {
            self.total_iterations = iterations;
        }
        if let Some(workers) = env_value(&lookup, ENV_WORKERS) {
            self.workers = workers;
        }
        if let Some(coordinator) = env_value(&lookup, ENV_COORDINATOR) {
            self.coordinator = coordinator;
        }
    }

    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(iterations) = overrides.iterations {
            self.total_iterations = iterations;
        }
        if let Some(workers) = overrides.workers {
            self.workers = workers;
        }
        if let Some(coordinator) = overrides.coordinator {
            self.coordinator = coordinator;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.exponent == 0 {
            return Err(ParsumError::validation_with_code(
                ErrorCode::VALIDATION_GENERIC,
                "exponent must be a positive integer",
                Some("n".to_string()),
            ));
        }
        self.plan().validate()
    }

    pub fn plan(&self) -> ReductionPlan {
        ReductionPlan::new(self.total_iterations, self.workers).with_coordinator(self.coordinator)
    }
}

fn env_value<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a non-negative integer", key, raw);
            None
        }
    }
}
