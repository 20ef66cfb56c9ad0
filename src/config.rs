//! Runtime configuration.
//!
//! Loaded from YAML (nested under a `lattice:` key) and optionally overlaid
//! with environment variables:
//!
//! ```yaml
//! lattice:
//!   simple_mode: true
//!   default_priority: 500
//!   business_config_paths:
//!     - "config/business"
//! ```
//!
//! - `LATTICE_SIMPLE_MODE` — `true`/`false`/`1`/`0`
//! - `LATTICE_DEFAULT_PRIORITY` — integer
//! - `LATTICE_BUSINESS_CONFIG_PATH` — additional business config path

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LatticeError, Result};

/// Priority used for implementations and templates that do not declare one.
pub const DEFAULT_PRIORITY: i32 = 1000;

/// Top-level runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatticeConfig {
    /// When a business code has no configuration, treat every registered
    /// product as installed instead of failing.
    #[serde(default)]
    pub simple_mode: bool,

    /// Priority for implementations without an explicit override.
    #[serde(default = "default_priority")]
    pub default_priority: i32,

    /// Files or directories holding business configuration YAML.
    #[serde(default)]
    pub business_config_paths: Vec<PathBuf>,
}

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

impl Default for LatticeConfig {
    fn default() -> Self {
        Self {
            simple_mode: false,
            default_priority: DEFAULT_PRIORITY,
            business_config_paths: Vec::new(),
        }
    }
}

/// Wrapper for YAML deserialization (config is nested under `lattice:`)
#[derive(Debug, Deserialize)]
struct ConfigWrapper {
    lattice: LatticeConfig,
}

impl LatticeConfig {
    /// Parse a configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let wrapper: ConfigWrapper = serde_yaml::from_str(yaml)?;
        Ok(wrapper.lattice)
    }

    /// Parse a configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Default configuration overlaid with environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Overlay `LATTICE_*` environment variables onto this configuration.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(raw) = env::var("LATTICE_SIMPLE_MODE") {
            self.simple_mode = parse_bool(&raw).ok_or_else(|| {
                LatticeError::Config(format!("LATTICE_SIMPLE_MODE is not a boolean: {}", raw))
            })?;
        }
        if let Ok(raw) = env::var("LATTICE_DEFAULT_PRIORITY") {
            self.default_priority = raw.trim().parse().map_err(|_| {
                LatticeError::Config(format!(
                    "LATTICE_DEFAULT_PRIORITY is not an integer: {}",
                    raw
                ))
            })?;
        }
        if let Ok(raw) = env::var("LATTICE_BUSINESS_CONFIG_PATH") {
            if !raw.trim().is_empty() {
                self.business_config_paths.push(PathBuf::from(raw.trim()));
            }
        }
        Ok(())
    }

    /// Builder-style toggle for simple mode.
    pub fn with_simple_mode(mut self, simple_mode: bool) -> Self {
        self.simple_mode = simple_mode;
        self
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
