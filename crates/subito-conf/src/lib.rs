//! Configuration loading for Subito.
//!
//! Subito turns a multi-track score into one rehearsal file per part. The
//! configuration tells it which instruments exist (`[parts]`), which
//! orderings of instruments a score may use (`[layouts]`), how loud the
//! soloed and background tracks are (`[settings]`), and which external
//! programs do the MIDI conversions (`[tools]`).
//!
//! Part and layout definitions are kept as raw strings here. Validating
//! them is the engine's job, because repairing a bad entry may need the
//! operator.
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `~/.config/subito/config.toml` (user)
//! 2. `./subito.toml` (local override), or the `--config` path instead
//! 3. Environment variables (`SUBITO_*`)
//!
//! # Example Config
//!
//! ```toml
//! [settings]
//! foreground_volume = 127
//! background_volume = 80
//! layout_priority = "satb"
//!
//! [parts]
//! soprano = "52, 0"
//! alto = "53, 0"
//!
//! [layouts]
//! duet = "soprano, alto"
//! ```
//!
//! Section and key names are matched without regard to case or
//! underscores, so `[SETTINGS]` with `ForegroundVolume = 127` works too.

pub mod loader;
pub mod settings;

pub use loader::{discover_config_files_with_override, ConfigSources};
pub use settings::{Settings, ToolsConfig};

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Config file {0} does not exist")]
    Missing(PathBuf),
}

/// One `name = "definition"` line from `[parts]` or `[layouts]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub name: String,
    pub definition: String,
}

impl RawEntry {
    pub fn new(name: impl Into<String>, definition: impl Into<String>) -> Self {
        RawEntry {
            name: name.into(),
            definition: definition.into(),
        }
    }
}

/// Complete Subito configuration.
#[derive(Debug, Clone, Default)]
pub struct SubitoConfig {
    pub settings: Settings,

    pub tools: ToolsConfig,

    /// Part definitions, in file order.
    pub parts: Vec<RawEntry>,

    /// Layout definitions, in file order.
    pub layouts: Vec<RawEntry>,
}

impl SubitoConfig {
    /// Load configuration from optional path and return information about sources.
    ///
    /// An explicit path that does not exist is an error; the standard
    /// locations are simply skipped when absent.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::Missing(path.to_path_buf()));
            }
        }

        let mut sources = ConfigSources::default();
        let mut config = SubitoConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            loader::load_into(&mut config, &path)?;
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }
}
