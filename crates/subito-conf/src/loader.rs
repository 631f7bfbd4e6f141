//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, RawEntry, SubitoConfig};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (user, then local). Only returns files that
/// exist. If `cli_path` is provided and exists, it replaces the local
/// override.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    // User config (XDG_CONFIG_HOME or ~/.config)
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("subito/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    // CLI override takes precedence over local
    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("subito.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Load a TOML file on top of `config`.
pub fn load_into(config: &mut SubitoConfig, path: &Path) -> Result<(), ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_into(config, &contents, path)
}

/// Parse a TOML document on top of `config`. Keys present in the document
/// win; parts and layouts with an existing name are replaced in place.
pub(crate) fn parse_into(
    config: &mut SubitoConfig,
    contents: &str,
    path: &Path,
) -> Result<(), ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    for (section, value) in &table {
        let Some(section_table) = value.as_table() else {
            continue;
        };

        match normalize_key(section).as_str() {
            "settings" => apply_settings(config, section_table, path)?,
            "tools" => apply_tools(config, section_table, path)?,
            "parts" => {
                for (name, value) in section_table {
                    upsert(&mut config.parts, name.to_lowercase(), definition_text(value));
                }
            }
            "layouts" => {
                for (name, value) in section_table {
                    upsert(
                        &mut config.layouts,
                        name.to_lowercase(),
                        definition_text(value).to_lowercase(),
                    );
                }
            }
            _ => {}
        }
    }

    Ok(())
}

/// `[settings]` as written in a file. Keys are normalised before this is
/// deserialized, so `ForegroundVolume` arrives as `foregroundvolume`.
#[derive(Debug, Default, Deserialize)]
struct SettingsSection {
    #[serde(rename = "foregroundvolume")]
    foreground_volume: Option<VolumeValue>,
    #[serde(rename = "backgroundvolume")]
    background_volume: Option<VolumeValue>,
    #[serde(rename = "layoutpriority")]
    layout_priority: Option<String>,
    #[serde(rename = "markertext")]
    marker_text: Option<String>,
    #[serde(rename = "loglevel")]
    log_level: Option<String>,
}

/// Volumes may be written as integers or, for older files, numeric strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum VolumeValue {
    Number(i64),
    Text(String),
}

impl VolumeValue {
    fn to_volume(&self, key: &str, path: &Path) -> Result<u8, ConfigError> {
        let raw = match self {
            VolumeValue::Number(n) => Some(*n),
            VolumeValue::Text(s) => s.trim().parse::<i64>().ok(),
        };

        raw.and_then(|v| u8::try_from(v).ok())
            .filter(|v| *v <= 127)
            .ok_or_else(|| ConfigError::Parse {
                path: path.to_path_buf(),
                message: format!("{} must be an integer between 0 and 127, got {}", key, self),
            })
    }
}

impl fmt::Display for VolumeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolumeValue::Number(n) => write!(f, "{}", n),
            VolumeValue::Text(s) => write!(f, "{:?}", s),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ToolsSection {
    mscore: Option<String>,
    midicsv: Option<String>,
    csvmidi: Option<String>,
}

/// Deserialize a section after normalising its key names.
fn deserialize_section<T: DeserializeOwned>(
    table: &toml::Table,
    path: &Path,
) -> Result<T, ConfigError> {
    let normalized: toml::Table = table
        .iter()
        .map(|(key, value)| (normalize_key(key), value.clone()))
        .collect();

    toml::Value::Table(normalized)
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

fn apply_settings(
    config: &mut SubitoConfig,
    table: &toml::Table,
    path: &Path,
) -> Result<(), ConfigError> {
    let section: SettingsSection = deserialize_section(table, path)?;
    let settings = &mut config.settings;

    if let Some(v) = section.foreground_volume {
        settings.foreground_volume = v.to_volume("foreground_volume", path)?;
    }
    if let Some(v) = section.background_volume {
        settings.background_volume = v.to_volume("background_volume", path)?;
    }
    if let Some(v) = section.layout_priority {
        settings.set_layout_priority(&v);
    }
    if let Some(v) = section.marker_text {
        settings.marker_text = v;
    }
    if let Some(v) = section.log_level {
        settings.log_level = v;
    }
    Ok(())
}

fn apply_tools(
    config: &mut SubitoConfig,
    table: &toml::Table,
    path: &Path,
) -> Result<(), ConfigError> {
    let section: ToolsSection = deserialize_section(table, path)?;
    let tools = &mut config.tools;

    if let Some(v) = section.mscore {
        tools.mscore = v;
    }
    if let Some(v) = section.midicsv {
        tools.midicsv = v;
    }
    if let Some(v) = section.csvmidi {
        tools.csvmidi = v;
    }
    Ok(())
}

/// Flatten a definition value to the comma-separated text the engine expects.
fn definition_text(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.trim().to_string(),
        toml::Value::Array(items) => items
            .iter()
            .map(|item| match item {
                toml::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

fn upsert(entries: &mut Vec<RawEntry>, name: String, definition: String) {
    match entries.iter_mut().find(|e| e.name == name) {
        Some(existing) => existing.definition = definition,
        None => entries.push(RawEntry { name, definition }),
    }
}

/// `ForegroundVolume`, `foreground_volume` and `FOREGROUND_VOLUME` all match.
fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut SubitoConfig, sources: &mut ConfigSources) {
    if let Ok(v) = env::var("SUBITO_FOREGROUND_VOLUME") {
        if let Some(volume) = v.trim().parse::<u8>().ok().filter(|v| *v <= 127) {
            config.settings.foreground_volume = volume;
            sources.env_overrides.push("SUBITO_FOREGROUND_VOLUME".to_string());
        }
    }
    if let Ok(v) = env::var("SUBITO_BACKGROUND_VOLUME") {
        if let Some(volume) = v.trim().parse::<u8>().ok().filter(|v| *v <= 127) {
            config.settings.background_volume = volume;
            sources.env_overrides.push("SUBITO_BACKGROUND_VOLUME".to_string());
        }
    }
    if let Ok(v) = env::var("SUBITO_LAYOUT_PRIORITY") {
        config.settings.set_layout_priority(&v);
        sources.env_overrides.push("SUBITO_LAYOUT_PRIORITY".to_string());
    }
    if let Ok(v) = env::var("SUBITO_MARKER_TEXT") {
        config.settings.marker_text = v;
        sources.env_overrides.push("SUBITO_MARKER_TEXT".to_string());
    }

    if let Ok(v) = env::var("SUBITO_LOG_LEVEL") {
        config.settings.log_level = v;
        sources.env_overrides.push("SUBITO_LOG_LEVEL".to_string());
    }
    // Also support RUST_LOG
    if let Ok(v) = env::var("RUST_LOG") {
        config.settings.log_level = v;
        sources.env_overrides.push("RUST_LOG".to_string());
    }

    if let Ok(v) = env::var("SUBITO_MSCORE") {
        config.tools.mscore = v;
        sources.env_overrides.push("SUBITO_MSCORE".to_string());
    }
    if let Ok(v) = env::var("SUBITO_MIDICSV") {
        config.tools.midicsv = v;
        sources.env_overrides.push("SUBITO_MIDICSV".to_string());
    }
    if let Ok(v) = env::var("SUBITO_CSVMIDI") {
        config.tools.csvmidi = v;
        sources.env_overrides.push("SUBITO_CSVMIDI".to_string());
    }
}
