//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$PST2MD_CONFIG` (environment variable)
//! 2. `~/.config/pst2md/config.toml` (Linux/macOS)
//!    `%APPDATA%\pst2md\config.toml` (Windows)
//! 3. Built-in defaults

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Output naming and layout.
    pub output: OutputConfig,
    /// Markdown rendering.
    pub markdown: MarkdownConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
    /// Override directory for the log file.
    pub log_dir: Option<PathBuf>,
    /// Number of PST files processed in parallel when `--workers` is absent.
    pub workers: usize,
}

/// Output naming and layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output directory used when `--output` is absent (default: next to each PST).
    pub default_dir: Option<PathBuf>,
    /// Maximum length of a sanitized file or folder name, in characters.
    pub max_filename_length: usize,
    /// `strftime` format of the date prefix in file names.
    pub filename_date_format: String,
    /// `strftime` format of the date shown in the metadata table.
    pub display_date_format: String,
}

/// Markdown rendering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    /// Use the plain-text body instead of converting HTML when both exist.
    pub prefer_plain_text: bool,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            log_dir: None,
            workers: 1,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_dir: None,
            max_filename_length: 100,
            filename_date_format: "%Y-%m-%d".to_string(),
            display_date_format: "%Y-%m-%d %H:%M:%S".to_string(),
        }
    }
}

// ── Load ───────────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Config>(&contents) {
                    Ok(cfg) => {
                        tracing::info!(path = %path.display(), "Loaded config");
                        return cfg;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to parse config, using defaults"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read config file, using defaults"
                    );
                }
            }
        }
    }
    Config::default()
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("PST2MD_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    dirs::config_dir().map(|d| d.join("pst2md").join("config.toml"))
}

/// Return the directory holding the log file.
pub fn log_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.log_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pst2md")
}
