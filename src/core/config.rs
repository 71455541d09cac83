//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.lectio/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{LevelFilter, debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::window::DEFAULT_BATCH_SIZE;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LectioConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub paging: PagingConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub corpus_path: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PagingConfig {
    pub batch_size: Option<usize>,
    pub initial_chapters: Option<usize>,
    pub jump_lookback: Option<usize>,
    pub jump_window: Option<usize>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_INITIAL_CHAPTERS: usize = 3;
pub const DEFAULT_JUMP_LOOKBACK: usize = 2;
pub const DEFAULT_JUMP_WINDOW: usize = 5;
pub const DEFAULT_CORPUS_PATH: &str = "bible.json";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub corpus_path: PathBuf,
    pub log_level: LevelFilter,
    pub batch_size: usize,
    pub initial_chapters: usize,
    pub jump_lookback: usize,
    /// Always at least `jump_lookback + 1` so the target lands in the window.
    pub jump_window: usize,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.lectio/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".lectio").join("config.toml"))
}

/// Load config from `~/.lectio/config.toml`.
pub fn load_config() -> Result<LectioConfig, ConfigError> {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => {
            warn!("Could not determine home directory, using default config");
            Ok(LectioConfig::default())
        }
    }
}

/// Load config from an explicit path.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `LectioConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config_from(path: &Path) -> Result<LectioConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(LectioConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: LectioConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# Lectio Configuration
# All settings are optional, defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# corpus_path = "bible.json"         # Or set LECTIO_CORPUS env var
# log_level = "debug"                # "off", "error", "warn", "info", "debug", "trace"

# [paging]
# batch_size = 3                     # Chapters per load-more / load-previous
# initial_chapters = 3               # Chapters loaded when a session starts
# jump_lookback = 2                  # Chapters kept above a jump target
# jump_window = 5                    # Chapters loaded by a jump
"#;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.trim().to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
///
/// `cli_corpus` comes from the `--corpus` flag (None = not specified).
pub fn resolve(config: &LectioConfig, cli_corpus: Option<&Path>) -> ResolvedConfig {
    // Corpus: CLI → env → config → default
    let corpus_path = cli_corpus
        .map(Path::to_path_buf)
        .or_else(|| std::env::var("LECTIO_CORPUS").ok().map(PathBuf::from))
        .or_else(|| config.general.corpus_path.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CORPUS_PATH));

    let log_level = match config.general.log_level.as_deref() {
        Some(level) => parse_level(level).unwrap_or_else(|| {
            warn!("Unknown log level '{level}', using debug");
            LevelFilter::Debug
        }),
        None => LevelFilter::Debug,
    };

    // Batch size: env → config → default
    let batch_size = std::env::var("LECTIO_BATCH_SIZE")
        .ok()
        .and_then(|s| s.parse().ok())
        .or(config.paging.batch_size)
        .unwrap_or(DEFAULT_BATCH_SIZE)
        .max(1);

    let jump_lookback = config
        .paging
        .jump_lookback
        .unwrap_or(DEFAULT_JUMP_LOOKBACK);
    let jump_window = config
        .paging
        .jump_window
        .unwrap_or(DEFAULT_JUMP_WINDOW)
        .max(jump_lookback + 1);

    ResolvedConfig {
        corpus_path,
        log_level,
        batch_size,
        initial_chapters: config
            .paging
            .initial_chapters
            .unwrap_or(DEFAULT_INITIAL_CHAPTERS),
        jump_lookback,
        jump_window,
    }
}
