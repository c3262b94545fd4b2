// Configuration loading and validation (config/spirit11.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use spirit11_cricket::squad::{Squad, INITIAL_BUDGET, SQUAD_SIZE};

/// Name of the single config file inside `config/` and `defaults/`.
pub const CONFIG_FILE: &str = "spirit11.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub feed: FeedConfig,
    pub db_path: String,
    pub game: GameConfig,
}

/// Raw deserialization target for the whole file.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    feed: FeedConfig,
    database: DatabaseSection,
    #[serde(default)]
    game: GameConfig,
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    path: String,
}

/// Where the player feed comes from. `url` takes precedence over `path`.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Reject malformed rows instead of dropping them.
    #[serde(default)]
    pub strict: bool,
}

impl FeedConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    pub initial_budget: i64,
    pub squad_size: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            initial_budget: INITIAL_BUDGET,
            squad_size: SQUAD_SIZE,
        }
    }
}

impl GameConfig {
    /// Empty squad under this game's budget and size rules.
    pub fn new_squad(&self) -> Squad {
        Squad::with_capacity(self.initial_budget, self.squad_size)
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/spirit11.toml` relative to `base_dir`.
///
/// Does not copy defaults; prefer `load_config()` for that.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = std::fs::read_to_string(&path).map_err(|_| ConfigError::FileNotFound {
        path: path.clone(),
    })?;
    let file: ConfigFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    let config = Config {
        feed: file.feed,
        db_path: file.database.path,
        game: file.game,
    };

    validate(&config)?;

    Ok(config)
}

/// Seed `config/spirit11.toml` from `defaults/spirit11.toml` when it does
/// not exist yet. Returns the path written, or `None` when a config was
/// already in place. An existing config is never overwritten.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let target = base_dir.join("config").join(CONFIG_FILE);
    if target.exists() {
        return Ok(None);
    }

    let source = base_dir.join("defaults").join(CONFIG_FILE);
    let defaults = std::fs::read_to_string(&source).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!(
            "no {} and no usable default at {}: {e}",
            target.display(),
            source.display()
        ),
    })?;

    let copy_err = |e: std::io::Error| ConfigError::DefaultsCopyError {
        message: format!("failed to write {}: {e}", target.display()),
    };
    if let Some(dir) = target.parent() {
        std::fs::create_dir_all(dir).map_err(copy_err)?;
    }
    std::fs::write(&target, defaults).map_err(copy_err)?;

    Ok(Some(target))
}

/// Load config relative to the current working directory, seeding it from
/// defaults first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    if let Some(path) = ensure_config_file(&cwd)? {
        info!("Created {} from defaults", path.display());
    }
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    let feed = &config.feed;
    match (&feed.url, &feed.path) {
        (None, None) => return Err(invalid("feed", "one of `url` or `path` must be set")),
        (Some(url), _) if !(url.starts_with("http://") || url.starts_with("https://")) => {
            return Err(invalid("feed.url", format!("must be an http(s) URL, got {url}")));
        }
        (None, Some(path)) if path.trim().is_empty() => {
            return Err(invalid("feed.path", "must not be empty"));
        }
        _ => {}
    }

    if feed.timeout_secs == 0 {
        return Err(invalid("feed.timeout_secs", "must be greater than 0"));
    }

    if config.db_path.trim().is_empty() {
        return Err(invalid("database.path", "must not be empty"));
    }

    if config.game.initial_budget <= 0 {
        return Err(invalid(
            "game.initial_budget",
            format!("must be > 0, got {}", config.game.initial_budget),
        ));
    }

    if config.game.squad_size == 0 {
        return Err(invalid("game.squad_size", "must be greater than 0"));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
