//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::{Config, Secret};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "MONGO_BOOTSTRAP";

/// Config file name inside the platform config directory
const CONFIG_FILE_NAME: &str = "config.toml";

/// Config file name looked up in the current directory
const LOCAL_CONFIG_FILE_NAME: &str = "mongo_bootstrap.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "MONGO_BOOTSTRAP_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `MONGO_BOOTSTRAP_CONFIG` environment variable (explicit path, must exist)
    /// 2. `./mongo_bootstrap.toml` (current directory)
    /// 3. `<platform config dir>/mongo_bootstrap/config.toml`
    /// 4. Built-in defaults (no file required)
    ///
    /// Environment variables override any config file values.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path()?;

        let mut config = if let Some(ref path) = config_path {
            load_from_file(path)?
        } else {
            Config::default()
        };

        apply_env_overrides(&mut config)?;

        Ok(Self { config_path, config })
    }

    /// Load configuration from a specific file path.
    ///
    /// Unlike [`ConfigLoader::load`], a missing file is an error here.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file).
    pub fn with_defaults() -> ConfigResult<Self> {
        let mut config = Config::default();
        apply_env_overrides(&mut config)?;

        Ok(Self {
            config_path: None,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get a mutable reference to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Render the configuration as TOML with secrets redacted.
    pub fn to_redacted_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(&self.config.redacted())?)
    }
}

/// Resolve the configuration file path using standard locations.
///
/// A path named by `MONGO_BOOTSTRAP_CONFIG` that does not exist is an error,
/// the same as a missing `--config` file.
pub fn resolve_config_path() -> ConfigResult<Option<PathBuf>> {
    // 1. Explicit environment variable
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }
        return Ok(Some(path));
    }

    // 2. Current directory
    let cwd_config = PathBuf::from(LOCAL_CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Ok(Some(cwd_config));
    }

    // 3. Platform config directory
    Ok(get_default_config_path().filter(|path| path.exists()))
}

/// Get the platform config directory for this tool.
pub fn get_default_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "mongo_bootstrap").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the platform config file path for this tool.
pub fn get_default_config_path() -> Option<PathBuf> {
    get_default_config_dir().map(|d| d.join(CONFIG_FILE_NAME))
}

/// Load configuration from a file.
fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(ConfigError::ParseError)
}

/// Apply process environment overrides to the configuration.
///
/// Variables follow the pattern `MONGO_BOOTSTRAP_<SECTION>_<KEY>`, for example
/// `MONGO_BOOTSTRAP_TARGET_DATABASE_NAME=tributaria`. The root credential
/// variables of the official MongoDB container image are accepted as
/// fallbacks for the admin login.
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    apply_overrides_from(config, |key| std::env::var(key).ok())
}

/// Apply overrides read through `lookup`.
///
/// For the admin login the prefixed variable wins over the image variable.
pub(crate) fn apply_overrides_from<F>(config: &mut Config, lookup: F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| -> String { format!("{ENV_PREFIX}_{key}") };
    let first = |keys: &[&str]| keys.iter().find_map(|k| lookup(*k));

    // Server overrides
    if let Some(val) = lookup(&var("SERVER_URI")) {
        config.server.uri = val;
    }
    if let Some(val) = first(&[var("SERVER_ADMIN_USERNAME").as_str(), "MONGO_INITDB_ROOT_USERNAME"]) {
        config.server.admin_username = Some(val);
    }
    if let Some(val) = first(&[var("SERVER_ADMIN_PASSWORD").as_str(), "MONGO_INITDB_ROOT_PASSWORD"]) {
        config.server.admin_password = Some(Secret::from(val));
    }
    if let Some(val) = lookup(&var("SERVER_AUTH_SOURCE")) {
        config.server.auth_source = val;
    }

    // Target overrides
    if let Some(val) = lookup(&var("TARGET_DATABASE_NAME")) {
        config.target.database_name = val;
    }
    if let Some(val) = lookup(&var("TARGET_KEEPALIVE_COLLECTION")) {
        config.target.keepalive_collection = val;
    }

    // App user overrides
    if let Some(val) = lookup(&var("APP_USER_USERNAME")) {
        config.app_user.username = val;
    }
    if let Some(val) = lookup(&var("APP_USER_PASSWORD")) {
        config.app_user.password = Secret::from(val);
    }

    // Bootstrap overrides
    let key = var("BOOTSTRAP_PREFLIGHT_USER_CHECK");
    if let Some(val) = lookup(&key) {
        config.bootstrap.preflight_user_check = parse_bool(&val)
            .ok_or_else(|| ConfigError::env_parse(&key, "expected true/false or 1/0"))?;
    }

    // Logging overrides
    if let Some(val) = lookup(&var("LOGGING_LEVEL")) {
        config.logging.level = val;
    }
    let key = var("LOGGING_FORMAT");
    if let Some(val) = lookup(&key) {
        config.logging.format = val
            .parse()
            .map_err(|message: String| ConfigError::env_parse(&key, message))?;
    }

    Ok(())
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
