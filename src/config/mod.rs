//! Configuration module for mongo_bootstrap.
//!
//! This module provides TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `MONGO_BOOTSTRAP_CONFIG` environment variable (explicit path)
//! 2. `./mongo_bootstrap.toml` (current directory)
//! 3. `~/.config/mongo_bootstrap/config.toml` (or the platform equivalent)
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! Any provisioning value can be overridden via environment variables.
//! The pattern is: `MONGO_BOOTSTRAP_<SECTION>_<KEY>`
//!
//! Examples:
//! - `MONGO_BOOTSTRAP_SERVER_URI=mongodb://mongo:27017`
//! - `MONGO_BOOTSTRAP_TARGET_DATABASE_NAME=tributaria`
//! - `MONGO_BOOTSTRAP_APP_USER_PASSWORD=apppass`
//!
//! The official image's `MONGO_INITDB_ROOT_USERNAME` and
//! `MONGO_INITDB_ROOT_PASSWORD` are accepted as fallbacks for the admin login.
//!
//! # Example
//!
//! ```rust,no_run
//! use mongo_bootstrap::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load()?;
//! let config = loader.config();
//! println!("Target database: {}", config.target.database_name);
//! # Ok::<(), mongo_bootstrap::config::ConfigError>(())
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    get_default_config_dir, get_default_config_path, resolve_config_path, ConfigLoader,
};
pub use schema::{
    AppUserConfig, BootstrapConfig, Config, LogFormat, LoggingConfig, Secret, ServerConfig,
    TargetConfig, REDACTED,
};
