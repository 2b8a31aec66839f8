//! Configuration schema definitions.
//!
//! This module defines the structure of the configuration file using serde.
//! Every section has defaults, so an empty file (or no file) yields the stock
//! `tributaria` / `appuser` provisioning.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Placeholder written in place of secrets in debug and redacted output.
pub const REDACTED: &str = "***";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Administrative connection.
    pub server: ServerConfig,
    /// Database to provision.
    pub target: TargetConfig,
    /// Application user to create.
    pub app_user: AppUserConfig,
    /// Run-time switches for the bootstrap procedure.
    pub bootstrap: BootstrapConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Config {
    /// Copy of the configuration with every secret replaced by [`REDACTED`].
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.server.uri = self.server.redacted_uri();
        if copy.server.admin_password.is_some() {
            copy.server.admin_password = Some(Secret::from(REDACTED));
        }
        copy.app_user.password = Secret::from(REDACTED);
        copy
    }
}

/// A string that never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// The plaintext value, for handing to the driver.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Administrative connection section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// MongoDB connection string
    pub uri: String,
    /// Admin identity; overrides credentials embedded in `uri` when set
    pub admin_username: Option<String>,
    /// Admin credential
    pub admin_password: Option<Secret>,
    /// Authentication database for the admin identity
    pub auth_source: String,
    /// Application name reported to the server
    pub app_name: String,
    /// Server selection timeout in milliseconds
    pub server_selection_timeout_ms: u64,
    /// Connect timeout in milliseconds
    pub connect_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017".to_string(),
            admin_username: None,
            admin_password: None,
            auth_source: "admin".to_string(),
            app_name: "mongo_bootstrap".to_string(),
            server_selection_timeout_ms: 10_000,
            connect_timeout_ms: 10_000,
        }
    }
}

impl ServerConfig {
    /// The connection string with any embedded `user:password@` replaced.
    pub fn redacted_uri(&self) -> String {
        let Some(scheme_end) = self.uri.find("://").map(|i| i + 3) else {
            return self.uri.clone();
        };
        let rest = &self.uri[scheme_end..];
        let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
        match rest[..authority_end].rfind('@') {
            Some(at) => format!("{}{}@{}", &self.uri[..scheme_end], REDACTED, &rest[at + 1..]),
            None => self.uri.clone(),
        }
    }

    pub fn server_selection_timeout(&self) -> Duration {
        Duration::from_millis(self.server_selection_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Target database section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Database to create
    pub database_name: String,
    /// Collection receiving the keepalive marker
    pub keepalive_collection: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            database_name: "tributaria".to_string(),
            keepalive_collection: "keepalive_init".to_string(),
        }
    }
}

/// Application user section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppUserConfig {
    pub username: String,
    pub password: Secret,
    /// Role granted on the target database
    pub role: String,
}

impl Default for AppUserConfig {
    fn default() -> Self {
        Self {
            username: "appuser".to_string(),
            password: Secret::from("apppass"),
            role: "readWrite".to_string(),
        }
    }
}

/// Bootstrap procedure switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Look the application user up before any write and fail early if it exists
    pub preflight_user_check: bool,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            preflight_user_check: true,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format with colors
    #[default]
    Pretty,
    /// Compact format
    Compact,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(format!("unknown log format '{other}', expected pretty, compact or json")),
        }
    }
}
