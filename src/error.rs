//! Bootstrap error taxonomy.
//!
//! Driver failures are classified, never retried or suppressed, so that the
//! process exit status tells an orchestrator what kind of failure happened.

use crate::config::ConfigError;
use mongodb::error::{ErrorKind, WriteFailure};
use std::process::ExitCode;
use thiserror::Error;

/// `createUser` on an existing identity (MongoDB 4.4+).
pub const CODE_USER_EXISTS: i32 = 51003;
/// Duplicate key, reported for existing users by older servers.
pub const CODE_DUPLICATE_KEY: i32 = 11000;
/// `Unauthorized`
pub const CODE_UNAUTHORIZED: i32 = 13;
/// `AuthenticationFailed`
pub const CODE_AUTHENTICATION_FAILED: i32 = 18;
/// `NamespaceExists`: `create` on a collection that is already there.
pub const CODE_NAMESPACE_EXISTS: i32 = 48;

/// Unified error type for a bootstrap run.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The administrative endpoint cannot be reached.
    #[error("cannot reach MongoDB: {0}")]
    Connectivity(String),

    /// The administrative credentials were rejected.
    #[error("authentication to MongoDB failed: {0}")]
    Authentication(String),

    /// The application user already exists.
    #[error("user \"{username}\" already exists in database \"{database}\"")]
    DuplicateIdentity { username: String, database: String },

    /// The administrative connection lacks privilege for the operation.
    #[error("not authorized: {0}")]
    Unauthorized(String),

    /// Any other server or driver failure.
    #[error("MongoDB error: {0}")]
    Driver(#[source] mongodb::error::Error),

    /// A server reply did not have the expected shape.
    #[error("unexpected server reply: {0}")]
    Decode(#[from] mongodb::bson::de::Error),
}

/// Coarse classification of a server command failure code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerCodeClass {
    DuplicateIdentity,
    Unauthorized,
    AuthenticationFailed,
    NamespaceExists,
    Other,
}

/// Classify a MongoDB server error code.
pub fn classify_server_code(code: i32) -> ServerCodeClass {
    match code {
        CODE_USER_EXISTS | CODE_DUPLICATE_KEY => ServerCodeClass::DuplicateIdentity,
        CODE_UNAUTHORIZED => ServerCodeClass::Unauthorized,
        CODE_AUTHENTICATION_FAILED => ServerCodeClass::AuthenticationFailed,
        CODE_NAMESPACE_EXISTS => ServerCodeClass::NamespaceExists,
        _ => ServerCodeClass::Other,
    }
}

/// Server error code carried by a command or write failure, if any.
pub fn server_code(err: &mongodb::error::Error) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Command(command) => Some(command.code),
        ErrorKind::Write(WriteFailure::WriteError(write)) => Some(write.code),
        ErrorKind::Write(WriteFailure::WriteConcernError(concern)) => Some(concern.code),
        _ => None,
    }
}

impl From<mongodb::error::Error> for BootstrapError {
    fn from(err: mongodb::error::Error) -> Self {
        match err.kind.as_ref() {
            ErrorKind::ServerSelection { .. }
            | ErrorKind::Io(_)
            | ErrorKind::DnsResolve { .. }
            | ErrorKind::ConnectionPoolCleared { .. } => Self::Connectivity(err.to_string()),
            ErrorKind::Authentication { .. } => Self::Authentication(err.to_string()),
            _ => match server_code(&err).map(classify_server_code) {
                Some(ServerCodeClass::Unauthorized) => Self::Unauthorized(err.to_string()),
                Some(ServerCodeClass::AuthenticationFailed) => {
                    Self::Authentication(err.to_string())
                }
                _ => Self::Driver(err),
            },
        }
    }
}

impl BootstrapError {
    /// Short machine-readable name of the error class, used as a log field.
    pub fn class(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Connectivity(_) => "connectivity",
            Self::Authentication(_) => "authentication",
            Self::DuplicateIdentity { .. } => "duplicate_identity",
            Self::Unauthorized(_) => "unauthorized",
            Self::Driver(_) => "driver",
            Self::Decode(_) => "decode",
        }
    }

    /// Exit status for this error, following the BSD `sysexits` convention.
    pub fn exit_status(&self) -> u8 {
        match self {
            // EX_CONFIG
            Self::Config(_) => 78,
            // EX_UNAVAILABLE
            Self::Connectivity(_) => 69,
            // EX_NOPERM
            Self::Authentication(_) | Self::Unauthorized(_) => 77,
            // EX_CANTCREAT
            Self::DuplicateIdentity { .. } => 73,
            // EX_SOFTWARE
            Self::Driver(_) | Self::Decode(_) => 70,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_status())
    }
}

/// Result type for bootstrap operations.
pub type BootstrapResult<T> = Result<T, BootstrapError>;
