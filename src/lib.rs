//! MongoDB bootstrap library
//!
//! One-shot provisioning of an application database: force the database into
//! existence with a keepalive marker, then create an application user holding
//! a single role scoped to that database.
//!
//! # Modules
//!
//! - `config`: Configuration management with TOML support and env overrides
//! - `error`: Error taxonomy and exit statuses
//! - `plan`: The values a run writes (database, marker, user, grant)
//! - `admin`: Administrative connection abstraction (MongoDB driver and mock)
//! - `bootstrap`: The provisioning run and post-run verification

pub mod admin;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod plan;

// Re-export commonly used types for convenience
pub use admin::{AdminClient, CollectionOutcome, MockAdminClient, MongoAdminClient, UserRecord};
pub use bootstrap::{BootstrapReport, Bootstrapper, VerifyReport};
pub use error::{BootstrapError, BootstrapResult};
pub use plan::{AppUser, MarkerDocument, ProvisioningPlan, RoleGrant};

// Re-export config types
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
