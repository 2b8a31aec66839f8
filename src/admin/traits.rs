//! Core trait for the administrative connection.
//!
//! Defines the `AdminClient` trait that allows both the MongoDB driver and
//! the in-memory mock to be used interchangeably by the bootstrapper.

use crate::error::BootstrapResult;
use crate::plan::{AppUser, MarkerDocument, RoleGrant};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Outcome of an explicit collection creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionOutcome {
    Created,
    AlreadyExists,
}

/// A user as reported by `usersInfo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user: String,
    pub db: String,
    #[serde(default)]
    pub roles: Vec<RoleGrant>,
}

/// Operations the bootstrapper needs from an administrative session.
///
/// Every method names its database explicitly; binding to a database has no
/// server-side effect of its own.
#[async_trait]
pub trait AdminClient: Send + Sync + std::fmt::Debug {
    /// Round-trip to the server; fails fast on connectivity or auth problems.
    async fn ping(&self) -> BootstrapResult<()>;

    /// Explicitly create `collection` in `database`.
    async fn create_collection(
        &self,
        database: &str,
        collection: &str,
    ) -> BootstrapResult<CollectionOutcome>;

    /// Insert the marker and return its `_id` rendered as a string.
    async fn insert_marker(
        &self,
        database: &str,
        collection: &str,
        marker: &MarkerDocument,
    ) -> BootstrapResult<String>;

    /// Look a user up in `database`.
    async fn find_user(&self, database: &str, username: &str)
        -> BootstrapResult<Option<UserRecord>>;

    /// Create the application user in `database`.
    async fn create_user(&self, database: &str, user: &AppUser) -> BootstrapResult<()>;

    /// Names of the databases the server enumerates.
    async fn list_database_names(&self) -> BootstrapResult<Vec<String>>;

    /// Number of documents in `collection`.
    async fn count_documents(&self, database: &str, collection: &str) -> BootstrapResult<u64>;
}
