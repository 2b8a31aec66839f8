//! Bootstrap procedure.
//!
//! `Bootstrapper` runs the provisioning steps strictly in order over an
//! [`AdminClient`]:
//!
//! ```text
//! ping ──> [usersInfo] ──> create keepalive collection ──> insert marker ──> createUser
//! ```
//!
//! Nothing is retried and nothing is rolled back. A failure at any step is
//! returned as-is and whatever earlier steps wrote stays on the server.

mod report;

pub use report::{BootstrapReport, VerifyReport};

use crate::admin::{AdminClient, CollectionOutcome};
use crate::error::{BootstrapError, BootstrapResult};
use crate::plan::{MarkerDocument, ProvisioningPlan};
use chrono::Utc;
use tracing::{debug, info, instrument, warn};

/// Runs the provisioning steps for one [`ProvisioningPlan`].
#[derive(Debug)]
pub struct Bootstrapper<C> {
    client: C,
    plan: ProvisioningPlan,
    preflight_user_check: bool,
}

impl<C: AdminClient> Bootstrapper<C> {
    pub fn new(client: C, plan: ProvisioningPlan) -> Self {
        Self {
            client,
            plan,
            preflight_user_check: true,
        }
    }

    /// Enable or disable the `usersInfo` lookup performed before any write.
    pub fn with_preflight_user_check(mut self, enabled: bool) -> Self {
        self.preflight_user_check = enabled;
        self
    }

    /// Provision the database and the application user.
    ///
    /// # Errors
    ///
    /// - `BootstrapError::Connectivity` / `Authentication` if the ping fails
    /// - `BootstrapError::DuplicateIdentity` if the user already exists. With
    ///   the preflight check on (the default) this is raised by the `usersInfo`
    ///   lookup before any write, which needs `viewUser` on the target
    ///   database. With it off, `createUser` raises it after the marker is
    ///   written.
    /// - `BootstrapError::Unauthorized` if the session lacks privilege
    #[instrument(
        skip(self),
        fields(
            database = %self.plan.database_name(),
            username = %self.plan.username(),
        )
    )]
    pub async fn run(&self) -> BootstrapResult<BootstrapReport> {
        let started_at = Utc::now();
        let database = self.plan.database_name();
        let collection = self.plan.keepalive_collection();

        self.client.ping().await?;
        debug!("administrative connection established");

        if self.preflight_user_check {
            if let Some(existing) = self.client.find_user(database, self.plan.username()).await? {
                warn!(roles = ?existing.roles, "application user already provisioned");
                return Err(BootstrapError::DuplicateIdentity {
                    username: existing.user,
                    database: database.to_string(),
                });
            }
        }

        let outcome = self.client.create_collection(database, collection).await?;
        match outcome {
            CollectionOutcome::Created => debug!(collection, "keepalive collection created"),
            CollectionOutcome::AlreadyExists => {
                debug!(collection, "keepalive collection already present")
            }
        }

        let marker = MarkerDocument::now();
        let marker_id = self
            .client
            .insert_marker(database, collection, &marker)
            .await?;
        info!(collection, marker_id = %marker_id, "keepalive marker written");

        let user = self.plan.app_user();
        self.client.create_user(database, &user).await?;
        info!(role = %user.grant.role, "application user created");

        Ok(BootstrapReport {
            database_name: database.to_string(),
            collection: collection.to_string(),
            collection_outcome: outcome,
            marker_id,
            marker_created_at: marker.created_at,
            username: user.username,
            role_grant: user.grant,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Inspect the server for the effects of an earlier run without writing.
    #[instrument(skip(self), fields(database = %self.plan.database_name()))]
    pub async fn verify(&self) -> BootstrapResult<VerifyReport> {
        let database = self.plan.database_name();
        let collection = self.plan.keepalive_collection();

        self.client.ping().await?;

        let database_listed = self
            .client
            .list_database_names()
            .await?
            .iter()
            .any(|name| name == database);
        let marker_count = self.client.count_documents(database, collection).await?;
        let role_grants = self
            .client
            .find_user(database, self.plan.username())
            .await?
            .map(|record| record.roles)
            .unwrap_or_default();

        let report = VerifyReport {
            database_name: database.to_string(),
            collection: collection.to_string(),
            username: self.plan.username().to_string(),
            expected_grant: self.plan.role_grant(),
            database_listed,
            marker_count,
            role_grants,
        };
        info!(
            provisioned = report.is_provisioned(),
            database_listed,
            marker_count,
            grants = report.role_grants.len(),
            "verification finished"
        );
        Ok(report)
    }
}
