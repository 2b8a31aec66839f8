use crate::admin::CollectionOutcome;
use crate::plan::RoleGrant;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Result of a successful bootstrap run.
#[derive(Debug, Clone, Serialize)]
pub struct BootstrapReport {
    pub database_name: String,
    pub collection: String,
    pub collection_outcome: CollectionOutcome,
    pub marker_id: String,
    pub marker_created_at: DateTime<Utc>,
    pub username: String,
    pub role_grant: RoleGrant,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// What `verify` found on the server.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    pub database_name: String,
    pub collection: String,
    pub username: String,
    pub expected_grant: RoleGrant,
    pub database_listed: bool,
    pub marker_count: u64,
    pub role_grants: Vec<RoleGrant>,
}

impl VerifyReport {
    /// Database listed, at least one marker, and exactly the expected grant.
    pub fn is_provisioned(&self) -> bool {
        self.database_listed
            && self.marker_count >= 1
            && self.role_grants.len() == 1
            && self.role_grants[0] == self.expected_grant
    }

    /// Human-readable problems, empty when provisioned.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if !self.database_listed {
            problems.push(format!("database '{}' is not listed", self.database_name));
        }
        if self.marker_count == 0 {
            problems.push(format!("collection '{}' holds no marker", self.collection));
        }
        match self.role_grants.as_slice() {
            [] => problems.push(format!("user '{}' has no grants", self.username)),
            [grant] if *grant == self.expected_grant => {}
            grants => problems.push(format!(
                "user '{}' has grants {:?}, expected only {}@{}",
                self.username, grants, self.expected_grant.role, self.expected_grant.db
            )),
        }
        problems
    }
}
