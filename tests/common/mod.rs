//! Shared test utilities for mongo_bootstrap tests.
//!
//! This module provides common test infrastructure including:
//! - The literal `tributaria` / `appuser` / `apppass` plan
//! - Bootstrappers wired to a shared `MockAdminClient`
//! - Assertions over the mock server's final state

#![allow(dead_code)]

use mongo_bootstrap::admin::MockAdminClient;
use mongo_bootstrap::{Bootstrapper, ProvisioningPlan, RoleGrant, UserRecord};

pub const DB_NAME: &str = "tributaria";
pub const APP_USER: &str = "appuser";
pub const APP_PASS: &str = "apppass";
pub const KEEPALIVE: &str = "keepalive_init";

/// The plan used by the container entrypoint.
pub fn literal_plan() -> ProvisioningPlan {
    ProvisioningPlan::new(DB_NAME, APP_USER, APP_PASS)
}

pub fn read_write(db: &str) -> RoleGrant {
    RoleGrant {
        role: "readWrite".to_string(),
        db: db.to_string(),
    }
}

/// A fresh mock server plus a bootstrapper that shares its state.
pub fn fresh_bootstrapper() -> (MockAdminClient, Bootstrapper<MockAdminClient>) {
    let server = MockAdminClient::new();
    let bootstrapper = Bootstrapper::new(server.clone(), literal_plan());
    (server, bootstrapper)
}

/// Another bootstrapper against the same mock server.
pub fn bootstrapper_for(server: &MockAdminClient) -> Bootstrapper<MockAdminClient> {
    Bootstrapper::new(server.clone(), literal_plan())
}

/// Seed the application user as if an earlier run had created it.
pub fn seed_app_user(server: &MockAdminClient) {
    server.seed_user(
        DB_NAME,
        UserRecord {
            user: APP_USER.to_string(),
            db: DB_NAME.to_string(),
            roles: vec![read_write(DB_NAME)],
        },
    );
}

/// Assert that nothing at all was created on the mock server.
pub fn assert_untouched(server: &MockAdminClient) {
    assert!(
        server.database(DB_NAME).is_none(),
        "expected no trace of {DB_NAME}, found {:?}",
        server.database(DB_NAME)
    );
}
