//! Utility functions for live server testing.

use mongo_bootstrap::config::ServerConfig;
use mongo_bootstrap::{MongoAdminClient, ProvisioningPlan};
use mongodb::bson::doc;
use mongodb::Client;
use std::env;
use std::time::{SystemTime, UNIX_EPOCH};

/// Admin connection string for the test server.
pub fn test_uri() -> Option<String> {
    env::var("MONGO_BOOTSTRAP_TEST_URI").ok()
}

pub fn server_config(uri: &str) -> ServerConfig {
    ServerConfig {
        uri: uri.to_string(),
        server_selection_timeout_ms: 5_000,
        connect_timeout_ms: 5_000,
        ..ServerConfig::default()
    }
}

pub async fn admin(uri: &str) -> MongoAdminClient {
    MongoAdminClient::connect(&server_config(uri))
        .await
        .expect("admin client")
}

/// A database/user pair that no other test run uses.
pub fn unique_plan(tag: &str) -> ProvisioningPlan {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    ProvisioningPlan::new(
        format!("boot_{tag}_{nanos}"),
        format!("user_{tag}_{nanos}"),
        "test-pass",
    )
}

/// Drop the plan's user and database, ignoring "not found" failures.
pub async fn cleanup(client: &Client, database: &str, username: &str) {
    let db = client.database(database);
    let _ = db.run_command(doc! { "dropUser": username }).await;
    let _ = db.drop().await;
}

/// Connect as the application user, authenticating against its database.
pub async fn app_client(uri: &str, database: &str, username: &str, password: &str) -> Client {
    let mut options = mongodb::options::ClientOptions::parse(uri)
        .await
        .expect("parse test uri");
    let mut credential = mongodb::options::Credential::default();
    credential.username = Some(username.to_string());
    credential.password = Some(password.to_string());
    credential.source = Some(database.to_string());
    options.credential = Some(credential);
    Client::with_options(options).expect("app client")
}
