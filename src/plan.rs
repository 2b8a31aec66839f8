//! Provisioning values derived from configuration.
//!
//! The database name is stored once in [`ProvisioningPlan`]; the marker write
//! and the user's role grant both read it from there, so the two can never
//! disagree.

use crate::config::{Config, Secret};
use chrono::{DateTime, Utc};
use mongodb::bson::{self, doc, Document};
use serde::{Deserialize, Serialize};

/// Authorization grant: one role scoped to one database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    pub role: String,
    pub db: String,
}

impl RoleGrant {
    pub fn to_document(&self) -> Document {
        doc! { "role": self.role.as_str(), "db": self.db.as_str() }
    }
}

/// The keepalive marker inserted to force physical database allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerDocument {
    pub created_at: DateTime<Utc>,
}

impl MarkerDocument {
    pub fn now() -> Self {
        Self {
            created_at: Utc::now(),
        }
    }

    /// BSON form: `{ createdAt: <datetime> }`.
    pub fn to_document(&self) -> Document {
        doc! {
            "createdAt": bson::DateTime::from_millis(self.created_at.timestamp_millis()),
        }
    }
}

/// Application user to create.
#[derive(Debug, Clone)]
pub struct AppUser {
    pub username: String,
    pub password: Secret,
    pub grant: RoleGrant,
}

impl AppUser {
    /// The `createUser` command issued against the target database.
    pub fn create_user_command(&self) -> Document {
        doc! {
            "createUser": self.username.as_str(),
            "pwd": self.password.expose(),
            "roles": [self.grant.to_document()],
        }
    }
}

/// Everything one bootstrap run writes.
#[derive(Debug, Clone)]
pub struct ProvisioningPlan {
    database_name: String,
    keepalive_collection: String,
    username: String,
    password: Secret,
    role: String,
}

impl ProvisioningPlan {
    pub fn new(
        database_name: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<Secret>,
    ) -> Self {
        let defaults = Config::default();
        Self {
            database_name: database_name.into(),
            keepalive_collection: defaults.target.keepalive_collection,
            username: username.into(),
            password: password.into(),
            role: defaults.app_user.role,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            database_name: config.target.database_name.clone(),
            keepalive_collection: config.target.keepalive_collection.clone(),
            username: config.app_user.username.clone(),
            password: config.app_user.password.clone(),
            role: config.app_user.role.clone(),
        }
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    pub fn keepalive_collection(&self) -> &str {
        &self.keepalive_collection
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// The single grant given to the application user.
    pub fn role_grant(&self) -> RoleGrant {
        RoleGrant {
            role: self.role.clone(),
            db: self.database_name.clone(),
        }
    }

    pub fn app_user(&self) -> AppUser {
        AppUser {
            username: self.username.clone(),
            password: self.password.clone(),
            grant: self.role_grant(),
        }
    }
}
