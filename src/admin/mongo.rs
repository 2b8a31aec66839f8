//! `AdminClient` backed by the official MongoDB driver.

use super::traits::{AdminClient, CollectionOutcome, UserRecord};
use crate::config::{ConfigError, ServerConfig};
use crate::error::{classify_server_code, server_code, BootstrapError, BootstrapResult, ServerCodeClass};
use crate::plan::{AppUser, MarkerDocument};
use async_trait::async_trait;
use mongodb::bson::{self, doc, Document};
use mongodb::error::ErrorKind;
use mongodb::options::{ClientOptions, Credential};
use mongodb::Client;
use serde::Deserialize;
use tracing::debug;

/// Reply of the `usersInfo` command.
#[derive(Debug, Deserialize)]
struct UsersInfoReply {
    #[serde(default)]
    users: Vec<UserRecord>,
}

/// Administrative session over a `mongodb::Client`.
///
/// The driver connects lazily; [`AdminClient::ping`] is the first round-trip.
#[derive(Debug, Clone)]
pub struct MongoAdminClient {
    client: Client,
}

impl MongoAdminClient {
    /// Build a client from the `[server]` configuration section.
    pub async fn connect(server: &ServerConfig) -> BootstrapResult<Self> {
        let options = client_options(server).await?;
        debug!(
            hosts = ?options.hosts,
            app_name = ?options.app_name,
            explicit_credential = options.credential.is_some(),
            "mongodb client options resolved"
        );
        let client = Client::with_options(options)?;
        Ok(Self { client })
    }

    /// Wrap an existing driver client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Parse the connection string and layer the configured settings on top.
///
/// A connection string the driver rejects is a configuration error.
pub async fn client_options(server: &ServerConfig) -> BootstrapResult<ClientOptions> {
    let mut options = ClientOptions::parse(server.uri.as_str())
        .await
        .map_err(|err| match err.kind.as_ref() {
            ErrorKind::InvalidArgument { message, .. } => {
                BootstrapError::Config(ConfigError::invalid_value("server.uri", message.clone()))
            }
            _ => err.into(),
        })?;
    options.app_name = Some(server.app_name.clone());
    options.server_selection_timeout = Some(server.server_selection_timeout());
    options.connect_timeout = Some(server.connect_timeout());

    if let Some(username) = &server.admin_username {
        let mut credential = Credential::default();
        credential.username = Some(username.clone());
        credential.password = server
            .admin_password
            .as_ref()
            .map(|secret| secret.expose().to_string());
        credential.source = Some(server.auth_source.clone());
        options.credential = Some(credential);
    }

    Ok(options)
}

#[async_trait]
impl AdminClient for MongoAdminClient {
    async fn ping(&self) -> BootstrapResult<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    async fn create_collection(
        &self,
        database: &str,
        collection: &str,
    ) -> BootstrapResult<CollectionOutcome> {
        match self
            .client
            .database(database)
            .create_collection(collection)
            .await
        {
            Ok(()) => Ok(CollectionOutcome::Created),
            Err(err)
                if server_code(&err).map(classify_server_code)
                    == Some(ServerCodeClass::NamespaceExists) =>
            {
                Ok(CollectionOutcome::AlreadyExists)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn insert_marker(
        &self,
        database: &str,
        collection: &str,
        marker: &MarkerDocument,
    ) -> BootstrapResult<String> {
        let result = self
            .client
            .database(database)
            .collection::<Document>(collection)
            .insert_one(marker.to_document())
            .await?;
        Ok(match result.inserted_id.as_object_id() {
            Some(oid) => oid.to_hex(),
            None => result.inserted_id.to_string(),
        })
    }

    async fn find_user(
        &self,
        database: &str,
        username: &str,
    ) -> BootstrapResult<Option<UserRecord>> {
        let reply = self
            .client
            .database(database)
            .run_command(doc! { "usersInfo": username })
            .await?;
        let reply: UsersInfoReply = bson::from_document(reply)?;
        Ok(reply.users.into_iter().find(|u| u.user == username))
    }

    async fn create_user(&self, database: &str, user: &AppUser) -> BootstrapResult<()> {
        self.client
            .database(database)
            .run_command(user.create_user_command())
            .await
            .map_err(|err| match server_code(&err).map(classify_server_code) {
                Some(ServerCodeClass::DuplicateIdentity) => BootstrapError::DuplicateIdentity {
                    username: user.username.clone(),
                    database: database.to_string(),
                },
                _ => err.into(),
            })?;
        Ok(())
    }

    async fn list_database_names(&self) -> BootstrapResult<Vec<String>> {
        Ok(self.client.list_database_names().await?)
    }

    async fn count_documents(&self, database: &str, collection: &str) -> BootstrapResult<u64> {
        Ok(self
            .client
            .database(database)
            .collection::<Document>(collection)
            .count_documents(doc! {})
            .await?)
    }
}
