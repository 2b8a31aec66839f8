//! In-memory `AdminClient` for testing.
//!
//! `MockAdminClient` models the parts of a MongoDB server the bootstrapper
//! touches: databases that only become enumerable once they hold a
//! collection, explicit collection creation, document inserts, and a user
//! store with server-enforced username uniqueness. Failures can be injected
//! to exercise each error class.

use super::traits::{AdminClient, CollectionOutcome, UserRecord};
use crate::error::{BootstrapError, BootstrapResult};
use crate::plan::{AppUser, MarkerDocument};
use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Document};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One call made against the mock, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminOp {
    Ping,
    CreateCollection { database: String, collection: String },
    InsertMarker { database: String, collection: String },
    FindUser { database: String, username: String },
    CreateUser { database: String, username: String },
    ListDatabaseNames,
    CountDocuments { database: String, collection: String },
}

/// Failure injected into every subsequent call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    /// Server cannot be reached.
    Unreachable,
    /// Admin credentials are rejected.
    BadCredentials,
}

/// A database as seen by the mock server.
#[derive(Debug, Clone, Default)]
pub struct MockDatabase {
    pub collections: BTreeMap<String, Vec<Document>>,
    pub users: BTreeMap<String, UserRecord>,
    passwords: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct MockServerState {
    databases: BTreeMap<String, MockDatabase>,
    ops: Vec<AdminOp>,
    failure: Option<MockFailure>,
    /// When false, user administration is refused with `Unauthorized`.
    user_admin_allowed: bool,
    /// When false, collection creation and inserts are refused.
    writes_allowed: bool,
    /// When true, every call yields to the scheduler before it runs.
    yield_between_calls: bool,
}

/// Mock administrative connection.
///
/// Clones share state, so a test can hand one clone to the bootstrapper and
/// inspect the other afterwards.
///
/// # Example
/// ```
/// use mongo_bootstrap::admin::{AdminClient, MockAdminClient};
///
/// # tokio_test::block_on(async {
/// let server = MockAdminClient::new();
/// server.create_collection("tributaria", "keepalive_init").await.unwrap();
/// assert_eq!(server.list_database_names().await.unwrap(), vec!["tributaria"]);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct MockAdminClient {
    state: Arc<Mutex<MockServerState>>,
}

impl Default for MockAdminClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAdminClient {
    /// An empty, reachable server where the session has full privilege.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockServerState {
                user_admin_allowed: true,
                writes_allowed: true,
                ..Default::default()
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockServerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every following call fail with `failure`.
    pub fn set_failure(&self, failure: Option<MockFailure>) {
        self.state().failure = failure;
    }

    /// Refuse `usersInfo` and `createUser`.
    pub fn deny_user_admin(&self) {
        self.state().user_admin_allowed = false;
    }

    /// Refuse collection creation and inserts.
    pub fn deny_writes(&self) {
        self.state().writes_allowed = false;
    }

    /// Yield before every call so concurrent runs on one task interleave.
    pub fn interleave_calls(&self) {
        self.state().yield_between_calls = true;
    }

    /// Pre-populate a user, as if created by an earlier run.
    pub fn seed_user(&self, database: &str, record: UserRecord) {
        let mut state = self.state();
        state
            .databases
            .entry(database.to_string())
            .or_default()
            .users
            .insert(record.user.clone(), record);
    }

    /// All calls made so far.
    pub fn ops(&self) -> Vec<AdminOp> {
        self.state().ops.clone()
    }

    /// Snapshot of a database, if anything was ever written to it.
    pub fn database(&self, name: &str) -> Option<MockDatabase> {
        self.state().databases.get(name).cloned()
    }

    /// Documents stored in `database.collection`.
    pub fn documents(&self, database: &str, collection: &str) -> Vec<Document> {
        self.state()
            .databases
            .get(database)
            .and_then(|db| db.collections.get(collection))
            .cloned()
            .unwrap_or_default()
    }

    /// Plaintext password the user was created with.
    pub fn user_password(&self, database: &str, username: &str) -> Option<String> {
        self.state()
            .databases
            .get(database)
            .and_then(|db| db.passwords.get(username))
            .cloned()
    }

    /// Record `op` and apply any injected failure.
    async fn begin(&self, op: AdminOp) -> BootstrapResult<MutexGuard<'_, MockServerState>> {
        let interleave = self.state().yield_between_calls;
        if interleave {
            tokio::task::yield_now().await;
        }
        let mut state = self.state();
        state.ops.push(op);
        match state.failure {
            Some(MockFailure::Unreachable) => Err(BootstrapError::Connectivity(
                "server selection timeout: no available servers".to_string(),
            )),
            Some(MockFailure::BadCredentials) => Err(BootstrapError::Authentication(
                "SCRAM failure: bad auth".to_string(),
            )),
            None => Ok(state),
        }
    }
}

#[async_trait]
impl AdminClient for MockAdminClient {
    async fn ping(&self) -> BootstrapResult<()> {
        self.begin(AdminOp::Ping).await.map(drop)
    }

    async fn create_collection(
        &self,
        database: &str,
        collection: &str,
    ) -> BootstrapResult<CollectionOutcome> {
        let mut state = self
            .begin(AdminOp::CreateCollection {
                database: database.to_string(),
                collection: collection.to_string(),
            })
            .await?;
        if !state.writes_allowed {
            return Err(BootstrapError::Unauthorized(format!(
                "not authorized on {database} to execute command create"
            )));
        }
        let collections = &mut state
            .databases
            .entry(database.to_string())
            .or_default()
            .collections;
        if collections.contains_key(collection) {
            return Ok(CollectionOutcome::AlreadyExists);
        }
        collections.insert(collection.to_string(), Vec::new());
        Ok(CollectionOutcome::Created)
    }

    async fn insert_marker(
        &self,
        database: &str,
        collection: &str,
        marker: &MarkerDocument,
    ) -> BootstrapResult<String> {
        let mut state = self
            .begin(AdminOp::InsertMarker {
                database: database.to_string(),
                collection: collection.to_string(),
            })
            .await?;
        if !state.writes_allowed {
            return Err(BootstrapError::Unauthorized(format!(
                "not authorized on {database} to execute command insert"
            )));
        }
        let id = ObjectId::new();
        let mut document = marker.to_document();
        document.insert("_id", id);
        state
            .databases
            .entry(database.to_string())
            .or_default()
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(document);
        Ok(id.to_hex())
    }

    async fn find_user(
        &self,
        database: &str,
        username: &str,
    ) -> BootstrapResult<Option<UserRecord>> {
        let state = self
            .begin(AdminOp::FindUser {
                database: database.to_string(),
                username: username.to_string(),
            })
            .await?;
        if !state.user_admin_allowed {
            return Err(BootstrapError::Unauthorized(format!(
                "not authorized on {database} to execute command usersInfo"
            )));
        }
        Ok(state
            .databases
            .get(database)
            .and_then(|db| db.users.get(username))
            .cloned())
    }

    async fn create_user(&self, database: &str, user: &AppUser) -> BootstrapResult<()> {
        let mut state = self
            .begin(AdminOp::CreateUser {
                database: database.to_string(),
                username: user.username.clone(),
            })
            .await?;
        if !state.user_admin_allowed {
            return Err(BootstrapError::Unauthorized(format!(
                "not authorized on {database} to execute command createUser"
            )));
        }
        let db = state.databases.entry(database.to_string()).or_default();
        if db.users.contains_key(&user.username) {
            return Err(BootstrapError::DuplicateIdentity {
                username: user.username.clone(),
                database: database.to_string(),
            });
        }
        db.users.insert(
            user.username.clone(),
            UserRecord {
                user: user.username.clone(),
                db: database.to_string(),
                roles: vec![user.grant.clone()],
            },
        );
        db.passwords
            .insert(user.username.clone(), user.password.expose().to_string());
        Ok(())
    }

    async fn list_database_names(&self) -> BootstrapResult<Vec<String>> {
        let state = self.begin(AdminOp::ListDatabaseNames).await?;
        Ok(state
            .databases
            .iter()
            .filter(|(_, db)| !db.collections.is_empty())
            .map(|(name, _)| name.clone())
            .collect())
    }

    async fn count_documents(&self, database: &str, collection: &str) -> BootstrapResult<u64> {
        let state = self
            .begin(AdminOp::CountDocuments {
                database: database.to_string(),
                collection: collection.to_string(),
            })
            .await?;
        let count = state
            .databases
            .get(database)
            .and_then(|db| db.collections.get(collection))
            .map_or(0, Vec::len);
        Ok(count as u64)
    }
}
