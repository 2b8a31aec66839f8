//! Administrative connection layer.
//!
//! Provides the `AdminClient` trait plus a MongoDB-backed implementation and
//! an in-memory mock, so the bootstrapper can run against either.

pub mod mock;
pub mod mongo;
pub mod traits;

pub use mock::{AdminOp, MockAdminClient, MockDatabase, MockFailure};
pub use mongo::MongoAdminClient;
pub use traits::*;
