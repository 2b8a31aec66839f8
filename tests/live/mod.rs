//! Tests against a real MongoDB server.

pub mod provisioning_tests;
pub mod utils;
