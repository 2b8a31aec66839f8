//! Provisioning runs against a real server.

use super::utils::*;
use mongo_bootstrap::{BootstrapError, Bootstrapper, CollectionOutcome};
use mongodb::bson::{doc, Document};

macro_rules! require_server {
    () => {
        match test_uri() {
            Some(uri) => uri,
            None => {
                eprintln!("MONGO_BOOTSTRAP_TEST_URI not set, skipping");
                return;
            }
        }
    };
}

#[tokio::test]
#[ignore = "requires a live MongoDB server"]
async fn first_run_provisions_database_and_user() {
    let uri = require_server!();
    let plan = unique_plan("first");
    let admin = admin(&uri).await;
    cleanup(admin.client(), plan.database_name(), plan.username()).await;

    let bootstrapper = Bootstrapper::new(admin.clone(), plan.clone());
    let report = bootstrapper.run().await.expect("first run");
    assert_eq!(report.collection_outcome, CollectionOutcome::Created);

    let names = admin.client().list_database_names().await.expect("list dbs");
    assert!(names.iter().any(|n| n == plan.database_name()));

    let markers = admin
        .client()
        .database(plan.database_name())
        .collection::<Document>(plan.keepalive_collection());
    let marker = markers
        .find_one(doc! {})
        .await
        .expect("find marker")
        .expect("marker present");
    assert!(marker.get_datetime("createdAt").is_ok());

    let verify = bootstrapper.verify().await.expect("verify");
    assert!(verify.is_provisioned(), "problems: {:?}", verify.problems());

    cleanup(admin.client(), plan.database_name(), plan.username()).await;
}

#[tokio::test]
#[ignore = "requires a live MongoDB server"]
async fn second_run_is_rejected_and_leaves_one_marker() {
    let uri = require_server!();
    let plan = unique_plan("second");
    let admin = admin(&uri).await;
    cleanup(admin.client(), plan.database_name(), plan.username()).await;

    let bootstrapper = Bootstrapper::new(admin.clone(), plan.clone());
    bootstrapper.run().await.expect("first run");

    let err = bootstrapper.run().await.unwrap_err();
    assert!(matches!(err, BootstrapError::DuplicateIdentity { .. }), "got {err:?}");
    assert_eq!(err.exit_status(), 73);

    let count = admin
        .client()
        .database(plan.database_name())
        .collection::<Document>(plan.keepalive_collection())
        .count_documents(doc! {})
        .await
        .expect("count markers");
    assert_eq!(count, 1);

    cleanup(admin.client(), plan.database_name(), plan.username()).await;
}

#[tokio::test]
#[ignore = "requires a live MongoDB server"]
async fn without_preflight_duplicate_is_reported_by_the_server() {
    let uri = require_server!();
    let plan = unique_plan("nopre");
    let admin = admin(&uri).await;
    cleanup(admin.client(), plan.database_name(), plan.username()).await;

    Bootstrapper::new(admin.clone(), plan.clone())
        .run()
        .await
        .expect("first run");

    let err = Bootstrapper::new(admin.clone(), plan.clone())
        .with_preflight_user_check(false)
        .run()
        .await
        .unwrap_err();
    assert!(matches!(err, BootstrapError::DuplicateIdentity { .. }), "got {err:?}");

    // The marker of the failed run is not rolled back.
    let count = admin
        .client()
        .database(plan.database_name())
        .collection::<Document>(plan.keepalive_collection())
        .count_documents(doc! {})
        .await
        .expect("count markers");
    assert_eq!(count, 2);

    cleanup(admin.client(), plan.database_name(), plan.username()).await;
}

#[tokio::test]
#[ignore = "requires a live MongoDB server"]
async fn app_user_is_scoped_to_its_database() {
    let uri = require_server!();
    let plan = unique_plan("scope");
    let admin = admin(&uri).await;
    cleanup(admin.client(), plan.database_name(), plan.username()).await;

    Bootstrapper::new(admin.clone(), plan.clone())
        .run()
        .await
        .expect("provision");

    let app = app_client(&uri, plan.database_name(), plan.username(), "test-pass").await;
    let own = app
        .database(plan.database_name())
        .collection::<Document>("scope_check");
    own.insert_one(doc! { "ok": true }).await.expect("insert in own db");
    let read = own.find_one(doc! { "ok": true }).await.expect("read own db");
    assert!(read.is_some());

    let unrelated = unique_plan("unrelated");
    let foreign = app
        .database(unrelated.database_name())
        .collection::<Document>("scope_check");
    let write_err = foreign
        .insert_one(doc! { "ok": true })
        .await
        .expect_err("write outside own db must be rejected");
    let write_err = BootstrapError::from(write_err);
    assert!(
        matches!(write_err, BootstrapError::Unauthorized(_)),
        "got {write_err:?}"
    );
    let read_err = foreign
        .find_one(doc! {})
        .await
        .expect_err("read outside own db must be rejected");
    let read_err = BootstrapError::from(read_err);
    assert!(
        matches!(read_err, BootstrapError::Unauthorized(_)),
        "got {read_err:?}"
    );

    cleanup(admin.client(), plan.database_name(), plan.username()).await;
    let _ = admin.client().database(unrelated.database_name()).drop().await;
}

#[tokio::test]
#[ignore = "requires a live MongoDB server"]
async fn bad_admin_credentials_fail_at_ping() {
    let uri = require_server!();
    let mut options = mongodb::options::ClientOptions::parse(&uri)
        .await
        .expect("parse test uri");
    let mut credential = mongodb::options::Credential::default();
    credential.username = Some("nobody".to_string());
    credential.password = Some("wrong".to_string());
    credential.source = Some("admin".to_string());
    options.credential = Some(credential);
    let client = mongodb::Client::with_options(options).expect("client");

    let plan = unique_plan("badauth");
    let err = Bootstrapper::new(mongo_bootstrap::MongoAdminClient::from_client(client), plan)
        .run()
        .await
        .unwrap_err();
    assert!(matches!(err, BootstrapError::Authentication(_)), "got {err:?}");
    assert_eq!(err.exit_status(), 77);
}
