//! Executor tests that need no running server.
//!
//! The client connects lazily, so construction succeeds against an address
//! nothing listens on; operations then fail fast with a short selection
//! timeout.

use std::time::Duration;

use fluent_mongodb::{MongoError, MongoExecutor, MongoExecutorConfig, ReadPreference};
use fluent_query::prelude::*;

fn unreachable_config() -> MongoExecutorConfig {
    MongoExecutorConfig::builder()
        .uri("mongodb://127.0.0.1:1/?directConnection=true")
        .app_name("fluent-tests")
        .server_selection_timeout(Duration::from_millis(200))
        .connect_timeout(Duration::from_millis(200))
        .read_preference(ReadPreference::Primary)
        .build()
        .unwrap()
}

#[test]
fn test_connect_is_lazy() {
    let executor = tokio_test::block_on(MongoExecutor::connect(unreachable_config())).unwrap();
    assert_eq!(executor.config().app_name.as_deref(), Some("fluent-tests"));
    assert!(format!("{:?}", executor).contains("MongoExecutor"));
}

#[test]
fn test_connect_rejects_bad_uri() {
    let config = MongoExecutorConfig::from_uri("mongodb://");
    let err = tokio_test::block_on(MongoExecutor::connect(config)).unwrap_err();
    assert!(matches!(err, MongoError::Config(_)));
}

#[tokio::test]
async fn test_unreachable_server_surfaces_executor_error() {
    let executor = MongoExecutor::connect(unreachable_config()).await.unwrap();
    assert!(!executor.is_healthy().await);

    let config = QueryConfig::builder()
        .database("app")
        .server_version(ServerVersion::new(4, 0))
        .build()
        .unwrap();
    let connection = Connection::new(executor, config).unwrap();
    let mut users = connection.collection("users");

    let err = users
        .where_(doc! { "name": "Ann" })
        .select()
        .await
        .unwrap_err();
    assert!(err.is_executor_error());
    // A failed terminal still clears the statement's options.
    assert!(users.options().filter().is_empty());

    let err = users
        .where_(doc! { "name": "Ann" })
        .set_field("age", 31)
        .await
        .unwrap_err();
    assert!(err.is_executor_error());
}

#[tokio::test]
async fn test_version_detection_failure_is_reported() {
    let executor = MongoExecutor::connect(unreachable_config()).await.unwrap();
    let connection = Connection::new(executor, QueryConfig::new("app")).unwrap();

    let err = connection.server_version().await.unwrap_err();
    assert!(err.is_executor_error());
}
