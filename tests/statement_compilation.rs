//! Integration tests for statement compilation.
//!
//! These tests drive the fluent surface against a recording executor and
//! check the exact bulk writes and aggregate commands it receives:
//! - Update and delete flags derived from `limit`
//! - Pipeline stage order and pagination
//! - The `$count` fallback for old servers
//! - Identifier handling on insert and filter

use std::time::Duration;

use mongo_fluent::prelude::*;
use mongo_fluent::testing::RecordingExecutor;
use pretty_assertions::assert_eq;

fn connect(executor: RecordingExecutor) -> Connection<RecordingExecutor> {
    let config = QueryConfig::builder()
        .database("app")
        .page_size(10)
        .debug(true)
        .build()
        .unwrap();
    Connection::new(executor, config).unwrap()
}

fn last_pipeline(executor: &RecordingExecutor) -> Vec<Document> {
    let command = executor.last_command().unwrap().command;
    command
        .get_array("pipeline")
        .unwrap()
        .iter()
        .map(|stage| stage.as_document().unwrap().clone())
        .collect()
}

fn last_operation(executor: &RecordingExecutor) -> WriteModel {
    let bulk = executor.last_bulk_write().unwrap();
    assert_eq!(bulk.len(), 1);
    bulk.operations()[0].clone()
}

// ==================== Updates ====================

/// Test that `limit(1)` turns an update into a single-document update.
#[tokio::test]
async fn test_update_with_limit_one_updates_single_document() {
    let connection = connect(RecordingExecutor::new());
    let mut users = connection.collection("users");

    let matched = users
        .where_(doc! { "name": "Ann" })
        .limit(1)
        .update(doc! { "age": ["$inc", 1] })
        .await
        .unwrap();
    assert_eq!(matched, 1);

    assert_eq!(
        last_operation(connection.executor()),
        WriteModel::Update {
            filter: doc! { "name": "Ann" },
            update: doc! { "$inc": { "age": 1 } },
            multi: false,
            upsert: false,
        }
    );
    assert_eq!(
        users.last_statement(),
        Some(r#"db.users.update({"name":"Ann"},{"$inc":{"age":1}},{"multi":false,"upsert":false});"#)
    );
}

/// Test that updates touch every match unless the limit is one.
#[tokio::test]
async fn test_update_is_multi_unless_limit_is_one() {
    let connection = connect(RecordingExecutor::new());
    let mut users = connection.collection("users");

    users
        .where_(doc! { "active": false })
        .update(doc! { "archived": true })
        .await
        .unwrap();
    let WriteModel::Update { multi, update, .. } = last_operation(connection.executor()) else {
        panic!("expected an update");
    };
    assert!(multi);
    assert_eq!(update, doc! { "$set": { "archived": true } });

    users
        .where_(doc! { "active": false })
        .limit(5)
        .update(doc! { "archived": true })
        .await
        .unwrap();
    let WriteModel::Update { multi, .. } = last_operation(connection.executor()) else {
        panic!("expected an update");
    };
    assert!(multi);
}

/// Test that plain fields and operator entries merge into one update document.
#[tokio::test]
async fn test_update_mixes_operators() {
    let connection = connect(RecordingExecutor::new());
    let mut users = connection.collection("users");

    users
        .where_(doc! { "name": "Ann" })
        .upsert(true)
        .update(doc! {
            "city": "Oslo",
            "visits": ["$inc", 2],
            "tags": ["$addToSet", "vip"],
        })
        .await
        .unwrap();

    assert_eq!(
        last_operation(connection.executor()),
        WriteModel::Update {
            filter: doc! { "name": "Ann" },
            update: doc! {
                "$set": { "city": "Oslo" },
                "$inc": { "visits": 2 },
                "$addToSet": { "tags": "vip" },
            },
            multi: true,
            upsert: true,
        }
    );
}

/// Test the `set_dec` and `set_field` shortcuts.
#[tokio::test]
async fn test_set_helpers() {
    let connection = connect(RecordingExecutor::new());
    let mut users = connection.collection("users");

    users
        .where_(doc! { "name": "Ann" })
        .set_dec("credits", 2)
        .await
        .unwrap();
    let WriteModel::Update { update, .. } = last_operation(connection.executor()) else {
        panic!("expected an update");
    };
    assert_eq!(update, doc! { "$inc": { "credits": -2_i64 } });

    users
        .where_(doc! { "name": "Ann" })
        .set_field("city", "Bergen")
        .await
        .unwrap();
    let WriteModel::Update { update, .. } = last_operation(connection.executor()) else {
        panic!("expected an update");
    };
    assert_eq!(update, doc! { "$set": { "city": "Bergen" } });
}

/// Test that a decrement with no negation fails without executing.
#[tokio::test]
async fn test_set_dec_rejects_unnegatable_step() {
    let connection = connect(RecordingExecutor::new());
    let mut users = connection.collection("users");

    let err = users
        .where_(doc! { "name": "Ann" })
        .set_dec("credits", i64::MIN)
        .await
        .unwrap_err();
    assert!(err.is_invalid_value());
    assert!(connection.executor().bulk_writes().is_empty());
    assert!(users.options().filter().is_empty());

    users
        .where_(doc! { "name": "Ann" })
        .set_dec("credits", i64::MAX)
        .await
        .unwrap();
    let WriteModel::Update { update, .. } = last_operation(connection.executor()) else {
        panic!("expected an update");
    };
    let lowest = i64::MIN + 1;
    assert_eq!(update, doc! { "$inc": { "credits": lowest } });
}

// ==================== Deletes ====================

/// Test that deletes remove a single document only with `limit(1)`.
#[tokio::test]
async fn test_delete_just_one_only_with_limit_one() {
    let connection = connect(RecordingExecutor::new());
    let mut users = connection.collection("users");

    users
        .where_(doc! { "name": "Ann" })
        .limit(1)
        .delete()
        .await
        .unwrap();
    assert_eq!(
        last_operation(connection.executor()),
        WriteModel::Delete {
            filter: doc! { "name": "Ann" },
            just_one: true,
        }
    );
    assert_eq!(
        users.last_statement(),
        Some(r#"db.users.remove({"name":"Ann"},{"justOne":true});"#)
    );

    users.where_(doc! { "name": "Ann" }).delete().await.unwrap();
    assert_eq!(
        last_operation(connection.executor()),
        WriteModel::Delete {
            filter: doc! { "name": "Ann" },
            just_one: false,
        }
    );
}

// ==================== Pipelines ====================

/// Test the pipeline compiled from filter, fields, sort and limit.
#[tokio::test]
async fn test_select_projects_sorts_and_limits() {
    let connection = connect(RecordingExecutor::new());
    let mut users = connection.collection("users");

    users
        .field("name,age")
        .sort(doc! { "age": -1 })
        .limit(3)
        .select()
        .await
        .unwrap();

    assert_eq!(
        last_pipeline(connection.executor()),
        vec![
            doc! { "$sort": { "age": -1 } },
            doc! { "$limit": 3_i64 },
            doc! { "$project": { "_id": 0, "name": 1, "age": 1 } },
        ]
    );

    let command = connection.executor().last_command().unwrap();
    assert_eq!(command.database, "app");
    assert_eq!(command.command.get_str("aggregate").unwrap(), "users");
    assert_eq!(command.command.get_document("cursor").unwrap(), &doc! {});
}

/// Test that stages come out in a fixed order whatever the call order.
#[tokio::test]
async fn test_stage_order_ignores_call_order() {
    let connection = connect(RecordingExecutor::new());
    let mut users = connection.collection("users");

    users
        .field("city")
        .limit(5)
        .skip(2)
        .sort(doc! { "n": -1 })
        .group(doc! { "_id": "$city", "n": { "$sum": 1 } })
        .where_(doc! { "active": true })
        .select()
        .await
        .unwrap();

    let names: Vec<String> = last_pipeline(connection.executor())
        .iter()
        .map(|stage| stage.keys().next().unwrap().clone())
        .collect();
    assert_eq!(
        names,
        vec!["$match", "$group", "$sort", "$skip", "$limit", "$project"]
    );
}

/// Test that computed projection documents pass through unchanged.
#[tokio::test]
async fn test_computed_projection_is_kept_verbatim() {
    let connection = connect(RecordingExecutor::new());
    let mut users = connection.collection("users");

    users
        .field(doc! { "name": 1, "next": { "$add": ["$seq", 1] } })
        .select()
        .await
        .unwrap();

    assert_eq!(
        last_pipeline(connection.executor()),
        vec![doc! { "$project": { "_id": 0, "name": 1, "next": { "$add": ["$seq", 1] } } }]
    );
}

/// Test that `page` falls back to the configured page size.
#[tokio::test]
async fn test_page_defaults_to_configured_page_size() {
    let connection = connect(RecordingExecutor::new());
    let mut users = connection.collection("users");

    users.page(2).await.unwrap();
    assert_eq!(
        last_pipeline(connection.executor()),
        vec![doc! { "$skip": 10_i64 }, doc! { "$limit": 10_i64 }]
    );

    users.page(0).await.unwrap();
    assert_eq!(
        last_pipeline(connection.executor()),
        vec![doc! { "$limit": 10_i64 }]
    );

    users.limit(5).page(3).await.unwrap();
    assert_eq!(
        last_pipeline(connection.executor()),
        vec![doc! { "$skip": 10_i64 }, doc! { "$limit": 5_i64 }]
    );
}

/// Test that count uses `$group` on servers older than 3.4.
#[tokio::test]
async fn test_count_falls_back_to_group_on_old_servers() {
    let executor = RecordingExecutor::new()
        .with_version(ServerVersion::new(3, 2))
        .with_rows(vec![doc! { "_id": Bson::Null, "__count__": 7 }]);
    let connection = connect(executor);
    let mut users = connection.collection("users");

    let total = users.where_(doc! { "active": true }).count().await.unwrap();
    assert_eq!(total, 7);
    assert_eq!(
        last_pipeline(connection.executor()),
        vec![
            doc! { "$match": { "active": true } },
            doc! { "$group": { "_id": Bson::Null, "__count__": { "$sum": 1 } } },
        ]
    );
}

/// Test that count uses `$count` and asks for the version once.
#[tokio::test]
async fn test_count_uses_native_stage_and_caches_version() {
    let executor = RecordingExecutor::new().with_version(ServerVersion::new(4, 4));
    let connection = connect(executor);
    let mut users = connection.collection("users");

    assert_eq!(users.count().await.unwrap(), 0);
    assert_eq!(
        last_pipeline(connection.executor()),
        vec![doc! { "$count": "__count__" }]
    );

    connection.executor().push_rows(vec![doc! { "__count__": 3 }]);
    assert_eq!(users.count().await.unwrap(), 3);
    assert_eq!(connection.executor().version_requests(), 1);
}

/// Test that a configured server version is never asked of the executor.
#[tokio::test]
async fn test_configured_version_skips_detection() {
    let config = QueryConfig::builder()
        .database("app")
        .server_version(ServerVersion::new(3, 0))
        .build()
        .unwrap();
    let connection = Connection::new(RecordingExecutor::new(), config).unwrap();

    connection.collection("users").count().await.unwrap();
    assert_eq!(connection.executor().version_requests(), 0);
    assert_eq!(
        last_pipeline(connection.executor()),
        vec![doc! { "$group": { "_id": Bson::Null, "__count__": { "$sum": 1 } } }]
    );
}

// ==================== Inserts and identifiers ====================

/// Test that `insert_all` returns ids in input order.
#[tokio::test]
async fn test_insert_all_returns_ids_in_input_order() {
    let connection = connect(RecordingExecutor::new());
    let mut users = connection.collection("users");

    let result = users
        .insert_all(vec![doc! { "name": "Ann" }, doc! { "name": "Bob" }])
        .await
        .unwrap();
    assert_eq!(result.inserted_count, 2);
    assert_eq!(result.inserted_ids.len(), 2);

    let bulk = connection.executor().last_bulk_write().unwrap();
    let stored: Vec<Bson> = bulk
        .inserted_documents()
        .iter()
        .map(|doc| doc.get("_id").unwrap().clone())
        .collect();
    assert_eq!(stored, result.inserted_ids);
    assert_eq!(
        users.last_insert_id(),
        Some(&LastInsertedIds::Many(result.inserted_ids.clone()))
    );
}

/// Test that `insert_all` leaves out empty documents.
#[tokio::test]
async fn test_insert_all_skips_empty_documents() {
    let connection = connect(RecordingExecutor::new());
    let mut users = connection.collection("users");

    let result = users
        .insert_all(vec![doc! { "name": "Ann" }, doc! {}, doc! { "name": "Cid" }])
        .await
        .unwrap();
    assert_eq!(result.inserted_ids.len(), 2);
    assert_eq!(connection.executor().last_bulk_write().unwrap().len(), 2);
}

/// Test that `insert_all` with nothing to insert fails.
#[tokio::test]
async fn test_insert_all_rejects_empty_batches() {
    let connection = connect(RecordingExecutor::new());
    let mut users = connection.collection("users");

    let err = users.insert_all(Vec::new()).await.unwrap_err();
    assert!(err.is_empty_document());

    let err = users.insert_all(vec![doc! {}]).await.unwrap_err();
    assert!(err.is_empty_document());
    assert!(connection.executor().bulk_writes().is_empty());
}

/// Test that string primary keys become object ids on insert.
#[tokio::test]
async fn test_insert_coerces_primary_key_strings() {
    let connection = connect(RecordingExecutor::new());
    let mut users = connection.collection("users");
    let oid = ObjectId::new();

    let id = users
        .insert_get_id(doc! { "_id": oid.to_hex(), "name": "Ann" })
        .await
        .unwrap();
    assert_eq!(id, Bson::ObjectId(oid));

    let bulk = connection.executor().last_bulk_write().unwrap();
    assert_eq!(
        bulk.inserted_documents(),
        vec![doc! { "_id": oid, "name": "Ann" }]
    );
    assert_eq!(
        users.last_statement(),
        Some(format!(r#"db.users.insert({{"_id":{{"$oid":"{}"}},"name":"Ann"}});"#, oid.to_hex()).as_str())
    );
}

/// Test that `pcs(true)` reports inserted ids as strings.
#[tokio::test]
async fn test_pcs_returns_string_ids() {
    let connection = connect(RecordingExecutor::new());
    let mut users = connection.collection("users");

    let id = users
        .pcs(true)
        .insert_get_id(doc! { "name": "Ann" })
        .await
        .unwrap();
    let Bson::String(hex) = &id else {
        panic!("expected a string id, got {id:?}");
    };
    assert!(ObjectId::parse_str(hex).is_ok());
    assert_eq!(users.last_insert_id(), Some(&LastInsertedIds::One(id.clone())));

    // pcs applies to one statement only.
    let id = users.insert_get_id(doc! { "name": "Bob" }).await.unwrap();
    assert!(matches!(id, Bson::ObjectId(_)));
}

/// Test that string primary keys in a filter become object ids.
#[tokio::test]
async fn test_filter_coerces_primary_key_strings() {
    let connection = connect(RecordingExecutor::new());
    let mut users = connection.collection("users");
    let oid = ObjectId::new();

    users.where_(doc! { "_id": oid.to_hex() });
    assert_eq!(users.options().filter(), &doc! { "_id": oid });

    // A malformed id matches nothing instead of failing.
    users.where_(doc! { "_id": "not-an-id" });
    assert!(matches!(
        users.options().filter().get("_id"),
        Some(Bson::ObjectId(_))
    ));
}

/// Test that the configured write concern rides on every bulk write.
#[tokio::test]
async fn test_write_concern_is_attached() {
    let config = QueryConfig::builder()
        .database("app")
        .write_concern(
            WriteConcern::majority()
                .with_timeout(Duration::from_millis(1000))
                .with_journal(false),
        )
        .build()
        .unwrap();
    let connection = Connection::new(RecordingExecutor::new(), config).unwrap();

    connection
        .collection("users")
        .insert(doc! { "name": "Ann" })
        .await
        .unwrap();
    let bulk = connection.executor().last_bulk_write().unwrap();
    let wc = bulk.write_concern().unwrap();
    assert_eq!(wc.w, Acknowledgment::Majority);
    assert_eq!(wc.wtimeout, Some(Duration::from_secs(1)));
    assert_eq!(wc.journal, Some(false));
}
