//! Integration tests for the transaction lifecycle.

mod common;

use common::{mock_driver, row, test_config};
use firebird_query::client::Client;
use firebird_query::error::FbError;
use firebird_query::sql::{Field, Filter, InsertMany, InsertOne, RowValues, Template, UpdateOne};
use firebird_query::transaction::TxState;
use std::sync::atomic::Ordering;

#[tokio::test]
async fn test_begin_opens_transaction_on_pooled_connection() {
    common::init_tracing();
    let (driver, state) = mock_driver();
    let client = Client::new(driver, test_config()).unwrap();

    let tx = client.transaction().await.unwrap();
    assert_eq!(tx.state(), TxState::Open);
    assert!(tx.id().starts_with("tx_"));
    assert_eq!(state.events(), vec!["begin"]);
    tx.close().await.unwrap();
}

#[tokio::test]
async fn test_statements_dispatch_on_transaction_connection() {
    let (driver, state) = mock_driver();
    let client = Client::new(driver, test_config()).unwrap();

    let mut tx = client.transaction().await.unwrap();
    tx.insert_one::<firebird_query::QueryRow>(&InsertOne::new(
        "USERS",
        RowValues::new().set("NAME", "Jane"),
    ))
    .await
    .unwrap();
    tx.update_one::<firebird_query::QueryRow>(&UpdateOne::new(
        "USERS",
        RowValues::new().set("AGE", 32),
        Filter::field("NAME", "Jane"),
    ))
    .await
    .unwrap();
    tx.close().await.unwrap();

    assert_eq!(
        state.executed(),
        vec![
            "INSERT INTO USERS (NAME) VALUES ('Jane');",
            "UPDATE USERS SET AGE = 32 WHERE NAME = 'Jane';",
        ]
    );
}

#[tokio::test]
async fn test_query_raw_returns_typed_rows() {
    let (driver, state) = mock_driver();
    let client = Client::new(driver, test_config()).unwrap();
    state.push_response(vec![row(&[
        ("ID", serde_json::json!(7)),
        ("NAME", serde_json::json!("Jane")),
    ])]);

    #[derive(serde::Deserialize, Debug, PartialEq)]
    struct User {
        #[serde(rename = "ID")]
        id: i64,
        #[serde(rename = "NAME")]
        name: String,
    }

    let mut tx = client.transaction().await.unwrap();
    let users: Vec<User> = tx
        .query_raw(
            &Template::new()
                .text("SELECT * FROM USERS WHERE ")
                .filter(Field::gt("ID", 0).into()),
        )
        .await
        .unwrap();
    tx.close().await.unwrap();

    assert_eq!(
        users,
        vec![User {
            id: 7,
            name: "Jane".to_string()
        }]
    );
}

#[tokio::test]
async fn test_insert_many_reports_row_count() {
    let (driver, _state) = mock_driver();
    let client = Client::new(driver, test_config()).unwrap();

    let mut tx = client.transaction().await.unwrap();
    let status = tx
        .insert_many(&InsertMany::new(
            "T",
            ["A", "B"],
            [
                RowValues::new().set("A", 1).set("B", 2),
                RowValues::new().set("A", 3).set("B", 4),
            ],
        ))
        .await
        .unwrap();
    assert_eq!(status, "2 rows inserted");

    let status = tx
        .insert_many(&InsertMany::new("T", ["A"], [RowValues::new().set("A", 5)]))
        .await
        .unwrap();
    assert_eq!(status, "1 row inserted");
    tx.close().await.unwrap();
}

#[tokio::test]
async fn test_commit_transitions_to_committed() {
    let (driver, state) = mock_driver();
    let client = Client::new(driver, test_config()).unwrap();

    let mut tx = client.transaction().await.unwrap();
    tx.commit().await.unwrap();
    assert_eq!(tx.state(), TxState::Committed);
    assert_eq!(state.events(), vec!["begin", "commit"]);
    tx.close().await.unwrap();
}

#[tokio::test]
async fn test_commit_failure_triggers_exactly_one_rollback() {
    let (driver, state) = mock_driver();
    let client = Client::new(driver, test_config()).unwrap();

    let mut tx = client.transaction().await.unwrap();
    state.fail_commit.store(true, Ordering::SeqCst);

    let err = tx.commit().await.err().expect("commit should fail");
    // The commit error surfaces, not the rollback outcome.
    assert!(err.to_string().contains("commit failed on server"));
    assert_eq!(tx.state(), TxState::RolledBack);
    assert_eq!(state.event_count("commit"), 1);
    assert_eq!(state.event_count("rollback"), 1);
}

#[tokio::test]
async fn test_failed_rollback_does_not_displace_commit_error() {
    let (driver, state) = mock_driver();
    let client = Client::new(driver, test_config()).unwrap();

    let mut tx = client.transaction().await.unwrap();
    state.fail_commit.store(true, Ordering::SeqCst);
    state.fail_rollback.store(true, Ordering::SeqCst);

    let err = tx.commit().await.err().expect("commit should fail");
    assert!(err.to_string().contains("commit failed on server"));
    assert_eq!(state.event_count("rollback"), 1);
    assert_eq!(tx.state(), TxState::RolledBack);
}

#[tokio::test]
async fn test_explicit_rollback() {
    let (driver, state) = mock_driver();
    let client = Client::new(driver, test_config()).unwrap();

    let mut tx = client.transaction().await.unwrap();
    tx.rollback().await.unwrap();
    assert_eq!(tx.state(), TxState::RolledBack);
    assert_eq!(state.events(), vec!["begin", "rollback"]);
}

#[tokio::test]
async fn test_rollback_failure_is_terminal() {
    let (driver, state) = mock_driver();
    let client = Client::new(driver, test_config()).unwrap();

    let mut tx = client.transaction().await.unwrap();
    state.fail_rollback.store(true, Ordering::SeqCst);

    let result = tx.rollback().await;
    assert!(matches!(result, Err(FbError::Transaction { .. })));
    // No further statements may run; the server-side state is unknown.
    assert_eq!(tx.state(), TxState::RolledBack);
}

#[tokio::test]
async fn test_statements_rejected_after_finalization() {
    let (driver, _state) = mock_driver();
    let client = Client::new(driver, test_config()).unwrap();

    let mut tx = client.transaction().await.unwrap();
    tx.commit().await.unwrap();

    let result = tx
        .insert_one::<firebird_query::QueryRow>(&InsertOne::new(
            "USERS",
            RowValues::new().set("NAME", "Jane"),
        ))
        .await;
    let err = result.err().expect("statement should be rejected");
    assert!(matches!(err, FbError::Transaction { .. }));
    assert!(err.to_string().contains("committed"));
}

#[tokio::test]
async fn test_double_commit_is_rejected() {
    let (driver, state) = mock_driver();
    let client = Client::new(driver, test_config()).unwrap();

    let mut tx = client.transaction().await.unwrap();
    tx.commit().await.unwrap();
    assert!(tx.commit().await.is_err());
    assert_eq!(state.event_count("commit"), 1);
}

#[tokio::test]
async fn test_close_commits_open_transaction_and_releases_connection() {
    let (driver, state) = mock_driver();
    let client = Client::new(driver, test_config()).unwrap();

    let tx = client.transaction().await.unwrap();
    assert_eq!(client.pool().idle_count(), 0);

    tx.close().await.unwrap();
    assert_eq!(state.event_count("commit"), 1);
    assert_eq!(client.pool().idle_count(), 1);
}

#[tokio::test]
async fn test_close_after_rollback_does_not_commit() {
    let (driver, state) = mock_driver();
    let client = Client::new(driver, test_config()).unwrap();

    let mut tx = client.transaction().await.unwrap();
    tx.rollback().await.unwrap();
    tx.close().await.unwrap();

    assert_eq!(state.event_count("commit"), 0);
    assert_eq!(client.pool().idle_count(), 1);
}

#[tokio::test]
async fn test_close_surfaces_commit_error_but_still_releases_connection() {
    let (driver, state) = mock_driver();
    let client = Client::new(driver, test_config()).unwrap();

    let tx = client.transaction().await.unwrap();
    state.fail_commit.store(true, Ordering::SeqCst);

    let err = tx
        .close()
        .await
        .err()
        .expect("close should surface the commit error");
    assert!(err.to_string().contains("commit failed on server"));
    assert_eq!(client.pool().idle_count(), 1);
}

#[tokio::test]
async fn test_transaction_holds_its_pool_slot_until_close() {
    let (driver, _state) = mock_driver();
    let client = Client::new(driver, test_config().max_connections(1)).unwrap();

    let tx = client.transaction().await.unwrap();

    let mut waiting = tokio_test::task::spawn(client.pool().acquire());
    tokio_test::assert_pending!(waiting.poll());

    tx.close().await.unwrap();
    assert!(waiting.is_woken());
    let conn = tokio_test::assert_ready!(waiting.poll()).unwrap();
    conn.detach().await.unwrap();
}
