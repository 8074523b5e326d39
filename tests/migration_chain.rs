//! Exercises the revision chain against an in-memory SQLite database:
//! forward application, re-entrancy, the superseded-table churn in the
//! middle of the chain, and structural restoration on downgrade.

use assistant_chat_store::migration::Migrator;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use sea_orm_migration::{MigratorTrait, SchemaManager};

async fn fresh_db() -> DatabaseConnection {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    // A single pooled connection keeps the in-memory database alive and
    // shared for the whole test.
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).min_connections(1);
    Database::connect(opts)
        .await
        .expect("in-memory sqlite connection")
}

#[tokio::test]
async fn full_chain_builds_live_schema() {
    let db = fresh_db().await;
    Migrator::up(&db, None).await.expect("upgrade to latest");

    let schema = SchemaManager::new(&db);
    for table in [
        "users",
        "user_sessions",
        "chat_conversations",
        "chat_messages",
        "message_chunks",
    ] {
        assert!(
            schema.has_table(table).await.unwrap(),
            "table {table} missing after full upgrade"
        );
    }
    // The superseded chunk storage must not survive the chain.
    assert!(!schema.has_table("assistant_results").await.unwrap());
    assert!(!schema.has_table("ai_result_data").await.unwrap());

    for column in ["sql_query", "result_schema", "is_positive", "status"] {
        assert!(
            schema.has_column("chat_messages", column).await.unwrap(),
            "chat_messages.{column} missing"
        );
    }
    assert!(schema
        .has_column("message_chunks", "data_chunk_index")
        .await
        .unwrap());
    assert!(schema
        .has_index("message_chunks", "uq_message_chunks_data_chunk")
        .await
        .unwrap());
}

#[tokio::test]
async fn upgrade_is_reentrant() {
    let db = fresh_db().await;
    Migrator::up(&db, None).await.expect("first upgrade");
    Migrator::up(&db, None).await.expect("second upgrade is a no-op");
}

#[tokio::test]
async fn upgrade_skips_objects_created_out_of_band() {
    let db = fresh_db().await;

    // The chunk table already exists but no history row says so; the chain
    // must take the existence-check branch and log a skip instead of
    // failing on the duplicate create.
    db.execute_unprepared(
        "CREATE TABLE message_chunks (
            id text PRIMARY KEY,
            message_id text NOT NULL,
            chunk_type text NOT NULL,
            chunk_sequence integer NOT NULL,
            data_chunk_index integer NOT NULL DEFAULT 0,
            total_data_chunks integer NOT NULL DEFAULT 1,
            chunk_data text NOT NULL,
            created_at text NOT NULL
        )",
    )
    .await
    .expect("out-of-band table");

    Migrator::up(&db, None).await.expect("chain tolerates existing objects");

    let schema = SchemaManager::new(&db);
    assert!(schema.has_table("message_chunks").await.unwrap());
    // The step still attaches its indexes to the pre-existing table.
    assert!(schema
        .has_index("message_chunks", "uq_message_chunks_data_chunk")
        .await
        .unwrap());
    assert!(!schema.has_table("ai_result_data").await.unwrap());
}

#[tokio::test]
async fn superseded_table_is_created_renamed_then_dropped() {
    let db = fresh_db().await;
    let schema = SchemaManager::new(&db);

    Migrator::up(&db, Some(3)).await.expect("through step 3");
    assert!(schema.has_table("assistant_results").await.unwrap());

    Migrator::up(&db, Some(1)).await.expect("rename step");
    assert!(!schema.has_table("assistant_results").await.unwrap());
    assert!(schema.has_table("ai_result_data").await.unwrap());

    Migrator::up(&db, None).await.expect("rest of the chain");
    assert!(!schema.has_table("ai_result_data").await.unwrap());
    assert!(schema.has_table("message_chunks").await.unwrap());
}

#[tokio::test]
async fn downgrade_reverses_the_latest_step() {
    let db = fresh_db().await;
    let schema = SchemaManager::new(&db);

    Migrator::up(&db, None).await.expect("upgrade");
    assert!(schema.has_column("chat_messages", "status").await.unwrap());

    Migrator::down(&db, Some(1)).await.expect("downgrade one step");
    assert!(!schema.has_column("chat_messages", "status").await.unwrap());

    Migrator::up(&db, None).await.expect("re-upgrade");
    assert!(schema.has_column("chat_messages", "status").await.unwrap());
}

#[tokio::test]
async fn downgrade_restores_superseded_table_structurally() {
    let db = fresh_db().await;
    let schema = SchemaManager::new(&db);
    Migrator::up(&db, None).await.expect("upgrade");

    // Three steps back reverts the status column, the feedback columns, and
    // the message_chunks table; the old chunk table comes back in shape
    // (documented as structure-only, the dropped rows are gone).
    Migrator::down(&db, Some(3)).await.expect("downgrade three steps");
    assert!(!schema.has_table("message_chunks").await.unwrap());
    assert!(schema.has_table("ai_result_data").await.unwrap());
    assert!(!schema.has_column("chat_messages", "status").await.unwrap());
    assert!(!schema
        .has_column("chat_messages", "is_positive")
        .await
        .unwrap());
    assert!(schema.has_column("chat_messages", "sql_query").await.unwrap());
}

#[tokio::test]
async fn full_downgrade_then_upgrade() {
    let db = fresh_db().await;
    let schema = SchemaManager::new(&db);

    Migrator::up(&db, None).await.expect("upgrade");
    Migrator::down(&db, None).await.expect("downgrade to empty");
    assert!(!schema.has_table("users").await.unwrap());
    assert!(!schema.has_table("chat_messages").await.unwrap());

    Migrator::up(&db, None).await.expect("upgrade from scratch");
    assert!(schema.has_table("message_chunks").await.unwrap());
}
