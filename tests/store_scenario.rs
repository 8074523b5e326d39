//! End-to-end store behavior over a fully migrated in-memory SQLite
//! database: the streamed-reply round trip, chunk addressing, feedback
//! rules, cascades, and session sweeping.

use assistant_chat_store::entity::message::MessageStatus;
use assistant_chat_store::entity::message_chunk::{self, ChunkType};
use assistant_chat_store::entity::{conversation, message, user, user_session};
use assistant_chat_store::migration::Migrator;
use assistant_chat_store::{
    ChunkStore, ConversationStore, MessageEnrichment, MessageStore, NewSession, SessionStore,
    StoreError, UserStore,
};
use sea_orm::{
    ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait, PaginatorTrait,
    Set,
};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

async fn migrated_db() -> DatabaseConnection {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).min_connections(1);
    let conn = Database::connect(opts)
        .await
        .expect("in-memory sqlite connection");
    Migrator::up(&conn, None).await.expect("migrations");
    conn
}

async fn new_user(conn: &DatabaseConnection, name: &str) -> user::Model {
    UserStore::new(conn.clone())
        .create_user(format!("{name}@example.com"), name, "$2b$12$hash")
        .await
        .expect("create user")
}

fn in_days(days: i64) -> sea_orm::prelude::DateTimeWithTimeZone {
    (chrono::Utc::now() + chrono::Duration::days(days)).into()
}

#[tokio::test]
async fn streamed_reply_round_trip() {
    let conn = migrated_db().await;
    let conversations = ConversationStore::new(conn.clone());
    let messages = MessageStore::new(conn.clone());
    let chunks = ChunkStore::new(conn.clone());

    let u1 = new_user(&conn, "owner").await;
    let u2 = new_user(&conn, "reviewer").await;
    let thread = conversations
        .create_conversation(u1.id, Some("rebate analysis".into()))
        .await
        .unwrap();

    let reply = messages
        .create_assistant_message(thread.id, u1.id, "Here is the analysis.")
        .await
        .unwrap();
    assert_eq!(reply.status, MessageStatus::Pending);
    messages.begin_streaming(reply.id).await.unwrap();

    // Large enough to force a three-fragment split at the default limit.
    let insights = serde_json::json!("n".repeat(5000));
    let stored = chunks
        .append_component(reply.id, ChunkType::Insights, 0, &insights)
        .await
        .unwrap();
    assert_eq!(stored.len(), 3);
    for (expected, row) in stored.iter().enumerate() {
        assert_eq!(row.data_chunk_index, expected as i32);
        assert_eq!(row.total_data_chunks, 3);
    }

    let reassembled = chunks
        .load_component(reply.id, ChunkType::Insights)
        .await
        .unwrap()
        .expect("component present");
    assert_eq!(reassembled, insights);

    let done = messages.complete(reply.id).await.unwrap();
    assert_eq!(done.status, MessageStatus::Complete);

    // Feedback from a different user than the message owner.
    let with_feedback = messages
        .add_feedback(reply.id, u2.id, false, Some("numbers look off".into()))
        .await
        .unwrap();
    assert_eq!(with_feedback.is_positive, Some(false));
    assert_eq!(with_feedback.feedback_user_id, Some(u2.id));

    // Deleting the feedback author detaches the attribution but keeps the
    // message and its verdict.
    UserStore::new(conn.clone()).delete_user(u2.id).await.unwrap();
    let survivor = messages.get(reply.id).await.unwrap().expect("message kept");
    assert_eq!(survivor.feedback_user_id, None);
    assert_eq!(survivor.is_positive, Some(false));
    assert_eq!(
        survivor.feedback_comment.as_deref(),
        Some("numbers look off")
    );
}

#[tokio::test]
async fn duplicate_chunk_position_is_rejected() {
    let conn = migrated_db().await;
    let conversations = ConversationStore::new(conn.clone());
    let messages = MessageStore::new(conn.clone());
    let chunks = ChunkStore::new(conn.clone());

    let owner = new_user(&conn, "dup").await;
    let thread = conversations.create_conversation(owner.id, None).await.unwrap();
    let reply = messages
        .create_assistant_message(thread.id, owner.id, "reply")
        .await
        .unwrap();

    let payload = serde_json::json!({"sql": "SELECT 1"});
    chunks
        .append_component(reply.id, ChunkType::Sql, 0, &payload)
        .await
        .unwrap();
    let err = chunks
        .append_component(reply.id, ChunkType::Sql, 1, &payload)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)), "got {err:?}");
}

#[tokio::test]
async fn user_messages_reject_assistant_only_writes() {
    let conn = migrated_db().await;
    let conversations = ConversationStore::new(conn.clone());
    let messages = MessageStore::new(conn.clone());

    let owner = new_user(&conn, "plain").await;
    let thread = conversations.create_conversation(owner.id, None).await.unwrap();
    let question = messages
        .create_user_message(thread.id, owner.id, "What changed last quarter?")
        .await
        .unwrap();
    assert_eq!(question.status, MessageStatus::Complete);
    assert_eq!(question.sql_query, None);

    let enrichment = MessageEnrichment {
        sql_query: Some("SELECT 1".into()),
        ..Default::default()
    };
    let err = messages
        .record_enrichment(question.id, enrichment)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidWrite(_)), "got {err:?}");

    let err = messages
        .add_feedback(question.id, owner.id, true, None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidWrite(_)), "got {err:?}");
}

#[tokio::test]
async fn deleting_a_user_cascades_owned_rows() {
    let conn = migrated_db().await;
    let conversations = ConversationStore::new(conn.clone());
    let messages = MessageStore::new(conn.clone());
    let chunks = ChunkStore::new(conn.clone());
    let sessions = SessionStore::new(conn.clone());

    let owner = new_user(&conn, "depart").await;
    sessions
        .create_session(NewSession {
            user_id: owner.id,
            token: "tok-depart".into(),
            expires_at: in_days(7),
            remember_me: true,
            user_agent: Some("test-agent".into()),
            ip_address: None,
        })
        .await
        .unwrap();
    let thread = conversations.create_conversation(owner.id, None).await.unwrap();
    messages
        .create_user_message(thread.id, owner.id, "hello")
        .await
        .unwrap();
    let reply = messages
        .create_assistant_message(thread.id, owner.id, "hi")
        .await
        .unwrap();
    chunks
        .append_component(reply.id, ChunkType::Data, 0, &serde_json::json!([1, 2, 3]))
        .await
        .unwrap();

    UserStore::new(conn.clone()).delete_user(owner.id).await.unwrap();

    assert_eq!(user::Entity::find().count(&conn).await.unwrap(), 0);
    assert_eq!(user_session::Entity::find().count(&conn).await.unwrap(), 0);
    assert_eq!(conversation::Entity::find().count(&conn).await.unwrap(), 0);
    assert_eq!(message::Entity::find().count(&conn).await.unwrap(), 0);
    assert_eq!(message_chunk::Entity::find().count(&conn).await.unwrap(), 0);
}

#[tokio::test]
async fn inconsistent_fragment_totals_fail_reassembly() {
    let conn = migrated_db().await;
    let conversations = ConversationStore::new(conn.clone());
    let messages = MessageStore::new(conn.clone());
    let chunks = ChunkStore::new(conn.clone());

    let owner = new_user(&conn, "corrupt").await;
    let thread = conversations.create_conversation(owner.id, None).await.unwrap();
    let reply = messages
        .create_assistant_message(thread.id, owner.id, "reply")
        .await
        .unwrap();

    // Hand-write two rows that disagree on total_data_chunks.
    for (index, total, fragment) in [(0, 2, "\"left-"), (1, 3, "right\"")] {
        message_chunk::ActiveModel {
            id: Set(Uuid::new_v4()),
            message_id: Set(reply.id),
            chunk_type: Set(ChunkType::Chart),
            chunk_sequence: Set(0),
            data_chunk_index: Set(index),
            total_data_chunks: Set(total),
            chunk_data: Set(serde_json::Value::String(fragment.into())),
            created_at: Set(chrono::Utc::now().into()),
        }
        .insert(&conn)
        .await
        .unwrap();
    }

    let err = chunks
        .load_component(reply.id, ChunkType::Chart)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Reassembly(_)), "got {err:?}");
}

#[tokio::test]
async fn one_feedback_verdict_per_message() {
    let conn = migrated_db().await;
    let conversations = ConversationStore::new(conn.clone());
    let messages = MessageStore::new(conn.clone());

    let owner = new_user(&conn, "fb-owner").await;
    let first = new_user(&conn, "fb-first").await;
    let second = new_user(&conn, "fb-second").await;
    let thread = conversations.create_conversation(owner.id, None).await.unwrap();
    let reply = messages
        .create_assistant_message(thread.id, owner.id, "reply")
        .await
        .unwrap();

    messages
        .add_feedback(reply.id, first.id, true, None)
        .await
        .unwrap();

    let err = messages
        .add_feedback(reply.id, second.id, false, None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)), "got {err:?}");

    // The original author may revise their verdict.
    let revised = messages
        .update_feedback(reply.id, first.id, false, Some("changed my mind".into()))
        .await
        .unwrap();
    assert_eq!(revised.is_positive, Some(false));

    let err = messages
        .update_feedback(reply.id, second.id, true, None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)), "got {err:?}");
}

#[tokio::test]
async fn feedback_comment_limit_counts_characters() {
    let conn = migrated_db().await;
    let conversations = ConversationStore::new(conn.clone());
    let messages = MessageStore::new(conn.clone());

    let owner = new_user(&conn, "multibyte").await;
    let thread = conversations.create_conversation(owner.id, None).await.unwrap();
    let reply = messages
        .create_assistant_message(thread.id, owner.id, "reply")
        .await
        .unwrap();

    // 255 two-byte characters fill the column exactly and must be accepted.
    let comment = "é".repeat(255);
    let stored = messages
        .add_feedback(reply.id, owner.id, true, Some(comment.clone()))
        .await
        .unwrap();
    assert_eq!(stored.feedback_comment, Some(comment));

    let err = messages
        .update_feedback(reply.id, owner.id, true, Some("é".repeat(256)))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidWrite(_)), "got {err:?}");
}

#[tokio::test]
async fn orphaned_feedback_cannot_be_claimed() {
    let conn = migrated_db().await;
    let conversations = ConversationStore::new(conn.clone());
    let messages = MessageStore::new(conn.clone());

    let owner = new_user(&conn, "orphan-owner").await;
    let reviewer = new_user(&conn, "orphan-reviewer").await;
    let thread = conversations.create_conversation(owner.id, None).await.unwrap();
    let reply = messages
        .create_assistant_message(thread.id, owner.id, "reply")
        .await
        .unwrap();

    messages
        .add_feedback(reply.id, reviewer.id, false, None)
        .await
        .unwrap();
    UserStore::new(conn.clone())
        .delete_user(reviewer.id)
        .await
        .unwrap();

    // The detached verdict is frozen; nobody can rewrite it or take over
    // authorship.
    let err = messages
        .update_feedback(reply.id, owner.id, true, None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)), "got {err:?}");
    let err = messages
        .add_feedback(reply.id, owner.id, true, None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)), "got {err:?}");

    let survivor = messages.get(reply.id).await.unwrap().expect("message kept");
    assert_eq!(survivor.is_positive, Some(false));
    assert_eq!(survivor.feedback_user_id, None);
}

#[tokio::test]
async fn expired_sessions_are_swept() {
    let conn = migrated_db().await;
    let sessions = SessionStore::new(conn.clone());
    let owner = new_user(&conn, "sess").await;

    for (token, days) in [("tok-live", 7), ("tok-stale", -1)] {
        sessions
            .create_session(NewSession {
                user_id: owner.id,
                token: token.into(),
                expires_at: in_days(days),
                remember_me: false,
                user_agent: None,
                ip_address: Some("127.0.0.1".into()),
            })
            .await
            .unwrap();
    }

    assert!(sessions.find_valid("tok-stale").await.unwrap().is_none());
    assert!(sessions.find_valid("tok-live").await.unwrap().is_some());

    assert_eq!(sessions.delete_expired().await.unwrap(), 1);
    assert_eq!(user_session::Entity::find().count(&conn).await.unwrap(), 1);
}

#[tokio::test]
async fn soft_deleted_conversations_are_hidden() {
    let conn = migrated_db().await;
    let conversations = ConversationStore::new(conn.clone());
    let messages = MessageStore::new(conn.clone());
    let owner = new_user(&conn, "soft").await;

    let keep = conversations
        .create_conversation(owner.id, Some("keep".into()))
        .await
        .unwrap();
    let remove = conversations
        .create_conversation(owner.id, Some("remove".into()))
        .await
        .unwrap();
    conversations.soft_delete(remove.id).await.unwrap();

    let listed = conversations.list_for_user(owner.id, 10, 0).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, keep.id);
    assert_eq!(conversations.count_for_user(owner.id).await.unwrap(), 1);

    // The row survives and still refuses new messages.
    assert!(conversations.get(remove.id).await.unwrap().is_some());
    let err = messages
        .create_user_message(remove.id, owner.id, "still there?")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidWrite(_)), "got {err:?}");
}

#[tokio::test]
async fn status_transitions_are_enforced() {
    let conn = migrated_db().await;
    let conversations = ConversationStore::new(conn.clone());
    let messages = MessageStore::new(conn.clone());
    let owner = new_user(&conn, "status").await;
    let thread = conversations.create_conversation(owner.id, None).await.unwrap();

    let reply = messages
        .create_assistant_message(thread.id, owner.id, "reply")
        .await
        .unwrap();
    messages.begin_streaming(reply.id).await.unwrap();
    messages.complete(reply.id).await.unwrap();

    // Terminal states accept no further transitions.
    let err = messages.begin_streaming(reply.id).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)), "got {err:?}");
    let err = messages.fail(reply.id).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)), "got {err:?}");

    let doomed = messages
        .create_assistant_message(thread.id, owner.id, "reply")
        .await
        .unwrap();
    let failed = messages.fail(doomed.id).await.unwrap();
    assert_eq!(failed.status, MessageStatus::Failed);
}

#[tokio::test]
async fn history_reconstruction_orders_components() {
    let conn = migrated_db().await;
    let conversations = ConversationStore::new(conn.clone());
    let messages = MessageStore::new(conn.clone());
    let chunks = ChunkStore::new(conn.clone());
    let owner = new_user(&conn, "history").await;
    let thread = conversations.create_conversation(owner.id, None).await.unwrap();
    let reply = messages
        .create_assistant_message(thread.id, owner.id, "reply")
        .await
        .unwrap();

    // Enrichment stages in arrival order: sql, data, chart, insights.
    let stages = [
        (ChunkType::Sql, serde_json::json!("SELECT region, total FROM rebates")),
        (ChunkType::Data, serde_json::json!([["west", 103], ["east", 87]])),
        (ChunkType::Chart, serde_json::json!({"kind": "bar", "x": "region"})),
        (ChunkType::Insights, serde_json::json!("West leads by 16.")),
    ];
    for (sequence, (chunk_type, payload)) in stages.iter().enumerate() {
        chunks
            .append_component(reply.id, *chunk_type, sequence as i32, payload)
            .await
            .unwrap();
    }

    let rows = chunks.list_for_message(reply.id).await.unwrap();
    assert_eq!(rows.len(), 4);
    let order: Vec<ChunkType> = rows.iter().map(|row| row.chunk_type).collect();
    assert_eq!(
        order,
        vec![
            ChunkType::Sql,
            ChunkType::Data,
            ChunkType::Chart,
            ChunkType::Insights
        ]
    );

    let counts = chunks.count_by_type(reply.id).await.unwrap();
    assert_eq!(counts.len(), 4);
    assert!(counts.iter().all(|(_, count)| *count == 1));

    assert_eq!(chunks.delete_for_message(reply.id).await.unwrap(), 4);
    assert!(chunks
        .load_component(reply.id, ChunkType::Sql)
        .await
        .unwrap()
        .is_none());
}
