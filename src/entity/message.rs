//! Chat message entity.
//!
//! Maps to the `chat_messages` table: one row per chat turn, either a user
//! query or an assistant reply. Assistant rows accumulate *enrichment*
//! columns after creation (generated SQL, chart config, insights, response
//! metadata, result schema) and carry the folded-in feedback columns. USER
//! rows never hold enrichment or feedback; [`crate::MessageStore`] enforces
//! that on write.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Whether a message row is a user query or an assistant reply.
#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "message_type")]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[sea_orm(string_value = "USER")]
    User,
    #[sea_orm(string_value = "ASSISTANT")]
    Assistant,
}

/// Explicit response lifecycle tag.
///
/// Replaces the implicit "all chunks written" signal: an assistant reply is
/// only treated as finished once the producing layer marks it `Complete`.
/// USER messages are `Complete` from creation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "streaming")]
    Streaming,
    #[sea_orm(string_value = "complete")]
    Complete,
    #[sea_orm(string_value = "failed")]
    Failed,
}

/// Sea-ORM model for the `chat_messages` table.
///
/// The enrichment columns (`sql_query`, `chart_config`, `ai_insights`,
/// `response_metadata`, `result_schema`) are nullable and assistant-only.
/// `chart_config` holds the chart structure with data values stripped so the
/// client can re-render; `result_schema` describes the tabular result shape
/// once per message while the rows themselves live in `message_chunks`.
///
/// Feedback is folded onto the message: at most one verdict per row,
/// `is_positive` tri-state (`NULL` = none recorded), the authoring user
/// attributed via `feedback_user_id` with set-null semantics on user
/// deletion.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "chat_messages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    pub message_type: MessageType,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub created_at: DateTimeWithTimeZone,
    #[sea_orm(column_type = "Text", nullable)]
    pub sql_query: Option<String>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub chart_config: Option<Json>,
    #[sea_orm(column_type = "Text", nullable)]
    pub ai_insights: Option<String>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub response_metadata: Option<Json>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub result_schema: Option<Json>,
    pub is_positive: Option<bool>,
    pub feedback_comment: Option<String>,
    pub feedback_user_id: Option<Uuid>,
    pub feedback_created_at: Option<DateTimeWithTimeZone>,
    pub status: MessageStatus,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::conversation::Entity",
        from = "Column::ConversationId",
        to = "super::conversation::Column::Id",
        on_delete = "Cascade"
    )]
    Conversation,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Author,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::FeedbackUserId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    FeedbackAuthor,
    #[sea_orm(has_many = "super::message_chunk::Entity")]
    Chunks,
}

impl Related<super::conversation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Conversation.def()
    }
}

impl Related<super::message_chunk::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Chunks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
