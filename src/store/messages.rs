use sea_orm::prelude::{Expr, Json};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entity::conversation;
use crate::entity::message::{self, MessageStatus, MessageType};
use crate::error::{StoreError, StoreResult};

use super::now;

/// Maximum accepted feedback comment length, matching the column width.
const FEEDBACK_COMMENT_MAX: usize = 255;

/// Assistant-only columns accumulated after a reply is produced.
///
/// Only the `Some` fields are written, so enrichment can arrive in stages as
/// the response pipeline completes them.
#[derive(Debug, Clone, Default)]
pub struct MessageEnrichment {
    /// Generated SQL, kept for re-execution.
    pub sql_query: Option<String>,
    /// Chart structure with data values stripped for client re-render.
    pub chart_config: Option<Json>,
    /// Narrative analysis of the result data.
    pub ai_insights: Option<String>,
    /// Timing/success metadata about the producing request.
    pub response_metadata: Option<Json>,
    /// Shape descriptor for the tabular result, stored once per message.
    pub result_schema: Option<Json>,
}

/// Store for chat message rows.
#[derive(Debug, Clone)]
pub struct MessageStore {
    conn: DatabaseConnection,
}

impl MessageStore {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Records a user query. User messages are complete the moment they are
    /// written and never carry enrichment or feedback.
    pub async fn create_user_message(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
        content: impl Into<String>,
    ) -> StoreResult<message::Model> {
        self.insert_message(
            conversation_id,
            user_id,
            MessageType::User,
            MessageStatus::Complete,
            content.into(),
        )
        .await
    }

    /// Records the shell of an assistant reply in `Pending` status. The
    /// streaming layer appends chunks, attaches enrichment, and finally
    /// marks the row complete or failed.
    pub async fn create_assistant_message(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
        content: impl Into<String>,
    ) -> StoreResult<message::Model> {
        self.insert_message(
            conversation_id,
            user_id,
            MessageType::Assistant,
            MessageStatus::Pending,
            content.into(),
        )
        .await
    }

    async fn insert_message(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
        message_type: MessageType,
        status: MessageStatus,
        content: String,
    ) -> StoreResult<message::Model> {
        let txn = self.conn.begin().await?;

        let thread = conversation::Entity::find_by_id(conversation_id)
            .one(&txn)
            .await?
            .ok_or(StoreError::NotFound("conversation"))?;
        if thread.is_deleted {
            return Err(StoreError::InvalidWrite(
                "cannot add a message to a deleted conversation".into(),
            ));
        }

        let model = message::ActiveModel {
            id: Set(Uuid::new_v4()),
            conversation_id: Set(conversation_id),
            user_id: Set(user_id),
            message_type: Set(message_type),
            content: Set(content),
            created_at: Set(now()),
            sql_query: Set(None),
            chart_config: Set(None),
            ai_insights: Set(None),
            response_metadata: Set(None),
            result_schema: Set(None),
            is_positive: Set(None),
            feedback_comment: Set(None),
            feedback_user_id: Set(None),
            feedback_created_at: Set(None),
            status: Set(status),
        };
        let inserted = model.insert(&txn).await?;

        let mut thread = thread.into_active_model();
        thread.updated_at = Set(now());
        thread.update(&txn).await?;

        txn.commit().await?;
        Ok(inserted)
    }

    pub async fn get(&self, id: Uuid) -> StoreResult<Option<message::Model>> {
        Ok(message::Entity::find_by_id(id).one(&self.conn).await?)
    }

    /// Messages of one thread in chronological order, paged.
    pub async fn list_for_conversation(
        &self,
        conversation_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> StoreResult<Vec<message::Model>> {
        Ok(message::Entity::find()
            .filter(message::Column::ConversationId.eq(conversation_id))
            .order_by_asc(message::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(&self.conn)
            .await?)
    }

    /// Attaches enrichment to an assistant reply; only the `Some` fields of
    /// `enrichment` are touched.
    ///
    /// USER messages are rejected with [`StoreError::InvalidWrite`]; the
    /// enrichment columns stay null on them by invariant.
    pub async fn record_enrichment(
        &self,
        message_id: Uuid,
        enrichment: MessageEnrichment,
    ) -> StoreResult<message::Model> {
        let found = self.require_assistant(message_id).await?;
        let mut active = found.into_active_model();
        if let Some(sql_query) = enrichment.sql_query {
            active.sql_query = Set(Some(sql_query));
        }
        if let Some(chart_config) = enrichment.chart_config {
            active.chart_config = Set(Some(chart_config));
        }
        if let Some(ai_insights) = enrichment.ai_insights {
            active.ai_insights = Set(Some(ai_insights));
        }
        if let Some(response_metadata) = enrichment.response_metadata {
            active.response_metadata = Set(Some(response_metadata));
        }
        if let Some(result_schema) = enrichment.result_schema {
            active.result_schema = Set(Some(result_schema));
        }
        Ok(active.update(&self.conn).await?)
    }

    /// `Pending` → `Streaming`, when the first chunk is about to land.
    pub async fn begin_streaming(&self, message_id: Uuid) -> StoreResult<message::Model> {
        self.transition(message_id, &[MessageStatus::Pending], MessageStatus::Streaming)
            .await
    }

    /// `Pending`/`Streaming` → `Complete`, once every chunk is durable.
    pub async fn complete(&self, message_id: Uuid) -> StoreResult<message::Model> {
        self.transition(
            message_id,
            &[MessageStatus::Pending, MessageStatus::Streaming],
            MessageStatus::Complete,
        )
        .await
    }

    /// `Pending`/`Streaming` → `Failed`.
    pub async fn fail(&self, message_id: Uuid) -> StoreResult<message::Model> {
        self.transition(
            message_id,
            &[MessageStatus::Pending, MessageStatus::Streaming],
            MessageStatus::Failed,
        )
        .await
    }

    async fn transition(
        &self,
        message_id: Uuid,
        allowed_from: &[MessageStatus],
        to: MessageStatus,
    ) -> StoreResult<message::Model> {
        let found = self.require_assistant(message_id).await?;
        if !allowed_from.contains(&found.status) {
            return Err(StoreError::Conflict(format!(
                "illegal status transition {:?} -> {:?}",
                found.status, to
            )));
        }
        let mut active = found.into_active_model();
        active.status = Set(to);
        Ok(active.update(&self.conn).await?)
    }

    /// Records the single feedback verdict for an assistant reply.
    ///
    /// A second verdict from anyone is a [`StoreError::Conflict`]; the
    /// original author revises through [`MessageStore::update_feedback`].
    pub async fn add_feedback(
        &self,
        message_id: Uuid,
        author: Uuid,
        is_positive: bool,
        comment: Option<String>,
    ) -> StoreResult<message::Model> {
        validate_comment(&comment)?;
        let found = self.require_assistant(message_id).await?;
        if found.is_positive.is_some() {
            return Err(StoreError::Conflict(
                "feedback already recorded for this message".into(),
            ));
        }
        let mut active = found.into_active_model();
        active.is_positive = Set(Some(is_positive));
        active.feedback_comment = Set(comment);
        active.feedback_user_id = Set(Some(author));
        active.feedback_created_at = Set(Some(now()));
        Ok(active.update(&self.conn).await?)
    }

    /// Lets the original feedback author change their verdict or comment.
    pub async fn update_feedback(
        &self,
        message_id: Uuid,
        author: Uuid,
        is_positive: bool,
        comment: Option<String>,
    ) -> StoreResult<message::Model> {
        validate_comment(&comment)?;
        let found = self.require_assistant(message_id).await?;
        match (found.feedback_user_id, found.is_positive) {
            (None, None) => {
                return Err(StoreError::NotFound("feedback"));
            }
            // The author was deleted; the detached verdict stays frozen
            // rather than letting someone else claim it.
            (None, Some(_)) => {
                return Err(StoreError::Conflict(
                    "feedback author no longer exists".into(),
                ));
            }
            (Some(existing), _) if existing != author => {
                return Err(StoreError::Conflict(
                    "feedback was recorded by a different user".into(),
                ));
            }
            _ => {}
        }
        let mut active = found.into_active_model();
        active.is_positive = Set(Some(is_positive));
        active.feedback_comment = Set(comment);
        active.feedback_user_id = Set(Some(author));
        Ok(active.update(&self.conn).await?)
    }

    /// Detaches a user from every feedback they authored, keeping the
    /// verdicts. Returns the number of messages touched.
    pub async fn clear_feedback_attribution(&self, user_id: Uuid) -> StoreResult<u64> {
        let result = message::Entity::update_many()
            .col_expr(message::Column::FeedbackUserId, Expr::value(None::<Uuid>))
            .filter(message::Column::FeedbackUserId.eq(user_id))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    async fn require_assistant(&self, message_id: Uuid) -> StoreResult<message::Model> {
        let found = message::Entity::find_by_id(message_id)
            .one(&self.conn)
            .await?
            .ok_or(StoreError::NotFound("message"))?;
        if found.message_type == MessageType::User {
            return Err(StoreError::InvalidWrite(
                "operation applies to assistant messages only".into(),
            ));
        }
        Ok(found)
    }
}

fn validate_comment(comment: &Option<String>) -> StoreResult<()> {
    if let Some(text) = comment {
        // The column width is measured in characters, not bytes.
        if text.chars().count() > FEEDBACK_COMMENT_MAX {
            return Err(StoreError::InvalidWrite(format!(
                "feedback comment exceeds {FEEDBACK_COMMENT_MAX} characters"
            )));
        }
    }
    Ok(())
}
