use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::entity::conversation;
use crate::error::{StoreError, StoreResult};

use super::now;

/// Store for conversation threads.
///
/// Conversations are soft-deleted: `soft_delete` flips `is_deleted` and the
/// listing queries exclude flagged rows, but the thread and its messages
/// remain until the owning user is removed.
#[derive(Debug, Clone)]
pub struct ConversationStore {
    conn: DatabaseConnection,
}

impl ConversationStore {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Opens a new thread. The title is usually generated from the first
    /// message and can be attached later via [`ConversationStore::rename`].
    pub async fn create_conversation(
        &self,
        user_id: Uuid,
        title: Option<String>,
    ) -> StoreResult<conversation::Model> {
        let model = conversation::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            title: Set(title),
            created_at: Set(now()),
            updated_at: Set(now()),
            is_deleted: Set(false),
        };
        Ok(model.insert(&self.conn).await?)
    }

    /// Fetches a thread by id, soft-deleted or not; callers that care check
    /// `is_deleted` themselves.
    pub async fn get(&self, id: Uuid) -> StoreResult<Option<conversation::Model>> {
        Ok(conversation::Entity::find_by_id(id).one(&self.conn).await?)
    }

    /// Lists a user's live threads, most recently active first.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> StoreResult<Vec<conversation::Model>> {
        Ok(conversation::Entity::find()
            .filter(conversation::Column::UserId.eq(user_id))
            .filter(conversation::Column::IsDeleted.eq(false))
            .order_by_desc(conversation::Column::UpdatedAt)
            .limit(limit)
            .offset(offset)
            .all(&self.conn)
            .await?)
    }

    pub async fn count_for_user(&self, user_id: Uuid) -> StoreResult<u64> {
        Ok(conversation::Entity::find()
            .filter(conversation::Column::UserId.eq(user_id))
            .filter(conversation::Column::IsDeleted.eq(false))
            .count(&self.conn)
            .await?)
    }

    pub async fn rename(&self, id: Uuid, title: impl Into<String>) -> StoreResult<conversation::Model> {
        let found = conversation::Entity::find_by_id(id)
            .one(&self.conn)
            .await?
            .ok_or(StoreError::NotFound("conversation"))?;
        let mut active = found.into_active_model();
        active.title = Set(Some(title.into()));
        active.updated_at = Set(now());
        Ok(active.update(&self.conn).await?)
    }

    /// Marks a thread deleted without removing its rows.
    pub async fn soft_delete(&self, id: Uuid) -> StoreResult<conversation::Model> {
        let found = conversation::Entity::find_by_id(id)
            .one(&self.conn)
            .await?
            .ok_or(StoreError::NotFound("conversation"))?;
        let mut active = found.into_active_model();
        active.is_deleted = Set(true);
        active.updated_at = Set(now());
        Ok(active.update(&self.conn).await?)
    }
}
