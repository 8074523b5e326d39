use sea_orm::prelude::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entity::{message, user};
use crate::error::{conflict_on_unique, StoreError, StoreResult};

use super::now;

/// Store for user identity rows.
///
/// Users are created at registration and touched on login. Application flows
/// never hard-delete them, but [`UserStore::delete_user`] exists for account
/// removal: it cascades the user's sessions, conversations, messages, and
/// chunks, while messages the user merely gave feedback on only lose their
/// attribution.
#[derive(Debug, Clone)]
pub struct UserStore {
    conn: DatabaseConnection,
}

impl UserStore {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Inserts a new active user. The password must already be hashed by the
    /// authentication collaborator; this layer stores whatever it is handed.
    ///
    /// Returns [`StoreError::Conflict`] when the email is taken.
    pub async fn create_user(
        &self,
        email: impl Into<String>,
        username: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> StoreResult<user::Model> {
        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.into()),
            username: Set(username.into()),
            password_hash: Set(password_hash.into()),
            is_active: Set(true),
            created_at: Set(now()),
            updated_at: Set(now()),
            last_login_at: Set(None),
        };
        model
            .insert(&self.conn)
            .await
            .map_err(|e| conflict_on_unique(e, "a user with this email already exists"))
    }

    pub async fn find_by_email(&self, email: &str) -> StoreResult<Option<user::Model>> {
        Ok(user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.conn)
            .await?)
    }

    pub async fn get(&self, id: Uuid) -> StoreResult<Option<user::Model>> {
        Ok(user::Entity::find_by_id(id).one(&self.conn).await?)
    }

    /// Stamps `last_login_at` (and `updated_at`) after a successful login.
    pub async fn record_login(&self, id: Uuid) -> StoreResult<user::Model> {
        let found = user::Entity::find_by_id(id)
            .one(&self.conn)
            .await?
            .ok_or(StoreError::NotFound("user"))?;
        let mut active = found.into_active_model();
        active.last_login_at = Set(Some(now()));
        active.updated_at = Set(now());
        Ok(active.update(&self.conn).await?)
    }

    pub async fn deactivate(&self, id: Uuid) -> StoreResult<user::Model> {
        let found = user::Entity::find_by_id(id)
            .one(&self.conn)
            .await?
            .ok_or(StoreError::NotFound("user"))?;
        let mut active = found.into_active_model();
        active.is_active = Set(false);
        active.updated_at = Set(now());
        Ok(active.update(&self.conn).await?)
    }

    /// Removes a user row.
    ///
    /// Sessions, conversations, messages, and message chunks owned by the
    /// user go with it via the cascade foreign keys. Feedback the user left
    /// on *other* users' messages is detached first in the same transaction,
    /// so those messages keep their verdict but lose the author.
    pub async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        let txn = self.conn.begin().await?;

        message::Entity::update_many()
            .col_expr(message::Column::FeedbackUserId, Expr::value(None::<Uuid>))
            .filter(message::Column::FeedbackUserId.eq(id))
            .exec(&txn)
            .await?;

        let deleted = user::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        if deleted.rows_affected == 0 {
            return Err(StoreError::NotFound("user"));
        }
        tracing::debug!(user_id = %id, "deleted user and dependent rows");
        Ok(())
    }
}
