use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

use crate::entity::user_session;
use crate::error::{conflict_on_unique, StoreResult};

use super::now;

/// Everything needed to persist a freshly issued session.
///
/// The token comes from the authentication collaborator; this store only
/// records it.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: DateTimeWithTimeZone,
    pub remember_me: bool,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

/// Store for authentication session rows.
#[derive(Debug, Clone)]
pub struct SessionStore {
    conn: DatabaseConnection,
}

impl SessionStore {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Persists a session issued at login.
    ///
    /// Returns [`StoreError::Conflict`](crate::StoreError::Conflict) if the
    /// token is already stored.
    pub async fn create_session(&self, session: NewSession) -> StoreResult<user_session::Model> {
        let model = user_session::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(session.user_id),
            session_token: Set(session.token),
            expires_at: Set(session.expires_at),
            remember_me: Set(session.remember_me),
            created_at: Set(now()),
            user_agent: Set(session.user_agent),
            ip_address: Set(session.ip_address),
        };
        model
            .insert(&self.conn)
            .await
            .map_err(|e| conflict_on_unique(e, "session token already in use"))
    }

    /// Looks a session up by token, filtering out expired rows at the query
    /// level.
    pub async fn find_valid(&self, token: &str) -> StoreResult<Option<user_session::Model>> {
        Ok(user_session::Entity::find()
            .filter(user_session::Column::SessionToken.eq(token))
            .filter(user_session::Column::ExpiresAt.gt(now()))
            .one(&self.conn)
            .await?)
    }

    /// Invalidates one session (explicit logout). Deleting an unknown token
    /// is not an error.
    pub async fn delete_session(&self, token: &str) -> StoreResult<()> {
        user_session::Entity::delete_many()
            .filter(user_session::Column::SessionToken.eq(token))
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    /// Invalidates every session belonging to a user ("log out everywhere").
    pub async fn delete_user_sessions(&self, user_id: Uuid) -> StoreResult<u64> {
        let result = user_session::Entity::delete_many()
            .filter(user_session::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    /// Bulk-deletes every expired session; intended for a periodic sweep.
    pub async fn delete_expired(&self) -> StoreResult<u64> {
        let result = user_session::Entity::delete_many()
            .filter(user_session::Column::ExpiresAt.lt(now()))
            .exec(&self.conn)
            .await?;
        tracing::debug!(swept = result.rows_affected, "removed expired sessions");
        Ok(result.rows_affected)
    }
}
