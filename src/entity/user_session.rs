//! Authentication session entity.
//!
//! Maps to the `user_sessions` table. Tokens are issued and validated by the
//! authentication collaborator; this layer only stores the rows. A session
//! cannot outlive its user, so the foreign key cascades on delete.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sea-ORM model for the `user_sessions` table.
///
/// `session_token` is unique; `expires_at` drives both the validity filter on
/// load and the bulk sweep in [`crate::SessionStore::delete_expired`].
/// `user_agent` and `ip_address` are optional client metadata captured at
/// login.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    #[sea_orm(unique)]
    pub session_token: String,
    pub expires_at: DateTimeWithTimeZone,
    pub remember_me: bool,
    pub created_at: DateTimeWithTimeZone,
    #[sea_orm(column_type = "Text", nullable)]
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
