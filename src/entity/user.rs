//! User identity entity.
//!
//! Maps to the `users` table. A user row is created at registration, touched
//! on login, and never hard-deleted by application flows; sessions,
//! conversations, and messages all cascade from it if it is ever removed.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sea-ORM model for the `users` table.
///
/// # Database Schema
///
/// | Column        | Type               | Description                          |
/// |---------------|--------------------|--------------------------------------|
/// | id            | UUID (Primary Key) | User id                              |
/// | email         | VARCHAR(255)       | Login email, unique                  |
/// | username      | VARCHAR(100)       | Display name                         |
/// | password_hash | VARCHAR(255)       | bcrypt hash, never the raw password  |
/// | is_active     | BOOLEAN            | Soft "account enabled" flag          |
/// | created_at    | TIMESTAMPTZ        | Registration time                    |
/// | updated_at    | TIMESTAMPTZ        | Last profile/login touch             |
/// | last_login_at | TIMESTAMPTZ (null) | Most recent successful login         |
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub username: String,
    // Never leaves the process in serialized form.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub last_login_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_session::Entity")]
    Sessions,
    #[sea_orm(has_many = "super::conversation::Entity")]
    Conversations,
}

impl Related<super::user_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl Related<super::conversation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Conversations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
