//! Message chunk entity.
//!
//! Maps to the `message_chunks` table: the durable representation of a
//! streamed assistant reply. One logical component of a reply (the SQL text,
//! the tabular data, the chart config, or the insight text) is identified by
//! `(message_id, chunk_type)` and stored as one or more rows.
//!
//! # Database Schema
//!
//! | Column            | Type               | Description                              |
//! |-------------------|--------------------|------------------------------------------|
//! | id                | UUID (Primary Key) | Chunk row id                             |
//! | message_id        | UUID (FK, cascade) | Owning `chat_messages` row               |
//! | chunk_type        | ENUM               | `sql`, `data`, `chart`, or `insights`    |
//! | chunk_sequence    | INTEGER            | Arrival order during streaming           |
//! | data_chunk_index  | INTEGER            | Fragment index within the component      |
//! | total_data_chunks | INTEGER            | Declared fragment count of the component |
//! | chunk_data        | JSONB              | Payload or serialized fragment           |
//! | created_at        | TIMESTAMPTZ        | Write time                               |
//!
//! `(message_id, chunk_type, data_chunk_index)` is unique, and rows are
//! ordered for reassembly by `(chunk_sequence, data_chunk_index)`.
//! `chunk_data` is deliberately unindexed: its entries can exceed the storage
//! engine's index-entry size limit.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The closed set of assistant-reply component types.
///
/// Adding a variant is a schema change (the enum is a database type), which
/// keeps downstream consumers exhaustively matchable.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "message_chunk_type")]
#[serde(rename_all = "lowercase")]
pub enum ChunkType {
    #[sea_orm(string_value = "sql")]
    Sql,
    #[sea_orm(string_value = "data")]
    Data,
    #[sea_orm(string_value = "chart")]
    Chart,
    #[sea_orm(string_value = "insights")]
    Insights,
}

/// Sea-ORM model for the `message_chunks` table.
///
/// An unsplit component occupies a single row with `data_chunk_index = 0` and
/// `total_data_chunks = 1`, holding the complete payload. A split component
/// stores one serialized fragment per row; the fragments concatenate back to
/// the original payload in `data_chunk_index` order. See [`crate::chunk`] for
/// the reassembly contract.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "message_chunks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub message_id: Uuid,
    pub chunk_type: ChunkType,
    pub chunk_sequence: i32,
    pub data_chunk_index: i32,
    pub total_data_chunks: i32,
    #[sea_orm(column_type = "JsonBinary")]
    pub chunk_data: Json,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::message::Entity",
        from = "Column::MessageId",
        to = "super::message::Column::Id",
        on_delete = "Cascade"
    )]
    Message,
}

impl Related<super::message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Message.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
