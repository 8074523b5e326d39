use sea_orm::prelude::Json;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::chunk::{self, Fragment, DEFAULT_FRAGMENT_BYTES};
use crate::entity::message_chunk::{self, ChunkType};
use crate::error::{conflict_on_unique, StoreError, StoreResult};

use super::now;

/// Store for streamed-reply chunk rows.
///
/// One logical component of an assistant reply, identified by message id and
/// [`ChunkType`], becomes one row when its payload is small, or several rows
/// of serialized fragments when it is not. The split/reassembly rules live in
/// [`crate::chunk`]; this store adds the durable half.
#[derive(Debug, Clone)]
pub struct ChunkStore {
    conn: DatabaseConnection,
}

impl ChunkStore {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Persists one component of a streaming reply.
    ///
    /// Payloads up to [`DEFAULT_FRAGMENT_BYTES`] are stored as a single row
    /// holding the JSON value itself. Larger payloads are serialized and cut
    /// into string fragments, one row per fragment, all sharing
    /// `chunk_sequence` and numbered by `data_chunk_index`. All rows land in
    /// one transaction.
    ///
    /// Writing a component position that already exists is a
    /// [`StoreError::Conflict`].
    pub async fn append_component(
        &self,
        message_id: Uuid,
        chunk_type: ChunkType,
        chunk_sequence: i32,
        payload: &Json,
    ) -> StoreResult<Vec<message_chunk::Model>> {
        let serialized = serde_json::to_string(payload).map_err(StoreError::Encode)?;

        let parts: Vec<Json> = if serialized.len() <= DEFAULT_FRAGMENT_BYTES {
            vec![payload.clone()]
        } else {
            chunk::split_fragments(&serialized, DEFAULT_FRAGMENT_BYTES)
                .into_iter()
                .map(|fragment| Json::String(fragment.to_owned()))
                .collect()
        };
        let total = parts.len() as i32;
        tracing::debug!(
            message_id = %message_id,
            ?chunk_type,
            bytes = serialized.len(),
            fragments = total,
            "storing reply component"
        );

        let txn = self.conn.begin().await?;
        let mut stored = Vec::with_capacity(parts.len());
        for (index, part) in parts.into_iter().enumerate() {
            let model = message_chunk::ActiveModel {
                id: Set(Uuid::new_v4()),
                message_id: Set(message_id),
                chunk_type: Set(chunk_type),
                chunk_sequence: Set(chunk_sequence),
                data_chunk_index: Set(index as i32),
                total_data_chunks: Set(total),
                chunk_data: Set(part),
                created_at: Set(now()),
            };
            let inserted = model.insert(&txn).await.map_err(|e| {
                conflict_on_unique(e, "chunk row already stored for this component position")
            })?;
            stored.push(inserted);
        }
        txn.commit().await?;
        Ok(stored)
    }

    /// Reads one component back, reassembling split payloads.
    ///
    /// Returns `Ok(None)` when no rows exist for the pair. Rows that
    /// disagree on `total_data_chunks`, repeat an index, or leave a gap
    /// surface as [`StoreError::Reassembly`]; nothing is guessed.
    pub async fn load_component(
        &self,
        message_id: Uuid,
        chunk_type: ChunkType,
    ) -> StoreResult<Option<Json>> {
        let rows = message_chunk::Entity::find()
            .filter(message_chunk::Column::MessageId.eq(message_id))
            .filter(message_chunk::Column::ChunkType.eq(chunk_type))
            .order_by_asc(message_chunk::Column::ChunkSequence)
            .order_by_asc(message_chunk::Column::DataChunkIndex)
            .all(&self.conn)
            .await?;

        if rows.is_empty() {
            return Ok(None);
        }
        if rows.len() == 1 && rows[0].total_data_chunks == 1 {
            return Ok(Some(rows[0].chunk_data.clone()));
        }

        let fragments = rows
            .into_iter()
            .map(|row| match row.chunk_data {
                Json::String(payload) => Ok(Fragment {
                    index: row.data_chunk_index,
                    total: row.total_data_chunks,
                    payload,
                }),
                _ => Err(StoreError::Decode(
                    "split chunk rows must store string fragments".into(),
                )),
            })
            .collect::<StoreResult<Vec<_>>>()?;

        let assembled = chunk::reassemble(fragments)?;
        let value =
            serde_json::from_str(&assembled).map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(Some(value))
    }

    /// Every chunk row of a message in reassembly order
    /// `(chunk_sequence, data_chunk_index)`, for history reconstruction.
    pub async fn list_for_message(
        &self,
        message_id: Uuid,
    ) -> StoreResult<Vec<message_chunk::Model>> {
        Ok(message_chunk::Entity::find()
            .filter(message_chunk::Column::MessageId.eq(message_id))
            .order_by_asc(message_chunk::Column::ChunkSequence)
            .order_by_asc(message_chunk::Column::DataChunkIndex)
            .all(&self.conn)
            .await?)
    }

    /// Row counts per component type for one message.
    pub async fn count_by_type(&self, message_id: Uuid) -> StoreResult<Vec<(ChunkType, i64)>> {
        Ok(message_chunk::Entity::find()
            .select_only()
            .column(message_chunk::Column::ChunkType)
            .column_as(message_chunk::Column::Id.count(), "count")
            .filter(message_chunk::Column::MessageId.eq(message_id))
            .group_by(message_chunk::Column::ChunkType)
            .into_tuple::<(ChunkType, i64)>()
            .all(&self.conn)
            .await?)
    }

    /// Drops every chunk row of a message. Normally the cascade from the
    /// message row handles this; this exists for re-streaming a reply.
    pub async fn delete_for_message(&self, message_id: Uuid) -> StoreResult<u64> {
        let result = message_chunk::Entity::delete_many()
            .filter(message_chunk::Column::MessageId.eq(message_id))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected)
    }
}
