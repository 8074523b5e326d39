//! Replaces `ai_result_data` with the `message_chunks` table.
//!
//! Chunk rows are addressed by `(message_id, chunk_type, data_chunk_index)`
//! and ordered by `(chunk_sequence, data_chunk_index)`. The payload column
//! `chunk_data` carries no index: its entries can exceed the index-entry
//! byte limit, which is precisely what sank the predecessor table.

use sea_orm_migration::prelude::*;

use super::m20241230_000004_rename_assistant_results::AiResultData;
use super::support;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        support::create_enum_type(
            manager,
            "message_chunk_type",
            &["sql", "data", "chart", "insights"],
        )
        .await?;

        if manager.has_table("message_chunks").await? {
            tracing::info!("message_chunks table already exists, skipping creation");
        } else {
            manager
                .create_table(
                    Table::create()
                        .table(MessageChunks::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MessageChunks::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(MessageChunks::MessageId).uuid().not_null())
                        .col(
                            support::enum_column(
                                manager,
                                MessageChunks::ChunkType,
                                "message_chunk_type",
                            )
                            .not_null(),
                        )
                        .col(
                            ColumnDef::new(MessageChunks::ChunkSequence)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MessageChunks::DataChunkIndex)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(MessageChunks::TotalDataChunks)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(MessageChunks::ChunkData)
                                .json_binary()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MessageChunks::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_message_chunks_message_id")
                                .from(MessageChunks::Table, MessageChunks::MessageId)
                                .to(ChatMessages::Table, ChatMessages::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;
        }

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_message_chunks_message_id")
                    .table(MessageChunks::Table)
                    .col(MessageChunks::MessageId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_message_chunks_type")
                    .table(MessageChunks::Table)
                    .col(MessageChunks::ChunkType)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_message_chunks_message_sequence")
                    .table(MessageChunks::Table)
                    .col(MessageChunks::MessageId)
                    .col(MessageChunks::ChunkSequence)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_message_chunks_data_chunk")
                    .table(MessageChunks::Table)
                    .col(MessageChunks::MessageId)
                    .col(MessageChunks::ChunkType)
                    .col(MessageChunks::DataChunkIndex)
                    .unique()
                    .to_owned(),
            )
            .await?;

        if manager.has_table("ai_result_data").await? {
            manager
                .drop_table(Table::drop().table(AiResultData::Table).to_owned())
                .await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MessageChunks::Table).to_owned())
            .await?;
        support::drop_enum_type(manager, "message_chunk_type").await?;

        // Structural restore only; the dropped rows are gone for good.
        manager
            .create_table(
                Table::create()
                    .table(AiResultData::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AiResultData::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AiResultData::MessageId).uuid().not_null())
                    .col(ColumnDef::new(AiResultData::ConversationId).uuid().not_null())
                    .col(ColumnDef::new(AiResultData::UserId).uuid().not_null())
                    .col(ColumnDef::new(AiResultData::ChunkIndex).integer().not_null())
                    .col(ColumnDef::new(AiResultData::TotalChunks).integer().not_null())
                    .col(
                        ColumnDef::new(AiResultData::ResultData)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AiResultData::DataValidationStatus)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(ColumnDef::new(AiResultData::ValidationErrors).text())
                    .col(
                        ColumnDef::new(AiResultData::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_ai_result_data_message_id")
                    .table(AiResultData::Table)
                    .col(AiResultData::MessageId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_ai_result_data_chunk_index")
                    .table(AiResultData::Table)
                    .col(AiResultData::ChunkIndex)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_ai_result_data_chunk")
                    .table(AiResultData::Table)
                    .col(AiResultData::MessageId)
                    .col(AiResultData::ChunkIndex)
                    .unique()
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum MessageChunks {
    Table,
    Id,
    MessageId,
    ChunkType,
    ChunkSequence,
    DataChunkIndex,
    TotalDataChunks,
    ChunkData,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ChatMessages {
    Table,
    Id,
}
