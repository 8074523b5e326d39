//! Renames `assistant_results` to `ai_result_data`, renaming its indexes to
//! match by drop-and-recreate (index renames are not portable).

use sea_orm_migration::prelude::*;

use super::m20241230_000003_create_assistant_results::AssistantResults;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .rename_table(
                Table::rename()
                    .table(AssistantResults::Table, AiResultData::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_assistant_results_message_id")
                    .table(AiResultData::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_assistant_results_chunk_index")
                    .table(AiResultData::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("uq_assistant_results_chunk")
                    .table(AiResultData::Table)
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

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_ai_result_data_message_id")
                    .table(AiResultData::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_ai_result_data_chunk_index")
                    .table(AiResultData::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("uq_ai_result_data_chunk")
                    .table(AiResultData::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .rename_table(
                Table::rename()
                    .table(AiResultData::Table, AssistantResults::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_assistant_results_message_id")
                    .table(AssistantResults::Table)
                    .col(AssistantResults::MessageId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_assistant_results_chunk_index")
                    .table(AssistantResults::Table)
                    .col(AssistantResults::ChunkIndex)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_assistant_results_chunk")
                    .table(AssistantResults::Table)
                    .col(AssistantResults::MessageId)
                    .col(AssistantResults::ChunkIndex)
                    .unique()
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum AiResultData {
    Table,
    Id,
    MessageId,
    ConversationId,
    UserId,
    ChunkIndex,
    TotalChunks,
    ResultData,
    DataValidationStatus,
    ValidationErrors,
    CreatedAt,
}
