//! Creates the `assistant_results` table: one row per streamed result chunk,
//! keyed by `(message_id, chunk_index)`.
//!
//! Superseded: large JSON payloads in `result_data` made the table
//! unworkable once environments indexed that column, and the
//! `message_chunks` table replaces it later in the chain. The step stays so
//! databases that lived through that history replay it identically.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AssistantResults::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AssistantResults::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AssistantResults::MessageId).uuid().not_null())
                    .col(
                        ColumnDef::new(AssistantResults::ConversationId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AssistantResults::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(AssistantResults::ChunkIndex)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssistantResults::TotalChunks)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssistantResults::ResultData)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssistantResults::DataValidationStatus)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(ColumnDef::new(AssistantResults::ValidationErrors).text())
                    .col(
                        ColumnDef::new(AssistantResults::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assistant_results_message_id")
                            .from(AssistantResults::Table, AssistantResults::MessageId)
                            .to(ChatMessages::Table, ChatMessages::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assistant_results_conversation_id")
                            .from(AssistantResults::Table, AssistantResults::ConversationId)
                            .to(ChatConversations::Table, ChatConversations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assistant_results_user_id")
                            .from(AssistantResults::Table, AssistantResults::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
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

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AssistantResults::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum AssistantResults {
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

#[derive(DeriveIden)]
enum ChatMessages {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum ChatConversations {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
