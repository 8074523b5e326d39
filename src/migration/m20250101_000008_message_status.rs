//! Adds the explicit response lifecycle column to `chat_messages`.
//!
//! Completeness of a streamed reply was previously implicit in "all chunks
//! written"; `status` makes it a stored fact. Rows that predate the column
//! were all finished responses, so the backfill default is `complete`.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(ChatMessages::Table)
                    .add_column(
                        ColumnDef::new(ChatMessages::Status)
                            .string_len(16)
                            .not_null()
                            .default("complete"),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(ChatMessages::Table)
                    .drop_column(ChatMessages::Status)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum ChatMessages {
    Table,
    Status,
}
