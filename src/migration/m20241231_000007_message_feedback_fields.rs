//! Folds user feedback onto `chat_messages`: a tri-state verdict, a short
//! comment, the feedback author, and a timestamp.
//!
//! This is the surviving feedback model; the earlier free-standing
//! `feedback_rating` columns on the response table are dead. At most one
//! verdict is stored per message, made explicit by the unique
//! `(id, feedback_user_id)` index.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DbBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(ChatMessages::Table)
                    .add_column(ColumnDef::new(ChatMessages::IsPositive).boolean())
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(ChatMessages::Table)
                    .add_column(ColumnDef::new(ChatMessages::FeedbackComment).string_len(255))
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(ChatMessages::Table)
                    .add_column(ColumnDef::new(ChatMessages::FeedbackUserId).uuid())
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(ChatMessages::Table)
                    .add_column(
                        ColumnDef::new(ChatMessages::FeedbackCreatedAt)
                            .timestamp_with_time_zone(),
                    )
                    .to_owned(),
            )
            .await?;

        // SQLite cannot add a constraint to an existing table; there the
        // set-null semantics live in the store layer instead.
        if manager.get_database_backend() == DbBackend::Postgres {
            manager
                .alter_table(
                    Table::alter()
                        .table(ChatMessages::Table)
                        .add_foreign_key(
                            TableForeignKey::new()
                                .name("fk_messages_feedback_user_id")
                                .from_tbl(ChatMessages::Table)
                                .from_col(ChatMessages::FeedbackUserId)
                                .to_tbl(Users::Table)
                                .to_col(Users::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;
        }

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_messages_feedback_user_id")
                    .table(ChatMessages::Table)
                    .col(ChatMessages::FeedbackUserId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_message_user_feedback")
                    .table(ChatMessages::Table)
                    .col(ChatMessages::Id)
                    .col(ChatMessages::FeedbackUserId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("uq_message_user_feedback")
                    .table(ChatMessages::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_messages_feedback_user_id")
                    .table(ChatMessages::Table)
                    .to_owned(),
            )
            .await?;

        if manager.get_database_backend() == DbBackend::Postgres {
            manager
                .alter_table(
                    Table::alter()
                        .table(ChatMessages::Table)
                        .drop_foreign_key(Alias::new("fk_messages_feedback_user_id"))
                        .to_owned(),
                )
                .await?;
        }

        manager
            .alter_table(
                Table::alter()
                    .table(ChatMessages::Table)
                    .drop_column(ChatMessages::FeedbackCreatedAt)
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(ChatMessages::Table)
                    .drop_column(ChatMessages::FeedbackUserId)
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(ChatMessages::Table)
                    .drop_column(ChatMessages::FeedbackComment)
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(ChatMessages::Table)
                    .drop_column(ChatMessages::IsPositive)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum ChatMessages {
    Table,
    Id,
    IsPositive,
    FeedbackComment,
    FeedbackUserId,
    FeedbackCreatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
