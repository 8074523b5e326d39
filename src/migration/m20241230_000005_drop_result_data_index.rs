//! Drops the index on `ai_result_data.result_data` where one exists.
//!
//! Only some environments ever had this index (it came from an eager
//! create-all path, not from the chain), and it is what triggered the
//! "index row requires N bytes, maximum size is 8191" insert failures on
//! large JSON payloads. Absence is tolerated: the step checks first and
//! skips instead of failing the chain.

use sea_orm_migration::prelude::*;

use super::m20241230_000004_rename_assistant_results::AiResultData;

const INDEX_NAME: &str = "idx_ai_result_data_result_data";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if manager.has_index("ai_result_data", INDEX_NAME).await? {
            manager
                .drop_index(
                    Index::drop()
                        .name(INDEX_NAME)
                        .table(AiResultData::Table)
                        .to_owned(),
                )
                .await?;
        } else {
            tracing::info!(index = INDEX_NAME, "index not present, skipping drop");
        }
        Ok(())
    }

    // The index is never recreated: payload entries exceed the index-entry
    // size limit, which is the reason this step exists.
    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        Ok(())
    }
}
