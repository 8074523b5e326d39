//! The linear schema revision chain.
//!
//! Each step revises exactly one predecessor; the chain has one head (the
//! initial schema) and one tail (the current schema). Steps guard the objects
//! they create so re-running against a database that already has them skips
//! instead of failing, and teardown of objects that may be absent in diverged
//! environments is tolerated. The migration table named below is the single
//! persisted schema-version pointer.

pub use sea_orm_migration::prelude::*;

mod support;

mod m20241229_000001_initial_schema;
mod m20241230_000002_message_enrichment_fields;
mod m20241230_000003_create_assistant_results;
mod m20241230_000004_rename_assistant_results;
mod m20241230_000005_drop_result_data_index;
mod m20241231_000006_create_message_chunks;
mod m20241231_000007_message_feedback_fields;
mod m20250101_000008_message_status;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    // Override the name of the migration table to avoid conflicts
    fn migration_table_name() -> sea_orm::DynIden {
        Alias::new("assistant_chat_migrations").into_iden()
    }

    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20241229_000001_initial_schema::Migration),
            Box::new(m20241230_000002_message_enrichment_fields::Migration),
            Box::new(m20241230_000003_create_assistant_results::Migration),
            Box::new(m20241230_000004_rename_assistant_results::Migration),
            Box::new(m20241230_000005_drop_result_data_index::Migration),
            Box::new(m20241231_000006_create_message_chunks::Migration),
            Box::new(m20241231_000007_message_feedback_fields::Migration),
            Box::new(m20250101_000008_message_status::Migration),
        ]
    }
}
