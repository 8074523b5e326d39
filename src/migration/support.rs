//! Backend-aware helpers shared by the migration steps.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::sea_query::extension::postgres::Type;
use sea_orm_migration::sea_orm::{ConnectionTrait, DbBackend, Statement};

/// Returns whether a Postgres enum type of the given name exists. Always
/// false on other backends, where enums degrade to plain strings.
pub(crate) async fn pg_enum_exists(
    manager: &SchemaManager<'_>,
    type_name: &str,
) -> Result<bool, DbErr> {
    if manager.get_database_backend() != DbBackend::Postgres {
        return Ok(false);
    }
    let stmt = Statement::from_sql_and_values(
        DbBackend::Postgres,
        "SELECT 1 FROM pg_type WHERE typname = $1",
        [type_name.into()],
    );
    Ok(manager.get_connection().query_one(stmt).await?.is_some())
}

/// Creates a Postgres enum type unless it is already present, in which case
/// the step logs and moves on. No-op on other backends.
pub(crate) async fn create_enum_type(
    manager: &SchemaManager<'_>,
    type_name: &str,
    values: &[&str],
) -> Result<(), DbErr> {
    if manager.get_database_backend() != DbBackend::Postgres {
        return Ok(());
    }
    if pg_enum_exists(manager, type_name).await? {
        tracing::info!(type_name, "enum type already exists, skipping creation");
        return Ok(());
    }
    manager
        .create_type(
            Type::create()
                .as_enum(Alias::new(type_name))
                .values(values.iter().map(|value| Alias::new(*value)))
                .to_owned(),
        )
        .await
}

/// Drops a Postgres enum type. No-op on other backends.
pub(crate) async fn drop_enum_type(
    manager: &SchemaManager<'_>,
    type_name: &str,
) -> Result<(), DbErr> {
    if manager.get_database_backend() != DbBackend::Postgres {
        return Ok(());
    }
    manager
        .drop_type(Type::drop().name(Alias::new(type_name)).to_owned())
        .await
}

/// Column definition for an enum-typed column: the native enum type on
/// Postgres, a plain string elsewhere.
pub(crate) fn enum_column(
    manager: &SchemaManager<'_>,
    name: impl IntoIden,
    type_name: &str,
) -> ColumnDef {
    let mut column = ColumnDef::new(name);
    match manager.get_database_backend() {
        DbBackend::Postgres => {
            column.custom(Alias::new(type_name));
        }
        _ => {
            column.string();
        }
    }
    column
}
