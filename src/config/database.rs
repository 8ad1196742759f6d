//! Database configuration module.
//!
//! Handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, ensuring the database schema matches
//! the Rust struct definitions without requiring manual SQL.

use crate::entities::{LedgerEntry, Obligation, StatusEvent};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Gets the database URL from the `DATABASE_URL` environment variable,
/// falling back to a default local `SQLite` file.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://data/tallybook.sqlite".to_string())
}

/// Establishes a connection to the database named by [`get_database_url`].
pub async fn create_connection() -> Result<DatabaseConnection> {
    Database::connect(get_database_url()).await.map_err(Into::into)
}

/// Creates all necessary tables using `SeaORM`'s schema generation from the
/// entity definitions: obligations, ledger entries, and status events.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let obligation_table = schema.create_table_from_entity(Obligation);
    let ledger_entry_table = schema.create_table_from_entity(LedgerEntry);
    let status_event_table = schema.create_table_from_entity(StatusEvent);

    db.execute(builder.build(&obligation_table)).await?;
    db.execute(builder.build(&ledger_entry_table)).await?;
    db.execute(builder.build(&status_event_table)).await?;

    Ok(())
}
