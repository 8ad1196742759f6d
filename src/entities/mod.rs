//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod ledger_entry;
pub mod obligation;
pub mod status_event;

// Re-export specific types to avoid conflicts
pub use ledger_entry::{
    Column as LedgerEntryColumn, Entity as LedgerEntry, Model as LedgerEntryModel,
};
pub use obligation::{Column as ObligationColumn, Entity as Obligation, Model as ObligationModel};
pub use status_event::{
    Column as StatusEventColumn, Entity as StatusEvent, Model as StatusEventModel,
};
