//! Ledger entry entity - An immutable record of a single payment.
//!
//! Entries are created and deleted only by the reconciliation engine and are
//! never edited in place; a correction is a delete plus a re-add.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ledger entry database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    /// Unique identifier for the entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the obligation this entry settles against
    pub obligation_id: i64,
    /// Payment amount, always positive
    pub amount: f64,
    /// Payment method (e.g., `"cash"`, `"check"`, `"bank_transfer"`)
    pub method: Option<String>,
    /// External reference such as a check or wire number
    pub reference: Option<String>,
    /// Free-form note
    pub note: Option<String>,
    /// When the payment was recorded
    pub created_at: DateTimeUtc,
    /// Who recorded the payment
    pub created_by: String,
}

/// Defines relationships between `LedgerEntry` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each entry belongs to one obligation
    #[sea_orm(
        belongs_to = "super::obligation::Entity",
        from = "Column::ObligationId",
        to = "super::obligation::Column::Id"
    )]
    Obligation,
}

impl Related<super::obligation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Obligation.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
