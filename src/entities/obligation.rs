//! Obligation entity - Represents the parent record payments settle against.
//!
//! Each obligation carries the total owed plus the running aggregates
//! (`amount_settled`, `balance_remaining`, `settlement_status`) that the
//! reconciliation engine keeps in lockstep with the ledger. An obligation is
//! either a purchase invoice or a consignment order.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Obligation database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "obligations")]
pub struct Model {
    /// Unique identifier for the obligation
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-facing reference (e.g., invoice number, order number)
    #[sea_orm(unique)]
    pub reference: String,
    /// Kind of obligation: `"purchase_invoice"` or `"consignment_order"`
    pub kind: String,
    /// Supplier or consignor this obligation is owed to
    pub counterparty: String,
    /// Total amount owed, fixed at creation
    pub total_obligation: f64,
    /// Running total of payments applied, maintained by the reconciliation engine
    pub amount_settled: f64,
    /// `total_obligation - amount_settled`, stored redundantly for queries
    pub balance_remaining: f64,
    /// Derived status: `"unpaid"`, `"partially_paid"`, or `"paid"`
    pub settlement_status: String,
    /// When the obligation was created
    pub created_at: DateTimeUtc,
    /// Who created the obligation
    pub created_by: String,
    /// Soft-void flag - voided obligations are hidden and reject payments
    pub is_voided: bool,
}

/// Defines relationships between Obligation and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One obligation has many ledger entries
    #[sea_orm(has_many = "super::ledger_entry::Entity")]
    LedgerEntries,
    /// One obligation has many status events
    #[sea_orm(has_many = "super::status_event::Entity")]
    StatusEvents,
}

impl Related<super::ledger_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerEntries.def()
    }
}

impl Related<super::status_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StatusEvents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
