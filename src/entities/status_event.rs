//! Status event entity - Audit log of settlement status transitions.
//!
//! A row is written in the same transaction as the reconciliation operation
//! that changed the parent's status, so regressions (e.g. paid back to
//! partially paid after a reversal) keep a durable trail of why they happened.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Status event database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "status_events")]
pub struct Model {
    /// Unique identifier for the event
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the obligation whose status changed
    pub obligation_id: i64,
    /// Ledger entry that triggered the transition, if any
    pub entry_id: Option<i64>,
    /// Status before the transition
    pub previous_status: String,
    /// Status after the transition
    pub new_status: String,
    /// What caused it: `"payment_applied"`, `"payment_reversed"`, or `"payment_amended"`
    pub cause: String,
    /// When the transition was recorded
    pub recorded_at: DateTimeUtc,
    /// Who performed the operation that caused it
    pub recorded_by: String,
}

/// Defines relationships between `StatusEvent` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each event belongs to one obligation
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
