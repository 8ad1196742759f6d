//! Ledger-vs-aggregate consistency checks and status history.
//!
//! The entries collection is the source of truth; the parent aggregates are
//! a materialized view of it. These checks recompute the view from the
//! ledger and report any drift, and expose the recorded status transitions.

use crate::{
    core::status::{SettlementStatus, derive_status},
    entities::{LedgerEntry, Obligation, StatusEvent, ledger_entry, obligation, status_event},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, prelude::*};

/// Tolerance for comparing accumulated monetary floats.
const AMOUNT_TOLERANCE: f64 = 1e-6;

/// Stored vs. ledger-derived view of one obligation.
#[derive(Debug, Clone)]
pub struct LedgerAudit {
    /// The audited obligation
    pub obligation_id: i64,
    /// Its human-facing reference
    pub reference: String,
    /// Aggregate stored on the parent record
    pub stored_amount_settled: f64,
    /// Sum of the ledger entry amounts
    pub entry_total: f64,
    /// Number of ledger entries
    pub entry_count: usize,
    /// Balance stored on the parent record
    pub stored_balance_remaining: f64,
    /// Balance recomputed from the ledger
    pub derived_balance_remaining: f64,
    /// Status stored on the parent record
    pub stored_status: String,
    /// Status recomputed from the ledger
    pub derived_status: SettlementStatus,
}

impl LedgerAudit {
    /// True when the stored aggregates match the ledger.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        (self.stored_amount_settled - self.entry_total).abs() < AMOUNT_TOLERANCE
            && (self.stored_balance_remaining - self.derived_balance_remaining).abs()
                < AMOUNT_TOLERANCE
            && self.stored_status == self.derived_status.as_str()
    }
}

async fn audit_model(db: &DatabaseConnection, obligation: obligation::Model) -> Result<LedgerAudit> {
    let entries = LedgerEntry::find()
        .filter(ledger_entry::Column::ObligationId.eq(obligation.id))
        .all(db)
        .await?;

    let entry_total: f64 = entries.iter().map(|entry| entry.amount).sum();
    let derived_balance = obligation.total_obligation - entry_total;

    Ok(LedgerAudit {
        obligation_id: obligation.id,
        reference: obligation.reference,
        stored_amount_settled: obligation.amount_settled,
        entry_total,
        entry_count: entries.len(),
        stored_balance_remaining: obligation.balance_remaining,
        derived_balance_remaining: derived_balance,
        stored_status: obligation.settlement_status,
        derived_status: derive_status(derived_balance, entry_total),
    })
}

/// Recomputes one obligation's aggregates from its ledger entries.
pub async fn audit_obligation(db: &DatabaseConnection, obligation_id: i64) -> Result<LedgerAudit> {
    let obligation = Obligation::find_by_id(obligation_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::ObligationNotFound {
            reference: obligation_id.to_string(),
        })?;

    audit_model(db, obligation).await
}

/// Audits every active obligation, ordered by reference.
pub async fn audit_all(db: &DatabaseConnection) -> Result<Vec<LedgerAudit>> {
    let obligations = Obligation::find()
        .filter(obligation::Column::IsVoided.eq(false))
        .order_by_asc(obligation::Column::Reference)
        .all(db)
        .await?;

    let mut audits = Vec::with_capacity(obligations.len());
    for obligation in obligations {
        audits.push(audit_model(db, obligation).await?);
    }
    Ok(audits)
}

/// Recorded status transitions for an obligation, oldest first.
pub async fn status_history(
    db: &DatabaseConnection,
    obligation_id: i64,
) -> Result<Vec<status_event::Model>> {
    StatusEvent::find()
        .filter(status_event::Column::ObligationId.eq(obligation_id))
        .order_by_asc(status_event::Column::RecordedAt)
        .order_by_asc(status_event::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::reconcile::reverse_payment;
    use crate::test_utils::*;
    use sea_orm::Set;

    #[tokio::test]
    async fn test_audit_consistent_after_reconciliation() -> Result<()> {
        let (db, obligation) = setup_with_obligation().await?;

        apply_test_payment(&db, obligation.id, 400.0).await?;
        let second = apply_test_payment(&db, obligation.id, 600.0).await?;
        reverse_payment(&db, &test_config(), second.id, "test_user").await?;

        let audit = audit_obligation(&db, obligation.id).await?;
        assert!(audit.is_consistent());
        assert_eq!(audit.entry_count, 1);
        assert_eq!(audit.entry_total, 400.0);
        assert_eq!(audit.stored_amount_settled, 400.0);
        assert_eq!(audit.derived_balance_remaining, 600.0);
        assert_eq!(audit.derived_status, SettlementStatus::PartiallyPaid);

        Ok(())
    }

    #[tokio::test]
    async fn test_audit_detects_corrupted_aggregate() -> Result<()> {
        let (db, obligation) = setup_with_obligation().await?;

        apply_test_payment(&db, obligation.id, 400.0).await?;

        // Corrupt the stored aggregate outside the engine.
        let parent = crate::core::obligation::get_obligation_by_id(&db, obligation.id)
            .await?
            .unwrap();
        let mut model: crate::entities::obligation::ActiveModel = parent.into();
        model.amount_settled = Set(999.0);
        model.update(&db).await?;

        let audit = audit_obligation(&db, obligation.id).await?;
        assert!(!audit.is_consistent());
        assert_eq!(audit.stored_amount_settled, 999.0);
        assert_eq!(audit.entry_total, 400.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_audit_obligation_not_found() -> Result<()> {
        let db = setup_test_db().await?;

        let result = audit_obligation(&db, 999).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::ObligationNotFound { reference: _ }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_audit_all_covers_active_obligations() -> Result<()> {
        let db = setup_test_db().await?;

        let first = create_test_obligation(&db, "INV-1001").await?;
        create_test_obligation(&db, "INV-1002").await?;
        apply_test_payment(&db, first.id, 250.0).await?;

        let audits = audit_all(&db).await?;
        assert_eq!(audits.len(), 2);
        assert!(audits.iter().all(LedgerAudit::is_consistent));

        Ok(())
    }

    #[tokio::test]
    async fn test_status_history_records_transitions() -> Result<()> {
        let (db, obligation) = setup_with_obligation().await?;
        let config = test_config();

        let first = apply_test_payment(&db, obligation.id, 400.0).await?;
        let second = apply_test_payment(&db, obligation.id, 600.0).await?;
        reverse_payment(&db, &config, second.id, "auditor").await?;

        let history = status_history(&db, obligation.id).await?;
        assert_eq!(history.len(), 3);

        assert_eq!(history[0].previous_status, "unpaid");
        assert_eq!(history[0].new_status, "partially_paid");
        assert_eq!(history[0].cause, "payment_applied");
        assert_eq!(history[0].entry_id, Some(first.id));

        assert_eq!(history[1].previous_status, "partially_paid");
        assert_eq!(history[1].new_status, "paid");
        assert_eq!(history[1].entry_id, Some(second.id));

        assert_eq!(history[2].previous_status, "paid");
        assert_eq!(history[2].new_status, "partially_paid");
        assert_eq!(history[2].cause, "payment_reversed");
        assert_eq!(history[2].recorded_by, "auditor");

        Ok(())
    }

    #[tokio::test]
    async fn test_status_history_skips_unchanged_status() -> Result<()> {
        let (db, obligation) = setup_with_obligation().await?;

        // Two partial payments: only the first changes the status.
        apply_test_payment(&db, obligation.id, 100.0).await?;
        apply_test_payment(&db, obligation.id, 100.0).await?;

        let history = status_history(&db, obligation.id).await?;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].new_status, "partially_paid");

        Ok(())
    }
}
