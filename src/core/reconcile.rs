//! The reconciliation engine - pairs every ledger write with the matching
//! parent update inside one database transaction.
//!
//! [`apply_payment`] adds a ledger entry and folds its amount into the parent
//! aggregates; [`reverse_payment`] removes an entry and restores the parent to
//! the state as if it never existed; [`amend_payment`] composes both for
//! in-place corrections. All three run their read-modify-write under the
//! storage transaction and are retried on concurrency conflicts per
//! [`ReconcileConfig`]. No other code path may write `amount_settled`,
//! `balance_remaining`, or `settlement_status`.

use crate::{
    core::{
        retry::{RetrySettings, with_conflict_retry},
        status::{OverpaymentPolicy, SettlementStatus, derive_status},
    },
    entities::{LedgerEntry, Obligation, ledger_entry, obligation, status_event},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use tracing::info;

/// Engine configuration, injected by the caller rather than read from
/// ambient globals.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// What to do with payments exceeding the outstanding balance
    pub overpayment_policy: OverpaymentPolicy,
    /// Conflict retry behavior
    pub retry: RetrySettings,
}

/// Caller-supplied audit and bookkeeping fields for a ledger entry.
#[derive(Debug, Clone, Default)]
pub struct EntryMetadata {
    /// Who is recording the payment
    pub created_by: String,
    /// Payment method (e.g., `"cash"`, `"check"`, `"bank_transfer"`)
    pub method: Option<String>,
    /// External reference such as a check or wire number
    pub reference: Option<String>,
    /// Free-form note
    pub note: Option<String>,
}

fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}

fn validate_metadata(metadata: &EntryMetadata) -> Result<()> {
    if metadata.created_by.trim().is_empty() {
        return Err(Error::Validation {
            field: "created_by".to_string(),
            message: "created_by cannot be empty".to_string(),
        });
    }
    Ok(())
}

/// Resolves the amount actually applied under the configured policy.
fn applied_amount(policy: OverpaymentPolicy, amount: f64, remaining: f64) -> Result<f64> {
    match policy {
        OverpaymentPolicy::AllowNegative => Ok(amount),
        OverpaymentPolicy::ClampToRemaining => {
            if remaining <= 0.0 {
                Err(Error::OverpaymentRejected { amount, remaining })
            } else {
                Ok(amount.min(remaining))
            }
        }
        OverpaymentPolicy::Reject => {
            if amount > remaining {
                Err(Error::OverpaymentRejected { amount, remaining })
            } else {
                Ok(amount)
            }
        }
    }
}

/// Loads an obligation inside a transaction, treating voided ones as absent.
async fn load_obligation<C>(db: &C, obligation_id: i64) -> Result<obligation::Model>
where
    C: ConnectionTrait,
{
    let model = Obligation::find_by_id(obligation_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::ObligationNotFound {
            reference: obligation_id.to_string(),
        })?;

    if model.is_voided {
        return Err(Error::ObligationNotFound {
            reference: obligation_id.to_string(),
        });
    }

    Ok(model)
}

/// Writes a status-transition audit row when the status actually changed.
async fn record_status_transition<C>(
    db: &C,
    obligation_id: i64,
    entry_id: Option<i64>,
    previous: &str,
    new_status: SettlementStatus,
    cause: &str,
    recorded_by: &str,
) -> Result<()>
where
    C: ConnectionTrait,
{
    if previous == new_status.as_str() {
        return Ok(());
    }

    let event = status_event::ActiveModel {
        obligation_id: Set(obligation_id),
        entry_id: Set(entry_id),
        previous_status: Set(previous.to_string()),
        new_status: Set(new_status.as_str().to_string()),
        cause: Set(cause.to_string()),
        recorded_at: Set(chrono::Utc::now()),
        recorded_by: Set(recorded_by.to_string()),
        ..Default::default()
    };
    event.insert(db).await?;
    Ok(())
}

/// Applies a payment against an obligation.
///
/// Validates the amount and metadata, then, inside a single transaction,
/// reads the obligation, resolves the applied amount under the configured
/// overpayment policy, creates the ledger entry, and updates the parent
/// aggregates. Either everything commits or nothing does; a concurrent
/// writer aborting the transaction triggers a bounded retry.
///
/// # Arguments
/// * `db` - Database connection
/// * `config` - Engine configuration (overpayment policy, retry behavior)
/// * `obligation_id` - The obligation to settle against
/// * `amount` - Payment amount, must be finite and positive
/// * `metadata` - Audit fields recorded on the ledger entry
pub async fn apply_payment(
    db: &DatabaseConnection,
    config: &ReconcileConfig,
    obligation_id: i64,
    amount: f64,
    metadata: EntryMetadata,
) -> Result<ledger_entry::Model> {
    validate_amount(amount)?;
    validate_metadata(&metadata)?;

    with_conflict_retry(&config.retry, "apply_payment", || {
        let metadata = metadata.clone();
        async move {
            let txn = db.begin().await?;

            let parent = load_obligation(&txn, obligation_id).await?;

            let applied =
                applied_amount(config.overpayment_policy, amount, parent.balance_remaining)?;
            let new_settled = parent.amount_settled + applied;
            let new_balance = parent.total_obligation - new_settled;
            let new_status = derive_status(new_balance, new_settled);
            let previous_status = parent.settlement_status.clone();

            let entry = ledger_entry::ActiveModel {
                obligation_id: Set(obligation_id),
                amount: Set(applied),
                method: Set(metadata.method),
                reference: Set(metadata.reference),
                note: Set(metadata.note),
                created_at: Set(chrono::Utc::now()),
                created_by: Set(metadata.created_by.clone()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;

            let mut parent_update: obligation::ActiveModel = parent.into();
            parent_update.amount_settled = Set(new_settled);
            parent_update.balance_remaining = Set(new_balance);
            parent_update.settlement_status = Set(new_status.as_str().to_string());
            parent_update.update(&txn).await?;

            record_status_transition(
                &txn,
                obligation_id,
                Some(entry.id),
                &previous_status,
                new_status,
                "payment_applied",
                &metadata.created_by,
            )
            .await?;

            txn.commit().await?;

            info!(
                obligation_id,
                amount = applied,
                balance_remaining = new_balance,
                status = %new_status,
                "payment applied"
            );
            Ok(entry)
        }
    })
    .await
}

/// Reverses a previously applied payment.
///
/// Inside a single transaction, deletes the ledger entry and restores the
/// parent aggregates to the state as if the entry never existed. A missing
/// parent means the entry was orphaned; it is surfaced rather than deleted
/// blindly.
///
/// # Arguments
/// * `db` - Database connection
/// * `config` - Engine configuration
/// * `entry_id` - The ledger entry to reverse
/// * `reversed_by` - Who is performing the reversal, recorded on the status event
pub async fn reverse_payment(
    db: &DatabaseConnection,
    config: &ReconcileConfig,
    entry_id: i64,
    reversed_by: &str,
) -> Result<()> {
    if reversed_by.trim().is_empty() {
        return Err(Error::Validation {
            field: "reversed_by".to_string(),
            message: "reversed_by cannot be empty".to_string(),
        });
    }

    with_conflict_retry(&config.retry, "reverse_payment", || async move {
        let txn = db.begin().await?;

        let entry = LedgerEntry::find_by_id(entry_id)
            .one(&txn)
            .await?
            .ok_or(Error::EntryNotFound { id: entry_id })?;

        let parent = load_obligation(&txn, entry.obligation_id).await?;

        let mut new_settled = parent.amount_settled - entry.amount;
        if new_settled < 0.0 {
            if config.overpayment_policy == OverpaymentPolicy::ClampToRemaining {
                new_settled = 0.0;
            } else {
                return Err(Error::ReversalExceedsSettled {
                    amount: entry.amount,
                    settled: parent.amount_settled,
                });
            }
        }
        let new_balance = parent.total_obligation - new_settled;
        let new_status = derive_status(new_balance, new_settled);
        let previous_status = parent.settlement_status.clone();
        let obligation_id = entry.obligation_id;
        let amount = entry.amount;

        entry.delete(&txn).await?;

        let mut parent_update: obligation::ActiveModel = parent.into();
        parent_update.amount_settled = Set(new_settled);
        parent_update.balance_remaining = Set(new_balance);
        parent_update.settlement_status = Set(new_status.as_str().to_string());
        parent_update.update(&txn).await?;

        record_status_transition(
            &txn,
            obligation_id,
            Some(entry_id),
            &previous_status,
            new_status,
            "payment_reversed",
            reversed_by,
        )
        .await?;

        txn.commit().await?;

        info!(
            obligation_id,
            entry_id,
            amount,
            balance_remaining = new_balance,
            status = %new_status,
            "payment reversed"
        );
        Ok(())
    })
    .await
}

/// Replaces a payment with a corrected amount in one atomic step.
///
/// A correction is modeled as delete plus re-add; composing both sides into
/// a single transaction means no reader ever observes the ledger without
/// either the old or the new entry. The replacement entry carries the
/// supplied metadata.
pub async fn amend_payment(
    db: &DatabaseConnection,
    config: &ReconcileConfig,
    entry_id: i64,
    new_amount: f64,
    metadata: EntryMetadata,
) -> Result<ledger_entry::Model> {
    validate_amount(new_amount)?;
    validate_metadata(&metadata)?;

    with_conflict_retry(&config.retry, "amend_payment", || {
        let metadata = metadata.clone();
        async move {
            let txn = db.begin().await?;

            let entry = LedgerEntry::find_by_id(entry_id)
                .one(&txn)
                .await?
                .ok_or(Error::EntryNotFound { id: entry_id })?;

            let parent = load_obligation(&txn, entry.obligation_id).await?;

            let settled_without = parent.amount_settled - entry.amount;
            if settled_without < 0.0 {
                return Err(Error::ReversalExceedsSettled {
                    amount: entry.amount,
                    settled: parent.amount_settled,
                });
            }
            let remaining_without = parent.total_obligation - settled_without;
            let applied =
                applied_amount(config.overpayment_policy, new_amount, remaining_without)?;

            let new_settled = settled_without + applied;
            let new_balance = parent.total_obligation - new_settled;
            let new_status = derive_status(new_balance, new_settled);
            let previous_status = parent.settlement_status.clone();
            let obligation_id = entry.obligation_id;

            entry.delete(&txn).await?;

            let replacement = ledger_entry::ActiveModel {
                obligation_id: Set(obligation_id),
                amount: Set(applied),
                method: Set(metadata.method),
                reference: Set(metadata.reference),
                note: Set(metadata.note),
                created_at: Set(chrono::Utc::now()),
                created_by: Set(metadata.created_by.clone()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;

            let mut parent_update: obligation::ActiveModel = parent.into();
            parent_update.amount_settled = Set(new_settled);
            parent_update.balance_remaining = Set(new_balance);
            parent_update.settlement_status = Set(new_status.as_str().to_string());
            parent_update.update(&txn).await?;

            record_status_transition(
                &txn,
                obligation_id,
                Some(replacement.id),
                &previous_status,
                new_status,
                "payment_amended",
                &metadata.created_by,
            )
            .await?;

            txn.commit().await?;

            info!(
                obligation_id,
                entry_id,
                amount = applied,
                balance_remaining = new_balance,
                status = %new_status,
                "payment amended"
            );
            Ok(replacement)
        }
    })
    .await
}

/// Retrieves all ledger entries for an obligation, newest first.
pub async fn get_entries_for_obligation(
    db: &DatabaseConnection,
    obligation_id: i64,
) -> Result<Vec<ledger_entry::Model>> {
    LedgerEntry::find()
        .filter(ledger_entry::Column::ObligationId.eq(obligation_id))
        .order_by_desc(ledger_entry::Column::CreatedAt)
        .order_by_desc(ledger_entry::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a specific ledger entry by its unique ID.
pub async fn get_entry_by_id(
    db: &DatabaseConnection,
    entry_id: i64,
) -> Result<Option<ledger_entry::Model>> {
    LedgerEntry::find_by_id(entry_id)
        .one(db)
        .await
        .map_err(Into::into)
}
