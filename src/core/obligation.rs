//! Obligation business logic - creation, queries, and voiding.
//!
//! Creation validates input and initializes the aggregates; afterwards the
//! reconciliation engine is the only writer of `amount_settled`,
//! `balance_remaining`, and `settlement_status`.

use crate::{
    core::status::derive_status,
    entities::{Obligation, obligation},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use std::{fmt, str::FromStr};

/// The two entity pairs the reconciliation pattern serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObligationKind {
    /// A purchase invoice settled by supplier payments
    PurchaseInvoice,
    /// A consignment order settled by consignment payments
    ConsignmentOrder,
}

impl ObligationKind {
    /// String form stored in the `kind` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PurchaseInvoice => "purchase_invoice",
            Self::ConsignmentOrder => "consignment_order",
        }
    }
}

impl fmt::Display for ObligationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObligationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "purchase_invoice" => Ok(Self::PurchaseInvoice),
            "consignment_order" => Ok(Self::ConsignmentOrder),
            other => Err(Error::Validation {
                field: "kind".to_string(),
                message: format!("unknown obligation kind: {other}"),
            }),
        }
    }
}

/// Creates a new obligation with zeroed aggregates.
///
/// Validates that the reference, counterparty, and creator are non-empty and
/// that the total is a finite positive amount. The reference must be unique
/// across obligations.
pub async fn create_obligation(
    db: &DatabaseConnection,
    reference: String,
    kind: ObligationKind,
    counterparty: String,
    total_obligation: f64,
    created_by: String,
) -> Result<obligation::Model> {
    if reference.trim().is_empty() {
        return Err(Error::Validation {
            field: "reference".to_string(),
            message: "reference cannot be empty".to_string(),
        });
    }

    if counterparty.trim().is_empty() {
        return Err(Error::Validation {
            field: "counterparty".to_string(),
            message: "counterparty cannot be empty".to_string(),
        });
    }

    if created_by.trim().is_empty() {
        return Err(Error::Validation {
            field: "created_by".to_string(),
            message: "created_by cannot be empty".to_string(),
        });
    }

    if !total_obligation.is_finite() || total_obligation <= 0.0 {
        return Err(Error::InvalidAmount {
            amount: total_obligation,
        });
    }

    let now = chrono::Utc::now();
    let model = obligation::ActiveModel {
        reference: Set(reference.trim().to_string()),
        kind: Set(kind.as_str().to_string()),
        counterparty: Set(counterparty.trim().to_string()),
        total_obligation: Set(total_obligation),
        amount_settled: Set(0.0),
        balance_remaining: Set(total_obligation),
        settlement_status: Set(derive_status(total_obligation, 0.0).as_str().to_string()),
        created_at: Set(now),
        created_by: Set(created_by),
        is_voided: Set(false),
        ..Default::default()
    };

    let result = model.insert(db).await?;
    Ok(result)
}

/// Finds an obligation by its unique ID.
pub async fn get_obligation_by_id(
    db: &DatabaseConnection,
    obligation_id: i64,
) -> Result<Option<obligation::Model>> {
    Obligation::find_by_id(obligation_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds an active obligation by its unique reference.
pub async fn get_obligation_by_reference(
    db: &DatabaseConnection,
    reference: &str,
) -> Result<Option<obligation::Model>> {
    Obligation::find()
        .filter(obligation::Column::Reference.eq(reference))
        .filter(obligation::Column::IsVoided.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all active (non-voided) obligations, ordered by reference.
pub async fn get_all_active_obligations(
    db: &DatabaseConnection,
) -> Result<Vec<obligation::Model>> {
    Obligation::find()
        .filter(obligation::Column::IsVoided.eq(false))
        .order_by_asc(obligation::Column::Reference)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves active obligations with balance outstanding, optionally
/// filtered by kind.
pub async fn get_open_obligations(
    db: &DatabaseConnection,
    kind: Option<ObligationKind>,
) -> Result<Vec<obligation::Model>> {
    let mut query = Obligation::find()
        .filter(obligation::Column::IsVoided.eq(false))
        .filter(obligation::Column::BalanceRemaining.gt(0.0));

    if let Some(kind) = kind {
        query = query.filter(obligation::Column::Kind.eq(kind.as_str()));
    }

    query
        .order_by_asc(obligation::Column::Reference)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Voids an obligation so it no longer appears in queries or accepts payments.
///
/// Voiding is only permitted while nothing has been settled; an obligation
/// with payments must have them reversed first.
pub async fn void_obligation(db: &DatabaseConnection, obligation_id: i64) -> Result<()> {
    let obligation = get_obligation_by_id(db, obligation_id)
        .await?
        .ok_or_else(|| Error::ObligationNotFound {
            reference: obligation_id.to_string(),
        })?;

    if obligation.is_voided {
        return Err(Error::ObligationNotFound {
            reference: obligation_id.to_string(),
        });
    }

    if obligation.amount_settled > 0.0 {
        return Err(Error::Validation {
            field: "amount_settled".to_string(),
            message: format!(
                "cannot void {}: settled payments exist, reverse them first",
                obligation.reference
            ),
        });
    }

    let mut model: obligation::ActiveModel = obligation.into();
    model.is_voided = Set(true);
    model.update(db).await?;
    Ok(())
}
