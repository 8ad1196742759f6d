//! Settlement status derivation and overpayment policy.
//!
//! [`derive_status`] is the single source of truth for an obligation's
//! settlement status. Nothing else may compute or assign it, including
//! callers that already know the answer.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::{fmt, str::FromStr};

/// How much of an obligation remains unpaid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementStatus {
    /// No payments applied yet
    Unpaid,
    /// Some payments applied, balance still outstanding
    PartiallyPaid,
    /// Balance fully settled (or overpaid)
    Paid,
}

impl SettlementStatus {
    /// String form stored in the `settlement_status` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::PartiallyPaid => "partially_paid",
            Self::Paid => "paid",
        }
    }
}

impl fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettlementStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "unpaid" => Ok(Self::Unpaid),
            "partially_paid" => Ok(Self::PartiallyPaid),
            "paid" => Ok(Self::Paid),
            other => Err(Error::Validation {
                field: "settlement_status".to_string(),
                message: format!("unknown status: {other}"),
            }),
        }
    }
}

/// Derives the settlement status from the parent aggregates.
///
/// Pure function of its inputs. A non-positive balance is `Paid` (an
/// overpayment under [`OverpaymentPolicy::AllowNegative`] stays `Paid` with
/// a negative balance), any settled amount with balance outstanding is
/// `PartiallyPaid`, and an untouched obligation is `Unpaid`.
#[must_use]
pub fn derive_status(balance_remaining: f64, amount_settled: f64) -> SettlementStatus {
    if balance_remaining <= 0.0 {
        SettlementStatus::Paid
    } else if amount_settled > 0.0 {
        SettlementStatus::PartiallyPaid
    } else {
        SettlementStatus::Unpaid
    }
}

/// Policy for payments that exceed the outstanding balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverpaymentPolicy {
    /// Accept the full amount; `balance_remaining` goes negative and the
    /// negative balance tracks the credit. Matches the historical behavior
    /// of the invoice and consignment flows.
    #[default]
    AllowNegative,
    /// Cap the applied amount at the outstanding balance so the aggregates
    /// land on exactly zero; payments against a settled obligation are
    /// rejected.
    ClampToRemaining,
    /// Refuse any payment larger than the outstanding balance.
    Reject,
}

impl OverpaymentPolicy {
    /// String form used in settings files and environment variables.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AllowNegative => "allow_negative",
            Self::ClampToRemaining => "clamp_to_remaining",
            Self::Reject => "reject",
        }
    }
}

impl FromStr for OverpaymentPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "allow_negative" => Ok(Self::AllowNegative),
            "clamp_to_remaining" => Ok(Self::ClampToRemaining),
            "reject" => Ok(Self::Reject),
            other => Err(Error::Validation {
                field: "overpayment_policy".to_string(),
                message: format!("unknown policy: {other}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_derive_status_unpaid() {
        assert_eq!(derive_status(1000.0, 0.0), SettlementStatus::Unpaid);
    }

    #[test]
    fn test_derive_status_partially_paid() {
        assert_eq!(derive_status(600.0, 400.0), SettlementStatus::PartiallyPaid);
        assert_eq!(derive_status(0.01, 999.99), SettlementStatus::PartiallyPaid);
    }

    #[test]
    fn test_derive_status_paid_at_exactly_zero() {
        assert_eq!(derive_status(0.0, 1000.0), SettlementStatus::Paid);
    }

    #[test]
    fn test_derive_status_overpaid_stays_paid() {
        assert_eq!(derive_status(-200.0, 1200.0), SettlementStatus::Paid);
    }

    #[test]
    fn test_derive_status_is_deterministic() {
        let first = derive_status(600.0, 400.0);
        let second = derive_status(600.0, 400.0);
        assert_eq!(first, second);
    }

    #[test]
    fn test_status_string_round_trip() {
        for status in [
            SettlementStatus::Unpaid,
            SettlementStatus::PartiallyPaid,
            SettlementStatus::Paid,
        ] {
            assert_eq!(status.as_str().parse::<SettlementStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_status_parse_rejects_unknown() {
        let result = "settled".parse::<SettlementStatus>();
        assert!(matches!(
            result.unwrap_err(),
            Error::Validation { field, .. } if field == "settlement_status"
        ));
    }

    #[test]
    fn test_policy_string_round_trip() {
        for policy in [
            OverpaymentPolicy::AllowNegative,
            OverpaymentPolicy::ClampToRemaining,
            OverpaymentPolicy::Reject,
        ] {
            assert_eq!(policy.as_str().parse::<OverpaymentPolicy>().unwrap(), policy);
        }
    }

    #[test]
    fn test_policy_parse_rejects_unknown() {
        let result = "bounce".parse::<OverpaymentPolicy>();
        assert!(matches!(
            result.unwrap_err(),
            Error::Validation { field, .. } if field == "overpayment_policy"
        ));
    }

    #[test]
    fn test_default_policy_is_allow_negative() {
        assert_eq!(
            OverpaymentPolicy::default(),
            OverpaymentPolicy::AllowNegative
        );
    }
}
