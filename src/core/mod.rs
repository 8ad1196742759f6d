//! Core business logic - framework-agnostic obligation, reconciliation,
//! retry, and audit operations.

/// Ledger-vs-aggregate consistency checks and status history
pub mod audit;
/// Obligation lifecycle: creation, queries, voiding
pub mod obligation;
/// The reconciliation engine: apply, reverse, and amend payments
pub mod reconcile;
/// Bounded retry with backoff for transaction conflicts
pub mod retry;
/// Settlement status derivation and overpayment policy
pub mod status;
