//! Shared test utilities.
//!
//! Common helper functions for setting up test databases and creating test
//! entities with sensible defaults.

use crate::{
    core::{
        obligation::{self, ObligationKind},
        reconcile::{self, EntryMetadata, ReconcileConfig},
        retry::RetrySettings,
        status::OverpaymentPolicy,
    },
    entities,
    errors::Result,
};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Default engine config for tests: allow-negative policy, fast retries.
pub fn test_config() -> ReconcileConfig {
    ReconcileConfig {
        retry: RetrySettings {
            base_delay_ms: 1,
            ..RetrySettings::default()
        },
        ..ReconcileConfig::default()
    }
}

/// Engine config with a specific overpayment policy.
pub fn config_with_policy(policy: OverpaymentPolicy) -> ReconcileConfig {
    ReconcileConfig {
        overpayment_policy: policy,
        ..test_config()
    }
}

/// Default metadata for test payments.
pub fn test_metadata() -> EntryMetadata {
    EntryMetadata {
        created_by: "test_user".to_string(),
        ..EntryMetadata::default()
    }
}

/// Creates a test obligation with sensible defaults.
///
/// # Defaults
/// * `kind`: `PurchaseInvoice`
/// * `counterparty`: "Test Supplier"
/// * `total_obligation`: 1000.0
/// * `created_by`: `"test_user"`
pub async fn create_test_obligation(
    db: &DatabaseConnection,
    reference: &str,
) -> Result<entities::obligation::Model> {
    obligation::create_obligation(
        db,
        reference.to_string(),
        ObligationKind::PurchaseInvoice,
        "Test Supplier".to_string(),
        1000.0,
        "test_user".to_string(),
    )
    .await
}

/// Creates a test obligation with custom parameters.
/// Use this when you need to test specific obligation configurations.
pub async fn create_custom_obligation(
    db: &DatabaseConnection,
    reference: &str,
    kind: ObligationKind,
    counterparty: &str,
    total_obligation: f64,
) -> Result<entities::obligation::Model> {
    obligation::create_obligation(
        db,
        reference.to_string(),
        kind,
        counterparty.to_string(),
        total_obligation,
        "test_user".to_string(),
    )
    .await
}

/// Applies a test payment with the default config and metadata.
pub async fn apply_test_payment(
    db: &DatabaseConnection,
    obligation_id: i64,
    amount: f64,
) -> Result<entities::ledger_entry::Model> {
    reconcile::apply_payment(db, &test_config(), obligation_id, amount, test_metadata()).await
}

/// Sets up a complete test environment with an obligation.
/// Returns (db, obligation) for common test scenarios.
pub async fn setup_with_obligation() -> Result<(DatabaseConnection, entities::obligation::Model)> {
    let db = setup_test_db().await?;
    let obligation = create_test_obligation(&db, "INV-1001").await?;
    Ok((db, obligation))
}
