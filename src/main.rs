//! `tallybook` maintenance binary - audits every obligation against its
//! ledger and reports drift between the stored aggregates and the entries.

use tallybook::{
    config::{database, settings},
    core::audit,
    errors::Result,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Environment variables can also be set externally, so a missing .env is fine
    dotenvy::dotenv().ok();

    let config = settings::load_from_env()?;
    info!(
        overpayment_policy = config.overpayment_policy.as_str(),
        max_retry_attempts = config.retry.max_attempts,
        "loaded engine configuration"
    );

    let db = database::create_connection().await?;
    info!("connected to database");

    let audits = audit::audit_all(&db).await?;
    let mut drifted = 0_usize;
    for ledger in &audits {
        if ledger.is_consistent() {
            info!(
                reference = %ledger.reference,
                amount_settled = ledger.stored_amount_settled,
                balance_remaining = ledger.stored_balance_remaining,
                status = %ledger.stored_status,
                "ledger consistent"
            );
        } else {
            drifted += 1;
            warn!(
                reference = %ledger.reference,
                stored_amount_settled = ledger.stored_amount_settled,
                entry_total = ledger.entry_total,
                stored_status = %ledger.stored_status,
                derived_status = %ledger.derived_status,
                "ledger drift detected"
            );
        }
    }

    info!(audited = audits.len(), drifted, "ledger audit complete");

    Ok(())
}
