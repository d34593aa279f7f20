//! One batch reminder sweep, for cron or a systemd timer.
//!
//! Exits non-zero when the sweep fails or leaves reminders unrecorded.

use anyhow::{bail, Result};
use dotenvy::dotenv;
use log::{error, info};
use potluck::{BlobStore, Database, ReminderDispatcher, SweepConfig, TwilioGateway};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let config = SweepConfig::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    let database = Database::new(&config.database_path).await?;
    let store: Arc<dyn BlobStore> = Arc::new(database);
    let sms = Arc::new(TwilioGateway::new(config.sms.clone(), config.gateway_timeout)?);

    let dispatcher = ReminderDispatcher::new(store, sms, &config.app_base_url, config.gateway_timeout);

    let report = match dispatcher.sweep().await {
        Ok(report) => report,
        Err(e) => {
            error!("Sweep failed: {e}");
            return Err(e.into());
        }
    };

    info!(
        "Sweep complete: {} processed, {} sent, {} failed, {} unrecorded",
        report.processed,
        report.sent,
        report.failed,
        report.unrecorded.len()
    );
    println!("{}", serde_json::to_string(&report)?);

    if !report.unrecorded.is_empty() {
        error!(
            "Reminders delivered or attempted without a recorded outcome: {}",
            report.unrecorded.join(", ")
        );
        bail!("{} reminder(s) unrecorded", report.unrecorded.len());
    }
    Ok(())
}
