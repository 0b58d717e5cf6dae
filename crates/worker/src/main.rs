//! Batch-delivery daemon.
//!
//! Claims due notification jobs on a fixed interval and drains them
//! through the configured channel transports. Channels whose provider is
//! not configured in the environment are simply not registered; their
//! jobs fail with a "no transport configured" reason and retry once the
//! configuration appears.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tribe_core::policy::DegradationPolicy;
use tribe_notify::delivery::{
    EmailConfig, EmailTransport, SmsTransport, TwilioClient, TwilioConfig, WhatsAppTransport,
};
use tribe_notify::{BatchProcessor, PgJobStore, PgPreferenceAuthority, TransportRegistry};

/// Seconds between processing passes when `WORKER_INTERVAL_SECS` is unset.
const DEFAULT_INTERVAL_SECS: u64 = 60;

/// Worker loop configuration from environment variables.
struct WorkerConfig {
    interval: Duration,
    batch_size: i64,
}

impl WorkerConfig {
    /// | Variable               | Default |
    /// |------------------------|---------|
    /// | `WORKER_INTERVAL_SECS` | `60`    |
    /// | `WORKER_BATCH_SIZE`    | `50`    |
    fn from_env() -> Self {
        let interval_secs = std::env::var("WORKER_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_INTERVAL_SECS);
        let batch_size = std::env::var("WORKER_BATCH_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(tribe_notify::DEFAULT_BATCH_SIZE)
            .max(1);
        Self {
            interval: Duration::from_secs(interval_secs.max(1)),
            batch_size,
        }
    }
}

/// Build the transport registry from whatever providers are configured.
fn build_transports() -> anyhow::Result<TransportRegistry> {
    let mut transports = TransportRegistry::new();

    match EmailConfig::from_env() {
        Some(config) => transports.register(Arc::new(EmailTransport::new(config)?)),
        None => tracing::warn!("SMTP_HOST not set, email delivery disabled"),
    }

    match TwilioConfig::from_env() {
        Some(config) => {
            let client = Arc::new(TwilioClient::new(config));
            transports.register(Arc::new(SmsTransport::new(client.clone())));
            transports.register(Arc::new(WhatsAppTransport::new(client)));
        }
        None => tracing::warn!("TWILIO_ACCOUNT_SID not set, SMS/WhatsApp delivery disabled"),
    }

    Ok(transports)
}

/// Run processing passes until cancelled.
async fn run(processor: BatchProcessor, config: WorkerConfig, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(config.interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Delivery worker stopped");
                break;
            }
            _ = interval.tick() => {
                match processor.process_pending(config.batch_size).await {
                    Ok(results) if results.is_empty() => {}
                    Ok(results) => {
                        tracing::info!(processed = results.len(), "Processed delivery batch");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Delivery batch failed");
                    }
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tribe_worker=info,tribe_notify=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = tribe_db::create_pool(&database_url)
        .await
        .context("failed to connect to the database")?;

    let authority = Arc::new(PgPreferenceAuthority::new(pool.clone()));
    let store = Arc::new(PgJobStore::new(pool));
    let transports = build_transports()?;
    let processor = BatchProcessor::new(store, authority, DegradationPolicy::FailOpen, transports);

    let config = WorkerConfig::from_env();
    tracing::info!(
        interval_secs = config.interval.as_secs(),
        batch_size = config.batch_size,
        "Delivery worker starting"
    );

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            signal_cancel.cancel();
        }
    });

    run(processor, config, cancel).await;
    Ok(())
}
