//! highgo-probe
//!
//! Loads a HighGo profile (`highgo.toml` or `$HIGHGO_PROFILE`, overridden by
//! `HIGHGO_*` variables), builds the pooled data source, opens one session
//! and prints what it found as JSON.

use anyhow::Context;
use highgo_connector::config::Settings;
use highgo_connector::{construct, LocalCredentialsService, SqlDialect};
use serde::Serialize;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProbeReport {
    target: String,
    dialect: String,
    legacy_dialect: bool,
    server_version: String,
    latency_ms: u64,
    pool: highgo_connector::pool::PoolStatus,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let settings = Settings::load().context("failed to load HighGo profile")?;
    info!("Profile loaded from {}", settings.profile_path.display());

    let profile = settings.profile;
    let dialect = profile.dialect();
    let source = construct(&profile, &LocalCredentialsService)?;

    let start = Instant::now();
    let result = async {
        let session = source.session().await?;
        let row = session.query_one("SELECT version()", &[]).await?;
        let version: String = row.get(0);
        session.rollback().await?;
        Ok::<_, anyhow::Error>(version)
    }
    .await;

    let server_version = match result {
        Ok(version) => version,
        Err(e) => {
            error!("Probe failed: {:#}", e);
            source.close();
            return Err(e);
        }
    };

    let report = ProbeReport {
        target: source.status().target,
        dialect: dialect.sql().name().to_string(),
        legacy_dialect: dialect.is_legacy(),
        server_version,
        latency_ms: start.elapsed().as_millis() as u64,
        pool: source.status(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    source.close();
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,highgo_connector=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact()
                .with_writer(std::io::stderr),
        )
        .init();
}
