//! Pooled data sources
//!
//! [`DeadpoolPooler`] opens a deadpool-postgres pool from a
//! [`PooledConnectionRequest`]. No connection is made until the first
//! [`PooledDataSource::session`] call.

pub mod tls;

use crate::connection::ConnectionParams;
use crate::error::{ConnectorError, Result};
use crate::factory::{
    CommitMode, ConnectionPooler, PooledConnectionRequest, DRIVER_ID, SUBPROTOCOL_OVERRIDE,
};
use deadpool_postgres::{
    ClientWrapper, Config, ManagerConfig, Object, Pool, PoolConfig, RecyclingMethod, Runtime,
};
use serde::Serialize;
use std::ops::Deref;
use std::time::Duration;
pub use tls::TlsPolicy;
use tokio_postgres::NoTls;
use tracing::{debug, info};

/// Opens deadpool-postgres pools
///
/// deadpool has no separate idle cap, so `max_idle` becomes the pool's
/// maximum size: at most that many connections exist, idle or in use.
/// Idle connections older than `idle_timeout` are dropped by
/// [`PooledDataSource::evict_idle`] and [`PooledDataSource::spawn_idle_reaper`].
#[derive(Debug, Clone, Default)]
pub struct DeadpoolPooler;

impl ConnectionPooler for DeadpoolPooler {
    type Handle = PooledDataSource;

    fn open_pooled(&self, request: PooledConnectionRequest) -> Result<PooledDataSource> {
        if request.driver_id != DRIVER_ID {
            return Err(ConnectorError::DataSourceCreation(format!(
                "unsupported driver '{}'",
                request.driver_id
            )));
        }

        let params = ConnectionParams::from_connection_uri(&request.connection_uri)?;
        let tls = TlsPolicy::from_properties(&request.properties)?;

        let mut cfg = Config::new();
        cfg.host = Some(params.host.clone());
        cfg.port = Some(params.port);
        cfg.dbname = Some(params.database.clone());
        cfg.user = request.username.clone();
        cfg.password = request.password.clone();
        cfg.ssl_mode = Some(tls.negotiation());
        apply_driver_properties(&mut cfg, &request)?;

        let recycling_method = match request.commit_mode {
            // Whatever a borrower left uncommitted is discarded on return.
            CommitMode::ForceManualCommit => RecyclingMethod::Custom("ROLLBACK".to_string()),
            CommitMode::Driver => RecyclingMethod::Fast,
        };
        cfg.manager = Some(ManagerConfig { recycling_method });
        cfg.pool = Some(PoolConfig::new(request.max_idle));

        let pool = match tls.client_config()? {
            Some(tls_config) => {
                let connector = tokio_postgres_rustls::MakeRustlsConnect::new(tls_config);
                cfg.create_pool(Some(Runtime::Tokio1), connector)?
            }
            None => cfg.create_pool(Some(Runtime::Tokio1), NoTls)?,
        };

        info!(
            "Created pool for {} (max {}, sslmode {})",
            params.to_display_string(),
            request.max_idle,
            tls.mode
        );

        Ok(PooledDataSource {
            pool,
            commit_mode: request.commit_mode,
            idle_timeout: request.idle_timeout,
            target: params.to_display_string(),
        })
    }
}

/// Map the driver properties tokio-postgres has a setting for.
fn apply_driver_properties(cfg: &mut Config, request: &PooledConnectionRequest) -> Result<()> {
    for (key, value) in &request.properties {
        match key.as_str() {
            "ssl" | "sslmode" => {}
            "application_name" | "ApplicationName" => cfg.application_name = Some(value.clone()),
            "options" => cfg.options = Some(value.clone()),
            "connect_timeout" | "connectTimeout" => {
                let secs: u64 = value.parse().map_err(|e| {
                    ConnectorError::InvalidField {
                        field: "connect_timeout",
                        reason: format!("'{}': {}", value, e),
                    }
                })?;
                cfg.connect_timeout = Some(Duration::from_secs(secs));
            }
            k if k == SUBPROTOCOL_OVERRIDE => {
                debug!("{}={} accepted, native driver needs no override", k, value);
            }
            other => debug!("Ignoring driver property without a native equivalent: {}", other),
        }
    }
    Ok(())
}

/// A caller-owned pool of HighGo connections
#[derive(Clone)]
pub struct PooledDataSource {
    pool: Pool,
    commit_mode: CommitMode,
    idle_timeout: Duration,
    target: String,
}

impl std::fmt::Debug for PooledDataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledDataSource")
            .field("target", &self.target)
            .field("commit_mode", &self.commit_mode)
            .field("idle_timeout", &self.idle_timeout)
            .finish_non_exhaustive()
    }
}

/// Snapshot of pool occupancy
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStatus {
    pub target: String,
    pub max_size: usize,
    pub size: usize,
    pub available: i64,
    pub closed: bool,
}

impl PooledDataSource {
    pub fn commit_mode(&self) -> CommitMode {
        self.commit_mode
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    pub fn status(&self) -> PoolStatus {
        let status = self.pool.status();
        PoolStatus {
            target: self.target.clone(),
            max_size: status.max_size,
            size: status.size,
            available: status.available as i64,
            closed: self.pool.is_closed(),
        }
    }

    /// Borrow a connection. In manual-commit mode a transaction is already open.
    pub async fn session(&self) -> Result<Session> {
        let client = self.pool.get().await?;
        let manual_commit = self.commit_mode == CommitMode::ForceManualCommit;
        if manual_commit {
            client.batch_execute("BEGIN").await?;
        }
        Ok(Session {
            client,
            manual_commit,
        })
    }

    /// Drop idle connections unused for longer than the idle timeout.
    /// Returns how many were removed.
    pub fn evict_idle(&self) -> usize {
        let before = self.pool.status().size;
        let idle_timeout = self.idle_timeout;
        let _ = self
            .pool
            .retain(|_, metrics| metrics.last_used() < idle_timeout);
        let removed = before.saturating_sub(self.pool.status().size);
        if removed > 0 {
            debug!("Evicted {} idle connection(s) from {}", removed, self.target);
        }
        removed
    }

    /// Run [`evict_idle`](Self::evict_idle) periodically until the pool closes.
    /// Must be called from within a tokio runtime.
    pub fn spawn_idle_reaper(&self) -> tokio::task::JoinHandle<()> {
        let source = self.clone();
        let period = self.idle_timeout.max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                if source.pool.is_closed() {
                    break;
                }
                source.evict_idle();
            }
        })
    }

    /// Close the pool; borrowed sessions finish but are not returned.
    pub fn close(&self) {
        self.pool.close();
        info!("Closed pool for {}", self.target);
    }
}

/// A borrowed connection
pub struct Session {
    client: Object,
    manual_commit: bool,
}

impl Session {
    /// Commit the open transaction and start the next one.
    pub async fn commit(&self) -> Result<()> {
        if self.manual_commit {
            self.client.batch_execute("COMMIT; BEGIN").await?;
        }
        Ok(())
    }

    /// Roll back the open transaction and start the next one.
    pub async fn rollback(&self) -> Result<()> {
        if self.manual_commit {
            self.client.batch_execute("ROLLBACK; BEGIN").await?;
        }
        Ok(())
    }
}

impl Deref for Session {
    type Target = ClientWrapper;

    fn deref(&self) -> &ClientWrapper {
        &self.client
    }
}
