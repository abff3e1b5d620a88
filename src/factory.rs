//! Data source factory
//!
//! Turns a profile into a pooled connection handle:
//!
//! 1. resolve credentials (external secret or inline)
//! 2. derive connection properties (TLS, driver compatibility, user overrides)
//! 3. build the connection URI
//! 4. hand the assembled request to a [`ConnectionPooler`]
//!
//! The first failing step aborts construction. Nothing is retried.

use crate::credentials::{resolve_credentials, CredentialsService};
use crate::error::Result;
use crate::pool::{DeadpoolPooler, PooledDataSource};
use crate::profile::ConnectionProfile;
use crate::ssl::ssl_mode;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

/// Driver identifier handed to the pool
pub const DRIVER_ID: &str = "highgo";

/// Compatibility switch the open-source driver build expects
pub const SUBPROTOCOL_OVERRIDE: &str = "OpenSourceSubProtocolOverride";

/// How the pool manages transaction boundaries on its connections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    /// Leave the driver default in place
    Driver,
    /// Never autocommit; the connector commits explicitly
    ForceManualCommit,
}

/// Everything the pooling layer needs to open a data source
#[derive(Clone, PartialEq, Eq)]
pub struct PooledConnectionRequest {
    pub driver_id: String,
    pub connection_uri: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub properties: BTreeMap<String, String>,
    pub commit_mode: CommitMode,
    pub max_idle: usize,
    pub idle_timeout: Duration,
}

impl fmt::Debug for PooledConnectionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnectionRequest")
            .field("driver_id", &self.driver_id)
            .field("connection_uri", &self.connection_uri)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .field("properties", &self.properties)
            .field("commit_mode", &self.commit_mode)
            .field("max_idle", &self.max_idle)
            .field("idle_timeout", &self.idle_timeout)
            .finish()
    }
}

/// Pooling collaborator
pub trait ConnectionPooler {
    type Handle;

    fn open_pooled(&self, request: PooledConnectionRequest) -> Result<Self::Handle>;
}

/// Connection properties for a profile.
///
/// User-supplied properties are applied last, in order, and may replace
/// any derived key including `ssl` and `sslmode`.
pub fn connection_properties(profile: &ConnectionProfile) -> Result<BTreeMap<String, String>> {
    let mut properties = BTreeMap::new();

    if profile.use_ssl {
        properties.insert("ssl".to_string(), "true".to_string());
        properties.insert(
            "sslmode".to_string(),
            ssl_mode(profile.encryption_validation_mode)?.to_string(),
        );
    }

    properties.insert(SUBPROTOCOL_OVERRIDE.to_string(), "true".to_string());

    for property in &profile.extra_properties {
        properties.insert(property.name.clone(), property.value.clone());
    }

    Ok(properties)
}

/// Assemble the pool request for a profile without opening anything.
pub fn build_request(
    profile: &ConnectionProfile,
    credentials_service: &dyn CredentialsService,
) -> Result<PooledConnectionRequest> {
    let credentials = resolve_credentials(profile, credentials_service)?;
    let properties = connection_properties(profile)?;
    let connection_uri = profile.connection_uri()?;

    Ok(PooledConnectionRequest {
        driver_id: DRIVER_ID.to_string(),
        connection_uri,
        username: credentials.username,
        password: credentials.password,
        properties,
        commit_mode: CommitMode::ForceManualCommit,
        max_idle: profile.max_idle_conns,
        idle_timeout: profile.idle_timeout(),
    })
}

/// Construct a data source through the given pooler.
pub fn construct_with<P: ConnectionPooler>(
    profile: &ConnectionProfile,
    credentials_service: &dyn CredentialsService,
    pooler: &P,
) -> Result<P::Handle> {
    let request = build_request(profile, credentials_service)?;
    debug!("Opening pooled data source: {:?}", request);
    let uri = request.connection_uri.clone();
    let handle = pooler.open_pooled(request)?;
    info!("Pooled data source ready for {}", uri);
    Ok(handle)
}

/// Construct a deadpool-backed data source. The caller owns the handle
/// and is responsible for closing it.
pub fn construct(
    profile: &ConnectionProfile,
    credentials_service: &dyn CredentialsService,
) -> Result<PooledDataSource> {
    construct_with(profile, credentials_service, &DeadpoolPooler::default())
}
