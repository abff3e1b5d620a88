//! HighGo connection-profile resolver
//!
//! Turns a validated [`ConnectionProfile`] into a pooled connection handle
//! and picks the SQL dialect the query engine renders with.
//!
//! ```no_run
//! use highgo_connector::{construct, ConnectionProfile, LocalCredentialsService};
//!
//! let profile = ConnectionProfile {
//!     hostname: Some("db.example.com".to_string()),
//!     database_name: Some("prod".to_string()),
//!     ..ConnectionProfile::default()
//! };
//! let source = construct(&profile, &LocalCredentialsService)?;
//! let dialect = profile.dialect();
//! # Ok::<(), highgo_connector::ConnectorError>(())
//! ```

pub mod config;
pub mod connection;
pub mod credentials;
pub mod dialect;
pub mod error;
pub mod factory;
pub mod plugin;
pub mod pool;
pub mod profile;
pub mod ssl;

pub use credentials::{
    CredentialsService, LocalCredentialsService, PasswordCredentials, ResolvedCredentials,
};
pub use dialect::{DialectHandle, SqlDialect};
pub use error::{ConnectorError, ErrorKind, Result};
pub use factory::{
    build_request, construct, construct_with, CommitMode, ConnectionPooler, PooledConnectionRequest,
};
pub use plugin::PluginConfig;
pub use pool::{PooledDataSource, Session};
pub use profile::{AuthenticationType, ConnectionProfile, EncryptionValidationMode, Property};
