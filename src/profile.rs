//! Connection profile model
//!
//! The validated configuration snapshot a HighGo source is created from.
//! Field constraints mirror what the configuration form enforces; the few
//! checks the form cannot express (text-typed port range) are re-checked
//! in [`ConnectionProfile::check`] and again when the URI is built.

use crate::error::{invalid_field, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use validator::{Validate, ValidationError};

/// Default HighGo listener port
pub const DEFAULT_PORT: &str = "5866";

/// How the connector authenticates. Informational only; the credential
/// resolver looks at the configured username/password/secret instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthenticationType {
    Anonymous,
    #[default]
    Master,
}

/// Strictness of TLS certificate verification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EncryptionValidationMode {
    NoValidation,
    CertificateOnlyValidation,
    #[default]
    CertificateAndHostnameValidation,
}

/// A user-supplied driver property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub value: String,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Configuration for a HighGo source
#[derive(Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ConnectionProfile {
    #[validate(custom(function = "not_blank", message = "Host is required"))]
    pub hostname: Option<String>,

    /// Kept as text so the form can bind it directly
    #[validate(length(min = 1, message = "Port is required"))]
    pub port: Option<String>,

    #[validate(custom(function = "not_blank", message = "Database name is required"))]
    pub database_name: Option<String>,

    pub username: Option<String>,

    #[serde(skip_serializing)]
    pub password: Option<String>,

    pub authentication_type: AuthenticationType,

    /// Record fetch size
    #[validate(range(min = 1, message = "Record fetch size must be positive"))]
    pub fetch_size: u32,

    pub use_legacy_dialect: bool,

    /// Encrypt connection
    pub use_ssl: bool,

    pub encryption_validation_mode: Option<EncryptionValidationMode>,

    pub secret_resource_url: Option<String>,

    pub enable_external_query: bool,

    #[serde(alias = "property_list")]
    pub extra_properties: Vec<Property>,

    /// Maximum idle connections
    #[validate(range(min = 1, message = "Maximum idle connections must be at least 1"))]
    pub max_idle_conns: usize,

    /// Connection idle time (s)
    pub idle_time_sec: u64,

    /// Query timeout (s), 0 disables it
    pub query_timeout_sec: u64,
}

fn not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

impl Default for ConnectionProfile {
    fn default() -> Self {
        Self {
            hostname: None,
            port: Some(DEFAULT_PORT.to_string()),
            database_name: None,
            username: None,
            password: None,
            authentication_type: AuthenticationType::default(),
            fetch_size: 200,
            use_legacy_dialect: false,
            use_ssl: false,
            encryption_validation_mode: Some(EncryptionValidationMode::default()),
            secret_resource_url: None,
            enable_external_query: false,
            extra_properties: Vec::new(),
            max_idle_conns: 8,
            idle_time_sec: 60,
            query_timeout_sec: 0,
        }
    }
}

impl ConnectionProfile {
    /// Profile used when a new source is created from scratch.
    ///
    /// New sources start on the legacy dialect; profiles restored from
    /// storage keep whatever flag they were saved with.
    pub fn new_message() -> Self {
        Self {
            use_legacy_dialect: true,
            ..Self::default()
        }
    }

    /// Run the declarative field rules plus the port range check.
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        if let Some(port) = self.port.as_deref() {
            parse_port(port)?;
        }
        Ok(())
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_time_sec)
    }

    /// `None` when the timeout is disabled
    pub fn query_timeout(&self) -> Option<Duration> {
        (self.query_timeout_sec > 0).then(|| Duration::from_secs(self.query_timeout_sec))
    }

    /// Secret URL, treating an empty string as unset
    pub fn secret_url(&self) -> Option<&str> {
        self.secret_resource_url
            .as_deref()
            .filter(|url| !url.is_empty())
    }
}

/// Parse a text port into the valid TCP range.
pub fn parse_port(port: &str) -> Result<u16> {
    let value: i64 = port
        .trim()
        .parse()
        .map_err(|e| invalid_field("port", format!("'{}' is not a number: {}", port, e)))?;

    if !(1..=65535).contains(&value) {
        return Err(invalid_field(
            "port",
            format!("{} is outside 1-65535", value),
        ));
    }

    u16::try_from(value).map_err(|e| invalid_field("port", e.to_string()))
}

impl fmt::Debug for ConnectionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionProfile")
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("database_name", &self.database_name)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .field("authentication_type", &self.authentication_type)
            .field("fetch_size", &self.fetch_size)
            .field("use_legacy_dialect", &self.use_legacy_dialect)
            .field("use_ssl", &self.use_ssl)
            .field("encryption_validation_mode", &self.encryption_validation_mode)
            .field("secret_resource_url", &self.secret_resource_url)
            .field("enable_external_query", &self.enable_external_query)
            .field("extra_properties", &self.extra_properties)
            .field("max_idle_conns", &self.max_idle_conns)
            .field("idle_time_sec", &self.idle_time_sec)
            .field("query_timeout_sec", &self.query_timeout_sec)
            .finish()
    }
}
