//! SSL mode tokens
//!
//! Maps the profile's validation mode onto the `sslmode` token the driver
//! understands, and parses tokens back when the pool builds its TLS policy.

use crate::error::{invalid_field, missing_field, Result};
use crate::profile::EncryptionValidationMode;
use std::fmt;
use std::str::FromStr;

/// Driver `sslmode` values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SslMode {
    Disable,
    Allow,
    Prefer,
    Require,
    VerifyCa,
    VerifyFull,
}

impl SslMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SslMode::Disable => "disable",
            SslMode::Allow => "allow",
            SslMode::Prefer => "prefer",
            SslMode::Require => "require",
            SslMode::VerifyCa => "verify-ca",
            SslMode::VerifyFull => "verify-full",
        }
    }

    pub fn uses_tls(&self) -> bool {
        !matches!(self, SslMode::Disable)
    }
}

impl From<EncryptionValidationMode> for SslMode {
    fn from(mode: EncryptionValidationMode) -> Self {
        match mode {
            EncryptionValidationMode::CertificateAndHostnameValidation => SslMode::VerifyFull,
            EncryptionValidationMode::CertificateOnlyValidation => SslMode::VerifyCa,
            EncryptionValidationMode::NoValidation => SslMode::Require,
        }
    }
}

impl FromStr for SslMode {
    type Err = crate::error::ConnectorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disable" => Ok(SslMode::Disable),
            "allow" => Ok(SslMode::Allow),
            "prefer" => Ok(SslMode::Prefer),
            "require" => Ok(SslMode::Require),
            "verify-ca" => Ok(SslMode::VerifyCa),
            "verify-full" => Ok(SslMode::VerifyFull),
            other => Err(invalid_field(
                "sslmode",
                format!("unknown sslmode '{}'", other),
            )),
        }
    }
}

impl fmt::Display for SslMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token for the `sslmode` connection property.
pub fn ssl_mode(mode: Option<EncryptionValidationMode>) -> Result<&'static str> {
    let mode = mode.ok_or_else(|| missing_field("encryption_validation_mode"))?;
    Ok(SslMode::from(mode).as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_mode_tokens() {
        assert_eq!(
            ssl_mode(Some(EncryptionValidationMode::CertificateAndHostnameValidation)).unwrap(),
            "verify-full"
        );
        assert_eq!(
            ssl_mode(Some(EncryptionValidationMode::CertificateOnlyValidation)).unwrap(),
            "verify-ca"
        );
        assert_eq!(
            ssl_mode(Some(EncryptionValidationMode::NoValidation)).unwrap(),
            "require"
        );
    }

    #[test]
    fn test_unset_mode_fails() {
        let err = ssl_mode(None).unwrap_err();
        assert_eq!(err.field(), Some("encryption_validation_mode"));
    }

    #[test]
    fn test_parse_tokens() {
        assert_eq!("verify-ca".parse::<SslMode>().unwrap(), SslMode::VerifyCa);
        assert_eq!(" Require ".parse::<SslMode>().unwrap(), SslMode::Require);
        assert!("strict".parse::<SslMode>().is_err());
        assert!(!SslMode::Disable.uses_tls());
    }
}
