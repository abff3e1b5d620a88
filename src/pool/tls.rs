//! TLS policy for pooled connections
//!
//! The `sslmode` property decides how much of the server certificate is
//! checked. `ssl=true` on its own means full verification.

use crate::error::{ConnectorError, Result};
use crate::ssl::SslMode;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::verify_server_cert_signed_by_trust_anchor;
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::server::ParsedCertificate;
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlsPolicy {
    pub mode: SslMode,
}

impl TlsPolicy {
    pub fn from_properties(properties: &BTreeMap<String, String>) -> Result<Self> {
        let mode = match properties.get("sslmode") {
            Some(token) => token.parse()?,
            None if properties
                .get("ssl")
                .is_some_and(|v| v.eq_ignore_ascii_case("true")) =>
            {
                SslMode::VerifyFull
            }
            None => SslMode::Disable,
        };
        Ok(Self { mode })
    }

    /// What the server handshake must negotiate
    pub fn negotiation(&self) -> deadpool_postgres::SslMode {
        match self.mode {
            SslMode::Disable => deadpool_postgres::SslMode::Disable,
            SslMode::Allow | SslMode::Prefer => deadpool_postgres::SslMode::Prefer,
            SslMode::Require | SslMode::VerifyCa | SslMode::VerifyFull => {
                deadpool_postgres::SslMode::Require
            }
        }
    }

    /// rustls configuration, `None` for plaintext
    pub fn client_config(&self) -> Result<Option<ClientConfig>> {
        if !self.mode.uses_tls() {
            return Ok(None);
        }

        let provider = crypto_provider();
        let builder = ClientConfig::builder_with_provider(Arc::clone(&provider))
            .with_safe_default_protocol_versions()
            .map_err(|e| ConnectorError::DataSourceCreation(format!("TLS setup failed: {}", e)))?;

        let config = match self.mode {
            SslMode::VerifyFull => builder
                .with_root_certificates(native_roots())
                .with_no_client_auth(),
            SslMode::VerifyCa => builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(ChainOnlyVerifier {
                    roots: Arc::new(native_roots()),
                    provider,
                }))
                .with_no_client_auth(),
            _ => builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(EncryptionOnlyVerifier { provider }))
                .with_no_client_auth(),
        };

        debug!("TLS enabled with sslmode={}", self.mode);
        Ok(Some(config))
    }
}

fn crypto_provider() -> Arc<CryptoProvider> {
    CryptoProvider::get_default()
        .cloned()
        .unwrap_or_else(|| Arc::new(rustls::crypto::aws_lc_rs::default_provider()))
}

fn native_roots() -> RootCertStore {
    let certs = rustls_native_certs::load_native_certs();
    if !certs.errors.is_empty() {
        warn!("Skipped {} unreadable native root certificate(s)", certs.errors.len());
    }

    let mut root_store = RootCertStore::empty();
    for cert in certs.certs {
        root_store.add(cert).ok();
    }
    root_store
}

/// verify-ca: the chain must lead to a trusted root, the hostname is not checked
#[derive(Debug)]
struct ChainOnlyVerifier {
    roots: Arc<RootCertStore>,
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for ChainOnlyVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        let cert = ParsedCertificate::try_from(end_entity)?;
        verify_server_cert_signed_by_trust_anchor(
            &cert,
            &self.roots,
            intermediates,
            now,
            self.provider.signature_verification_algorithms.all,
        )?;
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider.signature_verification_algorithms.supported_schemes()
    }
}

/// require/prefer/allow: encrypt, accept any certificate
#[derive(Debug)]
struct EncryptionOnlyVerifier {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for EncryptionOnlyVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider.signature_verification_algorithms.supported_schemes()
    }
}
