//! Connection string handling
//!
//! Builds the driver URI from profile fields and parses it back into
//! the parameters the pool needs.

use crate::error::{invalid_field, missing_field, Result};
use crate::profile::{parse_port, ConnectionProfile};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::net::Ipv6Addr;
use url::{Host, Url};

/// URI scheme understood by the HighGo driver
pub const SCHEME: &str = "highgo";

/// Bytes escaped in the database path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Build `highgo://<host>:<port>/<database>`.
///
/// Fields are checked in order and the first missing one is reported.
pub fn build_connection_uri(
    hostname: Option<&str>,
    port: Option<&str>,
    database_name: Option<&str>,
) -> Result<String> {
    let hostname = hostname
        .filter(|h| !h.trim().is_empty())
        .ok_or_else(|| missing_field("hostname"))?;
    let port = port.ok_or_else(|| missing_field("port"))?;
    let port = parse_port(port)?;
    let database = database_name
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| missing_field("database_name"))?;

    Ok(format_uri(hostname, port, database))
}

fn format_uri(host: &str, port: u16, database: &str) -> String {
    let database = utf8_percent_encode(database, PATH_SEGMENT);
    match host.parse::<Ipv6Addr>() {
        Ok(_) => format!("{}://[{}]:{}/{}", SCHEME, host, port, database),
        Err(_) => format!("{}://{}:{}/{}", SCHEME, host, port, database),
    }
}

impl ConnectionProfile {
    pub fn connection_uri(&self) -> Result<String> {
        build_connection_uri(
            self.hostname.as_deref(),
            self.port.as_deref(),
            self.database_name.as_deref(),
        )
    }
}

/// Parsed parameters from a connection URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub database: String,
}

impl ConnectionParams {
    /// Parse a HighGo connection URI
    /// Format: highgo://host:port/database
    pub fn from_connection_uri(uri: &str) -> Result<Self> {
        let url = Url::parse(uri)
            .map_err(|e| invalid_field("connection_uri", format!("{}: {}", uri, e)))?;

        if url.scheme() != SCHEME {
            return Err(invalid_field(
                "connection_uri",
                format!("unsupported scheme '{}', expected {}://", url.scheme(), SCHEME),
            ));
        }

        let host = match url.host() {
            Some(Host::Ipv6(addr)) => addr.to_string(),
            Some(host) => host.to_string(),
            None => String::new(),
        };
        if host.is_empty() {
            return Err(missing_field("hostname"));
        }

        let port = url.port().ok_or_else(|| missing_field("port"))?;

        let database = percent_decode_str(url.path().trim_start_matches('/'))
            .decode_utf8()
            .map_err(|e| invalid_field("database_name", e.to_string()))?
            .into_owned();
        if database.is_empty() {
            return Err(missing_field("database_name"));
        }

        Ok(Self {
            host,
            port,
            database,
        })
    }

    /// The URI these parameters were parsed from, in canonical form
    pub fn to_display_string(&self) -> String {
        format_uri(&self.host, self.port, &self.database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_build_uri() {
        let uri = build_connection_uri(Some("db.example.com"), Some("5866"), Some("prod")).unwrap();
        assert_eq!(uri, "highgo://db.example.com:5866/prod");
    }

    #[test]
    fn test_build_uri_normalizes_port() {
        let uri = build_connection_uri(Some("h"), Some("05866"), Some("d")).unwrap();
        assert_eq!(uri, "highgo://h:5866/d");
    }

    #[test]
    fn test_non_numeric_port() {
        let err = build_connection_uri(Some("db.example.com"), Some("abc"), Some("prod")).unwrap_err();
        assert_eq!(err.field(), Some("port"));
    }

    #[test]
    fn test_missing_hostname() {
        let err = build_connection_uri(None, Some("5866"), Some("prod")).unwrap_err();
        assert_eq!(err.field(), Some("hostname"));
        let err = build_connection_uri(Some(""), Some("5866"), Some("prod")).unwrap_err();
        assert_eq!(err.field(), Some("hostname"));
    }

    #[test]
    fn test_missing_port_and_database() {
        let err = build_connection_uri(Some("h"), None, Some("prod")).unwrap_err();
        assert_eq!(err.field(), Some("port"));
        let err = build_connection_uri(Some("h"), Some("5866"), None).unwrap_err();
        assert_eq!(err.field(), Some("database_name"));
    }

    #[test]
    fn test_first_missing_field_wins() {
        let err = build_connection_uri(None, Some("abc"), None).unwrap_err();
        assert_eq!(err.field(), Some("hostname"));
    }

    #[test]
    fn test_parse_round_trip() {
        let params = ConnectionParams::from_connection_uri("highgo://db.example.com:5866/prod").unwrap();
        assert_eq!(
            params,
            ConnectionParams {
                host: "db.example.com".to_string(),
                port: 5866,
                database: "prod".to_string(),
            }
        );
        assert_eq!(params.to_display_string(), "highgo://db.example.com:5866/prod");
    }

    #[test]
    fn test_blank_hostname_and_database_are_missing() {
        let err = build_connection_uri(Some("   "), Some("5866"), Some("prod")).unwrap_err();
        assert_eq!(err.field(), Some("hostname"));
        let err = build_connection_uri(Some("h"), Some("5866"), Some(" \t")).unwrap_err();
        assert_eq!(err.field(), Some("database_name"));
    }

    #[test]
    fn test_database_names_survive_parsing() {
        for database in ["sales db", "a#b", "q?x", "café", "50%off", "a/b"] {
            let uri = build_connection_uri(Some("h"), Some("5866"), Some(database)).unwrap();
            let params = ConnectionParams::from_connection_uri(&uri).unwrap();
            assert_eq!(params.database, database, "uri {}", uri);
            assert_eq!(params.to_display_string(), uri);
        }
    }

    #[test]
    fn test_escaped_database_uri() {
        let uri = build_connection_uri(Some("h"), Some("5866"), Some("sales db")).unwrap();
        assert_eq!(uri, "highgo://h:5866/sales%20db");
    }

    #[test]
    fn test_ipv6_host_is_bracketed() {
        let uri = build_connection_uri(Some("::1"), Some("5866"), Some("d")).unwrap();
        assert_eq!(uri, "highgo://[::1]:5866/d");

        let params = ConnectionParams::from_connection_uri(&uri).unwrap();
        assert_eq!(params.host, "::1");
        assert_eq!(params.port, 5866);
        assert_eq!(params.to_display_string(), uri);
    }

    #[test]
    fn test_parse_rejects_other_scheme() {
        assert!(ConnectionParams::from_connection_uri("postgres://h:5432/db").is_err());
    }
}
