//! ARP dialect descriptors
//!
//! A descriptor is a packaged TOML file listing the SQL generation rules of
//! a source: identifier syntax, type mappings, paging templates and the
//! functions that may be pushed down.

use crate::dialect::template_indices;
use crate::error::{ConnectorError, Result};
use serde::Deserialize;
use tracing::debug;

/// Descriptors compiled into the crate, keyed by resource path
const PACKAGED_DESCRIPTORS: &[(&str, &str)] = &[(
    "arp/implementation/highgo-arp.toml",
    include_str!("../../resources/arp/implementation/highgo-arp.toml"),
)];

#[derive(Debug, Clone, Deserialize)]
pub struct ArpDescriptor {
    pub metadata: Metadata,
    pub syntax: Syntax,
    #[serde(default)]
    pub relational_algebra: RelationalAlgebra,
    #[serde(default)]
    pub data_types: Vec<TypeMapping>,
    #[serde(default)]
    pub operators: Vec<OperatorMapping>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Metadata {
    pub name: String,
    pub apiname: String,
    pub spec_version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Syntax {
    pub identifier_quote: char,
    #[serde(default)]
    pub identifier_length_limit: Option<usize>,
    #[serde(default = "default_true")]
    pub allows_boolean_literal: bool,
    #[serde(default)]
    pub supports_catalogs: bool,
    #[serde(default = "default_true")]
    pub supports_schemas: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelationalAlgebra {
    #[serde(default)]
    pub sort: Sort,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Sort {
    #[serde(default)]
    pub fetch_offset: FetchOffset,
}

/// Paging templates; `{0}` is the offset (or the fetch count in `fetch_only`),
/// `{1}` the fetch count in `offset_fetch`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FetchOffset {
    pub offset_fetch: Option<String>,
    pub offset_only: Option<String>,
    pub fetch_only: Option<String>,
}

/// Engine type name mapped to the source type name
#[derive(Debug, Clone, Deserialize)]
pub struct TypeMapping {
    pub engine: String,
    pub source: String,
}

/// A pushable function. Without `args` any arity is accepted; without
/// `rewrite` it renders as `NAME(arg, ...)`.
#[derive(Debug, Clone, Deserialize)]
pub struct OperatorMapping {
    pub name: String,
    #[serde(default)]
    pub args: Option<usize>,
    #[serde(default)]
    pub rewrite: Option<String>,
}

impl ArpDescriptor {
    /// Load a packaged descriptor by resource path.
    pub fn load(resource: &str) -> Result<Self> {
        let (_, text) = PACKAGED_DESCRIPTORS
            .iter()
            .find(|(path, _)| *path == resource)
            .ok_or_else(|| ConnectorError::FatalInitialization {
                resource: resource.to_string(),
                reason: "resource is not packaged".to_string(),
            })?;

        let descriptor = Self::parse(resource, text)?;
        debug!(
            "Loaded dialect descriptor {} ({} types, {} operators)",
            resource,
            descriptor.data_types.len(),
            descriptor.operators.len()
        );
        Ok(descriptor)
    }

    /// Parse and check a descriptor; `resource` is only used in errors.
    pub fn parse(resource: &str, text: &str) -> Result<Self> {
        let fatal = |reason: String| ConnectorError::FatalInitialization {
            resource: resource.to_string(),
            reason,
        };

        let descriptor: ArpDescriptor = toml::from_str(text).map_err(|e| fatal(e.to_string()))?;

        for op in &descriptor.operators {
            let (Some(args), Some(rewrite)) = (op.args, op.rewrite.as_deref()) else {
                continue;
            };
            if let Some(bad) = template_indices(rewrite).find(|i| *i >= args) {
                return Err(fatal(format!(
                    "operator '{}' takes {} argument(s) but its rewrite references {{{}}}",
                    op.name, args, bad
                )));
            }
        }

        let paging = &descriptor.relational_algebra.sort.fetch_offset;
        let limits = [
            ("offset_fetch", paging.offset_fetch.as_deref(), 2),
            ("offset_only", paging.offset_only.as_deref(), 1),
            ("fetch_only", paging.fetch_only.as_deref(), 1),
        ];
        for (key, template, args) in limits {
            if let Some(bad) = template.and_then(|t| template_indices(t).find(|i| *i >= args)) {
                return Err(fatal(format!("{} references {{{}}}", key, bad)));
            }
        }

        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_packaged_descriptor_parses() {
        let d = ArpDescriptor::load("arp/implementation/highgo-arp.toml").unwrap();
        assert_eq!(d.metadata.apiname, "highgo");
        assert_eq!(d.syntax.identifier_quote, '"');
        assert_eq!(d.syntax.identifier_length_limit, Some(63));
        assert!(d.data_types.iter().any(|t| t.engine == "varbinary" && t.source == "bytea"));
    }

    #[test]
    fn test_missing_resource_is_fatal() {
        let err = ArpDescriptor::load("arp/implementation/nope.toml").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FatalInitialization);
    }

    #[test]
    fn test_malformed_descriptor_is_fatal() {
        let err = ArpDescriptor::parse("broken.toml", "[metadata]\nname = 1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FatalInitialization);
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_rewrite_out_of_range_is_fatal() {
        let text = r#"
            [metadata]
            name = "X"
            apiname = "x"
            spec_version = "1"

            [syntax]
            identifier_quote = '"'

            [[operators]]
            name = "concat"
            args = 2
            rewrite = "{0} || {2}"
        "#;
        let err = ArpDescriptor::parse("x.toml", text).unwrap_err();
        assert!(err.to_string().contains("concat"));
    }

    #[test]
    fn test_minimal_descriptor_uses_defaults() {
        let text = r#"
            [metadata]
            name = "X"
            apiname = "x"
            spec_version = "1"

            [syntax]
            identifier_quote = '`'
        "#;
        let d = ArpDescriptor::parse("x.toml", text).unwrap();
        assert!(d.syntax.allows_boolean_literal);
        assert!(d.operators.is_empty());
        assert!(d.relational_algebra.sort.fetch_offset.fetch_only.is_none());
    }
}
