//! SQL dialect selection
//!
//! Two mutually exclusive dialects render SQL for HighGo sources:
//!
//! - [`LegacyDialect`]: the hand-written PostgreSQL rules, a plain static
//! - [`ArpDialect`]: driven by the packaged ARP descriptor, loaded once per
//!   process on first use and shared by every profile afterwards
//!
//! A profile picks one through `use_legacy_dialect`.

pub mod arp;
pub mod descriptor;
pub mod legacy;

pub use arp::ArpDialect;
pub use descriptor::ArpDescriptor;
pub use legacy::LegacyDialect;

use crate::profile::ConnectionProfile;
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

/// Resource path of the HighGo descriptor
pub const ARP_FILENAME: &str = "arp/implementation/highgo-arp.toml";

/// SQL rendering strategy used by the query engine
pub trait SqlDialect: Send + Sync {
    /// Get the dialect name
    fn name(&self) -> &str;

    /// Quote an identifier (table, column name)
    fn quote_identifier(&self, name: &str) -> String;

    /// Longest identifier the source accepts, if limited
    fn max_identifier_length(&self) -> Option<usize>;

    /// Get the boolean literal
    fn boolean_literal(&self, value: bool) -> &'static str;

    /// LIMIT/OFFSET clause, `None` when the combination cannot be pushed down
    fn limit_offset_sql(&self, limit: Option<u64>, offset: Option<u64>) -> Option<String>;

    /// Source type for an engine type name (`integer`, `varchar`, ...)
    fn native_type(&self, engine_type: &str) -> Option<String>;

    /// Whether `name` with `arity` arguments can be pushed down
    fn supports_function(&self, name: &str, arity: usize) -> bool;

    /// Render a function call over already-rendered arguments
    fn render_function(&self, name: &str, args: &[String]) -> Option<String>;
}

/// The dialect a profile resolved to
#[derive(Debug, Clone, Copy)]
pub enum DialectHandle {
    Legacy(&'static LegacyDialect),
    Arp(&'static ArpDialect),
}

impl DialectHandle {
    pub fn sql(&self) -> &'static dyn SqlDialect {
        match *self {
            DialectHandle::Legacy(d) => d as &dyn SqlDialect,
            DialectHandle::Arp(d) => d as &dyn SqlDialect,
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, DialectHandle::Legacy(_))
    }

    /// Identity comparison: both handles point at the same dialect object.
    pub fn same_instance(&self, other: &DialectHandle) -> bool {
        match (self, other) {
            (DialectHandle::Legacy(a), DialectHandle::Legacy(b)) => std::ptr::eq(*a, *b),
            (DialectHandle::Arp(a), DialectHandle::Arp(b)) => std::ptr::eq(*a, *b),
            _ => false,
        }
    }
}

static LEGACY_DIALECT: LegacyDialect = LegacyDialect;

static ARP_LOADS: AtomicUsize = AtomicUsize::new(0);

static HIGHGO_ARP_DIALECT: Lazy<ArpDialect> = Lazy::new(|| {
    ARP_LOADS.fetch_add(1, Ordering::SeqCst);
    match ArpDialect::load(ARP_FILENAME) {
        Ok(dialect) => {
            info!("ARP dialect '{}' initialized from {}", dialect.name(), ARP_FILENAME);
            dialect
        }
        // Nothing a user can configure fixes a broken package.
        Err(e) => panic!("{}", e),
    }
});

/// The process-wide ARP dialect, loading it on first call.
pub fn dialect_singleton() -> &'static ArpDialect {
    &HIGHGO_ARP_DIALECT
}

/// How many times the ARP descriptor has been loaded in this process
#[doc(hidden)]
pub fn arp_load_count() -> usize {
    ARP_LOADS.load(Ordering::SeqCst)
}

impl ConnectionProfile {
    /// Dialect selected by `use_legacy_dialect`
    pub fn dialect(&self) -> DialectHandle {
        if self.use_legacy_dialect {
            self.legacy_dialect()
        } else {
            self.arp_dialect()
        }
    }

    /// The legacy dialect regardless of the profile flag
    pub fn legacy_dialect(&self) -> DialectHandle {
        DialectHandle::Legacy(&LEGACY_DIALECT)
    }

    pub fn arp_dialect(&self) -> DialectHandle {
        DialectHandle::Arp(dialect_singleton())
    }
}

/// Argument indices referenced by `{N}` placeholders in a template
pub(crate) fn template_indices(template: &str) -> impl Iterator<Item = usize> + '_ {
    template.split('{').skip(1).filter_map(|part| {
        let (digits, _) = part.split_once('}')?;
        digits.parse().ok()
    })
}

/// Substitute `{N}` placeholders with `args[N]`; unknown placeholders stay as-is.
pub(crate) fn render_template(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let substituted = after.split_once('}').and_then(|(digits, tail)| {
            let index: usize = digits.parse().ok()?;
            args.get(index).map(|arg| (*arg, tail))
        });
        match substituted {
            Some((arg, tail)) => {
                out.push_str(arg);
                rest = tail;
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn profile(use_legacy_dialect: bool) -> ConnectionProfile {
        ConnectionProfile {
            hostname: Some("h".to_string()),
            database_name: Some("d".to_string()),
            use_legacy_dialect,
            ..ConnectionProfile::default()
        }
    }

    #[test]
    fn test_profiles_share_arp_instance() {
        let a = profile(false).dialect();
        let b = profile(false).dialect();
        assert!(!a.is_legacy());
        assert!(a.same_instance(&b));
    }

    #[test]
    fn test_legacy_flag_selects_legacy_singleton() {
        let a = profile(true).dialect();
        let b = profile(false).legacy_dialect();
        assert!(a.is_legacy());
        assert!(a.same_instance(&b));
        assert!(!a.same_instance(&profile(false).dialect()));
    }

    #[test]
    fn test_render_template() {
        assert_eq!(render_template("{0} || {1}", &["a", "b"]), "a || b");
        assert_eq!(render_template("STRPOS({1}, {0})", &["x", "y"]), "STRPOS(y, x)");
        assert_eq!(render_template("CURRENT_DATE", &[]), "CURRENT_DATE");
        assert_eq!(render_template("{x} {5}", &["a"]), "{x} {5}");
    }

    #[test]
    fn test_template_indices() {
        let found: Vec<usize> = template_indices("SUBSTRING({0} FROM {1} FOR {2})").collect();
        assert_eq!(found, vec![0, 1, 2]);
    }
}
