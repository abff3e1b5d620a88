//! Query-engine registration bundle for a HighGo source

use crate::credentials::CredentialsService;
use crate::dialect::DialectHandle;
use crate::error::Result;
use crate::factory::construct;
use crate::pool::PooledDataSource;
use crate::profile::ConnectionProfile;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Opens a fresh data source each time it is called
pub type DataSourceFactory = Arc<dyn Fn() -> Result<PooledDataSource> + Send + Sync>;

/// What the engine needs to run queries against the source
#[derive(Clone)]
pub struct PluginConfig {
    pub dialect: DialectHandle,
    pub fetch_size: u32,
    pub query_timeout: Option<Duration>,
    pub show_only_conn_database: bool,
    pub enable_external_query: bool,
    pub data_source_factory: DataSourceFactory,
}

impl fmt::Debug for PluginConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginConfig")
            .field("dialect", &self.dialect.sql().name())
            .field("fetch_size", &self.fetch_size)
            .field("query_timeout", &self.query_timeout)
            .field("show_only_conn_database", &self.show_only_conn_database)
            .field("enable_external_query", &self.enable_external_query)
            .finish_non_exhaustive()
    }
}

impl ConnectionProfile {
    pub fn build_plugin_config(
        &self,
        credentials_service: Arc<dyn CredentialsService>,
    ) -> PluginConfig {
        let profile = self.clone();
        PluginConfig {
            dialect: self.dialect(),
            fetch_size: self.fetch_size,
            query_timeout: self.query_timeout(),
            show_only_conn_database: false,
            enable_external_query: self.enable_external_query,
            data_source_factory: Arc::new(move || construct(&profile, credentials_service.as_ref())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::LocalCredentialsService;
    use crate::error::ErrorKind;

    fn profile() -> ConnectionProfile {
        ConnectionProfile {
            hostname: Some("localhost".to_string()),
            database_name: Some("highgo".to_string()),
            fetch_size: 500,
            query_timeout_sec: 15,
            ..ConnectionProfile::default()
        }
    }

    #[test]
    fn test_plugin_config_fields() {
        let config = profile().build_plugin_config(Arc::new(LocalCredentialsService));
        assert_eq!(config.fetch_size, 500);
        assert_eq!(config.query_timeout, Some(Duration::from_secs(15)));
        assert!(!config.show_only_conn_database);
        assert!(!config.dialect.is_legacy());
    }

    #[test]
    fn test_factory_builds_pool_on_each_call() {
        let config = profile().build_plugin_config(Arc::new(LocalCredentialsService));
        let first = (config.data_source_factory)().unwrap();
        let second = (config.data_source_factory)().unwrap();
        assert_eq!(first.status().target, second.status().target);
        first.close();
        assert!(!second.status().closed);
    }

    #[test]
    fn test_factory_surfaces_errors() {
        let broken = ConnectionProfile {
            database_name: None,
            ..profile()
        };
        let config = broken.build_plugin_config(Arc::new(LocalCredentialsService));
        let err = (config.data_source_factory)().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
