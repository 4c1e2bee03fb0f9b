pub mod config;
pub mod env;

use std::collections::BTreeMap;

use anyhow::Result;
use log::debug;

pub use config::ConfigSource;
pub use env::EnvironmentSource;

use crate::airflow::config::ConnrsConfig;
use crate::airflow::model::Connection;
use crate::airflow::traits::ConnectionSource;

/// Looks connections up in several sources, first match wins.
pub struct ConnectionResolver {
    sources: Vec<Box<dyn ConnectionSource>>,
}

impl ConnectionResolver {
    pub fn new(sources: Vec<Box<dyn ConnectionSource>>) -> Self {
        Self { sources }
    }

    /// Environment variables take precedence over the config file.
    pub fn from_config(config: &ConnrsConfig) -> Self {
        Self::new(vec![
            Box::new(EnvironmentSource::from_env(config.env_prefix())),
            Box::new(ConfigSource::from_config(config)),
        ])
    }

    pub fn get_connection(&self, conn_id: &str) -> Result<Option<(Connection, &'static str)>> {
        for source in &self.sources {
            if let Some(conn) = source.get_connection(conn_id)? {
                debug!("Resolved connection {conn_id} from {}", source.name());
                return Ok(Some((conn, source.name())));
            }
        }
        Ok(None)
    }

    /// Every known id with the source it resolves from, sorted by id.
    pub fn connection_ids(&self) -> BTreeMap<String, &'static str> {
        let mut ids = BTreeMap::new();
        for source in &self.sources {
            for id in source.connection_ids() {
                ids.entry(id).or_insert(source.name());
            }
        }
        ids
    }

    /// Every connection once, sorted by id, taken from the first source that has it.
    pub fn list_connections(&self) -> Result<Vec<Connection>> {
        let mut found = BTreeMap::new();
        for source in &self.sources {
            for conn in source.list_connections()? {
                found.entry(conn.conn_id.clone()).or_insert(conn);
            }
        }
        Ok(found.into_values().collect())
    }
}
