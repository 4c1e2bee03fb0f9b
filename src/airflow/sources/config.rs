use std::collections::BTreeMap;

use anyhow::{Context, Result};

use crate::airflow::config::{expand_env_vars, ConnrsConfig};
use crate::airflow::model::Connection;
use crate::airflow::traits::ConnectionSource;

/// Connections listed under `[connections]` in the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    connections: BTreeMap<String, String>,
}

impl ConfigSource {
    pub fn from_config(config: &ConnrsConfig) -> Self {
        Self {
            connections: config.connections.clone(),
        }
    }
}

impl ConnectionSource for ConfigSource {
    fn name(&self) -> &'static str {
        "config"
    }

    fn get_connection(&self, conn_id: &str) -> Result<Option<Connection>> {
        let Some(value) = self.connections.get(conn_id) else {
            return Ok(None);
        };
        let expanded = expand_env_vars(value)?;
        Connection::parse(conn_id, &expanded)
            .map(Some)
            .with_context(|| format!("Connection '{conn_id}' in the config file is invalid"))
    }

    fn connection_ids(&self) -> Vec<String> {
        self.connections.keys().cloned().collect()
    }
}
