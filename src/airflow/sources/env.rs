use std::collections::BTreeMap;

use anyhow::{Context, Result};
use log::{debug, warn};

use crate::airflow::model::Connection;
use crate::airflow::traits::ConnectionSource;

/// Connections stored in `{prefix}{CONN_ID}` environment variables, either
/// as a URI or as JSON.
#[derive(Debug, Clone)]
pub struct EnvironmentSource {
    prefix: String,
    vars: BTreeMap<String, String>,
}

impl EnvironmentSource {
    /// Snapshot of the current process environment.
    pub fn from_env(prefix: &str) -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)));
        Self::from_vars(prefix, vars)
    }

    pub fn from_vars<I>(prefix: &str, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: BTreeMap<String, String> = vars
            .into_iter()
            .filter(|(key, _)| key.len() > prefix.len() && key.starts_with(prefix))
            .filter(|(key, _)| {
                // Lookups uppercase the id, so a mixed case name is unreachable
                let suffix = &key[prefix.len()..];
                let upper = suffix.to_uppercase() == suffix;
                if !upper {
                    warn!("Ignoring ${key}: connection variables must be uppercase");
                }
                upper
            })
            .collect();
        debug!("Found {} environment variables with prefix {prefix}", vars.len());
        Self {
            prefix: prefix.to_string(),
            vars,
        }
    }

    pub fn var_name(&self, conn_id: &str) -> String {
        format!("{}{}", self.prefix, conn_id.to_uppercase())
    }
}

impl ConnectionSource for EnvironmentSource {
    fn name(&self) -> &'static str {
        "env"
    }

    fn get_connection(&self, conn_id: &str) -> Result<Option<Connection>> {
        let var_name = self.var_name(conn_id);
        let Some(value) = self.vars.get(&var_name) else {
            return Ok(None);
        };
        debug!("Reading connection {conn_id} from ${var_name}");
        Connection::parse(conn_id, value)
            .map(Some)
            .with_context(|| format!("Connection '{conn_id}' in ${var_name} is invalid"))
    }

    fn connection_ids(&self) -> Vec<String> {
        self.vars
            .keys()
            .map(|key| key[self.prefix.len()..].to_lowercase())
            .collect()
    }
}
