use anyhow::Result;

use crate::airflow::model::Connection;

/// Somewhere connections can be looked up by id, such as the process
/// environment or the config file.
pub trait ConnectionSource {
    /// Short label shown next to connections found in this source.
    fn name(&self) -> &'static str;

    /// `Ok(None)` when the source has no connection with this id. A value
    /// that exists but cannot be decoded is an error.
    fn get_connection(&self, conn_id: &str) -> Result<Option<Connection>>;

    fn connection_ids(&self) -> Vec<String>;

    fn list_connections(&self) -> Result<Vec<Connection>> {
        self.connection_ids()
            .iter()
            .filter_map(|id| self.get_connection(id).transpose())
            .collect()
    }
}
