use std::path::PathBuf;

use anyhow::{bail, Result};

use super::model::RemoveCommand;
use crate::airflow::config::ConnrsConfig;

impl RemoveCommand {
    pub fn run(&self) -> Result<()> {
        let path = self.file.as_ref().map(PathBuf::from);
        let mut config = ConnrsConfig::for_update(path.as_ref())?;
        remove_connection(&mut config, &self.conn_id)?;
        config.write_to_file()?;

        println!("✅ Connection {} removed successfully!", self.conn_id);
        Ok(())
    }
}

fn remove_connection(config: &mut ConnrsConfig, conn_id: &str) -> Result<()> {
    if config.connections.remove(conn_id).is_none() {
        bail!("Connection '{conn_id}' is not in the config file");
    }
    Ok(())
}
