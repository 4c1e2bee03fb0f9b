use anyhow::{anyhow, Result};
use log::info;

use super::model::GetCommand;
use super::{encode_as, load_config};
use crate::airflow::config::OutputFormat;
use crate::airflow::model::Connection;
use crate::airflow::sources::ConnectionResolver;

impl GetCommand {
    pub fn run(&self) -> Result<()> {
        let config = load_config(self.file.as_ref())?;
        let resolver = ConnectionResolver::from_config(&config);
        let (conn, source) = resolver
            .get_connection(&self.conn_id)?
            .ok_or_else(|| anyhow!("Connection '{}' not found", self.conn_id))?;
        info!("Found connection {} in {source}", self.conn_id);

        let format = self.output.unwrap_or(config.default_format);
        println!("{}", render(&conn, format, self.show_sensitive)?);
        Ok(())
    }
}

fn render(conn: &Connection, format: OutputFormat, show_sensitive: bool) -> Result<String> {
    let conn = if show_sensitive {
        conn.clone()
    } else {
        conn.masked()
    };
    match format {
        OutputFormat::Json => Ok(conn.to_json_pretty()?),
        OutputFormat::Uri => encode_as(&conn, format),
    }
}
