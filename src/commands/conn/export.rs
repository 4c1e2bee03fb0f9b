use anyhow::Result;
use serde_json::{Map, Value};

use super::model::{ExportCommand, ExportFormat};
use super::{encode_as, load_config};
use crate::airflow::codec::json::to_value;
use crate::airflow::config::OutputFormat;
use crate::airflow::model::Connection;
use crate::airflow::sources::ConnectionResolver;

impl ExportCommand {
    pub fn run(&self) -> Result<()> {
        let config = load_config(self.file.as_ref())?;
        let connections = ConnectionResolver::from_config(&config).list_connections()?;
        let serialization_format = self.serialization_format.unwrap_or(config.default_format);
        println!("{}", render_export(&connections, self.format, serialization_format)?);
        Ok(())
    }
}

fn render_export(
    connections: &[Connection],
    format: ExportFormat,
    serialization_format: OutputFormat,
) -> Result<String> {
    match format {
        ExportFormat::Json => {
            let mut document = Map::new();
            for conn in connections {
                document.insert(conn.conn_id.clone(), to_value(conn)?);
            }
            Ok(serde_json::to_string_pretty(&Value::Object(document))?)
        }
        ExportFormat::Env => {
            let lines = connections
                .iter()
                .map(|conn| {
                    let encoded = encode_as(conn, serialization_format)?;
                    Ok(format!("{}={}", conn.conn_id, snailquote::escape(&encoded)))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(lines.join("\n"))
        }
    }
}
