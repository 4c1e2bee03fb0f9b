pub mod model;

mod add;
mod convert;
mod export;
mod get;
mod list;
mod remove;

use std::path::PathBuf;

use anyhow::Result;
use log::info;

use crate::airflow::config::{ConnrsConfig, OutputFormat};
use crate::airflow::model::Connection;

fn load_config(file: Option<&String>) -> Result<ConnrsConfig> {
    let path = file.map(PathBuf::from);
    ConnrsConfig::from_file(path.as_ref())
}

/// Encodes in the requested form, falling back to JSON when the URI form
/// would drop data (a description) or cannot be built (no conn type).
pub fn encode_as(conn: &Connection, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(conn.to_json()?),
        OutputFormat::Uri if conn.description.is_some() || conn.conn_type.is_none() => {
            info!(
                "Connection {} cannot be written as a URI without losing data, using JSON",
                conn.conn_id
            );
            Ok(conn.to_json()?)
        }
        OutputFormat::Uri => Ok(conn.to_uri()?),
    }
}
