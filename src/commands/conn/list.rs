use std::collections::BTreeMap;

use anyhow::Result;

use super::load_config;
use super::model::ListCommand;
use crate::airflow::sources::ConnectionResolver;

impl ListCommand {
    pub fn run(&self) -> Result<()> {
        let config = load_config(self.file.as_ref())?;
        let ids = ConnectionResolver::from_config(&config).connection_ids();
        if ids.is_empty() {
            println!("No connections found");
        } else {
            println!("{}", format_listing(&ids));
        }
        Ok(())
    }
}

fn format_listing(ids: &BTreeMap<String, &'static str>) -> String {
    let width = ids.keys().map(String::len).max().unwrap_or(0);
    ids.iter()
        .map(|(id, source)| format!("{id:<width$}  {source}"))
        .collect::<Vec<_>>()
        .join("\n")
}
