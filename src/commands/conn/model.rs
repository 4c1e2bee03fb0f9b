use anyhow::Result;
use clap::{Parser, ValueEnum};
use inquire::validator::Validation;
use strum::Display;

use crate::airflow::codec::parse_extra_object;
use crate::airflow::config::OutputFormat;

#[derive(Parser, Debug)]
pub enum ConnCommand {
    /// Print a connection from the environment or the config file
    Get(GetCommand),
    /// Store a connection in the config file
    Add(AddCommand),
    #[clap(alias = "rm")]
    /// Remove a connection from the config file
    Remove(RemoveCommand),
    #[clap(alias = "ls")]
    /// List known connection ids and where they come from
    List(ListCommand),
    /// Print every known connection
    Export(ExportCommand),
    /// Convert a connection between its URI and JSON forms
    Convert(ConvertCommand),
}

impl ConnCommand {
    pub fn run(&self) -> Result<()> {
        match self {
            ConnCommand::Get(cmd) => cmd.run(),
            ConnCommand::Add(cmd) => cmd.run(),
            ConnCommand::Remove(cmd) => cmd.run(),
            ConnCommand::List(cmd) => cmd.run(),
            ConnCommand::Export(cmd) => cmd.run(),
            ConnCommand::Convert(cmd) => cmd.run(),
        }
    }
}

#[derive(Parser, Debug)]
pub struct GetCommand {
    pub conn_id: String,
    #[clap(short, long, value_enum)]
    pub output: Option<OutputFormat>,
    /// Print the password instead of a mask
    #[clap(long)]
    pub show_sensitive: bool,
    #[clap(short, long, env = "CONNRS_CONFIG")]
    pub file: Option<String>,
}

#[derive(Parser, Debug)]
pub struct AddCommand {
    pub conn_id: String,
    #[clap(long, conflicts_with_all = ["conn_json", "conn_type"])]
    pub conn_uri: Option<String>,
    #[clap(long, conflicts_with = "conn_type")]
    pub conn_json: Option<String>,
    #[clap(long)]
    pub conn_type: Option<String>,
    #[clap(long, requires = "conn_type")]
    pub conn_host: Option<String>,
    #[clap(long, requires = "conn_type")]
    pub conn_login: Option<String>,
    #[clap(long, requires = "conn_type")]
    pub conn_password: Option<String>,
    #[clap(long, requires = "conn_type")]
    pub conn_port: Option<u16>,
    #[clap(long, requires = "conn_type")]
    pub conn_schema: Option<String>,
    /// Extra as a JSON object; replaces any extra given in a URI or JSON
    #[clap(long)]
    pub conn_extra: Option<String>,
    #[clap(long)]
    pub conn_description: Option<String>,
    /// Replace an existing connection with the same id
    #[clap(long)]
    pub overwrite: bool,
    #[clap(short, long, env = "CONNRS_CONFIG")]
    pub file: Option<String>,
}

#[derive(Parser, Debug)]
pub struct RemoveCommand {
    pub conn_id: String,
    #[clap(short, long, env = "CONNRS_CONFIG")]
    pub file: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ListCommand {
    #[clap(short, long, env = "CONNRS_CONFIG")]
    pub file: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Display)]
pub enum ExportFormat {
    #[strum(to_string = "json")]
    Json,
    #[strum(to_string = "env")]
    Env,
}

#[derive(Parser, Debug)]
pub struct ExportCommand {
    #[clap(long, value_enum, default_value_t = ExportFormat::Json)]
    pub format: ExportFormat,
    /// Form of each connection in `env` output; defaults to the configured format
    #[clap(long, value_enum)]
    pub serialization_format: Option<OutputFormat>,
    #[clap(short, long, env = "CONNRS_CONFIG")]
    pub file: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ConvertCommand {
    /// A connection URI or JSON document
    pub text: String,
    /// Defaults to the form the input is not in
    #[clap(short, long, value_enum)]
    pub output: Option<OutputFormat>,
}

#[allow(clippy::unnecessary_wraps)]
pub fn validate_extra(
    extra: &str,
) -> Result<Validation, Box<dyn std::error::Error + Send + Sync>> {
    if extra.trim().is_empty() {
        return Ok(Validation::Valid);
    }
    match parse_extra_object(extra) {
        Ok(_) => Ok(Validation::Valid),
        Err(error) => Ok(Validation::Invalid(error.to_string().into())),
    }
}
