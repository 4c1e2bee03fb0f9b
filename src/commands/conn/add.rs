use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::{bail, Result};
use inquire::{required, CustomType, Password, PasswordDisplayMode, Text};
use log::info;
use regex::Regex;
use serde_json::Map;

use super::encode_as;
use super::model::{validate_extra, AddCommand};
use crate::airflow::codec::parse_extra_object;
use crate::airflow::config::ConnrsConfig;
use crate::airflow::model::Connection;

const MAX_CONN_ID_LEN: usize = 250;

static CONN_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w#!()\-.:/\\]+$").expect("connection id pattern must compile")
});

impl AddCommand {
    pub fn run(&self) -> Result<()> {
        validate_conn_id(&self.conn_id)?;
        let conn = match self.connection_from_args()? {
            Some(conn) => conn,
            None => prompt_connection(&self.conn_id)?,
        };

        let path = self.file.as_ref().map(PathBuf::from);
        let mut config = ConnrsConfig::for_update(path.as_ref())?;
        store_connection(&mut config, &conn, self.overwrite)?;
        config.write_to_file()?;

        println!("✅ Connection {} added successfully!", self.conn_id);
        Ok(())
    }

    /// `None` when no connection flags were given and the user should be prompted.
    fn connection_from_args(&self) -> Result<Option<Connection>> {
        let mut conn = if let Some(uri) = &self.conn_uri {
            Connection::from_uri(&self.conn_id, uri)?
        } else if let Some(json) = &self.conn_json {
            Connection::from_json(&self.conn_id, json)?
        } else if let Some(conn_type) = &self.conn_type {
            Connection {
                host: self.conn_host.clone(),
                login: self.conn_login.clone(),
                password: self.conn_password.clone(),
                port: self.conn_port,
                schema: self.conn_schema.clone(),
                ..Connection::new(&self.conn_id, conn_type)
            }
        } else {
            return Ok(None);
        };

        if let Some(extra) = &self.conn_extra {
            conn.extra = parse_extra_object(extra)?;
        }
        if let Some(description) = &self.conn_description {
            conn.description = Some(description.clone());
        }
        Ok(Some(conn))
    }
}

pub fn validate_conn_id(conn_id: &str) -> Result<()> {
    if conn_id.len() > MAX_CONN_ID_LEN {
        bail!("Connection id is longer than {MAX_CONN_ID_LEN} characters");
    }
    if !CONN_ID_PATTERN.is_match(conn_id) {
        bail!(
            "Connection id '{conn_id}' may only contain letters, digits and the characters _ # ! ( ) - . : / \\"
        );
    }
    Ok(())
}

/// Writes the connection into `[connections]` in the configured form and
/// returns the stored value.
fn store_connection(config: &mut ConnrsConfig, conn: &Connection, overwrite: bool) -> Result<String> {
    if config.connections.contains_key(&conn.conn_id) && !overwrite {
        bail!(
            "A connection with conn_id '{}' already exists. Use --overwrite to replace it",
            conn.conn_id
        );
    }
    let encoded = encode_as(conn, config.default_format)?;
    info!("Storing connection {} as {}", conn.conn_id, config.default_format);
    config
        .connections
        .insert(conn.conn_id.clone(), encoded.clone());
    Ok(encoded)
}

fn prompt_connection(conn_id: &str) -> Result<Connection> {
    println!("\n📝 Enter the details of connection {conn_id}. Leave a field empty to skip it.\n");

    let conn_type = Text::new("connection type")
        .with_placeholder("postgres")
        .with_validator(required!("a connection type is required"))
        .prompt()?;
    let host = skip_empty(Text::new("host").prompt_skippable()?);
    let port = CustomType::<u16>::new("port")
        .with_error_message("Please enter a port between 0 and 65535")
        .prompt_skippable()?;
    let login = skip_empty(Text::new("login").prompt_skippable()?);
    let password = skip_empty(
        Password::new("password")
            .without_confirmation()
            .with_display_mode(PasswordDisplayMode::Masked)
            .prompt_skippable()?,
    );
    let schema = skip_empty(Text::new("schema").prompt_skippable()?);
    let extra = match skip_empty(
        Text::new("extra (JSON object)")
            .with_validator(validate_extra)
            .prompt_skippable()?,
    ) {
        Some(raw) => parse_extra_object(&raw)?,
        None => Map::new(),
    };
    let description = skip_empty(Text::new("description").prompt_skippable()?);

    Ok(Connection {
        conn_id: conn_id.to_string(),
        conn_type: Some(conn_type.trim().to_string()),
        description,
        host,
        login,
        password,
        schema,
        port,
        extra,
    })
}

fn skip_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::airflow::config::OutputFormat;
    use rstest::rstest;

    fn add_command(args: &[&str]) -> AddCommand {
        use clap::Parser;
        AddCommand::try_parse_from(std::iter::once("add").chain(args.iter().copied())).unwrap()
    }

    #[rstest]
    #[case("my_postgres", true)]
    #[case("aws.default:eu-west-1/role", true)]
    #[case("has space", false)]
    #[case("semi;colon", false)]
    #[case("", false)]
    fn conn_id_validation(#[case] conn_id: &str, #[case] valid: bool) {
        assert_eq!(validate_conn_id(conn_id).is_ok(), valid, "{conn_id}");
    }

    #[test]
    fn conn_id_length_limit() {
        assert!(validate_conn_id(&"a".repeat(MAX_CONN_ID_LEN)).is_ok());
        assert!(validate_conn_id(&"a".repeat(MAX_CONN_ID_LEN + 1)).is_err());
    }

    #[test]
    fn builds_from_uri_with_overrides() {
        let cmd = add_command(&[
            "db",
            "--conn-uri",
            "postgres://u:p@h:5432/s?a=1",
            "--conn-extra",
            r#"{"sslmode": "require"}"#,
            "--conn-description",
            "main db",
        ]);
        let conn = cmd.connection_from_args().unwrap().unwrap();
        assert_eq!(conn.conn_id, "db");
        assert_eq!(conn.port, Some(5432));
        assert_eq!(conn.extra.len(), 1);
        assert_eq!(conn.extra["sslmode"], "require");
        assert_eq!(conn.description.as_deref(), Some("main db"));
    }

    #[test]
    fn builds_from_fields() {
        let cmd = add_command(&[
            "api",
            "--conn-type",
            "http",
            "--conn-host",
            "api.example.com",
            "--conn-port",
            "443",
            "--conn-password",
            "t/ken",
        ]);
        let conn = cmd.connection_from_args().unwrap().unwrap();
        assert_eq!(conn.to_uri().unwrap(), "http://:t%2Fken@api.example.com:443");
    }

    #[test]
    fn no_flags_means_prompt() {
        assert!(add_command(&["api"]).connection_from_args().unwrap().is_none());
    }

    #[test]
    fn bad_extra_flag_is_an_error() {
        let cmd = add_command(&["api", "--conn-type", "http", "--conn-extra", "[1]"]);
        assert!(cmd.connection_from_args().is_err());
    }

    #[test]
    fn store_respects_format_and_overwrite() {
        let mut config = ConnrsConfig::default();
        let conn = Connection {
            host: Some("h".to_string()),
            ..Connection::new("api", "http")
        };
        assert_eq!(store_connection(&mut config, &conn, false).unwrap(), "http://h");
        assert!(store_connection(&mut config, &conn, false).is_err());

        config.default_format = OutputFormat::Json;
        let stored = store_connection(&mut config, &conn, true).unwrap();
        assert_eq!(stored, r#"{"conn_type":"http","host":"h"}"#);
        assert_eq!(config.connections["api"], stored);
    }
}
