//! Conversion between [`Connection`] records and their two textual forms:
//! the legacy URI form and the JSON form.

pub mod json;
pub mod quote;
pub mod uri;

use custom_error::custom_error;
use serde_json::{Map, Value};

use crate::airflow::model::Connection;

custom_error! {
    #[derive(PartialEq)]
    pub CodecError
        MalformedPayload{reason: String} = "Malformed connection payload: {reason}",
        InvalidPort{value: String} = "Expected integer value for `port`, but got '{value}' instead",
        MissingConnType = "A connection type is required to build a connection URI",
}

pub(crate) fn malformed(reason: impl Into<String>) -> CodecError {
    CodecError::MalformedPayload {
        reason: reason.into(),
    }
}

/// Parses a port the way the platform does: ASCII digits only, within `u16`.
pub(crate) fn parse_port(value: &str) -> Result<u16, CodecError> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CodecError::InvalidPort {
            value: value.to_string(),
        });
    }
    value.parse::<u16>().map_err(|_| CodecError::InvalidPort {
        value: value.to_string(),
    })
}

/// Parses a JSON document that must be an object, as used for `extra`.
pub fn parse_extra_object(raw: &str) -> Result<Map<String, Value>, CodecError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(malformed(format!(
            "extra must be a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(malformed(format!("extra is not valid JSON: {e}"))),
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// `postgresql` is a legacy alias and schemes use `-` where types use `_`.
pub(crate) fn normalize_conn_type(conn_type: &str) -> String {
    if conn_type == "postgresql" {
        "postgres".to_string()
    } else {
        conn_type.replace('-', "_")
    }
}

impl Connection {
    pub fn to_uri(&self) -> Result<String, CodecError> {
        uri::encode(self)
    }

    pub fn from_uri(conn_id: &str, text: &str) -> Result<Self, CodecError> {
        uri::decode(conn_id, text)
    }

    pub fn to_json(&self) -> Result<String, CodecError> {
        json::encode(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, CodecError> {
        json::encode_pretty(self)
    }

    pub fn from_json(conn_id: &str, text: &str) -> Result<Self, CodecError> {
        json::decode(conn_id, text)
    }

    /// Decodes either form. Anything that looks like a JSON object is treated
    /// as JSON, everything else as a URI.
    pub fn parse(conn_id: &str, text: &str) -> Result<Self, CodecError> {
        if is_json(text) {
            Self::from_json(conn_id, text)
        } else {
            Self::from_uri(conn_id, text)
        }
    }
}

pub fn is_json(text: &str) -> bool {
    text.trim_start().starts_with('{')
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("5432", Ok(5432))]
    #[case("0", Ok(0))]
    #[case("65535", Ok(65535))]
    #[case("65536", Err(()))]
    #[case("+80", Err(()))]
    #[case("-1", Err(()))]
    #[case("notanumber", Err(()))]
    #[case("", Err(()))]
    fn parse_port_accepts_only_u16_digits(#[case] raw: &str, #[case] expected: Result<u16, ()>) {
        match (parse_port(raw), expected) {
            (Ok(port), Ok(want)) => assert_eq!(port, want),
            (Err(CodecError::InvalidPort { value }), Err(())) => assert_eq!(value, raw),
            (got, want) => panic!("parse_port({raw:?}) = {got:?}, expected {want:?}"),
        }
    }

    #[test]
    fn extra_object_rejects_non_objects() {
        assert!(parse_extra_object(r#"{"a": [1, 2]}"#).is_ok());
        assert!(matches!(
            parse_extra_object("[1, 2]"),
            Err(CodecError::MalformedPayload { .. })
        ));
        assert!(matches!(
            parse_extra_object("{not json"),
            Err(CodecError::MalformedPayload { .. })
        ));
    }

    #[rstest]
    #[case("postgresql", "postgres")]
    #[case("my-conn-type", "my_conn_type")]
    #[case("google_cloud_platform", "google_cloud_platform")]
    fn conn_type_is_normalized(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_conn_type(raw), expected);
    }

    #[test]
    fn parse_detects_the_form() {
        let from_json = Connection::parse("c", r#" {"conn_type": "http", "host": "h"}"#).unwrap();
        assert_eq!(from_json.host.as_deref(), Some("h"));

        let from_uri = Connection::parse("c", "http://h").unwrap();
        assert_eq!(from_uri, from_json);
    }
}
