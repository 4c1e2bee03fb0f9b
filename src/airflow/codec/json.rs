use serde_json::{Map, Value};

use super::{json_kind, malformed, normalize_conn_type, parse_extra_object, parse_port, CodecError};
use crate::airflow::model::{Connection, ConnectionPayload};

pub fn encode(conn: &Connection) -> Result<String, CodecError> {
    serde_json::to_string(&ConnectionPayload::from(conn))
        .map_err(|e| malformed(format!("connection cannot be serialized: {e}")))
}

pub fn encode_pretty(conn: &Connection) -> Result<String, CodecError> {
    serde_json::to_string_pretty(&ConnectionPayload::from(conn))
        .map_err(|e| malformed(format!("connection cannot be serialized: {e}")))
}

/// The JSON form as a value, for embedding in larger documents.
pub fn to_value(conn: &Connection) -> Result<Value, CodecError> {
    serde_json::to_value(ConnectionPayload::from(conn))
        .map_err(|e| malformed(format!("connection cannot be serialized: {e}")))
}

pub fn decode(conn_id: &str, text: &str) -> Result<Connection, CodecError> {
    let payload: ConnectionPayload = serde_json::from_str(text)
        .map_err(|e| malformed(format!("connection JSON is invalid: {e}")))?;
    from_payload(conn_id, payload)
}

fn from_payload(conn_id: &str, payload: ConnectionPayload) -> Result<Connection, CodecError> {
    Ok(Connection {
        conn_id: conn_id.to_string(),
        conn_type: payload
            .conn_type
            .filter(|t| !t.is_empty())
            .map(|t| normalize_conn_type(&t)),
        description: payload.description,
        host: payload.host,
        login: payload.login,
        password: payload.password,
        schema: payload.schema,
        port: decode_port(payload.port)?,
        extra: decode_extra(payload.extra)?,
    })
}

fn decode_port(port: Option<Value>) -> Result<Option<u16>, CodecError> {
    match port {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => parse_port(s.trim()).map(Some),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|p| u16::try_from(p).ok())
            .map(Some)
            .ok_or_else(|| CodecError::InvalidPort {
                value: n.to_string(),
            }),
        Some(other) => Err(CodecError::InvalidPort {
            value: other.to_string(),
        }),
    }
}

fn decode_extra(extra: Option<Value>) -> Result<Map<String, Value>, CodecError> {
    match extra {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(Map::new()),
        Some(Value::String(s)) => parse_extra_object(&s),
        Some(other) => Err(malformed(format!(
            "extra must be a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}
