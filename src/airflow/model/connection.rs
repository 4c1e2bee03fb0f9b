use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const PASSWORD_MASK: &str = "xxxxxxxx";

/// An Airflow connection: the credentials and settings needed to reach an
/// external service.
///
/// `conn_id` is the external key (for example the suffix of an
/// `AIRFLOW_CONN_*` variable) and is never part of an encoded payload.
#[derive(Clone, PartialEq, Default)]
pub struct Connection {
    pub conn_id: String,
    pub conn_type: Option<String>,
    pub description: Option<String>,
    pub host: Option<String>,
    pub login: Option<String>,
    pub password: Option<String>,
    pub schema: Option<String>,
    pub port: Option<u16>,
    /// Type specific settings. An empty map means the connection has no extra.
    pub extra: Map<String, Value>,
}

impl Connection {
    pub fn new(conn_id: impl Into<String>, conn_type: impl Into<String>) -> Self {
        Connection {
            conn_id: conn_id.into(),
            conn_type: Some(conn_type.into()),
            ..Default::default()
        }
    }

    /// Copy of this connection that is safe to print.
    pub fn masked(&self) -> Self {
        Connection {
            password: self.password.as_ref().map(|_| PASSWORD_MASK.to_string()),
            ..self.clone()
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("conn_id", &self.conn_id)
            .field("conn_type", &self.conn_type)
            .field("description", &self.description)
            .field("host", &self.host)
            .field("login", &self.login)
            .field("password", &self.password.as_ref().map(|_| "***redacted***"))
            .field("schema", &self.schema)
            .field("port", &self.port)
            .field("extra", &self.extra)
            .finish()
    }
}

/// Wire shape of the JSON form.
///
/// `port` and `extra` stay loosely typed here: the platform stores ports as
/// strings in some places and `extra` as a JSON encoded string in others.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conn_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

impl From<&Connection> for ConnectionPayload {
    fn from(c: &Connection) -> Self {
        ConnectionPayload {
            conn_type: c.conn_type.clone(),
            description: c.description.clone(),
            host: c.host.clone(),
            login: c.login.clone(),
            password: c.password.clone(),
            port: c.port.map(Value::from),
            schema: c.schema.clone(),
            extra: if c.extra.is_empty() {
                None
            } else {
                Some(Value::Object(c.extra.clone()))
            },
        }
    }
}
