//! The URI form:
//! `{conn_type}://{login}:{password}@{host}:{port}/{schema}?{query}`.

use log::{debug, warn};
use serde_json::{Map, Value};

use super::quote::{decode_query, encode_query, quote, quote_plus, unquote};
use super::{malformed, normalize_conn_type, parse_extra_object, parse_port, CodecError};
use crate::airflow::model::Connection;

/// Query parameter carrying the whole `extra` as JSON when it cannot be
/// expressed as plain `key=value` pairs.
pub const EXTRA_KEY: &str = "__extra__";

const SCHEME_SEPARATOR: &str = "://";

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

pub fn encode(conn: &Connection) -> Result<String, CodecError> {
    let conn_type = non_empty(conn.conn_type.as_ref()).ok_or(CodecError::MissingConnType)?;
    if conn_type.contains('_') {
        warn!(
            "Connection scheme (type: {conn_type}) shall not contain '_'; it is written with '-' instead"
        );
    }
    let mut uri = format!(
        "{}{SCHEME_SEPARATOR}",
        quote(&conn_type.to_lowercase().replace('_', "-"))
    );

    let (protocol, host) = match non_empty(conn.host.as_ref()) {
        Some(host) => match host.split_once(SCHEME_SEPARATOR) {
            Some((protocol, rest)) => (Some(protocol), rest),
            None => (None, host),
        },
        None => (None, ""),
    };
    if let Some(protocol) = protocol {
        uri.push_str(protocol);
        uri.push_str(SCHEME_SEPARATOR);
    }

    let mut authority = String::new();
    if let Some(login) = non_empty(conn.login.as_ref()) {
        authority.push_str(&quote(login));
    }
    if let Some(password) = non_empty(conn.password.as_ref()) {
        authority.push(':');
        authority.push_str(&quote(password));
    }
    if !authority.is_empty() {
        authority.push('@');
        uri.push_str(&authority);
    }

    let mut host_block = quote(host);
    if let Some(port) = conn.port {
        // A bare ":port" would be read as an empty login with a password.
        if host_block.is_empty() && authority.is_empty() {
            host_block.push('@');
        }
        host_block.push_str(&format!(":{port}"));
    }
    if let Some(schema) = non_empty(conn.schema.as_ref()) {
        host_block.push('/');
        host_block.push_str(&quote(schema));
    }
    uri.push_str(&host_block);

    if let Some(query) = encode_extra(&conn.extra)? {
        uri.push('?');
        uri.push_str(&query);
    }
    Ok(uri)
}

/// Plain pairs when every entry survives query encoding unchanged, otherwise
/// the whole map as JSON under [`EXTRA_KEY`].
fn encode_extra(extra: &Map<String, Value>) -> Result<Option<String>, CodecError> {
    if extra.is_empty() {
        return Ok(None);
    }

    let rendered: Vec<(&str, String)> = extra
        .iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.as_str(), text)
        })
        .collect();
    let query = encode_query(rendered.iter().map(|(k, v)| (*k, v.as_str())));
    // A plain `__extra__` pair would be read back as the JSON payload.
    if !extra.contains_key(EXTRA_KEY) && decode_query(&query)? == *extra {
        return Ok(Some(query));
    }

    debug!("extra does not survive plain query encoding, writing it as {EXTRA_KEY}");
    let json = serde_json::to_string(extra)
        .map_err(|e| malformed(format!("extra cannot be serialized: {e}")))?;
    Ok(Some(format!("{EXTRA_KEY}={}", quote_plus(&json))))
}

pub fn decode(conn_id: &str, text: &str) -> Result<Connection, CodecError> {
    let (scheme, rest) = text
        .split_once(SCHEME_SEPARATOR)
        .ok_or_else(|| malformed(format!("no '{SCHEME_SEPARATOR}' in connection URI")))?;

    let rest = rest.split_once('#').map_or(rest, |(before, _fragment)| before);
    let (rest, query) = match rest.split_once('?') {
        Some((rest, query)) => (rest, Some(query)),
        None => (rest, None),
    };

    let (protocol, rest) = match rest.split_once(SCHEME_SEPARATOR) {
        Some((protocol, remainder)) => {
            if remainder.contains(SCHEME_SEPARATOR) {
                return Err(malformed("more than two schemes in connection URI"));
            }
            if protocol.contains(['@', ':', '/']) {
                return Err(malformed(format!(
                    "invalid host protocol '{protocol}' in connection URI"
                )));
            }
            (Some(protocol), remainder)
        }
        None => (None, rest),
    };

    let (netloc, path) = match rest.split_once('/') {
        Some((netloc, path)) => (netloc, Some(path)),
        None => (rest, None),
    };

    // Credentials end at the rightmost '@'; the login ends at the first ':'.
    let (userinfo, hostinfo) = match netloc.rsplit_once('@') {
        Some((userinfo, hostinfo)) => (Some(userinfo), hostinfo),
        None => (None, netloc),
    };
    let (login, password) = match userinfo {
        Some(userinfo) => match userinfo.split_once(':') {
            Some((login, password)) => (Some(login), Some(password)),
            None => (Some(userinfo), None),
        },
        None => (None, None),
    };
    let (host, port) = split_host_port(hostinfo)?;

    let conn_type = Some(normalize_conn_type(&unquote(scheme)?)).filter(|t| !t.is_empty());
    let host = Some(unquote(host)?).filter(|h| !h.is_empty()).map(|host| match protocol {
        Some(protocol) => format!("{protocol}{SCHEME_SEPARATOR}{host}"),
        None => host,
    });

    Ok(Connection {
        conn_id: conn_id.to_string(),
        conn_type,
        description: None,
        host,
        login: decode_component(login)?,
        password: decode_component(password)?,
        schema: decode_component(path)?,
        port,
        extra: decode_extra(query)?,
    })
}

fn decode_component(raw: Option<&str>) -> Result<Option<String>, CodecError> {
    Ok(raw.map(unquote).transpose()?.filter(|v| !v.is_empty()))
}

fn split_host_port(hostinfo: &str) -> Result<(&str, Option<u16>), CodecError> {
    let (host, port) = if let Some(bracketed) = hostinfo.strip_prefix('[') {
        let (host, tail) = bracketed
            .split_once(']')
            .ok_or_else(|| malformed("unterminated IPv6 literal in connection URI"))?;
        (host, tail.split_once(':').map_or("", |(_, port)| port))
    } else {
        hostinfo.split_once(':').unwrap_or((hostinfo, ""))
    };

    let port = if port.is_empty() {
        None
    } else {
        Some(parse_port(port)?)
    };
    Ok((host, port))
}

fn decode_extra(query: Option<&str>) -> Result<Map<String, Value>, CodecError> {
    let Some(query) = query.filter(|q| !q.is_empty()) else {
        return Ok(Map::new());
    };
    let params = decode_query(query)?;
    match params.get(EXTRA_KEY) {
        Some(Value::String(raw)) => parse_extra_object(raw),
        _ => Ok(params),
    }
}
