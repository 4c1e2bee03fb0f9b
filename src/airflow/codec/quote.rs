use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{Map, Value};

use super::{malformed, CodecError};

/// Everything except ASCII alphanumerics and `-._~` is escaped, so `/ @ : ? #`
/// inside a credential can never be read back as URI structure.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

pub fn quote(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Query string flavour of [`quote`]: spaces become `+`.
pub fn quote_plus(value: &str) -> String {
    value.split(' ').map(quote).collect::<Vec<_>>().join("+")
}

/// Percent-decodes `value`. Escapes that do not form valid UTF-8 are an error.
pub fn unquote(value: &str) -> Result<String, CodecError> {
    percent_decode_str(value)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| malformed(format!("percent-encoded text is not valid UTF-8: {e}")))
}

fn unquote_plus(value: &str) -> Result<String, CodecError> {
    unquote(&value.replace('+', " "))
}

pub fn encode_query<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    pairs
        .into_iter()
        .map(|(key, value)| format!("{}={}", quote_plus(key), quote_plus(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Parses a query string into string values. Blank values are kept and the
/// last occurrence of a repeated key wins.
pub fn decode_query(query: &str) -> Result<Map<String, Value>, CodecError> {
    let mut params = Map::new();
    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        params.insert(unquote_plus(key)?, Value::String(unquote_plus(value)?));
    }
    Ok(params)
}
