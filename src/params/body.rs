//! Body decoding keyed on the declared media type.

use serde_json::Value;
use url::form_urlencoded;

use crate::params::{DecodeError, Params};

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const JSON: &str = "application/json";

/// Decode a request body into parameters.
///
/// Only `application/x-www-form-urlencoded` and `application/json` bodies
/// contribute parameters; any other or missing content type yields an empty
/// set. Media type parameters (`; charset=...`) are ignored.
///
/// For JSON, only a top-level object contributes. String members are taken
/// verbatim, every other member as its compact JSON text.
pub fn decode_body(content_type: Option<&str>, body: &[u8]) -> Result<Params, DecodeError> {
    if body.is_empty() {
        return Ok(Params::new());
    }

    let media_type = match content_type {
        Some(value) => value.split(';').next().unwrap_or_default().trim(),
        None => return Ok(Params::new()),
    };

    if media_type.eq_ignore_ascii_case(FORM_URLENCODED) {
        Ok(form_urlencoded::parse(body).into_owned().collect())
    } else if media_type.eq_ignore_ascii_case(JSON) {
        match serde_json::from_slice::<Value>(body)? {
            Value::Object(members) => Ok(members
                .into_iter()
                .map(|(name, value)| match value {
                    Value::String(text) => (name, text),
                    other => (name, other.to_string()),
                })
                .collect()),
            _ => Ok(Params::new()),
        }
    } else {
        Ok(Params::new())
    }
}
