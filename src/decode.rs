//! Strict JSON decoding, sanitization and validation of request bodies.
//!
//! [`decode`] runs three steps, in order:
//!
//! 1. Parse the body as JSON into the target type. A malformed body, or a
//!    body with a field the target does not declare, fails with
//!    `400 Bad Request`.
//! 2. Scrub markup out of every top-level string field with the `ammonia`
//!    policy (safe formatting tags survive, scripts and handlers do not).
//! 3. Run the target's [`Validate`] rules, collecting every violation.
//!
//! Cleaning happens on the JSON before it meets the target type, so it
//! applies to every top-level JSON string, whatever Rust type reads it.
//! Cleaned text is HTML-escaped (`&` becomes `&amp;`), which changes
//! values such as enum names or URLs containing `&`, `<` or `>`. Declare
//! such fields as `String` and convert them after `decode`, or decode into
//! a nested object, which is left untouched.

use http::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Error;
use crate::request::Request;
use crate::validate::{English, Locale, Validate, Validator};

/// Decodes, sanitizes and validates the request body with English messages.
pub fn decode<T>(req: &Request) -> Result<T, Error>
where
    T: DeserializeOwned + Validate,
{
    decode_with_locale(req, &English)
}

/// Like [`decode`], rendering validation messages with `locale`.
pub fn decode_with_locale<T>(req: &Request, locale: &dyn Locale) -> Result<T, Error>
where
    T: DeserializeOwned + Validate,
{
    let mut value: Value = serde_json::from_slice(req.body())
        .map_err(|e| Error::request(e, StatusCode::BAD_REQUEST))?;

    sanitize(&mut value);

    let mut unknown = Vec::new();
    let target: T = serde_ignored::deserialize(value, |path| unknown.push(path.to_string()))
        .map_err(|e| Error::request(e, StatusCode::BAD_REQUEST))?;
    if let Some(field) = unknown.first() {
        return Err(Error::request(format!("unknown field \"{field}\""), StatusCode::BAD_REQUEST));
    }

    let mut validator = Validator::new(locale);
    target.validate(&mut validator);
    validator.finish()?;

    Ok(target)
}

/// Cleans the string members of a top-level object in place.
///
/// Anything that is not an object has no fields to clean. Nested values are
/// left alone, matching the "fields of the target" scope.
fn sanitize(value: &mut Value) {
    if let Value::Object(fields) = value {
        for field in fields.values_mut() {
            if let Value::String(s) = field {
                *s = sanitize_str(s);
            }
        }
    }
}

pub(crate) fn sanitize_str(s: &str) -> String {
    ammonia::clean(s)
}
