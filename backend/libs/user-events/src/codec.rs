//! JSON wire format for [`UserRecord`]
//!
//! ```json
//! {"id":42,"name":"Ana","email":"ana@example.com","phone":"+1 555 0100"}
//! ```
//!
//! Absent optional fields are omitted rather than written as `null`. On decode
//! `id`, `name` and `email` are required; a malformed `phone` is dropped.

use serde_json::{Map, Value};

use crate::error::{DecodeError, EncodeError};
use crate::record::{normalize_phone, UserRecord};

pub fn encode(record: &UserRecord) -> Result<Vec<u8>, EncodeError> {
    Ok(serde_json::to_vec(record)?)
}

pub fn decode(bytes: &[u8]) -> Result<UserRecord, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::new("empty payload", bytes));
    }

    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| DecodeError::new(format!("invalid JSON: {}", e), bytes))?;

    let Value::Object(fields) = value else {
        return Err(DecodeError::new("payload is not a JSON object", bytes));
    };

    let id = match fields.get("id") {
        Some(v) => v
            .as_i64()
            .ok_or_else(|| DecodeError::new("field `id` is not an integer", bytes))?,
        None => return Err(DecodeError::new("missing field `id`", bytes)),
    };
    let name = required_str(&fields, "name", bytes)?;
    let email = required_str(&fields, "email", bytes)?;
    let phone = fields
        .get("phone")
        .and_then(Value::as_str)
        .map(str::to_owned);

    Ok(UserRecord {
        id: Some(id),
        name,
        email,
        phone: normalize_phone(phone),
    })
}

fn required_str(fields: &Map<String, Value>, key: &str, raw: &[u8]) -> Result<String, DecodeError> {
    match fields.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(DecodeError::new(format!("field `{}` is not a string", key), raw)),
        None => Err(DecodeError::new(format!("missing field `{}`", key), raw)),
    }
}
