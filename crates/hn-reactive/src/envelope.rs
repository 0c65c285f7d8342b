//! Decoding of the backend's two response envelopes.
//!
//! Snapshot: a JSON array of `[id, values]` pairs where `values` is an array
//! holding exactly one object. Any other arity is a contract violation and
//! fails hard; nothing is coerced to an empty result.
//!
//! Stream: a bare token string. A JSON string literal (`"abc"`) is accepted
//! and unquoted, since some backends send the token through a JSON encoder.

use serde_json::Value;

use crate::{ReactiveError, Snapshot, SnapshotRow, StreamHandle};

pub fn decode_snapshot(body: &[u8]) -> Result<Snapshot, ReactiveError> {
    let root: Value = serde_json::from_slice(body)
        .map_err(|e| ReactiveError::Decode(format!("snapshot body is not JSON: {e}")))?;

    let pairs = match root {
        Value::Array(pairs) => pairs,
        other => {
            return Err(ReactiveError::Decode(format!(
                "snapshot envelope must be an array, got {}",
                type_name(&other)
            )))
        }
    };

    let mut rows = Vec::with_capacity(pairs.len());
    for (i, pair) in pairs.into_iter().enumerate() {
        rows.push(decode_row(i, pair)?);
    }
    Ok(Snapshot { rows })
}

fn decode_row(i: usize, pair: Value) -> Result<SnapshotRow, ReactiveError> {
    let mut pair = match pair {
        Value::Array(items) if items.len() == 2 => items,
        Value::Array(items) => {
            return Err(ReactiveError::Decode(format!(
                "row {i}: expected [id, values] pair, got array of length {}",
                items.len()
            )))
        }
        other => {
            return Err(ReactiveError::Decode(format!(
                "row {i}: expected [id, values] pair, got {}",
                type_name(&other)
            )))
        }
    };

    let values = pair.pop().unwrap_or(Value::Null);
    let id = pair.pop().unwrap_or(Value::Null);

    if !(id.is_number() || id.is_string()) {
        return Err(ReactiveError::Decode(format!(
            "row {i}: id must be a number or string, got {}",
            type_name(&id)
        )));
    }

    let mut values = match values {
        Value::Array(values) => values,
        other => {
            return Err(ReactiveError::Decode(format!(
                "row {i}: values must be an array, got {}",
                type_name(&other)
            )))
        }
    };
    if values.len() != 1 {
        return Err(ReactiveError::Decode(format!(
            "row {i}: values must hold exactly one object, got {}",
            values.len()
        )));
    }

    match values.pop() {
        Some(Value::Object(value)) => Ok(SnapshotRow { id, value }),
        Some(other) => Err(ReactiveError::Decode(format!(
            "row {i}: value must be an object, got {}",
            type_name(&other)
        ))),
        None => Err(ReactiveError::Decode(format!("row {i}: values is empty"))),
    }
}

pub fn decode_stream_handle(body: &[u8]) -> Result<StreamHandle, ReactiveError> {
    let text = std::str::from_utf8(body)
        .map_err(|e| ReactiveError::Decode(format!("stream token is not UTF-8: {e}")))?
        .trim();

    if text.starts_with('"') {
        let token: String = serde_json::from_str(text)
            .map_err(|e| ReactiveError::Decode(format!("stream token is a malformed JSON string: {e}")))?;
        return StreamHandle::parse(&token);
    }
    if text.starts_with(['[', '{']) {
        return Err(ReactiveError::Decode(
            "stream response is structured JSON, expected a token".to_string(),
        ));
    }
    StreamHandle::parse(text)
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
