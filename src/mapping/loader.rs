/*
Input decoding.

Accepted shapes (TOON or JSON):
    a top-level list of record objects
    an object with a `records` list

Records stay untyped (`serde_json::Value`); FieldMapping decides which
fields are keys.
*/
use serde_json::Value;
use tracing::debug;

use crate::core::error::{ReconcileError, Result};

pub fn load_records(text: &str) -> Result<Vec<Value>> {
    let doc: Value = toon_format::decode_default(text)?;
    into_records(doc)
}

pub fn load_records_json(text: &str) -> Result<Vec<Value>> {
    let doc: Value = serde_json::from_str(text)?;
    into_records(doc)
}

fn into_records(doc: Value) -> Result<Vec<Value>> {
    let records = match doc {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("records") {
            Some(Value::Array(items)) => items,
            _ => return Err(ReconcileError::NotARecordList),
        },
        _ => return Err(ReconcileError::NotARecordList),
    };
    debug!(records = records.len(), "loaded records");
    Ok(records)
}
