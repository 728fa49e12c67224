// field-name driven key extraction for JSON-like records
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::core::error::Result;
use crate::core::group::{Group, Grouper};
use crate::core::options::MissingKeyPolicy;
use crate::core::types::GroupKey;

/// Names of the record fields used as grouping keys.
///
/// `levels` are required, outermost first. `parent` is the optional reference
/// to a sibling group at the same level; falsy values (absent, null, false,
/// empty string, zero) count as "no parent".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub levels: Vec<String>,
    pub parent: String,
}

impl FieldMapping {
    pub fn new<I, S>(levels: I, parent: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            levels: levels.into_iter().map(Into::into).collect(),
            parent: parent.into(),
        }
    }

    pub fn from_toon(text: &str) -> Result<Self> {
        let doc: Value = toon_format::decode_default(text)?;
        Ok(serde_json::from_value(doc)?)
    }

    pub fn grouper(&self) -> Grouper<'_, Value> {
        let mut g = Grouper::new();
        for field in &self.levels {
            g = g.key(move |r: &Value| level_key(r, field));
        }
        g.parent_key(move |r: &Value| parent_key(r, &self.parent))
    }

    pub fn group(&self, records: Vec<Value>, policy: MissingKeyPolicy) -> Result<Group<Value>> {
        self.grouper().missing_keys(policy).group(records)
    }
}

fn scalar_key(v: &Value) -> GroupKey {
    match v {
        Value::Null => GroupKey::Missing,
        Value::String(s) => GroupKey::Value(s.clone()),
        Value::Number(n) => GroupKey::Value(number_text(n)),
        other => GroupKey::Value(other.to_string()),
    }
}

//integral floats key like integers: 1.0 and 1 land in the same group
fn number_text(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => (f as i64).to_string(),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

pub fn level_key(record: &Value, field: &str) -> GroupKey {
    record.get(field).map(scalar_key).unwrap_or(GroupKey::Missing)
}

pub fn parent_key(record: &Value, field: &str) -> Option<GroupKey> {
    let v = record.get(field)?;
    let falsy = match v {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Array(_) | Value::Object(_) => false,
    };
    if falsy { None } else { Some(scalar_key(v)) }
}
