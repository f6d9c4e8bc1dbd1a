pub mod loader;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Number};

pub use loader::{DataSource, LoadError, Loader, LoaderOptions};

/// A single cell of a student record.
///
/// JSON booleans, arrays and objects have no meaning in a grade sheet; they are
/// folded into `Text` using their JSON text so every record stays renderable.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Text(String),
    Number(Number),
    Null,
    Absent,
}

static ABSENT: Value = Value::Absent;

impl Value {
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Number(n) => Value::Number(n),
            other => Value::Text(other.to_string()),
        }
    }

    /// Null, absent and empty text all render as a placeholder.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null | Value::Absent => true,
            Value::Text(s) => s.is_empty(),
            Value::Number(_) => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Number(n) => f.write_str(&format_number(n)),
            Value::Null | Value::Absent => Ok(()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(Number::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(Number::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// Numbers print the way a browser stringifies them: shortest round-trip
/// digits, `10.0` as `10`, `-0` as `0`, and exponent form (`1e+21`, `1e-7`)
/// outside `[1e-6, 1e21)`.
pub fn format_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) => format_float(f),
        None => n.to_string(),
    }
}

fn format_float(f: f64) -> String {
    if f == 0.0 {
        return "0".to_string();
    }
    if (1e-6..1e21).contains(&f.abs()) {
        return f.to_string();
    }
    let sci = format!("{f:e}");
    match sci.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => sci,
    }
}

/// One student's row, columns kept in document order.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(from = "Map<String, serde_json::Value>")]
pub struct Record {
    columns: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `column`, replacing an existing value in place.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(name, _)| *name == column) {
            Some(slot) => slot.1 = value,
            None => self.columns.push((column, value)),
        }
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    /// Returns `Value::Absent` for columns the record does not carry.
    pub fn value(&self, column: &str) -> &Value {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
            .unwrap_or(&ABSENT)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl From<Map<String, serde_json::Value>> for Record {
    fn from(map: Map<String, serde_json::Value>) -> Self {
        Self {
            columns: map
                .into_iter()
                .map(|(name, value)| (name, Value::from_json(value)))
                .collect(),
        }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        let mut record = Record::new();
        for (column, value) in iter {
            record.insert(column, value);
        }
        record
    }
}

/// The published grade book.
///
/// An entry under `records` that is not an object (`null`, a string, a number)
/// is treated as if the identifier were missing; the rest of the book still
/// loads. A document without `records` loads but answers no lookups.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub last_updated: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "lenient_records")]
    pub records: Option<HashMap<String, Option<Record>>>,
}

fn lenient_records<'de, D>(
    deserializer: D,
) -> Result<Option<HashMap<String, Option<Record>>>, D::Error>
where
    D: Deserializer<'de>,
{
    let records = match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => return Ok(None),
        serde_json::Value::Object(entries) => entries
            .into_iter()
            .map(|(id, entry)| {
                let record = match entry {
                    serde_json::Value::Object(columns) => Some(Record::from(columns)),
                    _ => None,
                };
                (id, record)
            })
            .collect(),
        // A `records` value that is not a map still counts as loaded data.
        _ => HashMap::new(),
    };
    Ok(Some(records))
}

impl Dataset {
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn has_records(&self) -> bool {
        self.records.is_some()
    }

    pub fn record(&self, identifier: &str) -> Option<&Record> {
        self.records.as_ref()?.get(identifier)?.as_ref()
    }

    pub fn len(&self) -> usize {
        self.records
            .as_ref()
            .map(|records| records.values().filter(|r| r.is_some()).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The update marker as shown to users, or `None` when it is missing or
    /// falsy (`null`, `false`, `0`, `""`).
    pub fn last_updated_label(&self) -> Option<String> {
        match self.last_updated.as_ref()? {
            serde_json::Value::Null | serde_json::Value::Bool(false) => None,
            serde_json::Value::String(s) if s.is_empty() => None,
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) if n.as_f64() == Some(0.0) => None,
            serde_json::Value::Number(n) => Some(format_number(n)),
            other => Some(other.to_string()),
        }
    }
}
