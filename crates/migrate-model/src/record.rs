//! Records, record keys and keyed record sets.

use std::borrow::{Borrow, Cow};
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::InputError;

/// Which side of the migration a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The records being migrated from.
    Old,
    /// The records being migrated to.
    New,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Old => f.write_str("old"),
            Self::New => f.write_str("new"),
        }
    }
}

/// Canonical identifier of a record within its set.
///
/// Key-field values are rendered to text: strings are trimmed, numbers and
/// booleans use their JSON form, so `1` and `"1"` name the same record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordKey(String);

impl RecordKey {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.len() == value.len() {
            Self(value)
        } else {
            Self(trimmed.to_string())
        }
    }

    /// Builds a key from a key-field value.
    ///
    /// Returns the reason when the value cannot identify a record.
    pub fn from_value(value: &Value) -> Result<Self, &'static str> {
        match value {
            Value::String(text) if text.trim().is_empty() => Err("empty string"),
            Value::String(text) => Ok(Self::new(text.as_str())),
            Value::Number(number) => Ok(Self(number.to_string())),
            Value::Bool(flag) => Ok(Self(flag.to_string())),
            Value::Null => Err("null"),
            Value::Array(_) | Value::Object(_) => Err("not a scalar"),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for RecordKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RecordKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RecordKey {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&RecordKey> for RecordKey {
    fn from(value: &RecordKey) -> Self {
        value.clone()
    }
}

macro_rules! key_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for RecordKey {
                fn from(value: $ty) -> Self {
                    Self(value.to_string())
                }
            }
        )*
    };
}

key_from_integer!(i32, i64, u32, u64, usize);

/// An immutable field map describing one entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a JSON object; any other value yields `None`.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    /// Builder used by hosts and tests to assemble records field by field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Text form of a scalar field, used for display and comparison.
    ///
    /// Null, array and object values have no text form.
    pub fn text(&self, field: &str) -> Option<Cow<'_, str>> {
        match self.0.get(field)? {
            Value::String(text) => Some(Cow::Borrowed(text.as_str())),
            Value::Number(number) => Some(Cow::Owned(number.to_string())),
            Value::Bool(flag) => Some(Cow::Owned(flag.to_string())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// An ordered, uniquely keyed sequence of records.
#[derive(Debug, Clone)]
pub struct RecordSet {
    side: Side,
    key_field: String,
    records: Vec<Record>,
    keys: Vec<RecordKey>,
    index: HashMap<RecordKey, usize>,
}

impl RecordSet {
    /// Builds a record set, validating that every record carries a unique key.
    pub fn new(
        side: Side,
        key_field: impl Into<String>,
        records: Vec<Record>,
    ) -> Result<Self, InputError> {
        let key_field = key_field.into();
        let mut keys = Vec::with_capacity(records.len());
        let mut index = HashMap::with_capacity(records.len());

        for (position, record) in records.iter().enumerate() {
            let value = record.get(&key_field).ok_or_else(|| InputError::MissingKey {
                side,
                index: position,
                field: key_field.clone(),
            })?;
            let key = RecordKey::from_value(value).map_err(|reason| InputError::InvalidKey {
                side,
                index: position,
                field: key_field.clone(),
                reason,
            })?;
            if let Some(&first) = index.get(&key) {
                return Err(InputError::DuplicateKey {
                    side,
                    key,
                    first,
                    second: position,
                });
            }
            index.insert(key.clone(), position);
            keys.push(key);
        }

        Ok(Self {
            side,
            key_field,
            records,
            keys,
            index,
        })
    }

    /// Builds a record set from a list of JSON values, each of which must be an object.
    pub fn from_values(
        side: Side,
        key_field: impl Into<String>,
        values: Vec<Value>,
    ) -> Result<Self, InputError> {
        let records = values
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                Record::from_value(value).ok_or(InputError::NotAnObject { side, index })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(side, key_field, records)
    }

    /// Builds a record set from a JSON array payload.
    pub fn from_json(
        side: Side,
        key_field: impl Into<String>,
        payload: Value,
    ) -> Result<Self, InputError> {
        match payload {
            Value::Array(values) => Self::from_values(side, key_field, values),
            _ => Err(InputError::NotAnArray { side }),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn key_field(&self) -> &str {
        &self.key_field
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, key: &RecordKey) -> bool {
        self.index.contains_key(key)
    }

    /// Position of a key in set order.
    pub fn position(&self, key: &RecordKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn get(&self, key: &RecordKey) -> Option<&Record> {
        self.position(key).map(|position| &self.records[position])
    }

    pub fn key_at(&self, position: usize) -> Option<&RecordKey> {
        self.keys.get(position)
    }

    pub fn keys(&self) -> &[RecordKey] {
        &self.keys
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Iterates `(key, record)` pairs in set order.
    pub fn iter(&self) -> impl Iterator<Item = (&RecordKey, &Record)> {
        self.keys.iter().zip(self.records.iter())
    }
}
