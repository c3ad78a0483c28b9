//! Ordered parameter maps.
//!
//! Insertion order matters for the payload rendering and is irrelevant for
//! the signing rendering, which sorts.

use std::fmt;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};

/// A scalar parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// Free text.
    Text(String),
    /// Integer (amounts, timestamps, index types).
    Integer(i64),
    /// Calendar date, rendered as `YYYY-MM-DD`.
    Date(NaiveDate),
}

impl ParamValue {
    /// Converts the value to JSON. Integers stay numeric.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Integer(n) => serde_json::Value::from(*n),
            Self::Date(_) => serde_json::Value::String(self.to_string()),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl Serialize for ParamValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Integer(n) => serializer.serialize_i64(*n),
            _ => serializer.collect_str(self),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<NaiveDate> for ParamValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

/// Ordered mapping from field name to [`ParamValue`].
///
/// Re-inserting an existing key replaces its value but keeps its original
/// position, so `defaults.merge(params)` keeps the default field order.
///
/// # Examples
///
/// ```
/// use spgateway::codec::ParamMap;
///
/// let mut params = ParamMap::new();
/// params.insert("Version", "1.0");
/// params.insert("Amt", 100);
/// params.insert("Version", "1.1");
///
/// let keys: Vec<&str> = params.keys().collect();
/// assert_eq!(keys, ["Version", "Amt"]);
/// assert_eq!(params.get("Version").unwrap().to_string(), "1.1");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ParamMap {
    entries: IndexMap<String, ParamValue>,
}

impl ParamMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a field.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> &mut Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts the field only when `value` is `Some`.
    pub fn insert_opt<V: Into<ParamValue>>(
        &mut self,
        key: impl Into<String>,
        value: Option<V>,
    ) -> &mut Self {
        if let Some(value) = value {
            self.insert(key, value);
        }
        self
    }

    /// Returns the value of a field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key)
    }

    /// Returns true if the field is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Removes a field, preserving the order of the others.
    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.entries.shift_remove(key)
    }

    /// Overlays `other` onto `self`: existing keys are replaced in place,
    /// new keys are appended in `other`'s order.
    #[must_use]
    pub fn merge(mut self, other: &Self) -> Self {
        for (key, value) in other.iter() {
            self.entries.insert(key.to_owned(), value.clone());
        }
        self
    }

    /// Iterates fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates field names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Converts the map to a JSON object, keeping insertion order.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.entries.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
        )
    }

    /// Renders every value as a string, for form posts.
    #[must_use]
    pub fn to_form_fields(&self) -> Vec<(String, String)> {
        self.entries.iter().map(|(k, v)| (k.clone(), v.to_string())).collect()
    }
}

impl<K, V> FromIterator<(K, V)> for ParamMap
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for ParamMap
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}
