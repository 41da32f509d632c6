//! Keyed attribute table
//!
//! Attributes come from outside the geometry (a CSV export, an API response)
//! and are joined to features by a primary key. The table is built once per
//! render pass and only read afterwards; overlays share it behind an `Arc`.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// A dynamically typed attribute value
///
/// Equality is same-value equality: `NaN` equals `NaN` and `-0` equals `0`,
/// so numbers can key hash maps.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return Some(0.0);
    }

    let radix = match text.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let digits = &text[2..];
        if digits.is_empty() {
            return None;
        }
        return digits.chars().try_fold(0.0_f64, |acc, c| {
            c.to_digit(radix).map(|d| acc * f64::from(radix) + f64::from(d))
        });
    }

    match text {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }
    // `f64::from_str` also takes "inf" and "nan" spellings
    if !text
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
    {
        return None;
    }
    text.parse::<f64>().ok()
}

impl AttributeValue {
    /// Convert a JSON value; arrays and objects are kept as their JSON text
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => n.as_f64().map_or(Self::Null, Self::Number),
            Value::String(s) => Self::Text(s.clone()),
            other => Self::Text(other.to_string()),
        }
    }

    /// Convert to JSON; non-finite numbers become `null`
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 => {
                Value::from(*n as i64)
            }
            Self::Number(n) => serde_json::Number::from_f64(*n).map_or(Value::Null, Value::Number),
            Self::Text(s) => Value::String(s.clone()),
        }
    }

    /// Numeric reading of the value
    ///
    /// Follows the usual dynamic-language coercion: null reads as 0, booleans
    /// as 1/0, and text is trimmed then parsed as a decimal literal, a
    /// `0x`/`0o`/`0b` integer literal or a signed `Infinity`. Blank text reads
    /// as 0. `NaN` and anything else unparsable are not numbers.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Null => Some(0.0),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Number(n) => (!n.is_nan()).then_some(*n),
            Self::Text(s) => parse_number(s),
        }
    }

    /// Text content, if this is a text value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl PartialEq for AttributeValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Self::Text(a), Self::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for AttributeValue {}

impl Hash for AttributeValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Bool(b) => b.hash(state),
            Self::Number(n) => number_bits(*n).hash(state),
            Self::Text(s) => s.hash(state),
        }
    }
}

// must agree with `eq`: every NaN hashes alike, and so do both zeros
fn number_bits(n: f64) -> u64 {
    if n.is_nan() {
        f64::NAN.to_bits()
    } else if n == 0.0 {
        0
    } else {
        n.to_bits()
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for AttributeValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for AttributeValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<i32> for AttributeValue {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&Value> for AttributeValue {
    fn from(value: &Value) -> Self {
        Self::from_json(value)
    }
}

/// One entity's attributes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributeRecord {
    pub id: AttributeValue,
    #[serde(default)]
    pub fields: HashMap<String, AttributeValue>,
}

impl AttributeRecord {
    /// Create a record with no fields
    pub fn new(id: impl Into<AttributeValue>) -> Self {
        Self {
            id: id.into(),
            fields: HashMap::new(),
        }
    }

    /// Builder-style field setter
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Value of a field, if present
    pub fn get(&self, field: &str) -> Option<&AttributeValue> {
        self.fields.get(field)
    }

    /// Build a record from a flat JSON object keyed by `id_field`
    ///
    /// Returns `None` when the id is missing or null. The id field stays in
    /// `fields` so behaviors can match on it like any other attribute.
    pub fn from_json_object(object: &Map<String, Value>, id_field: &str) -> Option<Self> {
        let id = object.get(id_field).map(AttributeValue::from_json)?;
        if id.is_null() {
            return None;
        }
        let fields = object
            .iter()
            .map(|(k, v)| (k.clone(), AttributeValue::from_json(v)))
            .collect();
        Some(Self { id, fields })
    }
}

/// Records keyed by id, iterated in insertion order
#[derive(Clone, Debug, Default)]
pub struct AttributeTable {
    records: Vec<AttributeRecord>,
    index: HashMap<AttributeValue, usize>,
}

impl AttributeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, replacing (in place) any record with the same id
    pub fn insert(&mut self, record: AttributeRecord) -> Option<AttributeRecord> {
        match self.index.get(&record.id) {
            Some(&slot) => Some(std::mem::replace(&mut self.records[slot], record)),
            None => {
                self.index.insert(record.id.clone(), self.records.len());
                self.records.push(record);
                None
            }
        }
    }

    /// Look up a record by id
    pub fn get(&self, id: &AttributeValue) -> Option<&AttributeRecord> {
        self.index.get(id).map(|&slot| &self.records[slot])
    }

    pub fn contains_key(&self, id: &AttributeValue) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, AttributeRecord> {
        self.records.iter()
    }

    /// Ids in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &AttributeValue> {
        self.records.iter().map(|r| &r.id)
    }

    /// Build a table from flat records keyed by `id_field`
    ///
    /// Records with a missing or null id are skipped.
    pub fn from_records<I>(records: I, id_field: &str) -> Self
    where
        I: IntoIterator<Item = Map<String, Value>>,
    {
        let mut table = Self::new();
        let mut skipped = 0usize;
        for object in records {
            match AttributeRecord::from_json_object(&object, id_field) {
                Some(record) => {
                    table.insert(record);
                }
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            tracing::warn!(skipped, id_field, "Skipped records without an id");
        }
        tracing::debug!(records = table.len(), id_field, "Built attribute table");
        table
    }

    /// Parse a JSON array of flat objects into a table
    ///
    /// Array entries that are not objects are ignored.
    pub fn from_json(json: &str, id_field: &str) -> Result<Self> {
        let rows: Vec<Value> = serde_json::from_str(json)?;
        let objects = rows.into_iter().filter_map(|row| match row {
            Value::Object(object) => Some(object),
            _ => None,
        });
        Ok(Self::from_records(objects, id_field))
    }
}

impl FromIterator<AttributeRecord> for AttributeTable {
    fn from_iter<I: IntoIterator<Item = AttributeRecord>>(iter: I) -> Self {
        let mut table = Self::new();
        table.extend(iter);
        table
    }
}

impl Extend<AttributeRecord> for AttributeTable {
    fn extend<I: IntoIterator<Item = AttributeRecord>>(&mut self, iter: I) {
        for record in iter {
            self.insert(record);
        }
    }
}

impl<'a> IntoIterator for &'a AttributeTable {
    type Item = &'a AttributeRecord;
    type IntoIter = std::slice::Iter<'a, AttributeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use std::collections::HashSet;

    #[rstest]
    #[case(AttributeValue::Number(3.5), Some(3.5))]
    #[case(AttributeValue::Number(f64::NAN), None)]
    #[case(AttributeValue::Bool(true), Some(1.0))]
    #[case(AttributeValue::Bool(false), Some(0.0))]
    #[case(AttributeValue::from("  42 "), Some(42.0))]
    #[case(AttributeValue::from("-1.5e2"), Some(-150.0))]
    #[case(AttributeValue::from(".5"), Some(0.5))]
    #[case(AttributeValue::from("5."), Some(5.0))]
    #[case(AttributeValue::from(""), Some(0.0))]
    #[case(AttributeValue::from("   "), Some(0.0))]
    #[case(AttributeValue::Null, Some(0.0))]
    #[case(AttributeValue::from("0x10"), Some(16.0))]
    #[case(AttributeValue::from("0o17"), Some(15.0))]
    #[case(AttributeValue::from("0B101"), Some(5.0))]
    #[case(AttributeValue::from("0x"), None)]
    #[case(AttributeValue::from("-0x10"), None)]
    #[case(AttributeValue::from("0x1g"), None)]
    #[case(AttributeValue::from("Infinity"), Some(f64::INFINITY))]
    #[case(AttributeValue::from(" -Infinity"), Some(f64::NEG_INFINITY))]
    #[case(AttributeValue::from("inf"), None)]
    #[case(AttributeValue::from("infinity"), None)]
    #[case(AttributeValue::from("-inf"), None)]
    #[case(AttributeValue::from("NaN"), None)]
    #[case(AttributeValue::from("1_000"), None)]
    #[case(AttributeValue::from("."), None)]
    #[case(AttributeValue::from("n/a"), None)]
    fn test_as_number(#[case] value: AttributeValue, #[case] expected: Option<f64>) {
        assert_eq!(value.as_number(), expected);
    }

    #[test]
    fn test_same_value_equality() {
        assert_eq!(AttributeValue::Number(f64::NAN), AttributeValue::Number(f64::NAN));
        assert_eq!(AttributeValue::Number(-0.0), AttributeValue::Number(0.0));
        assert_ne!(AttributeValue::Number(1.0), AttributeValue::from("1"));
        assert_ne!(AttributeValue::Null, AttributeValue::Bool(false));

        let mut set = HashSet::new();
        set.insert(AttributeValue::Number(-0.0));
        set.insert(AttributeValue::Number(0.0));
        set.insert(AttributeValue::Number(f64::NAN));
        set.insert(AttributeValue::Number(-f64::NAN));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_json_conversion() {
        assert_eq!(AttributeValue::from_json(&json!(7)), AttributeValue::Number(7.0));
        assert_eq!(AttributeValue::from_json(&json!(null)), AttributeValue::Null);
        assert_eq!(
            AttributeValue::from_json(&json!([1, 2])),
            AttributeValue::from("[1,2]")
        );
        assert_eq!(AttributeValue::Number(7.0).to_json(), json!(7));
        assert_eq!(AttributeValue::Number(0.25).to_json(), json!(0.25));
        assert_eq!(AttributeValue::Number(f64::INFINITY).to_json(), json!(null));
    }

    #[test]
    fn test_untagged_serde() {
        let values: Vec<AttributeValue> = serde_json::from_str(r#"[null, true, 2, "x"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                AttributeValue::Null,
                AttributeValue::Bool(true),
                AttributeValue::Number(2.0),
                AttributeValue::from("x"),
            ]
        );
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut table = AttributeTable::new();
        table.insert(AttributeRecord::new("a").with_field("v", 1));
        table.insert(AttributeRecord::new("b").with_field("v", 2));
        let old = table.insert(AttributeRecord::new("a").with_field("v", 3));

        assert_eq!(old.unwrap().get("v"), Some(&AttributeValue::Number(1.0)));
        assert_eq!(table.len(), 2);
        let ids: Vec<_> = table.keys().cloned().collect();
        assert_eq!(ids, vec![AttributeValue::from("a"), AttributeValue::from("b")]);
        assert_eq!(
            table.get(&"a".into()).unwrap().get("v"),
            Some(&AttributeValue::Number(3.0))
        );
    }

    #[test]
    fn test_from_json_skips_rows_without_id() {
        let table = AttributeTable::from_json(
            r#"[
                {"code": "FR", "pop": 68},
                {"code": null, "pop": 1},
                {"pop": 2},
                "not a record",
                {"code": "DE", "pop": 84}
            ]"#,
            "code",
        )
        .unwrap();

        assert_eq!(table.len(), 2);
        let fr = table.get(&"FR".into()).unwrap();
        assert_eq!(fr.get("code"), Some(&AttributeValue::from("FR")));
        assert_eq!(fr.get("pop").and_then(AttributeValue::as_number), Some(68.0));
    }

    #[test]
    fn test_from_json_rejects_non_array() {
        assert!(AttributeTable::from_json(r#"{"code": "FR"}"#, "code").is_err());
    }
}
