//! Wire types for the CRM REST API: records, query pages and describe results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// One CRM record as returned by the API: field name to JSON value.
///
/// The `attributes` entry (object type and URL) is kept but never treated as a field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(pub Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build a record from `(field, value)` pairs.
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn id(&self) -> Option<&str> {
        self.0.get("Id").and_then(Value::as_str)
    }

    /// Object type from `attributes.type`, when the API supplied it.
    pub fn object_type(&self) -> Option<&str> {
        self.0
            .get("attributes")
            .and_then(|a| a.get("type"))
            .and_then(Value::as_str)
    }

    /// Exact-name lookup. Dotted names walk into nested relationship objects.
    pub fn get(&self, field: &str) -> Option<&Value> {
        let mut parts = field.split('.');
        let first = parts.next()?;
        let mut value = self.0.get(first)?;
        for part in parts {
            value = value.get(part)?;
        }
        Some(value)
    }

    /// Case-insensitive lookup, returning the field's canonical name.
    pub fn find_field(&self, field: &str) -> Option<(&str, &Value)> {
        let mut fields = self.0.iter().filter(|(name, _)| name.as_str() != "attributes");
        let exact = self
            .0
            .iter()
            .find(|(name, _)| name.as_str() == field && field != "attributes");
        exact
            .or_else(|| fields.find(|(name, _)| name.eq_ignore_ascii_case(field)))
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    /// Display text for a field; empty when missing or null.
    pub fn text(&self, field: &str) -> String {
        self.get(field).map(display_value).unwrap_or_default()
    }

    /// Human label: Name, then Subject, then Title, then the Id.
    pub fn display_name(&self) -> String {
        ["Name", "Subject", "Title", "CaseNumber"]
            .iter()
            .filter_map(|f| self.0.get(*f).and_then(Value::as_str))
            .find(|v| !v.is_empty())
            .or_else(|| self.id())
            .unwrap_or("Unnamed")
            .to_string()
    }

    /// Field names in API order, excluding `attributes`.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0
            .keys()
            .map(String::as_str)
            .filter(|k| *k != "attributes")
    }

    /// Fields with a non-empty value, sorted by name.
    pub fn populated_fields(&self) -> Vec<(&str, &Value)> {
        let mut fields: Vec<(&str, &Value)> = self
            .0
            .iter()
            .filter(|(k, v)| k.as_str() != "attributes" && !is_empty_value(v))
            .map(|(k, v)| (k.as_str(), v))
            .collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));
        fields
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Render a JSON value for a table cell or detail line.
///
/// Nested relationship objects show their `Name` when present.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Object(map) => match map.get("Name") {
            Some(name) => display_value(name),
            None => Value::Object(map.clone()).to_string(),
        },
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Ordering for local sorts. Nulls sort after every value; numbers compare
/// numerically, strings case-insensitively.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => display_value(x)
            .to_lowercase()
            .cmp(&display_value(y).to_lowercase()),
    }
}

/// One page of a SOQL query.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    #[serde(default)]
    pub total_size: usize,
    #[serde(default = "default_true")]
    pub done: bool,
    #[serde(default)]
    pub records: Vec<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_records_url: Option<String>,
}

fn default_true() -> bool {
    true
}

impl QueryResult {
    pub fn from_records(records: Vec<Record>) -> Self {
        Self {
            total_size: records.len(),
            done: true,
            records,
            next_records_url: None,
        }
    }
}

/// Full describe of one object type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectDescribe {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub label_plural: String,
    #[serde(default)]
    pub custom: bool,
    #[serde(default)]
    pub queryable: bool,
    #[serde(default)]
    pub searchable: bool,
    #[serde(default)]
    pub createable: bool,
    #[serde(default)]
    pub updateable: bool,
    #[serde(default)]
    pub deletable: bool,
    #[serde(default)]
    pub fields: Vec<FieldDescribe>,
    #[serde(default)]
    pub child_relationships: Vec<ChildRelationshipDescribe>,
}

impl ObjectDescribe {
    /// Case-insensitive field lookup.
    pub fn field(&self, name: &str) -> Option<&FieldDescribe> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PicklistValue {
    pub value: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescribe {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default)]
    pub field_type: String,
    #[serde(default)]
    pub length: Option<u64>,
    #[serde(default)]
    pub precision: Option<u64>,
    #[serde(default)]
    pub scale: Option<u64>,
    #[serde(default = "default_true")]
    pub nillable: bool,
    #[serde(default)]
    pub defaulted_on_create: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub external_id: bool,
    #[serde(default)]
    pub calculated: bool,
    #[serde(default)]
    pub custom: bool,
    #[serde(default)]
    pub updateable: bool,
    #[serde(default)]
    pub picklist_values: Vec<PicklistValue>,
    #[serde(default)]
    pub reference_to: Vec<String>,
    #[serde(default)]
    pub relationship_name: Option<String>,
    #[serde(default)]
    pub inline_help_text: Option<String>,
}

impl FieldDescribe {
    /// Required on create: not nillable and not defaulted.
    pub fn required(&self) -> bool {
        !self.nillable && !self.defaulted_on_create
    }

    pub fn is_reference(&self) -> bool {
        !self.reference_to.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildRelationshipDescribe {
    #[serde(default)]
    pub relationship_name: Option<String>,
    #[serde(rename = "childSObject")]
    pub child_sobject: String,
    pub field: String,
    #[serde(default)]
    pub cascade_delete: bool,
}

/// One entry of the global describe (object catalogue).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SObjectSummary {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub custom: bool,
    #[serde(default)]
    pub custom_setting: bool,
    #[serde(default)]
    pub queryable: bool,
    #[serde(default)]
    pub createable: bool,
}
