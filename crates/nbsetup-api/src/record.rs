use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A NetBox object as returned by list and create endpoints.
///
/// Only `id` is typed; every other attribute is kept as raw JSON since the
/// engine reads a handful of fields (`slug`, the nested `tenant.name`, …)
/// across many collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: u64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// A top-level string attribute.
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// `name` of a nested object, e.g. the `tenant` of a site.
    pub fn nested_name(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .and_then(|v| v.get("name"))
            .and_then(Value::as_str)
    }
}

/// Envelope of every NetBox list endpoint.
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}
