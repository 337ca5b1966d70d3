// Structured create-time validation errors.
//
// A bulk POST that fails validation answers HTTP 400 with one object per
// submitted record, in submission order. Records that were fine get `{}`.
//
//   [{}, {"slug": ["site with this slug already exists."]}, {}]
//
// A single-object POST answers with a bare object instead of a list.

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

/// Field → messages for one submitted record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(IndexMap<String, Vec<String>>);

impl FieldErrors {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut map = IndexMap::new();
        map.insert(field.into(), vec![message.into()]);
        Self(map)
    }

    fn from_object(map: &serde_json::Map<String, Value>) -> Self {
        Self(
            map.iter()
                .map(|(field, value)| (field.clone(), messages(value)))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    /// `(field, messages)` pairs in server order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0
            .iter()
            .filter(|(_, msgs)| !msgs.is_empty())
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// The per-record error list of one rejected bulk create.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldErrors>);

impl ValidationErrors {
    pub fn from_entries(entries: Vec<FieldErrors>) -> Self {
        Self(entries)
    }

    /// Parse a 400 body. Returns `None` when the body is not NetBox's
    /// field-error shape (plain text, `{"detail": …}` handled elsewhere, etc.)
    pub fn from_body(body: &str) -> Option<Self> {
        match serde_json::from_str::<Value>(body).ok()? {
            Value::Array(items) => {
                let entries = items
                    .iter()
                    .map(|item| match item {
                        Value::Object(map) => Some(FieldErrors::from_object(map)),
                        _ => None,
                    })
                    .collect::<Option<Vec<_>>>()?;
                Some(Self(entries))
            }
            Value::Object(map) => Some(Self(vec![FieldErrors::from_object(&map)])),
            _ => None,
        }
    }

    /// All entries, including the empty ones for records that were valid.
    pub fn entries(&self) -> &[FieldErrors] {
        &self.0
    }

    /// Only the entries that carry at least one message.
    pub fn failed(&self) -> impl Iterator<Item = &FieldErrors> {
        self.0.iter().filter(|e| !e.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.failed().next().is_none()
    }

    /// One line for all entries: the first message of every field, grouped
    /// by field with duplicates dropped, e.g.
    /// `name: must be unique, type: "x" is not a valid choice.`
    pub fn merged(&self) -> String {
        let mut grouped: IndexMap<&str, IndexSet<&str>> = IndexMap::new();
        for entry in self.failed() {
            for (field, msgs) in entry.iter() {
                if let Some(first) = msgs.first() {
                    grouped.entry(field).or_default().insert(first);
                }
            }
        }
        grouped
            .iter()
            .map(|(field, msgs)| {
                let joined: Vec<&str> = msgs.iter().copied().collect();
                format!("{field}: {}", joined.join(", "))
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.merged())
    }
}

/// Flatten a NetBox error value into plain messages. Nested objects (errors
/// on a nested reference) are prefixed with their key.
fn messages(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items.iter().flat_map(messages).collect(),
        Value::Object(map) => map
            .iter()
            .flat_map(|(k, v)| messages(v).into_iter().map(move |m| format!("{k}: {m}")))
            .collect(),
        other => vec![other.to_string()],
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parses_bulk_list_with_empty_entries() {
        let body = r#"[{}, {"slug": ["site with this slug already exists."]}, {}]"#;
        let errors = ValidationErrors::from_body(body).unwrap();
        assert_eq!(errors.entries().len(), 3);
        assert_eq!(errors.failed().count(), 1);
        assert_eq!(errors.merged(), "slug: site with this slug already exists.");
    }

    #[test]
    fn nested_reference_errors_are_prefixed() {
        let body = r#"{"site": {"name": ["Related object not found."]}}"#;
        let errors = ValidationErrors::from_body(body).unwrap();
        let entry = errors.failed().next().unwrap();
        let pairs: Vec<_> = entry.iter().collect();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0, "site");
        assert_eq!(pairs[0].1, ["name: Related object not found.".to_owned()]);
    }

    #[test]
    fn merge_dedupes_and_groups_by_field() {
        let body = r#"[
            {"name": ["must be unique"], "type": ["\"x\" is not a valid choice."]},
            {"name": ["must be unique"]},
            {"name": ["too long"]}
        ]"#;
        let errors = ValidationErrors::from_body(body).unwrap();
        assert_eq!(
            errors.merged(),
            "name: must be unique, too long, type: \"x\" is not a valid choice."
        );
    }

    #[test]
    fn rejects_non_field_shapes() {
        assert!(ValidationErrors::from_body("Bad Request").is_none());
        assert!(ValidationErrors::from_body(r#"["plain"]"#).is_none());
    }
}
