use std::fmt;

use serde_json::Value;

/// Ordered `field=value` pairs sent as query parameters on a lookup.
///
/// JSON `null` renders as the literal `null`, which NetBox reads as
/// "this field is unset" (e.g. `vrf_id=null` for the global table).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter(Vec<(String, Value)>);

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-field filter.
    pub fn by(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self(vec![(field.into(), value.into())])
    }

    /// Add a field, replacing any earlier value for the same field.
    pub fn and(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        let field = field.into();
        let value = value.into();
        if let Some(slot) = self.0.iter_mut().find(|(k, _)| *k == field) {
            slot.1 = value;
        } else {
            self.0.push((field, value));
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.iter().find(|(k, _)| k == field).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Render as `(name, value)` query pairs.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), render_value(v)))
            .collect()
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_owned(),
        other => other.to_string(),
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}={}", render_value(v))?;
        }
        Ok(())
    }
}
