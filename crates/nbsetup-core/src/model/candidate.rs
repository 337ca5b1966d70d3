use std::fmt;

use nbsetup_api::Filter;
use serde_json::{Map, Value};

/// Field → JSON value body of one record.
pub type Fields = Map<String, Value>;

/// Unwrap a `json!({...})` literal into its field map.
pub fn object(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => Fields::new(),
    }
}

/// Human rendering of a key value: strings bare, everything else as JSON.
pub fn value_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// One record to provision.
///
/// `fields` is the body sent on create. Named references inside it are
/// nested maps holding only a natural key (`{"name": "DC1"}`), resolved by
/// NetBox at create time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidate {
    pub fields: Fields,
    /// Compound existence filter, attached once parents are resolved.
    pub filter: Option<Filter>,
    /// Identity shown in reports for compound-filtered records.
    pub label: Option<String>,
    /// VLAN a prefix is bound to. Resolved to an id before create; never
    /// serialized as-is.
    pub vlan: Option<VlanRef>,
}

impl Candidate {
    pub fn new(fields: Fields) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    pub fn with_vlan(mut self, vlan: Option<VlanRef>) -> Self {
        self.vlan = vlan;
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).filter(|v| !v.is_null())
    }

    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    /// Natural key inside a nested reference, e.g. the VLAN group name of a
    /// VLAN (`group: {"name": …}`).
    pub fn reference_name(&self, field: &str) -> Option<String> {
        let reference = self.get(field)?;
        reference
            .get("name")
            .or_else(|| reference.get("slug"))
            .or_else(|| reference.get("model"))
            .map(value_label)
    }

    /// Request body.
    pub fn body(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// How this candidate is named in exists/created report lines.
    pub fn identity(&self, key: &CheckKey) -> String {
        match key {
            CheckKey::Field(field) => self.get(field).map(value_label).unwrap_or_default(),
            CheckKey::Slug => format!(
                "{} ({})",
                self.name().unwrap_or_default(),
                self.str_field("slug").unwrap_or_default()
            ),
            CheckKey::Scoped(field, scope) => {
                let key = self.get(field).map(value_label).unwrap_or_default();
                let scope: Vec<String> = scope
                    .iter()
                    .filter_map(|field| self.get(field).map(value_label))
                    .collect();
                if scope.is_empty() {
                    key
                } else {
                    format!("{key} ({})", scope.join(", "))
                }
            }
            CheckKey::Compound => self
                .label
                .clone()
                .or_else(|| self.filter.as_ref().map(ToString::to_string))
                .unwrap_or_default(),
        }
    }
}

/// What makes a record "the same" as one already in NetBox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKey {
    /// Single natural-key field (`name`, `model`, `prefix`, `cid`).
    Field(&'static str),
    /// `slug`; reported as `name (slug)`.
    Slug,
    /// A natural key only unique alongside the scope fields, e.g. a VRF's
    /// `name` with its `rd`. Unset scope fields filter as `null`.
    Scoped(&'static str, &'static [&'static str]),
    /// The candidate's own compound filter.
    Compound,
}

impl CheckKey {
    /// The lookup filter for `candidate`, or `None` when the key field is
    /// missing (or a compound filter was never attached).
    pub fn filter_for(&self, candidate: &Candidate) -> Option<Filter> {
        match self {
            Self::Field(field) => candidate
                .get(field)
                .map(|value| Filter::by(*field, value.clone())),
            Self::Slug => candidate
                .get("slug")
                .map(|value| Filter::by("slug", value.clone())),
            Self::Scoped(field, scope) => {
                let mut filter = Filter::by(*field, candidate.get(field)?.clone());
                for field in *scope {
                    filter.insert(*field, candidate.get(field).cloned().unwrap_or(Value::Null));
                }
                Some(filter)
            }
            Self::Compound => candidate.filter.clone(),
        }
    }
}

impl fmt::Display for CheckKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(field) => f.write_str(field),
            Self::Slug => f.write_str("slug"),
            Self::Scoped(field, scope) => write!(f, "{field}+{}", scope.join("+")),
            Self::Compound => f.write_str("compound filter"),
        }
    }
}

/// A prefix's VLAN, by VID within a VLAN group or directly under a site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VlanRef {
    pub vid: u16,
    pub scope: VlanScope,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VlanScope {
    Group(String),
    Site(String),
}

impl VlanScope {
    pub const GROUP_NOUN: &'static str = "VLAN group";
    pub const SITE_NOUN: &'static str = "site";

    pub fn name(&self) -> &str {
        match self {
            Self::Group(name) | Self::Site(name) => name,
        }
    }

    pub fn noun(&self) -> &'static str {
        match self {
            Self::Group(_) => Self::GROUP_NOUN,
            Self::Site(_) => Self::SITE_NOUN,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn slug_identity_shows_name_and_slug() {
        let c = Candidate::new(object(json!({"name": "Data Centre", "slug": "data_centre"})));
        assert_eq!(c.identity(&CheckKey::Slug), "Data Centre (data_centre)");
        assert_eq!(c.identity(&CheckKey::Field("name")), "Data Centre");
    }

    #[test]
    fn null_key_builds_no_filter() {
        let c = Candidate::new(object(json!({"name": null})));
        assert!(CheckKey::Field("name").filter_for(&c).is_none());
        assert!(CheckKey::Compound.filter_for(&c).is_none());
    }

    #[test]
    fn numeric_key_identity_is_plain() {
        let c = Candidate::new(object(json!({"cid": "4711", "vid": 10})));
        assert_eq!(c.identity(&CheckKey::Field("vid")), "10");
        assert_eq!(c.reference_name("group"), None);
    }

    #[test]
    fn scoped_key_filters_unset_scope_as_null() {
        let key = CheckKey::Scoped("name", &["rd"]);
        let with_rd = Candidate::new(object(json!({"name": "blue", "rd": "65000:2"})));
        let without = Candidate::new(object(json!({"name": "blue"})));

        assert_eq!(
            key.filter_for(&with_rd).as_ref().map(ToString::to_string),
            Some("name=blue, rd=65000:2".to_owned())
        );
        assert_eq!(
            key.filter_for(&without).as_ref().map(ToString::to_string),
            Some("name=blue, rd=null".to_owned())
        );
        assert_eq!(with_rd.identity(&key), "blue (65000:2)");
        assert_eq!(without.identity(&key), "blue");
    }
}
