use std::fmt;

use nbsetup_api::Collection;
use serde::Deserialize;

/// Contact priority on an assignment.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::VariantNames,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
    #[default]
    Primary,
    Secondary,
    Tertiary,
    Inactive,
}

/// Object kinds a contact may be assigned to.
pub const ASSIGNABLE_KINDS: &[&str] = &[
    "tenant",
    "site",
    "location",
    "rack",
    "manufacturer",
    "clustergroup",
    "cluster",
    "provider",
    "circuit",
];

/// Assign `contacts` with `role` to the object of `kind` named `identifier`.
/// Expands into one contact-assignment row per contact.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentCandidate {
    pub kind: String,
    pub identifier: String,
    pub contacts: Vec<String>,
    pub role: String,
    pub priority: Priority,
}

impl AssignmentCandidate {
    pub fn content_type(&self) -> ContentType {
        ContentType::for_kind(&self.kind)
    }

    /// Field the target object is looked up by first.
    pub fn primary_field(&self) -> &'static str {
        if self.kind.eq_ignore_ascii_case("circuit") {
            "cid"
        } else {
            "name"
        }
    }
}

/// NetBox content type (`app.model`) of an assignment target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    pub app: &'static str,
    pub model: String,
}

impl ContentType {
    pub fn for_kind(kind: &str) -> Self {
        let model = kind.to_ascii_lowercase();
        let app = if model.contains("circuit") || model.contains("provider") {
            "circuits"
        } else if model.contains("tenant") {
            "tenancy"
        } else if model.contains("cluster") {
            "virtualization"
        } else {
            "dcim"
        };
        Self { app, model }
    }

    /// The collection holding objects of this type.
    pub fn collection(&self) -> Collection {
        Collection::new(self.app, &plural(&self.model))
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.app, self.model)
    }
}

/// Endpoint name for a model. Compound model names are hyphenated in the
/// REST paths.
fn plural(model: &str) -> String {
    match model {
        "clustergroup" => "cluster-groups".to_owned(),
        "clustertype" => "cluster-types".to_owned(),
        "sitegroup" => "site-groups".to_owned(),
        "contactgroup" => "contact-groups".to_owned(),
        "circuittype" => "circuit-types".to_owned(),
        "devicerole" => "device-roles".to_owned(),
        "devicetype" => "device-types".to_owned(),
        "rackrole" => "rack-roles".to_owned(),
        "powerpanel" => "power-panels".to_owned(),
        "virtualmachine" => "virtual-machines".to_owned(),
        "vlangroup" => "vlan-groups".to_owned(),
        other => format!("{other}s"),
    }
}
