// ── Input document ──
//
// The declarative description of what to provision, as written in the YAML
// input files. Field names follow the input format (`descr`, `addr`, `vl`,
// …); the model builder maps them onto NetBox attributes.
//
// Names that YAML would read as numbers (`cid: 4711`, `name: 100`) are
// accepted and kept as text.

mod load;
mod template;
mod validate;

use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::Deserialize;

use crate::plan::Stage;

pub use load::load_dir;
pub use template::{DeviceTypeTemplate, InterfaceTemplate, PortRange, PortTemplate, load_template};
pub use validate::{Findings, validate};

// ── Top level ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InputDocument {
    pub tenant: Option<Vec<TenantInput>>,
    pub rack_role: Option<Vec<RackRoleInput>>,
    pub device_role: Option<Vec<DeviceRoleInput>>,
    pub manufacturer: Option<Vec<ManufacturerInput>>,
    pub rir: Option<Vec<RirInput>>,
    pub role: Option<Vec<IpamRoleInput>>,
    pub circuit_type: Option<Vec<NamedInput>>,
    pub provider: Option<Vec<ProviderInput>>,
    pub cluster_group: Option<Vec<NamedInput>>,
    pub cluster_type: Option<Vec<ClusterTypeInput>>,
    pub contact_role: Option<Vec<NamedInput>>,
    pub contact_group: Option<Vec<ContactGroupInput>>,
    pub contact_assign: Option<Vec<ContactAssignInput>>,
}

impl InputDocument {
    /// Whether a top-level section was declared.
    pub fn has_section(&self, section: &str) -> bool {
        match section {
            "tenant" => self.tenant.is_some(),
            "rack_role" => self.rack_role.is_some(),
            "device_role" => self.device_role.is_some(),
            "manufacturer" => self.manufacturer.is_some(),
            "rir" => self.rir.is_some(),
            "role" => self.role.is_some(),
            "circuit_type" => self.circuit_type.is_some(),
            "provider" => self.provider.is_some(),
            "cluster_group" => self.cluster_group.is_some(),
            "cluster_type" => self.cluster_type.is_some(),
            "contact_role" => self.contact_role.is_some(),
            "contact_group" => self.contact_group.is_some(),
            "contact_assign" => self.contact_assign.is_some(),
            _ => false,
        }
    }

    /// Required sections absent for each of `stages`; stages with nothing
    /// missing are left out.
    pub fn missing_sections(&self, stages: &[Stage]) -> Vec<(Stage, Vec<&'static str>)> {
        stages
            .iter()
            .filter_map(|&stage| {
                let missing: Vec<&'static str> = stage
                    .required_sections()
                    .iter()
                    .copied()
                    .filter(|section| !self.has_section(section))
                    .collect();
                (!missing.is_empty()).then_some((stage, missing))
            })
            .collect()
    }
}

// ── Shared ───────────────────────────────────────────────────────────

/// `name → attribute` pairs, written either as a mapping or as a bare list
/// of names (attribute then empty). Used for tags (name → colour), route
/// targets (name → description) and assignment targets (kind → object).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamedAttrs(IndexMap<String, String>);

impl NamedAttrs {
    pub fn from_pairs<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<'de> Deserialize<'de> for NamedAttrs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match serde_yaml::Value::deserialize(deserializer)? {
            serde_yaml::Value::Mapping(map) => Ok(Self(
                map.iter()
                    .map(|(k, v)| (yaml_text(k), yaml_text(v)))
                    .collect(),
            )),
            serde_yaml::Value::Sequence(items) => Ok(Self(
                items.iter().map(|k| (yaml_text(k), String::new())).collect(),
            )),
            serde_yaml::Value::Null => Ok(Self::default()),
            _ => Err(de::Error::custom("expected a mapping or a list of names")),
        }
    }
}

fn yaml_text(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_yaml::Value::deserialize(deserializer)? {
        value @ (serde_yaml::Value::String(_)
        | serde_yaml::Value::Number(_)
        | serde_yaml::Value::Bool(_)) => Ok(yaml_text(&value)),
        _ => Err(de::Error::custom("expected a string or number")),
    }
}

fn opt_scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::Null => Ok(None),
        value @ (serde_yaml::Value::String(_)
        | serde_yaml::Value::Number(_)
        | serde_yaml::Value::Bool(_)) => Ok(Some(yaml_text(&value))),
        _ => Err(de::Error::custom("expected a string or number")),
    }
}

/// One name or a list of names.
fn name_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::Sequence(items) => Ok(items.iter().map(yaml_text).collect()),
        serde_yaml::Value::Null => Ok(Vec::new()),
        value => Ok(vec![yaml_text(&value)]),
    }
}

/// Records that only carry the common attributes (circuit types, cluster
/// groups, contact roles).
#[derive(Debug, Clone, Deserialize)]
pub struct NamedInput {
    #[serde(deserialize_with = "scalar")]
    pub name: String,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub descr: Option<String>,
    pub tags: Option<NamedAttrs>,
}

// ── Organisation ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct TenantInput {
    #[serde(deserialize_with = "scalar")]
    pub name: String,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub descr: Option<String>,
    pub tags: Option<NamedAttrs>,
    #[serde(default)]
    pub site: Vec<SiteInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteInput {
    #[serde(deserialize_with = "scalar")]
    pub name: String,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub descr: Option<String>,
    pub time_zone: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub addr: Option<String>,
    #[serde(rename = "ASN")]
    pub asn: Option<u32>,
    pub tags: Option<NamedAttrs>,
    #[serde(default)]
    pub location: Vec<LocationInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationInput {
    #[serde(deserialize_with = "scalar")]
    pub name: String,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub descr: Option<String>,
    pub tags: Option<NamedAttrs>,
    #[serde(default)]
    pub rack: Vec<RackInput>,
    /// Child locations (one level of nesting).
    #[serde(default)]
    pub location: Vec<LocationInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RackInput {
    #[serde(deserialize_with = "scalar")]
    pub name: String,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub tenant: Option<String>,
    pub height: Option<u16>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub role: Option<String>,
    pub tags: Option<NamedAttrs>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RackRoleInput {
    #[serde(deserialize_with = "scalar")]
    pub name: String,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub descr: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub color: Option<String>,
    pub tags: Option<NamedAttrs>,
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceRoleInput {
    #[serde(deserialize_with = "scalar")]
    pub name: String,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub descr: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub color: Option<String>,
    pub vm_role: Option<bool>,
    pub tags: Option<NamedAttrs>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManufacturerInput {
    #[serde(deserialize_with = "scalar")]
    pub name: String,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub descr: Option<String>,
    pub tags: Option<NamedAttrs>,
    #[serde(default)]
    pub platform: Vec<PlatformInput>,
    /// Template file names under the device-type directory.
    #[serde(default)]
    pub device_type: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlatformInput {
    #[serde(deserialize_with = "scalar")]
    pub name: String,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub descr: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub driver: Option<String>,
    pub tags: Option<NamedAttrs>,
}

// ── IPAM ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct RirInput {
    #[serde(deserialize_with = "scalar")]
    pub name: String,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub descr: Option<String>,
    pub is_private: Option<bool>,
    pub tags: Option<NamedAttrs>,
    #[serde(default)]
    pub aggregate: Vec<AggregateInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AggregateInput {
    pub prefix: String,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub descr: Option<String>,
    pub tags: Option<NamedAttrs>,
}

/// Prefix/VLAN role and, beneath it, the per-site VLAN groups, VLANs, VRFs
/// and prefixes that carry the role.
#[derive(Debug, Clone, Deserialize)]
pub struct IpamRoleInput {
    #[serde(deserialize_with = "scalar")]
    pub name: String,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub descr: Option<String>,
    pub tags: Option<NamedAttrs>,
    #[serde(default)]
    pub site: Vec<RoleSiteInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleSiteInput {
    #[serde(deserialize_with = "scalar")]
    pub name: String,
    #[serde(default)]
    pub vlan_grp: Vec<VlanGroupInput>,
    /// VLANs directly under the site, outside any group.
    #[serde(default)]
    pub vlan: Vec<VlanInput>,
    /// VRFs whose prefixes have no VLAN group.
    #[serde(default)]
    pub vrf: Vec<VrfInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VlanGroupInput {
    #[serde(deserialize_with = "scalar")]
    pub name: String,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub descr: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub tenant: Option<String>,
    pub tags: Option<NamedAttrs>,
    #[serde(default)]
    pub vlan: Vec<VlanInput>,
    #[serde(default)]
    pub vrf: Vec<VrfInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VlanInput {
    pub id: u16,
    #[serde(deserialize_with = "scalar")]
    pub name: String,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub tenant: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub descr: Option<String>,
    pub tags: Option<NamedAttrs>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VrfInput {
    #[serde(deserialize_with = "scalar")]
    pub name: String,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub descr: Option<String>,
    pub unique: Option<bool>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub tenant: Option<String>,
    pub tags: Option<NamedAttrs>,
    pub import_rt: Option<NamedAttrs>,
    pub export_rt: Option<NamedAttrs>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub rd: Option<String>,
    #[serde(default)]
    pub prefix: Vec<PrefixInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrefixInput {
    pub pfx: String,
    pub pool: Option<bool>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub descr: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub tenant: Option<String>,
    pub tags: Option<NamedAttrs>,
    /// VID of the VLAN this prefix is bound to.
    pub vl: Option<u16>,
}

// ── Circuits ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderInput {
    #[serde(deserialize_with = "scalar")]
    pub name: String,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub account_num: Option<String>,
    pub portal_url: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub comments: Option<String>,
    pub asn: Option<u32>,
    pub tags: Option<NamedAttrs>,
    #[serde(default)]
    pub circuit: Vec<CircuitInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CircuitInput {
    #[serde(deserialize_with = "scalar")]
    pub cid: String,
    #[serde(rename = "type", deserialize_with = "scalar")]
    pub circuit_type: String,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub descr: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub comments: Option<String>,
    pub tags: Option<NamedAttrs>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub tenant: Option<String>,
    pub commit_rate: Option<u64>,
}

// ── Virtualisation ───────────────────────────────────────────────────

/// Cluster type; its `site`, `group`, `tags` and `tenant` are inherited by
/// clusters that leave them unset.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterTypeInput {
    #[serde(deserialize_with = "scalar")]
    pub name: String,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub descr: Option<String>,
    pub tags: Option<NamedAttrs>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub site: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub group: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub tenant: Option<String>,
    #[serde(default)]
    pub cluster: Vec<ClusterInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClusterInput {
    #[serde(deserialize_with = "scalar")]
    pub name: String,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub comment: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub site: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub group: Option<String>,
    pub tags: Option<NamedAttrs>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub tenant: Option<String>,
}

// ── Contacts ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ContactGroupInput {
    #[serde(deserialize_with = "scalar")]
    pub name: String,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub descr: Option<String>,
    pub tags: Option<NamedAttrs>,
    #[serde(default)]
    pub contact: Vec<ContactInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContactInput {
    #[serde(deserialize_with = "scalar")]
    pub name: String,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub addr: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub comments: Option<String>,
    pub tags: Option<NamedAttrs>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContactAssignInput {
    #[serde(deserialize_with = "name_list")]
    pub contact: Vec<String>,
    #[serde(deserialize_with = "scalar")]
    pub role: String,
    pub priority: Option<String>,
    /// Object kind → object name (or slug; `cid` for circuits).
    pub assign_to: NamedAttrs,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn named_attrs_accept_mapping_or_list() {
        let tags: NamedAttrs = serde_yaml::from_str("{prod: ff0000, 100: '00ff00'}").unwrap();
        assert_eq!(
            tags.iter().collect::<Vec<_>>(),
            vec![("prod", "ff0000"), ("100", "00ff00")]
        );

        let rts: NamedAttrs = serde_yaml::from_str("['65000:1', '65000:2']").unwrap();
        assert_eq!(
            rts.iter().collect::<Vec<_>>(),
            vec![("65000:1", ""), ("65000:2", "")]
        );
    }

    #[test]
    fn numeric_names_are_text() {
        let circuit: CircuitInput = serde_yaml::from_str("{cid: 4711, type: Fibre}").unwrap();
        assert_eq!(circuit.cid, "4711");
        assert_eq!(circuit.circuit_type, "Fibre");
    }

    #[test]
    fn contact_may_be_single_name() {
        let asgn: ContactAssignInput =
            serde_yaml::from_str("{contact: Bob, role: NOC, assign_to: {site: DC1}}").unwrap();
        assert_eq!(asgn.contact, vec!["Bob".to_owned()]);
        assert_eq!(asgn.assign_to.iter().next(), Some(("site", "DC1")));
    }

    #[test]
    fn missing_sections_per_stage() {
        let doc: InputDocument = serde_yaml::from_str("tenant: []\nrir: []").unwrap();
        let missing = doc.missing_sections(&[Stage::Organisation, Stage::Ipam]);
        assert_eq!(
            missing,
            vec![
                (Stage::Organisation, vec!["rack_role"]),
                (Stage::Ipam, vec!["role"]),
            ]
        );
    }
}
