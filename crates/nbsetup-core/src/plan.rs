// ── Stage plan ──
//
// Record kinds are synchronized in a fixed dependency order. Every kind
// declares which other kinds it references by name; `Plan::validate` checks
// those references only ever point backwards.

use nbsetup_api::Collection;
use tracing::debug;

use crate::error::CoreError;
use crate::model::CheckKey;
use crate::sync::{ParentLink, PREFIX_PARENTS, VLAN_PARENTS};

/// Provisioning stages, in run order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum Stage {
    Organisation,
    Devices,
    Ipam,
    Circuits,
    Virtualisation,
    Contacts,
}

impl Stage {
    pub const ALL: [Self; 6] = [
        Self::Organisation,
        Self::Devices,
        Self::Ipam,
        Self::Circuits,
        Self::Virtualisation,
        Self::Contacts,
    ];

    /// Section heading used in validation output.
    pub fn title(self) -> &'static str {
        match self {
            Self::Organisation => "ORGANISATION",
            Self::Devices => "DEVICES",
            Self::Ipam => "IPAM",
            Self::Circuits => "CIRCUITS",
            Self::Virtualisation => "VIRTUALISATION",
            Self::Contacts => "CONTACTS",
        }
    }

    /// Record kinds of this stage, in sync order.
    pub fn kinds(self) -> &'static [RecordKind] {
        use RecordKind as K;
        match self {
            Self::Organisation => &[
                K::RackRole,
                K::Tenant,
                K::Site,
                K::ParentLocation,
                K::ChildLocation,
                K::Rack,
            ],
            Self::Devices => &[K::DeviceRole, K::Manufacturer, K::Platform, K::DeviceType],
            Self::Ipam => &[
                K::Rir,
                K::Aggregate,
                K::IpamRole,
                K::VlanGroup,
                K::Vrf,
                K::Vlan,
                K::Prefix,
            ],
            Self::Circuits => &[K::CircuitType, K::Provider, K::Circuit],
            Self::Virtualisation => &[K::ClusterType, K::ClusterGroup, K::Cluster],
            Self::Contacts => &[
                K::ContactRole,
                K::ContactGroup,
                K::Contact,
                K::ContactAssignment,
            ],
        }
    }

    /// Top-level input sections the stage cannot run without.
    pub fn required_sections(self) -> &'static [&'static str] {
        match self {
            Self::Organisation => &["tenant", "rack_role"],
            Self::Devices => &["device_role", "manufacturer"],
            Self::Ipam => &["rir", "role"],
            Self::Circuits => &["circuit_type", "provider"],
            Self::Virtualisation => &["cluster_group", "cluster_type"],
            Self::Contacts => &["contact_role", "contact_group", "contact_assign"],
        }
    }
}

/// How the engine synchronizes a record kind.
#[derive(Debug, Clone, Copy)]
pub enum Strategy {
    /// Check by key, bulk-create the rest.
    Flat,
    /// Resolve a parent reference first (first link whose field is set);
    /// prefixes additionally resolve their VLAN.
    Resolved(&'static [ParentLink]),
    /// Device type with component templates.
    Composite,
    /// Contact assignments.
    Assignment,
}

/// Every record type the engine provisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    RackRole,
    Tenant,
    Site,
    ParentLocation,
    ChildLocation,
    Rack,
    DeviceRole,
    Manufacturer,
    Platform,
    DeviceType,
    Rir,
    Aggregate,
    IpamRole,
    VlanGroup,
    Vrf,
    Vlan,
    Prefix,
    CircuitType,
    Provider,
    Circuit,
    ClusterType,
    ClusterGroup,
    Cluster,
    ContactRole,
    ContactGroup,
    Contact,
    ContactAssignment,
}

impl RecordKind {
    /// Report label.
    pub fn label(self) -> &'static str {
        match self {
            Self::RackRole => "Rack Role",
            Self::Tenant => "Tenant",
            Self::Site => "Site",
            Self::ParentLocation => "Location (parent)",
            Self::ChildLocation => "Location (child)",
            Self::Rack => "Rack",
            Self::DeviceRole => "Device-role",
            Self::Manufacturer => "Manufacturer",
            Self::Platform => "Platform",
            Self::DeviceType => "Device-type",
            Self::Rir => "RIRs",
            Self::Aggregate => "Aggregates",
            Self::IpamRole => "Prefix/VLAN Role",
            Self::VlanGroup => "VLAN Group",
            Self::Vrf => "VRF",
            Self::Vlan => "VLAN",
            Self::Prefix => "Prefix",
            Self::CircuitType => "Circuit Type",
            Self::Provider => "Provider",
            Self::Circuit => "Circuit",
            Self::ClusterType => "Cluster Type",
            Self::ClusterGroup => "Cluster Group",
            Self::Cluster => "Cluster",
            Self::ContactRole => "Contact Role",
            Self::ContactGroup => "Contact Group",
            Self::Contact => "Contacts",
            Self::ContactAssignment => "Contact Assignment",
        }
    }

    pub fn collection(self) -> Collection {
        match self {
            Self::RackRole => Collection::RACK_ROLES,
            Self::Tenant => Collection::TENANTS,
            Self::Site => Collection::SITES,
            Self::ParentLocation | Self::ChildLocation => Collection::LOCATIONS,
            Self::Rack => Collection::RACKS,
            Self::DeviceRole => Collection::DEVICE_ROLES,
            Self::Manufacturer => Collection::MANUFACTURERS,
            Self::Platform => Collection::PLATFORMS,
            Self::DeviceType => Collection::DEVICE_TYPES,
            Self::Rir => Collection::RIRS,
            Self::Aggregate => Collection::AGGREGATES,
            Self::IpamRole => Collection::ROLES,
            Self::VlanGroup => Collection::VLAN_GROUPS,
            Self::Vrf => Collection::VRFS,
            Self::Vlan => Collection::VLANS,
            Self::Prefix => Collection::PREFIXES,
            Self::CircuitType => Collection::CIRCUIT_TYPES,
            Self::Provider => Collection::PROVIDERS,
            Self::Circuit => Collection::CIRCUITS,
            Self::ClusterType => Collection::CLUSTER_TYPES,
            Self::ClusterGroup => Collection::CLUSTER_GROUPS,
            Self::Cluster => Collection::CLUSTERS,
            Self::ContactRole => Collection::CONTACT_ROLES,
            Self::ContactGroup => Collection::CONTACT_GROUPS,
            Self::Contact => Collection::CONTACTS,
            Self::ContactAssignment => Collection::CONTACT_ASSIGNMENTS,
        }
    }

    pub fn check_key(self) -> CheckKey {
        match self {
            Self::ParentLocation | Self::ChildLocation => CheckKey::Slug,
            Self::DeviceType => CheckKey::Field("model"),
            Self::Aggregate => CheckKey::Field("prefix"),
            Self::Circuit => CheckKey::Field("cid"),
            Self::Vrf => CheckKey::Scoped("name", &["rd"]),
            Self::Vlan | Self::Prefix | Self::ContactAssignment => CheckKey::Compound,
            _ => CheckKey::Field("name"),
        }
    }

    pub fn strategy(self) -> Strategy {
        match self {
            Self::Vlan => Strategy::Resolved(&VLAN_PARENTS),
            Self::Prefix => Strategy::Resolved(&PREFIX_PARENTS),
            Self::DeviceType => Strategy::Composite,
            Self::ContactAssignment => Strategy::Assignment,
            _ => Strategy::Flat,
        }
    }

    pub fn stage(self) -> Stage {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.kinds().contains(&self))
            .unwrap_or(Stage::Organisation)
    }

    /// Kinds this kind names in its body and so needs to exist first.
    pub fn references(self) -> &'static [RecordKind] {
        use RecordKind as K;
        match self {
            K::Site | K::Vrf => &[K::Tenant],
            K::ParentLocation => &[K::Site],
            K::ChildLocation => &[K::Site, K::ParentLocation],
            K::Rack => &[
                K::Site,
                K::ParentLocation,
                K::ChildLocation,
                K::Tenant,
                K::RackRole,
            ],
            K::Platform | K::DeviceType => &[K::Manufacturer],
            K::Aggregate => &[K::Rir],
            K::VlanGroup => &[K::Site],
            K::Vlan => &[K::VlanGroup, K::Site, K::IpamRole, K::Tenant],
            K::Prefix => &[K::Vrf, K::Vlan, K::IpamRole, K::Site, K::Tenant],
            K::Circuit => &[K::CircuitType, K::Provider, K::Tenant],
            K::Cluster => &[K::ClusterType, K::ClusterGroup, K::Site, K::Tenant],
            K::Contact => &[K::ContactGroup],
            K::ContactAssignment => &[
                K::ContactRole,
                K::Contact,
                K::Tenant,
                K::Site,
                K::ParentLocation,
                K::ChildLocation,
                K::Rack,
                K::Manufacturer,
                K::Provider,
                K::Circuit,
                K::ClusterGroup,
                K::Cluster,
            ],
            _ => &[],
        }
    }
}

/// The kinds one run synchronizes, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    kinds: Vec<RecordKind>,
}

impl Plan {
    /// Plan for the selected stages in dependency order. An empty selection
    /// means every stage.
    pub fn new(selection: impl IntoIterator<Item = Stage>) -> Self {
        let mut stages: Vec<Stage> = selection.into_iter().collect();
        if stages.is_empty() {
            stages = Stage::ALL.to_vec();
        }
        stages.sort();
        stages.dedup();
        Self {
            kinds: stages
                .iter()
                .flat_map(|stage| stage.kinds().iter().copied())
                .collect(),
        }
    }

    pub fn all() -> Self {
        Self::new([])
    }

    /// Plan with an explicit kind order.
    pub fn from_kinds(kinds: Vec<RecordKind>) -> Self {
        Self { kinds }
    }

    pub fn kinds(&self) -> &[RecordKind] {
        &self.kinds
    }

    /// Stages touched by this plan, in order of first appearance.
    pub fn stages(&self) -> Vec<Stage> {
        let mut stages: Vec<Stage> = Vec::new();
        for kind in &self.kinds {
            let stage = kind.stage();
            if !stages.contains(&stage) {
                stages.push(stage);
            }
        }
        stages
    }

    pub fn kinds_in(&self, stage: Stage) -> impl Iterator<Item = RecordKind> + '_ {
        self.kinds
            .iter()
            .copied()
            .filter(move |kind| kind.stage() == stage)
    }

    /// Every reference must point to a kind scheduled earlier in this plan,
    /// or to a kind of an earlier stage that is not part of this run (it is
    /// then assumed to be provisioned already).
    pub fn validate(&self) -> Result<(), CoreError> {
        for (position, kind) in self.kinds.iter().enumerate() {
            for referenced in kind.references() {
                match self.kinds.iter().position(|k| k == referenced) {
                    Some(at) if at < position => {}
                    Some(_) => {
                        return Err(CoreError::Plan(format!(
                            "'{}' references '{}', which is scheduled after it",
                            kind.label(),
                            referenced.label()
                        )));
                    }
                    None if referenced.stage() < kind.stage() => {
                        debug!(
                            kind = kind.label(),
                            referenced = referenced.label(),
                            "referenced kind not in plan, assuming it is provisioned"
                        );
                    }
                    None => {
                        return Err(CoreError::Plan(format!(
                            "'{}' references '{}', which is not scheduled before it",
                            kind.label(),
                            referenced.label()
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn full_plan_is_valid() {
        Plan::all().validate().unwrap_or_else(|e| panic!("{e}"));
    }

    #[test]
    fn every_stage_alone_is_valid() {
        for stage in Stage::ALL {
            Plan::new([stage])
                .validate()
                .unwrap_or_else(|e| panic!("{stage}: {e}"));
        }
    }

    #[test]
    fn selection_is_sorted_and_deduped() {
        let plan = Plan::new([Stage::Contacts, Stage::Organisation, Stage::Contacts]);
        assert_eq!(plan.stages(), vec![Stage::Organisation, Stage::Contacts]);
        assert_eq!(plan.kinds().first(), Some(&RecordKind::RackRole));
        assert_eq!(plan.kinds().last(), Some(&RecordKind::ContactAssignment));
    }

    #[test]
    fn ipam_order_puts_vrf_before_vlan_and_prefix() {
        let kinds: Vec<_> = Plan::new([Stage::Ipam]).kinds_in(Stage::Ipam).collect();
        assert_eq!(
            kinds,
            vec![
                RecordKind::Rir,
                RecordKind::Aggregate,
                RecordKind::IpamRole,
                RecordKind::VlanGroup,
                RecordKind::Vrf,
                RecordKind::Vlan,
                RecordKind::Prefix,
            ]
        );
    }

    #[test]
    fn forward_reference_is_rejected() {
        let plan = Plan::from_kinds(vec![RecordKind::Vlan, RecordKind::VlanGroup]);
        let err = plan.validate().unwrap_err();
        assert!(
            matches!(&err, CoreError::Plan(msg) if msg.contains("'VLAN' references 'VLAN Group'")),
            "{err}"
        );
    }

    #[test]
    fn same_stage_reference_missing_from_plan_is_rejected() {
        let plan = Plan::from_kinds(vec![RecordKind::Rack]);
        assert!(plan.validate().is_err());
    }

    #[test]
    fn stage_of_kind() {
        assert_eq!(RecordKind::Prefix.stage(), Stage::Ipam);
        assert_eq!(RecordKind::ContactAssignment.stage(), Stage::Contacts);
        assert_eq!("virtualisation".parse::<Stage>().ok(), Some(Stage::Virtualisation));
    }
}
