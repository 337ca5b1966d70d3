// NetBox collection paths, relative to `/api/`.

use std::borrow::Cow;
use std::fmt;

/// A NetBox collection such as `dcim/sites`.
///
/// The well-known collections are associated constants; anything else
/// (for example a contact-assignment target derived at runtime) goes
/// through [`Collection::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Collection(Cow<'static, str>);

impl Collection {
    // ── dcim ────────────────────────────────────────────────────────
    pub const SITES: Self = Self::from_static("dcim/sites");
    pub const LOCATIONS: Self = Self::from_static("dcim/locations");
    pub const RACKS: Self = Self::from_static("dcim/racks");
    pub const RACK_ROLES: Self = Self::from_static("dcim/rack-roles");
    pub const DEVICE_ROLES: Self = Self::from_static("dcim/device-roles");
    pub const MANUFACTURERS: Self = Self::from_static("dcim/manufacturers");
    pub const PLATFORMS: Self = Self::from_static("dcim/platforms");
    pub const DEVICE_TYPES: Self = Self::from_static("dcim/device-types");
    pub const INTERFACE_TEMPLATES: Self = Self::from_static("dcim/interface-templates");
    pub const POWER_PORT_TEMPLATES: Self = Self::from_static("dcim/power-port-templates");
    pub const CONSOLE_PORT_TEMPLATES: Self = Self::from_static("dcim/console-port-templates");
    pub const REAR_PORT_TEMPLATES: Self = Self::from_static("dcim/rear-port-templates");
    pub const FRONT_PORT_TEMPLATES: Self = Self::from_static("dcim/front-port-templates");

    // ── ipam ────────────────────────────────────────────────────────
    pub const RIRS: Self = Self::from_static("ipam/rirs");
    pub const AGGREGATES: Self = Self::from_static("ipam/aggregates");
    pub const ROLES: Self = Self::from_static("ipam/roles");
    pub const VLAN_GROUPS: Self = Self::from_static("ipam/vlan-groups");
    pub const VLANS: Self = Self::from_static("ipam/vlans");
    pub const VRFS: Self = Self::from_static("ipam/vrfs");
    pub const ROUTE_TARGETS: Self = Self::from_static("ipam/route-targets");
    pub const PREFIXES: Self = Self::from_static("ipam/prefixes");

    // ── circuits ────────────────────────────────────────────────────
    pub const CIRCUIT_TYPES: Self = Self::from_static("circuits/circuit-types");
    pub const PROVIDERS: Self = Self::from_static("circuits/providers");
    pub const CIRCUITS: Self = Self::from_static("circuits/circuits");

    // ── virtualization ──────────────────────────────────────────────
    pub const CLUSTER_TYPES: Self = Self::from_static("virtualization/cluster-types");
    pub const CLUSTER_GROUPS: Self = Self::from_static("virtualization/cluster-groups");
    pub const CLUSTERS: Self = Self::from_static("virtualization/clusters");

    // ── tenancy ─────────────────────────────────────────────────────
    pub const TENANTS: Self = Self::from_static("tenancy/tenants");
    pub const CONTACT_ROLES: Self = Self::from_static("tenancy/contact-roles");
    pub const CONTACT_GROUPS: Self = Self::from_static("tenancy/contact-groups");
    pub const CONTACTS: Self = Self::from_static("tenancy/contacts");
    pub const CONTACT_ASSIGNMENTS: Self = Self::from_static("tenancy/contact-assignments");

    // ── extras ──────────────────────────────────────────────────────
    pub const TAGS: Self = Self::from_static("extras/tags");

    pub const fn from_static(path: &'static str) -> Self {
        Self(Cow::Borrowed(path))
    }

    /// Build a collection from an `app/name` path computed at runtime.
    pub fn new(app: &str, name: &str) -> Self {
        Self(Cow::Owned(format!("{app}/{name}")))
    }

    /// Path relative to `/api/`, without trailing slash.
    pub fn path(&self) -> &str {
        &self.0
    }

    /// The application namespace (`dcim`, `ipam`, …).
    pub fn app(&self) -> &str {
        self.0.split_once('/').map_or(&self.0, |(app, _)| app)
    }

    /// The endpoint name within its application (`sites`, `vlan-groups`, …).
    pub fn name(&self) -> &str {
        self.0.split_once('/').map_or(&self.0, |(_, name)| name)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
