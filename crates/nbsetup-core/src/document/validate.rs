// Semantic checks on the input document. Nothing here talks to NetBox:
// every rule is answered from the document alone.

use std::collections::HashSet;
use std::hash::Hash;

use indexmap::IndexMap;
use ipnetwork::IpNetwork;

use super::{InputDocument, VlanInput, VrfInput};
use crate::model::{ASSIGNABLE_KINDS, Priority};
use crate::plan::Stage;

/// Validation findings grouped by stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Findings(IndexMap<Stage, Vec<String>>);

impl Findings {
    fn push(&mut self, stage: Stage, message: String) {
        self.0.entry(stage).or_default().push(message);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of findings.
    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stage, &[String])> {
        self.0.iter().map(|(stage, msgs)| (*stage, msgs.as_slice()))
    }

    pub fn for_stage(&self, stage: Stage) -> &[String] {
        self.0.get(&stage).map_or(&[], Vec::as_slice)
    }
}

/// Every value that occurs more than once, in first-seen order.
fn duplicates<'a, T: Eq + Hash + ?Sized + 'a>(items: impl IntoIterator<Item = &'a T>) -> Vec<&'a T> {
    let mut seen = HashSet::new();
    let mut dups = Vec::new();
    for item in items {
        if !seen.insert(item) && !dups.contains(&item) {
            dups.push(item);
        }
    }
    dups
}

fn check_unique<'a>(
    findings: &mut Findings,
    stage: Stage,
    what: &str,
    names: impl IntoIterator<Item = &'a str>,
) {
    let dups = duplicates(names);
    if !dups.is_empty() {
        findings.push(
            stage,
            format!("duplicate {what} '{}', all should be unique", dups.join(", ")),
        );
    }
}

/// A network address with netmask (host bits clear).
fn is_network(cidr: &str) -> bool {
    cidr.contains('/')
        && cidr
            .parse::<IpNetwork>()
            .is_ok_and(|net| net.network() == net.ip())
}

pub fn validate(doc: &InputDocument) -> Findings {
    let mut findings = Findings::default();
    organisation(doc, &mut findings);
    devices(doc, &mut findings);
    ipam(doc, &mut findings);
    circuits(doc, &mut findings);
    virtualisation(doc, &mut findings);
    contacts(doc, &mut findings);
    findings
}

fn organisation(doc: &InputDocument, findings: &mut Findings) {
    let stage = Stage::Organisation;
    let tenants = doc.tenant.as_deref().unwrap_or_default();
    let rack_roles = doc.rack_role.as_deref().unwrap_or_default();

    check_unique(findings, stage, "tenants", tenants.iter().map(|t| t.name.as_str()));
    check_unique(
        findings,
        stage,
        "sites",
        tenants.iter().flat_map(|t| t.site.iter().map(|s| s.name.as_str())),
    );
    check_unique(findings, stage, "rack roles", rack_roles.iter().map(|r| r.name.as_str()));

    let role_names: HashSet<&str> = rack_roles.iter().map(|r| r.name.as_str()).collect();
    for site in tenants.iter().flat_map(|t| &t.site) {
        let locations = site
            .location
            .iter()
            .chain(site.location.iter().flat_map(|l| &l.location));
        for location in locations {
            for rack in &location.rack {
                if let Some(role) = &rack.role {
                    if !role_names.contains(role.as_str()) {
                        findings.push(
                            stage,
                            format!(
                                "rack '{}' in site '{}' uses rack role '{role}' which is not declared",
                                rack.name, site.name
                            ),
                        );
                    }
                }
            }
        }
    }
}

fn devices(doc: &InputDocument, findings: &mut Findings) {
    let stage = Stage::Devices;
    let manufacturers = doc.manufacturer.as_deref().unwrap_or_default();

    check_unique(
        findings,
        stage,
        "device roles",
        doc.device_role.iter().flatten().map(|r| r.name.as_str()),
    );
    check_unique(findings, stage, "manufacturers", manufacturers.iter().map(|m| m.name.as_str()));
    check_unique(
        findings,
        stage,
        "platforms",
        manufacturers.iter().flat_map(|m| m.platform.iter().map(|p| p.name.as_str())),
    );
}

fn ipam(doc: &InputDocument, findings: &mut Findings) {
    let stage = Stage::Ipam;
    let rirs = doc.rir.as_deref().unwrap_or_default();
    let roles = doc.role.as_deref().unwrap_or_default();

    check_unique(findings, stage, "RIRs", rirs.iter().map(|r| r.name.as_str()));
    for aggr in rirs.iter().flat_map(|r| &r.aggregate) {
        if !is_network(&aggr.prefix) {
            findings.push(
                stage,
                format!("aggregate '{}' is not a valid network/netmask", aggr.prefix),
            );
        }
    }
    check_unique(findings, stage, "prefix/VLAN roles", roles.iter().map(|r| r.name.as_str()));

    let declared_sites: Option<HashSet<&str>> = doc.tenant.as_ref().map(|tenants| {
        tenants
            .iter()
            .flat_map(|t| t.site.iter().map(|s| s.name.as_str()))
            .collect()
    });

    for role in roles {
        for site in &role.site {
            if let Some(declared) = &declared_sites {
                if !declared.contains(site.name.as_str()) {
                    findings.push(
                        stage,
                        format!(
                            "site '{}' of role '{}' is not declared under any tenant",
                            site.name, role.name
                        ),
                    );
                }
            }

            check_unique(
                findings,
                stage,
                &format!("VLAN groups in site '{}'", site.name),
                site.vlan_grp.iter().map(|g| g.name.as_str()),
            );
            for group in &site.vlan_grp {
                let scope = format!("VLAN group '{}'", group.name);
                vlans(findings, &scope, &group.vlan);
                vrfs(findings, &scope, &group.vrf, &group.vlan);
            }
            let scope = format!("site '{}'", site.name);
            vlans(findings, &scope, &site.vlan);
            vrfs(findings, &scope, &site.vrf, &site.vlan);
        }
    }
}

fn vlans(findings: &mut Findings, scope: &str, vlans: &[VlanInput]) {
    let stage = Stage::Ipam;
    for vlan in vlans {
        if !(1..=4094).contains(&vlan.id) {
            findings.push(
                stage,
                format!(
                    "VLAN '{}' in {scope} has ID {} outside 1-4094",
                    vlan.name, vlan.id
                ),
            );
        }
    }
    check_unique(
        findings,
        stage,
        &format!("VLAN names in {scope}"),
        vlans.iter().map(|v| v.name.as_str()),
    );
    let ids: Vec<String> = vlans.iter().map(|v| v.id.to_string()).collect();
    check_unique(
        findings,
        stage,
        &format!("VLAN IDs in {scope}"),
        ids.iter().map(String::as_str),
    );
}

fn vrfs(findings: &mut Findings, scope: &str, vrfs: &[VrfInput], vlans: &[VlanInput]) {
    let stage = Stage::Ipam;
    let vids: HashSet<u16> = vlans.iter().map(|v| v.id).collect();
    for vrf in vrfs {
        for pfx in &vrf.prefix {
            if !is_network(&pfx.pfx) {
                findings.push(
                    stage,
                    format!(
                        "prefix '{}' in VRF '{}' is not a valid network/netmask",
                        pfx.pfx, vrf.name
                    ),
                );
            }
            if let Some(vl) = pfx.vl {
                if !vids.contains(&vl) {
                    findings.push(
                        stage,
                        format!(
                            "prefix '{}' uses VLAN {vl} which is not a VLAN of {scope}",
                            pfx.pfx
                        ),
                    );
                }
            }
        }
        check_unique(
            findings,
            stage,
            &format!("prefixes in VRF '{}'", vrf.name),
            vrf.prefix.iter().map(|p| p.pfx.as_str()),
        );
    }
}

fn circuits(doc: &InputDocument, findings: &mut Findings) {
    let stage = Stage::Circuits;
    let types = doc.circuit_type.as_deref().unwrap_or_default();
    let providers = doc.provider.as_deref().unwrap_or_default();

    check_unique(findings, stage, "circuit types", types.iter().map(|t| t.name.as_str()));
    check_unique(findings, stage, "providers", providers.iter().map(|p| p.name.as_str()));

    let type_names: HashSet<&str> = types.iter().map(|t| t.name.as_str()).collect();
    for provider in providers {
        check_unique(
            findings,
            stage,
            &format!("circuit IDs of provider '{}'", provider.name),
            provider.circuit.iter().map(|c| c.cid.as_str()),
        );
        for circuit in &provider.circuit {
            if !type_names.contains(circuit.circuit_type.as_str()) {
                findings.push(
                    stage,
                    format!(
                        "circuit '{}' uses circuit type '{}' which is not declared",
                        circuit.cid, circuit.circuit_type
                    ),
                );
            }
        }
    }
}

fn virtualisation(doc: &InputDocument, findings: &mut Findings) {
    let stage = Stage::Virtualisation;
    let groups = doc.cluster_group.as_deref().unwrap_or_default();
    let types = doc.cluster_type.as_deref().unwrap_or_default();

    check_unique(findings, stage, "cluster groups", groups.iter().map(|g| g.name.as_str()));
    check_unique(findings, stage, "cluster types", types.iter().map(|t| t.name.as_str()));
    check_unique(
        findings,
        stage,
        "clusters",
        types.iter().flat_map(|t| t.cluster.iter().map(|c| c.name.as_str())),
    );

    let group_names: HashSet<&str> = groups.iter().map(|g| g.name.as_str()).collect();
    for cluster_type in types {
        for cluster in &cluster_type.cluster {
            if let Some(group) = cluster.group.as_ref().or(cluster_type.group.as_ref()) {
                if !group_names.contains(group.as_str()) {
                    findings.push(
                        stage,
                        format!(
                            "cluster '{}' uses cluster group '{group}' which is not declared",
                            cluster.name
                        ),
                    );
                }
            }
        }
    }
}

fn contacts(doc: &InputDocument, findings: &mut Findings) {
    let stage = Stage::Contacts;
    let roles = doc.contact_role.as_deref().unwrap_or_default();
    let groups = doc.contact_group.as_deref().unwrap_or_default();

    check_unique(findings, stage, "contact roles", roles.iter().map(|r| r.name.as_str()));
    check_unique(findings, stage, "contact groups", groups.iter().map(|g| g.name.as_str()));
    check_unique(
        findings,
        stage,
        "contacts",
        groups.iter().flat_map(|g| g.contact.iter().map(|c| c.name.as_str())),
    );

    let role_names: HashSet<&str> = roles.iter().map(|r| r.name.as_str()).collect();
    let contact_names: HashSet<&str> = groups
        .iter()
        .flat_map(|g| g.contact.iter().map(|c| c.name.as_str()))
        .collect();

    for asgn in doc.contact_assign.iter().flatten() {
        if !role_names.contains(asgn.role.as_str()) {
            findings.push(
                stage,
                format!("contact role '{}' is not declared", asgn.role),
            );
        }
        for contact in &asgn.contact {
            if !contact_names.contains(contact.as_str()) {
                findings.push(stage, format!("contact '{contact}' is not declared"));
            }
        }
        if let Some(priority) = &asgn.priority {
            if priority.parse::<Priority>().is_err() {
                findings.push(
                    stage,
                    format!(
                        "priority '{priority}' is not valid, it must be one of primary, secondary, tertiary, inactive"
                    ),
                );
            }
        }
        for kind in asgn.assign_to.names() {
            if !ASSIGNABLE_KINDS.contains(&kind) {
                findings.push(
                    stage,
                    format!(
                        "'{kind}' cannot be assigned a contact, it must be one of {}",
                        ASSIGNABLE_KINDS.join(", ")
                    ),
                );
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn doc(yaml: &str) -> InputDocument {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn clean_document_has_no_findings() {
        let findings = validate(&doc(
            r"
tenant:
  - name: Acme
    site:
      - name: DC1
        location:
          - name: Hall 1
            rack: [{name: R1, role: Network}]
rack_role: [{name: Network}]
rir: [{name: RFC1918, aggregate: [{prefix: 10.0.0.0/8}]}]
role:
  - name: prod
    site:
      - name: DC1
        vlan_grp:
          - name: DC1-VL
            vlan: [{id: 10, name: data}]
            vrf:
              - name: blue
                prefix: [{pfx: 10.10.10.0/24, vl: 10}]
",
        ));
        assert!(findings.is_empty(), "{findings:?}");
    }

    #[test]
    fn duplicate_names_are_reported_once() {
        let findings = validate(&doc(
            "tenant: [{name: Acme}, {name: Acme}, {name: Acme}]\nrack_role: []",
        ));
        assert_eq!(
            findings.for_stage(Stage::Organisation),
            ["duplicate tenants 'Acme', all should be unique".to_owned()]
        );
    }

    #[test]
    fn vlan_rules() {
        let findings = validate(&doc(
            r"
role:
  - name: prod
    site:
      - name: DC1
        vlan_grp:
          - name: G1
            vlan: [{id: 10, name: data}, {id: 10, name: voice}, {id: 5000, name: big}]
            vrf:
              - name: blue
                prefix: [{pfx: 10.1.1.1/24, vl: 20}]
",
        ));
        let ipam = findings.for_stage(Stage::Ipam);
        assert_eq!(ipam.len(), 4, "{ipam:?}");
        assert!(ipam.iter().any(|m| m.contains("ID 5000 outside 1-4094")));
        assert!(ipam.iter().any(|m| m.contains("duplicate VLAN IDs in VLAN group 'G1' '10'")));
        assert!(ipam.iter().any(|m| m.contains("'10.1.1.1/24' in VRF 'blue' is not a valid")));
        assert!(ipam.iter().any(|m| m.contains("uses VLAN 20")));
    }

    #[test]
    fn role_site_must_exist_under_a_tenant() {
        let findings = validate(&doc(
            "tenant: [{name: Acme, site: [{name: DC1}]}]\nrole: [{name: prod, site: [{name: DC2}]}]",
        ));
        assert_eq!(
            findings.for_stage(Stage::Ipam),
            ["site 'DC2' of role 'prod' is not declared under any tenant".to_owned()]
        );
    }

    #[test]
    fn references_across_sections() {
        let findings = validate(&doc(
            r"
circuit_type: [{name: Fibre}]
provider: [{name: ISP, circuit: [{cid: 1, type: Copper}]}]
cluster_group: [{name: EU}]
cluster_type: [{name: ESXi, group: US, cluster: [{name: C1}]}]
",
        ));
        assert_eq!(findings.len(), 2);
        assert!(findings.for_stage(Stage::Circuits)[0].contains("circuit type 'Copper'"));
        assert!(findings.for_stage(Stage::Virtualisation)[0].contains("cluster group 'US'"));
    }

    #[test]
    fn assignment_rules() {
        let findings = validate(&doc(
            r"
contact_role: [{name: NOC}]
contact_group: [{name: Ops, contact: [{name: Bob}]}]
contact_assign:
  - contact: [Bob, Alice]
    role: Billing
    priority: urgent
    assign_to: {site: DC1, device: sw1}
",
        ));
        let msgs = findings.for_stage(Stage::Contacts);
        assert_eq!(msgs.len(), 4, "{msgs:?}");
        assert!(msgs.iter().any(|m| m.contains("contact role 'Billing'")));
        assert!(msgs.iter().any(|m| m.contains("contact 'Alice'")));
        assert!(msgs.iter().any(|m| m.contains("priority 'urgent'")));
        assert!(msgs.iter().any(|m| m.starts_with("'device' cannot be assigned")));
    }
}
