// IPAM: RIRs and aggregates, roles, and beneath each role the per-site VLAN
// groups, VLANs, VRFs and prefixes.
//
// Tenancy cascades downwards. A site's tenant is read from NetBox; a VLAN
// group's tenant defaults to it, a VLAN's to its group's (or site's) and a
// prefix's to its VRF's.

use serde_json::{Value, json};

use super::{ModelBuilder, StageModels, insert_opt, name_ref, named};
use crate::document::{IpamRoleInput, PrefixInput, VlanInput, VrfInput};
use crate::error::CoreError;
use crate::model::{Candidate, VlanRef, VlanScope, object};
use crate::plan::RecordKind;
use crate::remote::Remote;
use crate::report::ReportSink;
use crate::sync::collapse;

const DEFAULT_PREFIX_STATUS: &str = "active";

#[derive(Default)]
struct IpamModels {
    vlan_groups: Vec<Candidate>,
    vlans: Vec<Candidate>,
    vrfs: Vec<Candidate>,
    prefixes: Vec<Candidate>,
}

fn tenant_ref(tenant: Option<&str>) -> Option<Value> {
    tenant.map(name_ref)
}

impl<R: Remote, S: ReportSink> ModelBuilder<'_, R, S> {
    pub(super) async fn ipam(&mut self) -> Result<StageModels, CoreError> {
        let doc = self.doc;

        let mut rirs = Vec::new();
        let mut aggregates = Vec::new();
        for rir in doc.rir.iter().flatten() {
            let mut fields = named(&rir.name, rir.slug.as_deref(), rir.descr.as_deref());
            fields.insert("is_private".into(), json!(rir.is_private.unwrap_or(false)));
            fields.insert("tags".into(), self.tags(rir.tags.as_ref()).await?);
            rirs.push(Candidate::new(fields));

            for aggregate in &rir.aggregate {
                let mut fields = object(json!({
                    "rir": {"name": rir.name},
                    "prefix": aggregate.prefix,
                    "description": aggregate.descr.as_deref().unwrap_or_default(),
                }));
                fields.insert("tags".into(), self.tags(aggregate.tags.as_ref()).await?);
                aggregates.push(Candidate::new(fields));
            }
        }

        let mut roles = Vec::new();
        let mut nested = IpamModels::default();
        for role in doc.role.iter().flatten() {
            let mut fields = named(&role.name, role.slug.as_deref(), role.descr.as_deref());
            fields.insert("tags".into(), self.tags(role.tags.as_ref()).await?);
            roles.push(Candidate::new(fields));
            self.role_sites(role, &mut nested).await?;
        }

        let mut models = StageModels::default();
        models.flat(RecordKind::Rir, rirs);
        models.flat(RecordKind::Aggregate, aggregates);
        models.flat(RecordKind::IpamRole, roles);
        models.flat(RecordKind::VlanGroup, collapse(nested.vlan_groups));
        models.flat(RecordKind::Vrf, collapse(nested.vrfs));
        models.flat(RecordKind::Vlan, nested.vlans);
        models.flat(RecordKind::Prefix, nested.prefixes);
        Ok(models)
    }

    async fn role_sites(&mut self, role: &IpamRoleInput, out: &mut IpamModels) -> Result<(), CoreError> {
        for site in &role.site {
            let site_tenant = self.site_tenant(&site.name).await?;

            for group in &site.vlan_grp {
                let group_tenant = group.tenant.clone().or_else(|| site_tenant.clone());
                let mut fields = named(&group.name, group.slug.as_deref(), group.descr.as_deref());
                fields.insert("site".into(), name_ref(&site.name));
                fields.insert("tags".into(), self.tags(group.tags.as_ref()).await?);
                out.vlan_groups.push(Candidate::new(fields));

                let scope = VlanScope::Group(group.name.clone());
                for vlan in &group.vlan {
                    let candidate = self
                        .vlan(vlan, &role.name, &scope, group_tenant.as_deref())
                        .await?;
                    out.vlans.push(candidate);
                }
                for vrf in &group.vrf {
                    self.vrf(vrf, &role.name, &site.name, &scope, site_tenant.as_deref(), out)
                        .await?;
                }
            }

            let scope = VlanScope::Site(site.name.clone());
            for vlan in &site.vlan {
                let candidate = self
                    .vlan(vlan, &role.name, &scope, site_tenant.as_deref())
                    .await?;
                out.vlans.push(candidate);
            }
            for vrf in &site.vrf {
                self.vrf(vrf, &role.name, &site.name, &scope, site_tenant.as_deref(), out)
                    .await?;
            }
        }
        Ok(())
    }

    async fn vlan(
        &mut self,
        vlan: &VlanInput,
        role: &str,
        scope: &VlanScope,
        inherited_tenant: Option<&str>,
    ) -> Result<Candidate, CoreError> {
        let mut fields = object(json!({
            "vid": vlan.id,
            "name": vlan.name,
            "role": {"name": role},
            "description": vlan.descr.as_deref().unwrap_or_default(),
        }));
        let parent = match scope {
            VlanScope::Group(_) => "group",
            VlanScope::Site(_) => "site",
        };
        fields.insert(parent.into(), name_ref(scope.name()));
        insert_opt(
            &mut fields,
            "tenant",
            tenant_ref(vlan.tenant.as_deref().or(inherited_tenant)),
        );
        fields.insert("tags".into(), self.tags(vlan.tags.as_ref()).await?);
        Ok(Candidate::new(fields))
    }

    /// The VRF itself (collapsed later) and its prefixes.
    async fn vrf(
        &mut self,
        vrf: &VrfInput,
        role: &str,
        site: &str,
        scope: &VlanScope,
        site_tenant: Option<&str>,
        out: &mut IpamModels,
    ) -> Result<(), CoreError> {
        let tenant = vrf.tenant.as_deref().or(site_tenant);

        let mut fields = object(json!({
            "name": vrf.name,
            "description": vrf.descr.as_deref().unwrap_or_default(),
            "enforce_unique": vrf.unique.unwrap_or(true),
        }));
        insert_opt(&mut fields, "rd", vrf.rd.as_deref().map(|rd| json!(rd)));
        insert_opt(&mut fields, "tenant", tenant_ref(tenant));
        fields.insert("tags".into(), self.tags(vrf.tags.as_ref()).await?);
        for (field, targets) in [("import_targets", &vrf.import_rt), ("export_targets", &vrf.export_rt)] {
            let ids = match targets {
                Some(targets) => self.engine.route_target_ids(targets, tenant).await?,
                None => Vec::new(),
            };
            fields.insert(field.into(), json!(ids));
        }
        out.vrfs.push(Candidate::new(fields));

        let mut vrf_ref = object(json!({"name": vrf.name}));
        insert_opt(&mut vrf_ref, "rd", vrf.rd.as_deref().map(|rd| json!(rd)));
        let vrf_ref = Value::Object(vrf_ref);
        for prefix in &vrf.prefix {
            let candidate = self
                .prefix(prefix, role, site, &vrf_ref, scope, tenant)
                .await?;
            out.prefixes.push(candidate);
        }
        Ok(())
    }

    async fn prefix(
        &mut self,
        prefix: &PrefixInput,
        role: &str,
        site: &str,
        vrf_ref: &Value,
        scope: &VlanScope,
        vrf_tenant: Option<&str>,
    ) -> Result<Candidate, CoreError> {
        let mut fields = object(json!({
            "prefix": prefix.pfx,
            "role": {"name": role},
            "is_pool": prefix.pool.unwrap_or(false),
            "vrf": vrf_ref,
            "site": {"name": site},
            "description": prefix.descr.as_deref().unwrap_or_default(),
            "status": prefix.status.as_deref().unwrap_or(DEFAULT_PREFIX_STATUS),
        }));
        insert_opt(
            &mut fields,
            "tenant",
            tenant_ref(prefix.tenant.as_deref().or(vrf_tenant)),
        );
        fields.insert("tags".into(), self.tags(prefix.tags.as_ref()).await?);
        let vlan = prefix.vl.map(|vid| VlanRef {
            vid,
            scope: scope.clone(),
        });
        Ok(Candidate::new(fields).with_vlan(vlan))
    }
}
