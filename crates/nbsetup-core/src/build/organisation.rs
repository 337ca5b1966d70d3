use serde_json::json;

use super::{ModelBuilder, StageModels, insert_opt, make_slug, name_ref, named};
use crate::document::{LocationInput, SiteInput, TenantInput};
use crate::error::CoreError;
use crate::model::{Candidate, object};
use crate::plan::RecordKind;
use crate::remote::Remote;
use crate::report::ReportSink;

const DEFAULT_TIME_ZONE: &str = "UTC";
const DEFAULT_RACK_HEIGHT: u16 = 42;
const DEFAULT_COLOR: &str = "ffffff";

impl<R: Remote, S: ReportSink> ModelBuilder<'_, R, S> {
    /// Tenants, their sites, locations (one level of nesting) and racks,
    /// plus rack roles.
    pub(super) async fn organisation(&mut self) -> Result<StageModels, CoreError> {
        let doc = self.doc;
        let mut tenants = Vec::new();
        let mut sites = Vec::new();
        let mut parents = Vec::new();
        let mut children = Vec::new();
        let mut racks = Vec::new();

        for tenant in doc.tenant.iter().flatten() {
            let mut fields = named(&tenant.name, tenant.slug.as_deref(), tenant.descr.as_deref());
            fields.insert("tags".into(), self.tags(tenant.tags.as_ref()).await?);
            tenants.push(Candidate::new(fields));

            for site in &tenant.site {
                sites.push(self.site(site, tenant).await?);
                for location in &site.location {
                    parents.push(self.location(location, site, None).await?);
                    racks.extend(self.racks(location, site, tenant).await?);
                    for child in &location.location {
                        children.push(self.location(child, site, Some(location)).await?);
                        racks.extend(self.racks(child, site, tenant).await?);
                    }
                }
            }
        }

        let mut rack_roles = Vec::new();
        for role in doc.rack_role.iter().flatten() {
            let mut fields = named(&role.name, role.slug.as_deref(), role.descr.as_deref());
            fields.insert(
                "color".into(),
                json!(role.color.as_deref().unwrap_or(DEFAULT_COLOR)),
            );
            fields.insert("tags".into(), self.tags(role.tags.as_ref()).await?);
            rack_roles.push(Candidate::new(fields));
        }

        let mut models = StageModels::default();
        models.flat(RecordKind::RackRole, rack_roles);
        models.flat(RecordKind::Tenant, tenants);
        models.flat(RecordKind::Site, sites);
        models.flat(RecordKind::ParentLocation, parents);
        models.flat(RecordKind::ChildLocation, children);
        models.flat(RecordKind::Rack, racks);
        Ok(models)
    }

    async fn site(&mut self, site: &SiteInput, tenant: &TenantInput) -> Result<Candidate, CoreError> {
        let mut fields = named(&site.name, site.slug.as_deref(), site.descr.as_deref());
        fields.insert("tenant".into(), name_ref(&tenant.name));
        fields.insert(
            "time_zone".into(),
            json!(site.time_zone.as_deref().unwrap_or(DEFAULT_TIME_ZONE)),
        );
        fields.insert(
            "physical_address".into(),
            json!(site.addr.as_deref().unwrap_or_default()),
        );
        insert_opt(&mut fields, "asn", site.asn.map(|asn| json!(asn)));
        fields.insert("tags".into(), self.tags(site.tags.as_ref()).await?);
        Ok(Candidate::new(fields))
    }

    async fn location(
        &mut self,
        location: &LocationInput,
        site: &SiteInput,
        parent: Option<&LocationInput>,
    ) -> Result<Candidate, CoreError> {
        let mut fields = named(&location.name, location.slug.as_deref(), location.descr.as_deref());
        fields.insert("site".into(), name_ref(&site.name));
        insert_opt(&mut fields, "parent", parent.map(|p| name_ref(&p.name)));
        fields.insert("tags".into(), self.tags(location.tags.as_ref()).await?);
        Ok(Candidate::new(fields))
    }

    async fn racks(
        &mut self,
        location: &LocationInput,
        site: &SiteInput,
        tenant: &TenantInput,
    ) -> Result<Vec<Candidate>, CoreError> {
        let location_slug = make_slug(location.slug.as_deref().unwrap_or(&location.name));
        let mut racks = Vec::with_capacity(location.rack.len());
        for rack in &location.rack {
            let mut fields = object(json!({
                "name": rack.name,
                "site": {"name": site.name},
                "location": {"slug": location_slug},
                "tenant": {"name": rack.tenant.as_deref().unwrap_or(&tenant.name)},
                "u_height": rack.height.unwrap_or(DEFAULT_RACK_HEIGHT),
            }));
            insert_opt(&mut fields, "role", rack.role.as_deref().map(name_ref));
            fields.insert("tags".into(), self.tags(rack.tags.as_ref()).await?);
            racks.push(Candidate::new(fields));
        }
        Ok(racks)
    }
}
