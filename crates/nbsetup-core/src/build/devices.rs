use serde_json::json;

use super::{Batch, ModelBuilder, StageModels, insert_opt, make_slug, name_ref, named};
use crate::document::{DeviceTypeTemplate, load_template};
use crate::error::CoreError;
use crate::model::{Candidate, DeviceTypeCandidate, Fields, object};
use crate::plan::RecordKind;
use crate::remote::Remote;
use crate::report::ReportSink;

const DEFAULT_COLOR: &str = "ffffff";

impl<R: Remote, S: ReportSink> ModelBuilder<'_, R, S> {
    /// Device roles, manufacturers with their platforms, and device types
    /// read from template files.
    pub(super) async fn devices(&mut self) -> Result<StageModels, CoreError> {
        let doc = self.doc;

        let mut roles = Vec::new();
        for role in doc.device_role.iter().flatten() {
            let mut fields = named(&role.name, role.slug.as_deref(), role.descr.as_deref());
            fields.insert(
                "color".into(),
                json!(role.color.as_deref().unwrap_or(DEFAULT_COLOR)),
            );
            fields.insert("vm_role".into(), json!(role.vm_role.unwrap_or(true)));
            fields.insert("tags".into(), self.tags(role.tags.as_ref()).await?);
            roles.push(Candidate::new(fields));
        }

        let mut manufacturers = Vec::new();
        let mut platforms = Vec::new();
        let mut device_types = Vec::new();
        for manufacturer in doc.manufacturer.iter().flatten() {
            let mut fields = named(
                &manufacturer.name,
                manufacturer.slug.as_deref(),
                manufacturer.descr.as_deref(),
            );
            fields.insert("tags".into(), self.tags(manufacturer.tags.as_ref()).await?);
            manufacturers.push(Candidate::new(fields));

            for platform in &manufacturer.platform {
                let mut fields = named(&platform.name, platform.slug.as_deref(), platform.descr.as_deref());
                fields.insert("manufacturer".into(), name_ref(&manufacturer.name));
                let driver = platform
                    .driver
                    .clone()
                    .unwrap_or_else(|| make_slug(&platform.name));
                fields.insert("napalm_driver".into(), json!(driver));
                fields.insert("tags".into(), self.tags(platform.tags.as_ref()).await?);
                platforms.push(Candidate::new(fields));
            }

            for file in &manufacturer.device_type {
                let template = load_template(self.template_dir, file)?;
                device_types.push(device_type(&manufacturer.name, &template));
            }
        }

        let mut models = StageModels::default();
        models.flat(RecordKind::DeviceRole, roles);
        models.flat(RecordKind::Manufacturer, manufacturers);
        models.flat(RecordKind::Platform, platforms);
        models.insert(RecordKind::DeviceType, Batch::DeviceTypes(device_types));
        Ok(models)
    }
}

fn port(name: &str, kind: &str) -> Fields {
    object(json!({"name": name, "type": kind}))
}

/// Device type body and component templates. Every number of a front-port
/// range yields a rear port and a front port of the same name.
fn device_type(manufacturer: &str, template: &DeviceTypeTemplate) -> DeviceTypeCandidate {
    let mut parent = object(json!({
        "manufacturer": {"name": manufacturer},
        "model": template.model,
        "slug": template.slug,
        "u_height": template.u_height.unwrap_or(1.0),
        "is_full_depth": template.is_full_depth.unwrap_or(true),
    }));
    insert_opt(&mut parent, "part_number", template.part_number.as_deref().map(|p| json!(p)));

    let interfaces = template
        .interfaces
        .iter()
        .map(|intf| {
            let mut fields = port(&intf.name, &intf.kind);
            fields.insert("mgmt_only".into(), json!(intf.mgmt_only.unwrap_or(false)));
            insert_opt(&mut fields, "description", intf.descr.as_deref().map(|d| json!(d)));
            fields
        })
        .collect();

    let mut rear_ports = Vec::new();
    let mut front_ports = Vec::new();
    for range in &template.front_port {
        for number in range.start_port..=range.end_port {
            let name = number.to_string();
            rear_ports.push(port(&name, &range.kind));
            front_ports.push(port(&name, &range.kind));
        }
    }

    DeviceTypeCandidate {
        parent: Candidate::new(parent),
        interfaces,
        power_ports: template.power_ports.iter().map(|p| port(&p.name, &p.kind)).collect(),
        console_ports: template.console_ports.iter().map(|p| port(&p.name, &p.kind)).collect(),
        rear_ports,
        front_ports,
    }
}
