// Device types with their component templates. The parent is created
// first; if any component group is rejected the parent is deleted again
// (NetBox removes already-created templates with it).

use nbsetup_api::{Collection, FieldErrors, Filter, ValidationErrors};
use serde_json::Value;
use tracing::{debug, warn};

use super::SyncEngine;
use super::check::{exists, find_id};
use crate::error::CoreError;
use crate::model::{ComponentKind, DeviceTypeCandidate};
use crate::plan::RecordKind;
use crate::remote::Remote;
use crate::report::{ReportLine, ReportSink};

/// Why a component group could not be created.
enum ComponentFailure {
    Rejected(ValidationErrors),
    Other(String),
}

impl ComponentFailure {
    fn describe(&self) -> String {
        match self {
            Self::Rejected(errors) => errors.merged(),
            Self::Other(message) => message.clone(),
        }
    }
}

impl<R: Remote, S: ReportSink> SyncEngine<R, S> {
    pub(crate) async fn sync_device_types(
        &mut self,
        device_types: Vec<DeviceTypeCandidate>,
    ) -> Result<(), CoreError> {
        let kind = RecordKind::DeviceType;
        let key = kind.check_key();
        let collection = kind.collection();

        let mut existing = Vec::new();
        let mut created = Vec::new();
        for device_type in device_types {
            let present = match key.filter_for(&device_type.parent) {
                Some(filter) => exists(&self.remote, &collection, &filter).await?,
                None => false,
            };
            if present {
                existing.push(device_type.model());
            } else if let Some(model) = self.create_device_type(&device_type).await? {
                created.push(model);
            }
        }

        if !existing.is_empty() {
            self.emit(ReportLine::Exists {
                label: kind.label().to_owned(),
                names: existing,
            });
        }
        if !created.is_empty() {
            self.emit(ReportLine::Created {
                label: kind.label().to_owned(),
                names: created,
            });
        }
        Ok(())
    }

    /// Create one device type and all of its components, or nothing.
    /// Returns the model on success; failures are reported here.
    pub(crate) async fn create_device_type(
        &mut self,
        device_type: &DeviceTypeCandidate,
    ) -> Result<Option<String>, CoreError> {
        let label = RecordKind::DeviceType.label();
        let model = device_type.model();

        let parent_id = match self
            .remote
            .bulk_create(&Collection::DEVICE_TYPES, &[device_type.parent.body()])
            .await
        {
            Ok(records) => match records.first() {
                Some(record) => record.id,
                None => {
                    return Err(CoreError::Internal(format!(
                        "creating device type '{model}' returned no record"
                    )));
                }
            },
            Err(e) => {
                self.report_failure(label, e)?;
                return Ok(None);
            }
        };
        debug!(model, id = parent_id, "device type created");

        for component in ComponentKind::ORDER {
            let templates = device_type.components(component);
            if templates.is_empty() {
                continue;
            }
            if let Some(failure) = self.create_components(component, templates, parent_id).await? {
                self.emit(ReportLine::Failed {
                    label: label.to_owned(),
                    field: None,
                    message: format!(
                        "Failed to create '{model}' because of errors with '{component}' component - {}",
                        failure.describe()
                    ),
                });
                warn!(model, %component, "removing partially created device type");
                if let Err(e) = self.remote.delete(&Collection::DEVICE_TYPES, parent_id).await {
                    if !e.is_recoverable() {
                        return Err(e.into());
                    }
                    warn!(model, error = %e, "device type could not be removed");
                }
                return Ok(None);
            }
        }
        Ok(Some(model))
    }

    /// One bulk create for a component group under `parent_id`.
    async fn create_components(
        &mut self,
        component: ComponentKind,
        templates: &[crate::model::Fields],
        parent_id: u64,
    ) -> Result<Option<ComponentFailure>, CoreError> {
        let mut bodies = Vec::with_capacity(templates.len());
        let mut unpaired = Vec::new();
        for template in templates {
            let mut body = template.clone();
            body.insert("device_type".into(), parent_id.into());
            if component == ComponentKind::FrontPort {
                let name = body.get("name").cloned().unwrap_or(Value::Null);
                let filter = Filter::by("name", name.clone()).and("devicetype_id", parent_id);
                match find_id(&self.remote, &Collection::REAR_PORT_TEMPLATES, &filter).await? {
                    Some(rear) => {
                        body.insert("rear_port".into(), rear.into());
                    }
                    None => unpaired.push(FieldErrors::single(
                        "rear_port",
                        format!(
                            "no rear port template named '{}'",
                            crate::model::value_label(&name)
                        ),
                    )),
                }
            }
            bodies.push(Value::Object(body));
        }
        if !unpaired.is_empty() {
            return Ok(Some(ComponentFailure::Rejected(ValidationErrors::from_entries(
                unpaired,
            ))));
        }

        match self.remote.bulk_create(&component.collection(), &bodies).await {
            Ok(_) => Ok(None),
            Err(e) => match e.validation_errors() {
                Some(errors) => Ok(Some(ComponentFailure::Rejected(errors.clone()))),
                None if e.is_recoverable() => Ok(Some(ComponentFailure::Other(e.to_string()))),
                None => Err(e.into()),
            },
        }
    }
}
