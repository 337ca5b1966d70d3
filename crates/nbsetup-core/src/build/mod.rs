// ── Model builder ──
//
// Turns the input document into candidate lists, one stage at a time.
// Builders fill defaults, derive slugs and write named references as
// nested `{"name": …}` maps. They talk to NetBox for two things only: tag
// and route-target ids (through the engine's ledger) and the tenant of a
// site.

mod circuits;
mod contacts;
mod devices;
mod ipam;
mod organisation;
mod virtualisation;

use std::collections::HashMap;
use std::path::Path;

use nbsetup_api::{Collection, Filter};
use serde_json::{Value, json};

use crate::document::{InputDocument, NamedAttrs};
use crate::error::CoreError;
use crate::model::{AssignmentCandidate, Candidate, DeviceTypeCandidate, Fields, object};
use crate::plan::{RecordKind, Stage};
use crate::remote::Remote;
use crate::report::ReportSink;
use crate::sync::{SyncEngine, find_record};

/// Slug from a name: spaces become `_`, everything lowercase.
pub fn make_slug(name: &str) -> String {
    name.replace(' ', "_").to_lowercase()
}

/// Candidates for one record kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Batch {
    Flat(Vec<Candidate>),
    DeviceTypes(Vec<DeviceTypeCandidate>),
    Assignments(Vec<AssignmentCandidate>),
}

impl Default for Batch {
    fn default() -> Self {
        Self::Flat(Vec::new())
    }
}

impl Batch {
    pub fn len(&self) -> usize {
        match self {
            Self::Flat(items) => items.len(),
            Self::DeviceTypes(items) => items.len(),
            Self::Assignments(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn shape(&self) -> &'static str {
        match self {
            Self::Flat(_) => "flat",
            Self::DeviceTypes(_) => "device-type",
            Self::Assignments(_) => "assignment",
        }
    }
}

/// Everything one stage will synchronize, by kind.
#[derive(Debug, Default)]
pub struct StageModels(HashMap<RecordKind, Batch>);

impl StageModels {
    pub fn insert(&mut self, kind: RecordKind, batch: Batch) {
        self.0.insert(kind, batch);
    }

    fn flat(&mut self, kind: RecordKind, candidates: Vec<Candidate>) {
        self.insert(kind, Batch::Flat(candidates));
    }

    /// Remove and return the batch for `kind` (empty if none was built).
    pub fn take(&mut self, kind: RecordKind) -> Batch {
        self.0.remove(&kind).unwrap_or_default()
    }

    pub fn get(&self, kind: RecordKind) -> Option<&Batch> {
        self.0.get(&kind)
    }
}

/// `{"name": name}`.
fn name_ref(name: &str) -> Value {
    json!({ "name": name })
}

/// Fields shared by most named records: name, slug (given or derived) and
/// description.
fn named(name: &str, slug: Option<&str>, descr: Option<&str>) -> Fields {
    object(json!({
        "name": name,
        "slug": make_slug(slug.unwrap_or(name)),
        "description": descr.unwrap_or_default(),
    }))
}

/// Insert `field` only when there is a value.
fn insert_opt(fields: &mut Fields, field: &str, value: Option<Value>) {
    if let Some(value) = value {
        fields.insert(field.to_owned(), value);
    }
}

pub struct ModelBuilder<'a, R, S> {
    engine: &'a mut SyncEngine<R, S>,
    doc: &'a InputDocument,
    template_dir: &'a Path,
    site_tenants: HashMap<String, Option<String>>,
}

impl<'a, R: Remote, S: ReportSink> ModelBuilder<'a, R, S> {
    pub fn new(engine: &'a mut SyncEngine<R, S>, doc: &'a InputDocument, template_dir: &'a Path) -> Self {
        Self {
            engine,
            doc,
            template_dir,
            site_tenants: HashMap::new(),
        }
    }

    pub async fn build(mut self, stage: Stage) -> Result<StageModels, CoreError> {
        match stage {
            Stage::Organisation => self.organisation().await,
            Stage::Devices => self.devices().await,
            Stage::Ipam => self.ipam().await,
            Stage::Circuits => self.circuits().await,
            Stage::Virtualisation => self.virtualisation().await,
            Stage::Contacts => self.contacts().await,
        }
    }

    /// Tag ids as a JSON list; no tags gives an empty list.
    async fn tags(&mut self, tags: Option<&NamedAttrs>) -> Result<Value, CoreError> {
        match tags {
            Some(tags) => Ok(json!(self.engine.tag_ids(tags).await?)),
            None => Ok(json!([])),
        }
    }

    /// Tenant name of an existing site. Unknown sites and sites without a
    /// tenant give `None`.
    async fn site_tenant(&mut self, site: &str) -> Result<Option<String>, CoreError> {
        if let Some(tenant) = self.site_tenants.get(site) {
            return Ok(tenant.clone());
        }
        let tenant = find_record(self.engine.remote(), &Collection::SITES, &Filter::by("name", site))
            .await?
            .and_then(|record| record.nested_name("tenant").map(str::to_owned));
        self.site_tenants.insert(site.to_owned(), tenant.clone());
        Ok(tenant)
    }
}
