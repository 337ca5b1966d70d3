// Get-or-create for resources shared across the whole input: tags and
// route targets. Each name is looked up (and if need be created) once per
// run; later requests are answered from the ledger.

use std::collections::{HashMap, HashSet};

use indexmap::IndexSet;
use nbsetup_api::{Collection, Filter};
use serde_json::{Value, json};
use tracing::debug;

use super::SyncEngine;
use super::check::{Lookup, lookup_one};
use crate::build::make_slug;
use crate::document::NamedAttrs;
use crate::error::CoreError;
use crate::model::{Fields, object};
use crate::remote::Remote;
use crate::report::{ReportLine, ReportSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum SecondaryKind {
    #[strum(serialize = "Tags")]
    Tag,
    #[strum(serialize = "Route-Targets")]
    RouteTarget,
}

impl SecondaryKind {
    pub fn collection(self) -> Collection {
        match self {
            Self::Tag => Collection::TAGS,
            Self::RouteTarget => Collection::ROUTE_TARGETS,
        }
    }
}

/// Names seen for one secondary kind. A name is in at most one of
/// `exists` / `created`.
#[derive(Debug, Default)]
pub struct ResourceLedger {
    exists: IndexSet<String>,
    created: IndexSet<String>,
    ids: HashMap<String, u64>,
    /// Names matching several records; reported once, never used.
    ambiguous: HashSet<String>,
}

impl ResourceLedger {
    pub fn exists(&self) -> impl Iterator<Item = &str> {
        self.exists.iter().map(String::as_str)
    }

    pub fn created(&self) -> impl Iterator<Item = &str> {
        self.created.iter().map(String::as_str)
    }

    pub fn id(&self, name: &str) -> Option<u64> {
        self.ids.get(name).copied()
    }

    fn found(&mut self, name: &str, id: u64) {
        self.exists.insert(name.to_owned());
        self.ids.insert(name.to_owned(), id);
    }

    fn made(&mut self, name: &str, id: u64) {
        self.created.insert(name.to_owned());
        self.ids.insert(name.to_owned(), id);
    }
}

#[derive(Debug, Default)]
pub struct SecondaryResources {
    tags: ResourceLedger,
    route_targets: ResourceLedger,
}

impl SecondaryResources {
    pub fn ledger(&self, kind: SecondaryKind) -> &ResourceLedger {
        match kind {
            SecondaryKind::Tag => &self.tags,
            SecondaryKind::RouteTarget => &self.route_targets,
        }
    }

    fn ledger_mut(&mut self, kind: SecondaryKind) -> &mut ResourceLedger {
        match kind {
            SecondaryKind::Tag => &mut self.tags,
            SecondaryKind::RouteTarget => &mut self.route_targets,
        }
    }
}

impl<R: Remote, S: ReportSink> SyncEngine<R, S> {
    /// Id of the `kind` resource called `name`, creating it from `body`
    /// when absent. `None` when the create was rejected (already reported).
    pub(crate) async fn get_or_create(
        &mut self,
        kind: SecondaryKind,
        name: &str,
        body: Fields,
    ) -> Result<Option<u64>, CoreError> {
        let ledger = self.secondary.ledger(kind);
        if let Some(id) = ledger.id(name) {
            return Ok(Some(id));
        }
        if ledger.ambiguous.contains(name) {
            return Ok(None);
        }

        let collection = kind.collection();
        match lookup_one(&self.remote, &collection, &Filter::by("name", name)).await? {
            Lookup::Found(record) => {
                self.secondary.ledger_mut(kind).found(name, record.id);
                return Ok(Some(record.id));
            }
            Lookup::Ambiguous(count) => {
                self.secondary.ledger_mut(kind).ambiguous.insert(name.to_owned());
                self.emit(ReportLine::Failed {
                    label: kind.to_string(),
                    field: None,
                    message: format!("'{name}' matches {count} records"),
                });
                return Ok(None);
            }
            Lookup::Absent => {}
        }

        debug!(%kind, name, "creating shared resource");
        match self
            .remote
            .bulk_create(&collection, &[Value::Object(body)])
            .await
        {
            Ok(records) => match records.first() {
                Some(record) => {
                    self.secondary.ledger_mut(kind).made(name, record.id);
                    Ok(Some(record.id))
                }
                None => Err(CoreError::Internal(format!(
                    "creating {kind} '{name}' returned no record"
                ))),
            },
            Err(e) => {
                self.report_failure(&kind.to_string(), e)?;
                Ok(None)
            }
        }
    }

    /// Tag ids for `name → colour` pairs. An empty colour is left to the
    /// NetBox default.
    pub(crate) async fn tag_ids(&mut self, tags: &NamedAttrs) -> Result<Vec<u64>, CoreError> {
        let mut ids = Vec::with_capacity(tags.len());
        for (name, colour) in tags.iter() {
            let mut body = object(json!({"name": name, "slug": make_slug(name)}));
            if !colour.is_empty() {
                body.insert("color".into(), json!(colour));
            }
            if let Some(id) = self.get_or_create(SecondaryKind::Tag, name, body).await? {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    /// Route-target ids for `name → description` pairs, owned by `tenant`.
    pub(crate) async fn route_target_ids(
        &mut self,
        targets: &NamedAttrs,
        tenant: Option<&str>,
    ) -> Result<Vec<u64>, CoreError> {
        let mut ids = Vec::with_capacity(targets.len());
        for (name, description) in targets.iter() {
            let mut body = object(json!({"name": name, "description": description}));
            if let Some(tenant) = tenant {
                body.insert("tenant".into(), json!({"name": tenant}));
            }
            if let Some(id) = self
                .get_or_create(SecondaryKind::RouteTarget, name, body)
                .await?
            {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    /// Created and already-present names of `kind` seen so far in the run.
    pub(crate) fn report_secondary(&mut self, kind: SecondaryKind) {
        let ledger = self.secondary.ledger(kind);
        let exists: Vec<String> = ledger.exists().map(str::to_owned).collect();
        let created: Vec<String> = ledger.created().map(str::to_owned).collect();
        if !exists.is_empty() {
            self.emit(ReportLine::Exists {
                label: kind.to_string(),
                names: exists,
            });
        }
        if !created.is_empty() {
            self.emit(ReportLine::Created {
                label: kind.to_string(),
                names: created,
            });
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use nbsetup_api::FieldErrors;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::testing::FakeRemote;

    #[tokio::test]
    async fn tag_is_created_once_and_reused() {
        let remote = FakeRemote::new();
        let mut engine = SyncEngine::new(remote, Vec::new());
        let tags = NamedAttrs::from_pairs([("prod", "ff0000")]);

        let first = engine.tag_ids(&tags).await.unwrap();
        let second = engine.tag_ids(&tags).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(engine.remote().create_calls(&Collection::TAGS), 1);
        let ledger = engine.secondary().ledger(SecondaryKind::Tag);
        assert_eq!(ledger.created().collect::<Vec<_>>(), vec!["prod"]);
        assert_eq!(ledger.exists().count(), 0);

        let created = &engine.remote().records(&Collection::TAGS)[0];
        assert_eq!(created.str_field("slug"), Some("prod"));
        assert_eq!(created.str_field("color"), Some("ff0000"));
    }

    #[tokio::test]
    async fn present_tag_is_recorded_as_existing() {
        let remote = FakeRemote::new();
        let id = remote.seed(&Collection::TAGS, json!({"name": "Core Net", "slug": "core_net"}));
        let mut engine = SyncEngine::new(remote, Vec::new());

        let ids = engine
            .tag_ids(&NamedAttrs::from_pairs([("Core Net", "")]))
            .await
            .unwrap();

        assert_eq!(ids, vec![id]);
        assert_eq!(engine.remote().create_calls(&Collection::TAGS), 0);
        engine.report_secondary(SecondaryKind::Tag);
        assert_eq!(
            engine.sink(),
            &vec![ReportLine::Exists {
                label: "Tags".into(),
                names: vec!["Core Net".into()],
            }]
        );
    }

    #[tokio::test]
    async fn route_targets_carry_tenant_and_description() {
        let remote = FakeRemote::new();
        let mut engine = SyncEngine::new(remote, Vec::new());

        let ids = engine
            .route_target_ids(&NamedAttrs::from_pairs([("65000:1", "blue import")]), Some("Acme"))
            .await
            .unwrap();

        assert_eq!(ids.len(), 1);
        let rt = &engine.remote().records(&Collection::ROUTE_TARGETS)[0];
        assert_eq!(rt.str_field("description"), Some("blue import"));
        assert_eq!(rt.nested_name("tenant"), Some("Acme"));
    }

    #[tokio::test]
    async fn rejected_tag_is_reported_and_omitted() {
        let remote = FakeRemote::new();
        remote.reject_when(
            &Collection::TAGS,
            "name",
            "bad",
            FieldErrors::single("color", "Enter a valid hexadecimal RGB color code."),
        );
        let mut engine = SyncEngine::new(remote, Vec::new());

        let ids = engine
            .tag_ids(&NamedAttrs::from_pairs([("bad", "zzz"), ("good", "")]))
            .await
            .unwrap();

        assert_eq!(ids.len(), 1);
        assert_eq!(
            engine.sink(),
            &vec![ReportLine::Failed {
                label: "Tags".into(),
                field: Some("color".into()),
                message: "Enter a valid hexadecimal RGB color code.".into(),
            }]
        );
    }

    #[tokio::test]
    async fn ambiguous_route_target_is_reported_once_and_not_created() {
        let remote = FakeRemote::new();
        remote.seed(&Collection::ROUTE_TARGETS, json!({"name": "65000:1", "tenant": {"name": "Acme"}}));
        remote.seed(&Collection::ROUTE_TARGETS, json!({"name": "65000:1", "tenant": {"name": "Globex"}}));
        let mut engine = SyncEngine::new(remote, Vec::new());
        let targets = NamedAttrs::from_pairs([("65000:1", "")]);

        let first = engine.route_target_ids(&targets, None).await.unwrap();
        let second = engine.route_target_ids(&targets, None).await.unwrap();

        assert!(first.is_empty());
        assert!(second.is_empty());
        assert_eq!(engine.remote().create_calls(&Collection::ROUTE_TARGETS), 0);
        assert_eq!(engine.remote().lookup_calls(&Collection::ROUTE_TARGETS), 1);
        assert_eq!(
            engine.sink(),
            &vec![ReportLine::Failed {
                label: "Route-Targets".into(),
                field: None,
                message: "'65000:1' matches 2 records".into(),
            }]
        );
    }
}
