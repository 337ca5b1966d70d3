// Parent resolution for VLANs and prefixes.
//
// A VLAN is only unique inside its VLAN group (or site), a prefix inside
// its VRF. Before the existence check, the parent named in the candidate is
// looked up and its id folded into a compound filter. Children whose parent
// is missing are dropped and reported once per parent.

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use nbsetup_api::{Collection, Filter};
use serde_json::Value;

use super::SyncEngine;
use super::check::{Lookup, check, find_id, lookup_one};
use crate::error::CoreError;
use crate::model::{Candidate, CheckKey, VlanRef, VlanScope, value_label};
use crate::plan::RecordKind;
use crate::remote::Remote;
use crate::report::{ReportLine, ReportSink};

/// How a child names its parent: the nested reference `field`, found in
/// `collection`, filtered on by `filter_field` once resolved.
#[derive(Debug, Clone)]
pub struct ParentLink {
    pub field: &'static str,
    pub collection: Collection,
    pub filter_field: &'static str,
    /// Parent kind as written in report messages.
    pub noun: &'static str,
    /// Reference fields that tell same-named parents apart. Unset ones are
    /// looked up as `null`.
    pub scope: &'static [&'static str],
}

impl ParentLink {
    pub const VLAN_GROUP: Self = Self {
        field: "group",
        collection: Collection::VLAN_GROUPS,
        filter_field: "group_id",
        noun: VlanScope::GROUP_NOUN,
        scope: &[],
    };

    pub const SITE: Self = Self {
        field: "site",
        collection: Collection::SITES,
        filter_field: "site_id",
        noun: VlanScope::SITE_NOUN,
        scope: &[],
    };

    pub const VRF: Self = Self {
        field: "vrf",
        collection: Collection::VRFS,
        filter_field: "vrf_id",
        noun: "VRF",
        scope: &["rd"],
    };

    /// Lookup filter for the parent named by `reference`: its scalar
    /// entries, so a VRF given as `{name, rd}` matches on both.
    fn parent_filter(&self, reference: &Value) -> Option<Filter> {
        let Value::Object(map) = reference else {
            return None;
        };
        let mut filter = Filter::new();
        for (field, value) in map {
            if !value.is_object() && !value.is_array() {
                filter.insert(field.clone(), value.clone());
            }
        }
        if filter.is_empty() {
            return None;
        }
        for field in self.scope {
            if filter.get(field).is_none() {
                filter.insert(*field, Value::Null);
            }
        }
        Some(filter)
    }
}

/// VLANs belong to a VLAN group, or directly to a site.
pub static VLAN_PARENTS: [ParentLink; 2] = [ParentLink::VLAN_GROUP, ParentLink::SITE];

pub static PREFIX_PARENTS: [ParentLink; 1] = [ParentLink::VRF];

/// Why a parent could not be pinned to one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParentProblem {
    Missing,
    /// This many records carry the name.
    Ambiguous(u64),
}

/// Children that could not be resolved, grouped by parent and problem.
#[derive(Debug, Default)]
pub struct MissingParents(IndexMap<(&'static str, String, ParentProblem), IndexSet<String>>);

impl MissingParents {
    pub fn add(&mut self, noun: &'static str, parent: String, child: String) {
        self.add_problem(noun, parent, ParentProblem::Missing, child);
    }

    pub fn add_problem(
        &mut self,
        noun: &'static str,
        parent: String,
        problem: ParentProblem,
        child: String,
    ) {
        self.0.entry((noun, parent, problem)).or_default().insert(child);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `(noun, parent, problem, children)` in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str, ParentProblem, Vec<&str>)> {
        self.0.iter().map(|((noun, parent, problem), children)| {
            (
                *noun,
                parent.as_str(),
                *problem,
                children.iter().map(String::as_str).collect(),
            )
        })
    }
}

/// Natural key of the child (VLAN name, prefix).
fn child_key(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Prefix => "prefix",
        _ => "name",
    }
}

/// Parent as named in reports: the natural key, then any other set scalar
/// (`blue (65000:1)`).
fn parent_label(name: String, filter: Option<&Filter>) -> String {
    let Some(filter) = filter else {
        return name;
    };
    let extra: Vec<String> = filter
        .iter()
        .filter(|(field, value)| !matches!(*field, "name" | "slug" | "model") && !value.is_null())
        .map(|(_, value)| value_label(value))
        .collect();
    if extra.is_empty() {
        name
    } else {
        format!("{name} ({})", extra.join(", "))
    }
}

impl<R: Remote, S: ReportSink> SyncEngine<R, S> {
    /// Attach a compound filter to every child whose parent exists; drop
    /// and record the others in `missing`.
    ///
    /// The first link whose field is set on the child is used. A child with
    /// none of them set is scoped globally (`<filter_field>=null`).
    pub(crate) async fn resolve(
        &self,
        kind: RecordKind,
        links: &[ParentLink],
        children: Vec<Candidate>,
        missing: &mut MissingParents,
    ) -> Result<Vec<Candidate>, CoreError> {
        let key = child_key(kind);
        let mut resolved = Vec::with_capacity(children.len());
        let mut parent_ids: HashMap<(&'static str, String), Lookup<u64>> = HashMap::new();

        for mut child in children {
            let key_value = child.get(key).cloned().unwrap_or(Value::Null);
            let label = value_label(&key_value);

            let link = links.iter().find(|link| child.get(link.field).is_some());
            let Some(link) = link else {
                let Some(first) = links.first() else {
                    resolved.push(child);
                    continue;
                };
                child.filter = Some(Filter::by(key, key_value).and(first.filter_field, Value::Null));
                child.label = Some(label);
                resolved.push(child);
                continue;
            };

            let parent_name = child.reference_name(link.field).unwrap_or_default();
            let filter = child
                .get(link.field)
                .and_then(|reference| link.parent_filter(reference));
            let cache_key = (
                link.field,
                filter.as_ref().map_or_else(|| parent_name.clone(), ToString::to_string),
            );
            let parent_id = match parent_ids.get(&cache_key) {
                Some(id) => *id,
                None => {
                    let id = match &filter {
                        Some(filter) => lookup_one(&self.remote, &link.collection, filter)
                            .await?
                            .map(|record| record.id),
                        None => Lookup::Absent,
                    };
                    parent_ids.insert(cache_key, id);
                    id
                }
            };

            let parent = || parent_label(parent_name.clone(), filter.as_ref());
            match parent_id {
                Lookup::Found(id) => {
                    child.filter = Some(Filter::by(key, key_value).and(link.filter_field, id));
                    child.label = Some(label);
                    resolved.push(child);
                }
                Lookup::Absent => missing.add(link.noun, parent(), label),
                Lookup::Ambiguous(count) => {
                    missing.add_problem(link.noun, parent(), ParentProblem::Ambiguous(count), label);
                }
            }
        }
        Ok(resolved)
    }

    /// One line per unresolved parent naming every child dropped because
    /// of it.
    pub(crate) fn report_missing(&mut self, kind: RecordKind, missing: &MissingParents) {
        let child_noun = kind.label().to_lowercase();
        let lines: Vec<ReportLine> = missing
            .iter()
            .map(|(noun, parent, problem, children)| ReportLine::Failed {
                label: kind.label().to_owned(),
                field: None,
                message: match problem {
                    ParentProblem::Missing => format!(
                        "{} - The {noun} '{parent}' for this {child_noun} does not exist",
                        children.join(", ")
                    ),
                    ParentProblem::Ambiguous(count) => format!(
                        "{} - The {noun} '{parent}' for this {child_noun} matches {count} records",
                        children.join(", ")
                    ),
                },
            })
            .collect();
        for line in lines {
            self.emit(line);
        }
    }

    /// Replace each prefix's `VlanRef` with the VLAN id. Prefixes whose VLAN
    /// cannot be found are dropped and reported per VLAN group (or site).
    pub(crate) async fn resolve_prefix_vlans(
        &mut self,
        prefixes: Vec<Candidate>,
    ) -> Result<Vec<Candidate>, CoreError> {
        let mut kept = Vec::with_capacity(prefixes.len());
        let mut missing = MissingParents::default();
        let mut scope_slugs: HashMap<VlanScope, Lookup<Option<String>>> = HashMap::new();

        for mut prefix in prefixes {
            let Some(VlanRef { vid, scope }) = prefix.vlan.take() else {
                kept.push(prefix);
                continue;
            };

            let slug = match scope_slugs.get(&scope) {
                Some(slug) => slug.clone(),
                None => {
                    let slug = self.scope_slug(&scope).await?;
                    scope_slugs.insert(scope.clone(), slug.clone());
                    slug
                }
            };
            let entry = format!(
                "{} 'VLAN {vid}'",
                prefix.str_field("prefix").unwrap_or_default()
            );
            let slug = match slug {
                Lookup::Found(Some(slug)) => slug,
                Lookup::Ambiguous(count) => {
                    let problem = ParentProblem::Ambiguous(count);
                    missing.add_problem(scope.noun(), scope.name().to_owned(), problem, entry);
                    continue;
                }
                Lookup::Found(None) | Lookup::Absent => {
                    missing.add(scope.noun(), scope.name().to_owned(), entry);
                    continue;
                }
            };

            let filter = match &scope {
                VlanScope::Group(_) => Filter::by("vid", vid).and("group", slug),
                VlanScope::Site(_) => Filter::by("vid", vid)
                    .and("site", slug)
                    .and("group_id", Value::Null),
            };
            match find_id(&self.remote, &Collection::VLANS, &filter).await? {
                Some(id) => {
                    prefix.fields.insert("vlan".into(), id.into());
                    kept.push(prefix);
                }
                None => missing.add(scope.noun(), scope.name().to_owned(), entry),
            }
        }

        let lines: Vec<ReportLine> = missing
            .iter()
            .map(|(noun, parent, problem, entries)| ReportLine::Failed {
                label: RecordKind::Prefix.label().to_owned(),
                field: None,
                message: match problem {
                    ParentProblem::Missing => {
                        format!("{} in {noun} '{parent}' does not exist", entries.join(", "))
                    }
                    ParentProblem::Ambiguous(count) => format!(
                        "{} - The {noun} '{parent}' matches {count} records",
                        entries.join(", ")
                    ),
                },
            })
            .collect();
        for line in lines {
            self.emit(line);
        }
        Ok(kept)
    }

    async fn scope_slug(&self, scope: &VlanScope) -> Result<Lookup<Option<String>>, CoreError> {
        let collection = match scope {
            VlanScope::Group(_) => Collection::VLAN_GROUPS,
            VlanScope::Site(_) => Collection::SITES,
        };
        Ok(lookup_one(&self.remote, &collection, &Filter::by("name", scope.name()))
            .await?
            .map(|record| record.str_field("slug").map(str::to_owned)))
    }

    /// Resolve parents, check, bind prefix VLANs, create.
    pub(crate) async fn sync_resolved(
        &mut self,
        kind: RecordKind,
        links: &[ParentLink],
        candidates: Vec<Candidate>,
    ) -> Result<(), CoreError> {
        let mut missing = MissingParents::default();
        let resolved = self.resolve(kind, links, candidates, &mut missing).await?;
        self.report_missing(kind, &missing);

        let collection = kind.collection();
        let key = CheckKey::Compound;
        let mut partition = check(&self.remote, &collection, &key, resolved).await?;
        if partition.not_existing.iter().any(|c| c.vlan.is_some()) {
            partition.not_existing = self.resolve_prefix_vlans(partition.not_existing).await?;
        }
        self.create_flat(kind.label(), &collection, &key, partition)
            .await
    }
}
