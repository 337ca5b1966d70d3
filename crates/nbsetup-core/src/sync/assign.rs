use indexmap::IndexSet;
use nbsetup_api::{Collection, Filter};
use serde_json::json;

use super::SyncEngine;
use super::check::{check, find_id};
use crate::error::CoreError;
use crate::model::{AssignmentCandidate, Candidate, CheckKey, object};
use crate::plan::RecordKind;
use crate::remote::Remote;
use crate::report::{ReportLine, ReportSink};

impl<R: Remote, S: ReportSink> SyncEngine<R, S> {
    /// Expand assignments into one row per contact, resolving the target
    /// object and each contact to ids. A target that cannot be found skips
    /// the whole assignment; a contact that cannot be found skips its row.
    pub(crate) async fn sync_assignments(
        &mut self,
        assignments: Vec<AssignmentCandidate>,
    ) -> Result<(), CoreError> {
        let kind = RecordKind::ContactAssignment;
        let mut rows = Vec::new();
        let mut unresolved: IndexSet<String> = IndexSet::new();

        for assignment in &assignments {
            let content_type = assignment.content_type();
            let collection = content_type.collection();

            let Some(object_id) = self.assignment_target(assignment, &collection).await? else {
                unresolved.insert(format!("{} - {}", content_type.model, assignment.identifier));
                continue;
            };

            for contact in &assignment.contacts {
                let Some(contact_id) =
                    find_id(&self.remote, &Collection::CONTACTS, &Filter::by("name", contact.as_str()))
                        .await?
                else {
                    unresolved.insert(format!("content - {contact}"));
                    continue;
                };

                let mut row = Candidate::new(object(json!({
                    "content_type": content_type.to_string(),
                    "object_id": object_id,
                    "contact": contact_id,
                    "role": {"name": assignment.role},
                    "priority": assignment.priority.to_string(),
                })));
                row.filter = Some(
                    Filter::by("content_type", content_type.to_string())
                        .and("object_id", object_id)
                        .and("contact_id", contact_id),
                );
                row.label = Some(format!(
                    "{contact} {} ({})",
                    assignment.identifier, content_type.model
                ));
                rows.push(row);
            }
        }

        if !unresolved.is_empty() {
            let names: Vec<&str> = unresolved.iter().map(String::as_str).collect();
            self.emit(ReportLine::Failed {
                label: kind.label().to_owned(),
                field: None,
                message: format!(
                    "Can't get the ID for the name or slug of: '{}'",
                    names.join(", ")
                ),
            });
        }

        let key = CheckKey::Compound;
        let partition = check(&self.remote, &kind.collection(), &key, rows).await?;
        self.create_flat(kind.label(), &kind.collection(), &key, partition)
            .await
    }

    /// Id of the assignment target: by its primary field, then by slug.
    async fn assignment_target(
        &self,
        assignment: &AssignmentCandidate,
        collection: &Collection,
    ) -> Result<Option<u64>, CoreError> {
        let identifier = assignment.identifier.as_str();
        let by_primary = Filter::by(assignment.primary_field(), identifier);
        if let Some(id) = find_id(&self.remote, collection, &by_primary).await? {
            return Ok(Some(id));
        }
        find_id(&self.remote, collection, &Filter::by("slug", identifier)).await
    }
}
