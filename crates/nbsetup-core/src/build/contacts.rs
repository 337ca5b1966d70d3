use std::path::PathBuf;
use std::str::FromStr;

use serde_json::json;

use super::{Batch, ModelBuilder, StageModels, insert_opt, named};
use crate::error::CoreError;
use crate::model::{AssignmentCandidate, Candidate, Priority, object};
use crate::plan::RecordKind;
use crate::remote::Remote;
use crate::report::ReportSink;

impl<R: Remote, S: ReportSink> ModelBuilder<'_, R, S> {
    pub(super) async fn contacts(&mut self) -> Result<StageModels, CoreError> {
        let doc = self.doc;

        let mut roles = Vec::new();
        for role in doc.contact_role.iter().flatten() {
            let mut fields = named(&role.name, role.slug.as_deref(), role.descr.as_deref());
            fields.insert("tags".into(), self.tags(role.tags.as_ref()).await?);
            roles.push(Candidate::new(fields));
        }

        let mut groups = Vec::new();
        let mut contacts = Vec::new();
        for group in doc.contact_group.iter().flatten() {
            let mut fields = named(&group.name, group.slug.as_deref(), group.descr.as_deref());
            fields.insert("tags".into(), self.tags(group.tags.as_ref()).await?);
            groups.push(Candidate::new(fields));

            for contact in &group.contact {
                let mut fields = object(json!({
                    "name": contact.name,
                    "group": {"name": group.name},
                }));
                let optional = [
                    ("phone", &contact.phone),
                    ("address", &contact.addr),
                    ("email", &contact.email),
                    ("comments", &contact.comments),
                ];
                for (field, value) in optional {
                    insert_opt(&mut fields, field, value.as_deref().map(|v| json!(v)));
                }
                fields.insert("tags".into(), self.tags(contact.tags.as_ref()).await?);
                contacts.push(Candidate::new(fields));
            }
        }

        let mut assignments = Vec::new();
        for assign in doc.contact_assign.iter().flatten() {
            let priority = match assign.priority.as_deref() {
                Some(text) => Priority::from_str(text).map_err(|_| CoreError::Input {
                    path: PathBuf::from("contact_assign"),
                    message: format!("priority '{text}' is not valid"),
                })?,
                None => Priority::default(),
            };
            for (kind, identifier) in assign.assign_to.iter() {
                assignments.push(AssignmentCandidate {
                    kind: kind.to_owned(),
                    identifier: identifier.to_owned(),
                    contacts: assign.contact.clone(),
                    role: assign.role.clone(),
                    priority,
                });
            }
        }

        let mut models = StageModels::default();
        models.flat(RecordKind::ContactRole, roles);
        models.flat(RecordKind::ContactGroup, groups);
        models.flat(RecordKind::Contact, contacts);
        models.insert(RecordKind::ContactAssignment, Batch::Assignments(assignments));
        Ok(models)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::Path;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::document::InputDocument;
    use crate::plan::Stage;
    use crate::sync::SyncEngine;
    use crate::testing::FakeRemote;

    const DOC: &str = r"
contact_role:
  - name: NOC
contact_group:
  - name: Operations
    contact:
      - {name: Alice, phone: 555-0100, addr: 1 Main St}
      - {name: Bob, email: bob@example.com}
contact_assign:
  - contact: [Alice, Bob]
    role: NOC
    priority: secondary
    assign_to: {site: DC1, circuit: 4711}
  - contact: Alice
    role: NOC
    assign_to: {tenant: Acme}
";

    async fn build(doc: &str) -> Result<StageModels, CoreError> {
        let doc: InputDocument = serde_yaml::from_str(doc).unwrap();
        let mut engine = SyncEngine::new(FakeRemote::new(), Vec::new());
        ModelBuilder::new(&mut engine, &doc, Path::new("."))
            .build(Stage::Contacts)
            .await
    }

    #[tokio::test]
    async fn one_assignment_per_target() {
        let mut models = build(DOC).await.unwrap();

        let Batch::Flat(contacts) = models.take(RecordKind::Contact) else {
            panic!("contacts are flat");
        };
        assert_eq!(contacts[0].get("group"), Some(&json!({"name": "Operations"})));
        assert_eq!(contacts[0].str_field("address"), Some("1 Main St"));
        assert_eq!(contacts[0].get("email"), None);
        assert_eq!(contacts[1].str_field("email"), Some("bob@example.com"));

        let Batch::Assignments(assignments) = models.take(RecordKind::ContactAssignment) else {
            panic!("assignments have their own batch");
        };
        let targets: Vec<_> = assignments
            .iter()
            .map(|a| (a.kind.as_str(), a.identifier.as_str(), a.priority))
            .collect();
        assert_eq!(
            targets,
            vec![
                ("site", "DC1", Priority::Secondary),
                ("circuit", "4711", Priority::Secondary),
                ("tenant", "Acme", Priority::Primary),
            ]
        );
        assert_eq!(assignments[0].contacts, vec!["Alice".to_owned(), "Bob".to_owned()]);
    }

    #[tokio::test]
    async fn unknown_priority_is_an_input_error() {
        let doc = "contact_role: []\ncontact_group: []\ncontact_assign:\n  - {contact: Alice, role: NOC, priority: urgent, assign_to: {site: DC1}}";
        let err = build(doc).await.unwrap_err();
        assert!(err.to_string().contains("priority 'urgent' is not valid"));
    }
}
