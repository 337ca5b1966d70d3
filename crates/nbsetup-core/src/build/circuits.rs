use serde_json::json;

use super::{ModelBuilder, StageModels, insert_opt, make_slug, name_ref, named};
use crate::error::CoreError;
use crate::model::{Candidate, object};
use crate::plan::RecordKind;
use crate::remote::Remote;
use crate::report::ReportSink;

impl<R: Remote, S: ReportSink> ModelBuilder<'_, R, S> {
    pub(super) async fn circuits(&mut self) -> Result<StageModels, CoreError> {
        let doc = self.doc;

        let mut circuit_types = Vec::new();
        for circuit_type in doc.circuit_type.iter().flatten() {
            let mut fields = named(
                &circuit_type.name,
                circuit_type.slug.as_deref(),
                circuit_type.descr.as_deref(),
            );
            fields.insert("tags".into(), self.tags(circuit_type.tags.as_ref()).await?);
            circuit_types.push(Candidate::new(fields));
        }

        let mut providers = Vec::new();
        let mut circuits = Vec::new();
        for provider in doc.provider.iter().flatten() {
            let mut fields = object(json!({
                "name": provider.name,
                "slug": make_slug(provider.slug.as_deref().unwrap_or(&provider.name)),
                "account": provider.account_num.as_deref().unwrap_or_default(),
                "portal_url": provider.portal_url.as_deref().unwrap_or_default(),
                "comments": provider.comments.as_deref().unwrap_or_default(),
            }));
            insert_opt(&mut fields, "asn", provider.asn.map(|asn| json!(asn)));
            fields.insert("tags".into(), self.tags(provider.tags.as_ref()).await?);
            providers.push(Candidate::new(fields));

            for circuit in &provider.circuit {
                let mut fields = object(json!({
                    "cid": circuit.cid,
                    "type": {"name": circuit.circuit_type},
                    "provider": {"name": provider.name},
                    "description": circuit.descr.as_deref().unwrap_or_default(),
                    "comments": circuit.comments.as_deref().unwrap_or_default(),
                }));
                insert_opt(&mut fields, "tenant", circuit.tenant.as_deref().map(name_ref));
                insert_opt(
                    &mut fields,
                    "commit_rate",
                    circuit.commit_rate.map(|rate| json!(rate)),
                );
                fields.insert("tags".into(), self.tags(circuit.tags.as_ref()).await?);
                circuits.push(Candidate::new(fields));
            }
        }

        let mut models = StageModels::default();
        models.flat(RecordKind::CircuitType, circuit_types);
        models.flat(RecordKind::Provider, providers);
        models.flat(RecordKind::Circuit, circuits);
        Ok(models)
    }
}
