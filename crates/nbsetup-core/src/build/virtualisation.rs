use serde_json::json;

use super::{ModelBuilder, StageModels, insert_opt, name_ref, named};
use crate::document::{ClusterInput, ClusterTypeInput};
use crate::error::CoreError;
use crate::model::{Candidate, object};
use crate::plan::RecordKind;
use crate::remote::Remote;
use crate::report::ReportSink;

impl<R: Remote, S: ReportSink> ModelBuilder<'_, R, S> {
    /// Cluster groups, cluster types and their clusters. A cluster takes
    /// `site`, `group`, `tags` and `tenant` from its type when it sets none
    /// itself; with no tenant anywhere, the site's tenant is used.
    pub(super) async fn virtualisation(&mut self) -> Result<StageModels, CoreError> {
        let doc = self.doc;

        let mut groups = Vec::new();
        for group in doc.cluster_group.iter().flatten() {
            let mut fields = named(&group.name, group.slug.as_deref(), group.descr.as_deref());
            fields.insert("tags".into(), self.tags(group.tags.as_ref()).await?);
            groups.push(Candidate::new(fields));
        }

        let mut types = Vec::new();
        let mut clusters = Vec::new();
        for cluster_type in doc.cluster_type.iter().flatten() {
            let mut fields = named(
                &cluster_type.name,
                cluster_type.slug.as_deref(),
                cluster_type.descr.as_deref(),
            );
            fields.insert("tags".into(), self.tags(cluster_type.tags.as_ref()).await?);
            types.push(Candidate::new(fields));

            for cluster in &cluster_type.cluster {
                clusters.push(self.cluster(cluster, cluster_type).await?);
            }
        }

        let mut models = StageModels::default();
        models.flat(RecordKind::ClusterType, types);
        models.flat(RecordKind::ClusterGroup, groups);
        models.flat(RecordKind::Cluster, clusters);
        Ok(models)
    }

    async fn cluster(
        &mut self,
        cluster: &ClusterInput,
        cluster_type: &ClusterTypeInput,
    ) -> Result<Candidate, CoreError> {
        let site = cluster.site.as_deref().or(cluster_type.site.as_deref());
        let group = cluster.group.as_deref().or(cluster_type.group.as_deref());
        let tags = cluster.tags.as_ref().or(cluster_type.tags.as_ref());

        let tenant = match cluster.tenant.clone().or_else(|| cluster_type.tenant.clone()) {
            Some(tenant) => Some(tenant),
            None => match site {
                Some(site) => self.site_tenant(site).await?,
                None => None,
            },
        };

        let mut fields = object(json!({
            "name": cluster.name,
            "type": {"name": cluster_type.name},
            "comments": cluster.comment.as_deref().unwrap_or_default(),
        }));
        insert_opt(&mut fields, "site", site.map(name_ref));
        insert_opt(&mut fields, "group", group.map(name_ref));
        insert_opt(&mut fields, "tenant", tenant.as_deref().map(name_ref));
        fields.insert("tags".into(), self.tags(tags).await?);
        Ok(Candidate::new(fields))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::Path;

    use nbsetup_api::Collection;
    use pretty_assertions::assert_eq;

    use super::super::Batch;
    use super::*;
    use crate::document::InputDocument;
    use crate::plan::Stage;
    use crate::sync::SyncEngine;
    use crate::testing::FakeRemote;

    #[tokio::test]
    async fn clusters_inherit_from_their_type() {
        let remote = FakeRemote::new();
        remote.seed(
            &Collection::SITES,
            json!({"name": "DC1", "tenant": {"id": 4, "name": "Acme"}}),
        );
        let doc: InputDocument = serde_yaml::from_str(
            r"
cluster_group:
  - name: Prod
cluster_type:
  - name: VMware
    site: DC1
    group: Prod
    tags: [vmware]
    cluster:
      - {name: ESX-A}
      - {name: ESX-B, site: DC2, group: Lab, tenant: Lab Co, comment: spare}
",
        )
        .unwrap();
        let mut engine = SyncEngine::new(remote, Vec::new());

        let mut models = ModelBuilder::new(&mut engine, &doc, Path::new("."))
            .build(Stage::Virtualisation)
            .await
            .unwrap();

        let Batch::Flat(clusters) = models.take(RecordKind::Cluster) else {
            panic!("clusters are flat");
        };
        assert_eq!(
            clusters[0].fields,
            object(json!({
                "name": "ESX-A",
                "type": {"name": "VMware"},
                "comments": "",
                "site": {"name": "DC1"},
                "group": {"name": "Prod"},
                "tenant": {"name": "Acme"},
                "tags": [1],
            }))
        );
        assert_eq!(clusters[1].get("site"), Some(&json!({"name": "DC2"})));
        assert_eq!(clusters[1].get("group"), Some(&json!({"name": "Lab"})));
        assert_eq!(clusters[1].get("tenant"), Some(&json!({"name": "Lab Co"})));
        assert_eq!(clusters[1].str_field("comments"), Some("spare"));
        assert_eq!(engine.remote().lookup_calls(&Collection::SITES), 1);
    }
}
