// ── Sync engine ──
//
// Consumes candidate lists one record kind at a time, in plan order. Every
// remote call is awaited before the next one starts. Record-level failures
// are reported through the sink; only transport-level failures end the run.

mod assign;
mod check;
mod collapse;
mod composite;
mod create;
mod memo;
mod resolve;

use std::path::Path;

use tracing::info;

use crate::build::{Batch, ModelBuilder};
use crate::document::InputDocument;
use crate::error::CoreError;
use crate::plan::{Plan, RecordKind, Strategy};
use crate::remote::Remote;
use crate::report::{ReportLine, ReportSink, RunSummary};

pub use check::{Partition, check};
pub(crate) use check::find_record;
pub use collapse::collapse;
pub use memo::{ResourceLedger, SecondaryKind, SecondaryResources};
pub use resolve::{MissingParents, PREFIX_PARENTS, ParentLink, ParentProblem, VLAN_PARENTS};

/// One provisioning run against one remote.
///
/// Owns the secondary-resource ledger, so tag and route-target state never
/// outlives the run.
pub struct SyncEngine<R, S> {
    remote: R,
    sink: S,
    secondary: SecondaryResources,
    summary: RunSummary,
}

impl<R: Remote, S: ReportSink> SyncEngine<R, S> {
    pub fn new(remote: R, sink: S) -> Self {
        Self {
            remote,
            sink,
            secondary: SecondaryResources::default(),
            summary: RunSummary::default(),
        }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn into_remote(self) -> R {
        self.remote
    }

    pub fn secondary(&self) -> &SecondaryResources {
        &self.secondary
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    pub(crate) fn emit(&mut self, line: ReportLine) {
        self.summary.count(&line);
        self.sink.record(line);
    }

    /// Synchronize one record kind. Empty batches are a no-op.
    pub async fn sync_kind(&mut self, kind: RecordKind, batch: Batch) -> Result<(), CoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        match (kind.strategy(), batch) {
            (Strategy::Flat, Batch::Flat(candidates)) => self.sync_flat(kind, candidates).await,
            (Strategy::Resolved(links), Batch::Flat(candidates)) => {
                self.sync_resolved(kind, links, candidates).await
            }
            (Strategy::Composite, Batch::DeviceTypes(device_types)) => {
                self.sync_device_types(device_types).await
            }
            (Strategy::Assignment, Batch::Assignments(assignments)) => {
                self.sync_assignments(assignments).await
            }
            (_, batch) => Err(CoreError::Internal(format!(
                "'{}' cannot be synchronized from a {} batch",
                kind.label(),
                batch.shape()
            ))),
        }
    }

    /// Build and synchronize every stage of `plan` from `doc`.
    ///
    /// Models for a stage are built right before it runs, so builders that
    /// query NetBox (site tenants, tags) see what earlier stages created.
    pub async fn run(
        &mut self,
        plan: &Plan,
        doc: &InputDocument,
        template_dir: &Path,
    ) -> Result<RunSummary, CoreError> {
        plan.validate()?;

        let stages = plan.stages();
        if let Some((stage, sections)) = doc.missing_sections(&stages).into_iter().next() {
            return Err(CoreError::Plan(format!(
                "stage '{stage}' needs the input section(s) {}",
                sections.join(", ")
            )));
        }

        for stage in stages {
            info!(%stage, "synchronizing stage");
            let before = self.summary;

            let mut models = ModelBuilder::new(self, doc, template_dir)
                .build(stage)
                .await?;
            for kind in plan.kinds_in(stage) {
                self.sync_kind(kind, models.take(kind)).await?;
                if kind == RecordKind::Vrf {
                    self.report_secondary(SecondaryKind::RouteTarget);
                }
            }

            info!(
                %stage,
                created = self.summary.created - before.created,
                existing = self.summary.existing - before.existing,
                failures = self.summary.failures - before.failures,
                "stage finished"
            );
        }

        self.report_secondary(SecondaryKind::Tag);
        Ok(self.summary)
    }
}
