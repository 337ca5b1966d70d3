use nbsetup_api::{Collection, Error as ApiError};
use serde_json::Value;
use tracing::debug;

use super::SyncEngine;
use super::check::{Partition, check};
use crate::error::CoreError;
use crate::model::{Candidate, CheckKey};
use crate::plan::RecordKind;
use crate::remote::Remote;
use crate::report::{ReportLine, ReportSink};

impl<R: Remote, S: ReportSink> SyncEngine<R, S> {
    /// Check by natural key, then create whatever is missing.
    pub(crate) async fn sync_flat(
        &mut self,
        kind: RecordKind,
        candidates: Vec<Candidate>,
    ) -> Result<(), CoreError> {
        let key = kind.check_key();
        let partition = check(&self.remote, &kind.collection(), &key, candidates).await?;
        self.create_flat(kind.label(), &kind.collection(), &key, partition)
            .await
    }

    /// Bulk-create `partition.not_existing` in one call and report the
    /// outcome: field errors first, then already-present, then created.
    pub(crate) async fn create_flat(
        &mut self,
        label: &str,
        collection: &Collection,
        key: &CheckKey,
        partition: Partition,
    ) -> Result<(), CoreError> {
        let Partition {
            not_existing,
            existing,
        } = partition;

        let mut created = Vec::new();
        if !not_existing.is_empty() {
            let bodies: Vec<Value> = not_existing.iter().map(Candidate::body).collect();
            debug!(%collection, count = bodies.len(), "creating records");
            match self.remote.bulk_create(collection, &bodies).await {
                Ok(_) => created = not_existing.iter().map(|c| c.identity(key)).collect(),
                Err(e) => self.report_failure(label, e)?,
            }
        }

        if !existing.is_empty() {
            self.emit(ReportLine::Exists {
                label: label.to_owned(),
                names: existing,
            });
        }
        if !created.is_empty() {
            self.emit(ReportLine::Created {
                label: label.to_owned(),
                names: created,
            });
        }
        Ok(())
    }

    /// Report a rejected create. Field errors become one line per field of
    /// every failed entry; any other recoverable failure one plain line.
    /// Unrecoverable failures are handed back.
    pub(crate) fn report_failure(&mut self, label: &str, err: ApiError) -> Result<(), CoreError> {
        if let Some(errors) = err.validation_errors() {
            let lines: Vec<ReportLine> = errors
                .failed()
                .flat_map(|entry| {
                    entry.iter().map(|(field, messages)| ReportLine::Failed {
                        label: label.to_owned(),
                        field: Some(field.to_owned()),
                        message: messages.join(", "),
                    })
                })
                .collect();
            for line in lines {
                self.emit(line);
            }
            return Ok(());
        }
        if err.is_recoverable() {
            self.emit(ReportLine::Failed {
                label: label.to_owned(),
                field: None,
                message: err.to_string(),
            });
            return Ok(());
        }
        Err(err.into())
    }
}
