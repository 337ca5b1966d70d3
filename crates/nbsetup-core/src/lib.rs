// nbsetup-core: Object-synchronization engine for NetBox provisioning
//
// The engine takes ordered candidate lists (built from the input document),
// decides what already exists, resolves name references to ids, creates the
// rest, and reports every outcome through a `ReportSink`. Record-level
// failures are reported and skipped; only transport-level failures abort.

pub mod build;
pub mod config;
pub mod document;
pub mod error;
pub mod model;
pub mod plan;
pub mod remote;
pub mod report;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{ProvisionConfig, TlsVerification};
pub use document::InputDocument;
pub use error::CoreError;
pub use model::{AssignmentCandidate, Candidate, CheckKey, DeviceTypeCandidate, Priority};
pub use plan::{Plan, RecordKind, Stage};
pub use remote::Remote;
pub use report::{ReportLine, ReportSink, RunSummary};
pub use sync::SyncEngine;
