// ── Run report ──
//
// One line per object-type outcome. The engine pushes lines into a
// `ReportSink`; the CLI renders them, tests collect them.

use std::fmt;

/// Outcome of one sync step for one record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportLine {
    /// Records created in this run.
    Created { label: String, names: Vec<String> },
    /// Records that were already present and left alone.
    Exists { label: String, names: Vec<String> },
    /// A recoverable failure. `field` is set for per-field validation
    /// messages of a rejected create.
    Failed {
        label: String,
        field: Option<String>,
        message: String,
    },
}

impl ReportLine {
    pub fn label(&self) -> &str {
        match self {
            Self::Created { label, .. } | Self::Exists { label, .. } | Self::Failed { label, .. } => {
                label
            }
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created { label, names } => {
                write!(f, "{label}: '{}' successfully created", names.join(", "))
            }
            Self::Exists { label, names } => {
                write!(f, "{label}: '{}' already exist", names.join(", "))
            }
            Self::Failed {
                label,
                field: Some(field),
                message,
            } => write!(f, "{label} '{field}' - {message}"),
            Self::Failed {
                label,
                field: None,
                message,
            } => write!(f, "{label}: {message}"),
        }
    }
}

/// Destination for report lines.
pub trait ReportSink {
    fn record(&mut self, line: ReportLine);
}

impl ReportSink for Vec<ReportLine> {
    fn record(&mut self, line: ReportLine) {
        self.push(line);
    }
}

impl<S: ReportSink + ?Sized> ReportSink for &mut S {
    fn record(&mut self, line: ReportLine) {
        (**self).record(line);
    }
}

/// Record counts across a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub created: usize,
    pub existing: usize,
    pub failures: usize,
}

impl RunSummary {
    pub(crate) fn count(&mut self, line: &ReportLine) {
        match line {
            ReportLine::Created { names, .. } => self.created += names.len(),
            ReportLine::Exists { names, .. } => self.existing += names.len(),
            ReportLine::Failed { .. } => self.failures += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_each_shape() {
        let created = ReportLine::Created {
            label: "Tenant".into(),
            names: vec!["Acme".into(), "Globex".into()],
        };
        let field = ReportLine::Failed {
            label: "Site".into(),
            field: Some("slug".into()),
            message: "site with this slug already exists.".into(),
        };
        let plain = ReportLine::Failed {
            label: "VLAN".into(),
            field: None,
            message: "DATA - The VLAN group 'G1' for this vlan does not exist".into(),
        };
        assert_eq!(created.to_string(), "Tenant: 'Acme, Globex' successfully created");
        assert_eq!(
            field.to_string(),
            "Site 'slug' - site with this slug already exists."
        );
        assert_eq!(
            plain.to_string(),
            "VLAN: DATA - The VLAN group 'G1' for this vlan does not exist"
        );
    }

    #[test]
    fn summary_counts_names_and_failures() {
        let mut summary = RunSummary::default();
        summary.count(&ReportLine::Created {
            label: "Tenant".into(),
            names: vec!["a".into(), "b".into()],
        });
        summary.count(&ReportLine::Failed {
            label: "Tenant".into(),
            field: None,
            message: "x".into(),
        });
        assert_eq!(
            summary,
            RunSummary {
                created: 2,
                existing: 0,
                failures: 1
            }
        );
    }
}
