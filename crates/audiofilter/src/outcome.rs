use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use chrono::{DateTime, SecondsFormat, Utc};
use crate::error::Error;
use crate::plan::{RewritePlan, SkipReason};
use crate::rewrite::RewriteReport;

/// Result of processing one file
#[derive(Debug)]
pub enum Outcome {
    /// Nothing to remove; the file was not touched
    Skipped(SkipReason),
    /// Dry-run: the file would be rewritten with this plan
    DryRunPlanned(RewritePlan),
    /// The file was rewritten in place
    Modified {
        plan: RewritePlan,
        report: RewriteReport,
    },
    /// Processing failed; the original is unchanged
    Failed(Error),
}

impl Outcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Skipped(_) => OutcomeKind::Skipped,
            Outcome::DryRunPlanned(_) => OutcomeKind::DryRunPlanned,
            Outcome::Modified { .. } => OutcomeKind::Modified,
            Outcome::Failed(_) => OutcomeKind::Failed,
        }
    }

    /// Human readable detail for the outcome log
    pub fn detail(&self) -> Option<String> {
        match self {
            Outcome::Skipped(reason) => Some(reason.to_string()),
            Outcome::DryRunPlanned(plan) => Some(plan.describe()),
            Outcome::Modified { plan, report } => Some(format!(
                "{}, {} -> {} bytes",
                plan.describe(),
                report.bytes_before,
                report.bytes_after
            )),
            Outcome::Failed(err) => Some(format!("{} error: {}", err.kind(), err)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    Skipped,
    DryRunPlanned,
    Modified,
    Failed,
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OutcomeKind::Skipped => "SKIPPED",
            OutcomeKind::DryRunPlanned => "DRY-RUN",
            OutcomeKind::Modified => "MODIFIED",
            OutcomeKind::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// One immutable line of the outcome log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeRecord {
    pub at: DateTime<Utc>,
    pub path: PathBuf,
    pub kind: OutcomeKind,
    pub detail: Option<String>,
    pub bytes_saved: u64,
}

impl OutcomeRecord {
    /// Tab separated: timestamp, kind, path, detail
    pub fn to_line(&self) -> String {
        let detail = self
            .detail
            .as_deref()
            .unwrap_or("")
            .replace(['\n', '\r', '\t'], " ");
        format!(
            "{}\t{}\t{}\t{}",
            self.at.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.kind,
            self.path.display(),
            detail
        )
    }
}

/// Process-wide append-only sink for per-file outcomes.
///
/// Created once at startup and handed to the processor by `&mut`.
pub struct OutcomeLog {
    writer: Option<Box<dyn Write + Send>>,
    records: Vec<OutcomeRecord>,
}

impl OutcomeLog {
    /// Open `path` in append mode (created if missing, never truncated)
    pub fn open(path: &Path) -> io::Result<Self> {
        let file: File = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::with_writer(file))
    }

    pub fn with_writer(writer: impl Write + Send + 'static) -> Self {
        OutcomeLog {
            writer: Some(Box::new(writer)),
            records: Vec::new(),
        }
    }

    /// Keep records in memory only
    pub fn in_memory() -> Self {
        OutcomeLog {
            writer: None,
            records: Vec::new(),
        }
    }

    /// Append one outcome. A failing log write is reported, never propagated.
    pub fn record(&mut self, path: &Path, outcome: &Outcome) -> &OutcomeRecord {
        let bytes_saved = match outcome {
            Outcome::Modified { report, .. } => report.bytes_saved(),
            _ => 0,
        };
        let record = OutcomeRecord {
            at: Utc::now(),
            path: path.to_path_buf(),
            kind: outcome.kind(),
            detail: outcome.detail(),
            bytes_saved,
        };

        if let Some(writer) = self.writer.as_mut() {
            let line = record.to_line();
            if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
                log::error!("Failed to append to outcome log: {} (line: {})", e, line);
            }
        }

        let index = self.records.len();
        self.records.push(record);
        &self.records[index]
    }

    pub fn records(&self) -> &[OutcomeRecord] {
        &self.records
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary::from_records(&self.records)
    }
}

/// Totals over a batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub skipped: usize,
    pub planned: usize,
    pub modified: usize,
    pub failed: usize,
    pub bytes_saved: u64,
}

impl BatchSummary {
    pub fn from_records(records: &[OutcomeRecord]) -> Self {
        let mut summary = BatchSummary::default();
        for record in records {
            summary.add(record);
        }
        summary
    }

    pub fn add(&mut self, record: &OutcomeRecord) {
        self.total += 1;
        match record.kind {
            OutcomeKind::Skipped => self.skipped += 1,
            OutcomeKind::DryRunPlanned => self.planned += 1,
            OutcomeKind::Modified => self.modified += 1,
            OutcomeKind::Failed => self.failed += 1,
        }
        self.bytes_saved += record.bytes_saved;
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}
