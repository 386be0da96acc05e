//! Per-file orchestration: inspect, plan, rewrite, record.

use std::path::{Path, PathBuf};
use log::{error, info};
use crate::config::{FilterConfig, ProcessingMode};
use crate::outcome::{BatchSummary, Outcome, OutcomeLog};
use crate::plan::RewritePlanner;
use crate::rewrite::AtomicRewriter;
use crate::tools::MediaToolkit;

/// Runs the pipeline for one file at a time
pub struct FileProcessor<T: MediaToolkit> {
    toolkit: T,
    planner: RewritePlanner,
    rewriter: AtomicRewriter,
    mode: ProcessingMode,
}

impl<T: MediaToolkit> FileProcessor<T> {
    pub fn new(toolkit: T, planner: RewritePlanner, rewriter: AtomicRewriter, mode: ProcessingMode) -> Self {
        FileProcessor {
            toolkit,
            planner,
            rewriter,
            mode,
        }
    }

    pub fn from_config(toolkit: T, cfg: &FilterConfig, mode: ProcessingMode) -> Self {
        Self::new(
            toolkit,
            RewritePlanner::from_config(cfg),
            AtomicRewriter::from_config(cfg),
            mode,
        )
    }

    pub fn mode(&self) -> ProcessingMode {
        self.mode
    }

    pub fn toolkit(&self) -> &T {
        &self.toolkit
    }

    /// Process one file and append its outcome to the log
    pub fn process_file(&self, path: &Path, log: &mut OutcomeLog) -> Outcome {
        info!("Processing: {}", path.display());
        let outcome = self.run(path);

        match &outcome {
            Outcome::Skipped(reason) => info!("No changes needed for {}: {}", path.display(), reason),
            Outcome::DryRunPlanned(plan) => info!(
                "DRY RUN: would rewrite {} ({})",
                path.display(),
                plan.describe()
            ),
            Outcome::Modified { plan, .. } => info!(
                "✅ Modified {}: removed audio track(s) {:?}",
                path.display(),
                plan.dropped_audio
            ),
            Outcome::Failed(e) => error!("❌ Failed to process {}: {}", path.display(), e),
        }

        log.record(path, &outcome);
        outcome
    }

    fn run(&self, path: &Path) -> Outcome {
        let tracks = match self.toolkit.identify(path) {
            Ok(tracks) => tracks,
            Err(e) => return Outcome::Failed(e.into()),
        };

        let plan = self.planner.plan(path, &tracks);
        match plan.skip_reason {
            Some(reason) => return Outcome::Skipped(reason),
            None => debug_assert!(plan.needs_rewrite),
        }

        if self.mode.is_dry_run() {
            // Report the refusal apply mode would hit
            if let Err(e) = self.rewriter.check_container(path) {
                return Outcome::Failed(e.into());
            }
            return Outcome::DryRunPlanned(plan);
        }

        match self.rewriter.rewrite(&self.toolkit, path, &plan) {
            Ok(report) => Outcome::Modified { plan, report },
            Err(e) => Outcome::Failed(e),
        }
    }

    /// Process files in order; one file's failure never stops the others
    pub fn process_batch<I, P>(&self, paths: I, log: &mut OutcomeLog) -> BatchSummary
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut summary = BatchSummary::default();
        let paths: Vec<PathBuf> = paths.into_iter().map(|p| p.as_ref().to_path_buf()).collect();
        let total = paths.len();

        for (i, path) in paths.iter().enumerate() {
            info!("[{}/{}] {}", i + 1, total, path.display());
            self.process_file(path, log);
            if let Some(record) = log.records().last() {
                summary.add(record);
            }
        }

        info!(
            "Batch complete: {} file(s), {} modified, {} planned, {} skipped, {} failed",
            summary.total, summary.modified, summary.planned, summary.skipped, summary.failed
        );
        summary
    }
}
