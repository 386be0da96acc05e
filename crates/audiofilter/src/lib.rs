//! Remove non-English audio tracks from video files.
//!
//! Each file goes through the same pipeline: [`tools::MediaToolkit::identify`]
//! lists its tracks, [`plan::RewritePlanner`] decides which audio to drop,
//! and [`rewrite::AtomicRewriter`] remuxes into a temporary file that is
//! renamed over the original only once it is complete.
//! [`processor::FileProcessor`] ties the steps together and records every
//! outcome in an [`outcome::OutcomeLog`].

pub mod config;
pub mod error;
pub mod probe;
pub mod classifier;
pub mod plan;
pub mod tools;
pub mod rewrite;
pub mod outcome;
pub mod processor;
pub mod scan;

pub use config::{FilterConfig, NoEnglishPolicy, ProcessingMode, UntaggedPolicy};
pub use error::{Error, FilesystemError, ProbeError, RewriteError, ToolError};
pub use probe::{TrackInfo, TrackKind};
pub use classifier::LanguageClassifier;
pub use plan::{RewritePlan, RewritePlanner, SkipReason};
pub use tools::{MediaToolkit, Mkvmerge};
pub use rewrite::{AtomicRewriter, RewriteReport};
pub use outcome::{BatchSummary, Outcome, OutcomeKind, OutcomeLog, OutcomeRecord};
pub use processor::FileProcessor;
