use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Language codes recognized as English out of the box
pub const DEFAULT_ENGLISH_CODES: &[&str] = &["en", "eng", "english", "en-us", "en-gb"];

/// Extensions picked up by the directory scan
pub const DEFAULT_MEDIA_EXTENSIONS: &[&str] = &["mkv", "mp4", "avi", "m4v", "mov", "wmv", "flv", "webm"];

/// Extensions the rewriter may replace in place (mkvmerge always writes Matroska)
pub const DEFAULT_REWRITE_EXTENSIONS: &[&str] = &["mkv", "mka", "mk3d"];

/// What to do with audio tracks that carry no usable language tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UntaggedPolicy {
    /// Treat absent, empty and `und` tags as non-English
    #[default]
    Drop,
    /// Treat them as English and keep the track
    Keep,
}

/// What to do when a file has audio but none of it is English
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoEnglishPolicy {
    /// Trust the classifier and remove every audio track
    #[default]
    Remove,
    /// Leave the file untouched
    Skip,
}

/// Whether the pipeline only reports or actually rewrites files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingMode {
    DryRun,
    Apply,
}

impl ProcessingMode {
    pub fn is_dry_run(&self) -> bool {
        *self == ProcessingMode::DryRun
    }
}

/// Configuration for the audio filter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Directory containing mkvmerge; PATH and common locations are searched when unset
    pub mkv_tools_path: Option<PathBuf>,
    /// Language tags treated as English (compared case-insensitively)
    pub english_codes: Vec<String>,
    /// Policy for audio tracks without a language tag
    pub untagged_audio: UntaggedPolicy,
    /// Policy for files whose audio tracks are all non-English
    pub no_english_audio: NoEnglishPolicy,
    /// Mark the first kept audio track as default when a file is rewritten
    pub set_default_audio: bool,
    /// Re-identify the remuxed output before swapping it in
    pub verify_output: bool,
    /// File extensions considered during the directory scan
    pub media_extensions: Vec<String>,
    /// File extensions the rewriter is allowed to replace
    pub rewrite_extensions: Vec<String>,
    /// Append-only log receiving one line per processed file
    pub outcome_log: PathBuf,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

impl FilterConfig {
    /// Create a default configuration with sensible values
    pub fn default_config() -> Self {
        Self {
            mkv_tools_path: None,
            english_codes: DEFAULT_ENGLISH_CODES.iter().map(|s| s.to_string()).collect(),
            untagged_audio: UntaggedPolicy::Drop,
            no_english_audio: NoEnglishPolicy::Remove,
            set_default_audio: true,
            verify_output: true,
            media_extensions: DEFAULT_MEDIA_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            rewrite_extensions: DEFAULT_REWRITE_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            outcome_log: PathBuf::from("audio_filter.log"),
        }
    }

    /// Load configuration from a file, or return defaults if path is None or file doesn't exist
    pub fn load_config(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default_config();

        if let Some(config_path) = path {
            if config_path.exists() {
                let content = std::fs::read_to_string(config_path)
                    .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

                if config_path.extension().and_then(|s| s.to_str()) == Some("toml") {
                    config = toml::from_str(&content)
                        .with_context(|| format!("Failed to parse TOML config: {}", config_path.display()))?;
                } else {
                    config = serde_json::from_str(&content)
                        .with_context(|| format!("Failed to parse JSON config: {}", config_path.display()))?;
                }
            } else {
                log::warn!("Config file {} not found, using defaults", config_path.display());
            }
        }

        Ok(config)
    }
}
