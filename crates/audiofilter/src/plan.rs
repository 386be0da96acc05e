//! Keep/drop decision for one file's tracks.

use std::fmt;
use std::path::Path;
use crate::classifier::LanguageClassifier;
use crate::config::{FilterConfig, NoEnglishPolicy};
use crate::probe::TrackInfo;

/// Why a file needs no rewrite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The file has no audio tracks at all
    NoAudio,
    /// Every audio track is already English
    AllEnglish,
    /// No English audio and the policy says to leave such files alone
    NoEnglishAudio,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipReason::NoAudio => "no audio tracks",
            SkipReason::AllEnglish => "all audio tracks are English",
            SkipReason::NoEnglishAudio => "no English audio track found, left untouched",
        };
        f.write_str(s)
    }
}

/// Tracks to retain for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewritePlan {
    /// Retained track ids in original order: every non-audio track plus English audio
    pub keep: Vec<u32>,
    pub kept_audio: Vec<u32>,
    pub dropped_audio: Vec<u32>,
    /// True iff at least one audio track is excluded
    pub needs_rewrite: bool,
    /// Audio track to flag as default when the file is rewritten
    pub default_audio: Option<u32>,
    pub skip_reason: Option<SkipReason>,
}

impl RewritePlan {
    pub fn describe(&self) -> String {
        format!(
            "keep tracks {:?}, drop audio {:?}",
            self.keep, self.dropped_audio
        )
    }
}

/// Builds a [`RewritePlan`] from classified tracks
#[derive(Debug, Clone)]
pub struct RewritePlanner {
    classifier: LanguageClassifier,
    no_english: NoEnglishPolicy,
    set_default_audio: bool,
}

impl RewritePlanner {
    pub fn new(classifier: LanguageClassifier, no_english: NoEnglishPolicy, set_default_audio: bool) -> Self {
        RewritePlanner {
            classifier,
            no_english,
            set_default_audio,
        }
    }

    pub fn from_config(cfg: &FilterConfig) -> Self {
        Self::new(
            LanguageClassifier::from_config(cfg),
            cfg.no_english_audio,
            cfg.set_default_audio,
        )
    }

    /// Partition tracks and compute the keep-set
    pub fn plan(&self, path: &Path, tracks: &[TrackInfo]) -> RewritePlan {
        let mut keep = Vec::with_capacity(tracks.len());
        let mut kept_audio = Vec::new();
        let mut dropped_audio = Vec::new();

        for track in tracks {
            if !track.is_audio() {
                keep.push(track.id);
                continue;
            }
            if self.classifier.is_english(track.language.as_deref()) {
                keep.push(track.id);
                kept_audio.push(track.id);
            } else {
                log::info!(
                    "{}: non-English audio track {} ({})",
                    path.display(),
                    track.id,
                    track.language.as_deref().unwrap_or("untagged")
                );
                dropped_audio.push(track.id);
            }
        }

        let audio_total = kept_audio.len() + dropped_audio.len();
        let skip_reason = if audio_total == 0 {
            Some(SkipReason::NoAudio)
        } else if dropped_audio.is_empty() {
            Some(SkipReason::AllEnglish)
        } else if kept_audio.is_empty() {
            match self.no_english {
                NoEnglishPolicy::Skip => {
                    log::warn!("{}: no English audio track found, skipping", path.display());
                    Some(SkipReason::NoEnglishAudio)
                }
                NoEnglishPolicy::Remove => {
                    log::warn!(
                        "{}: no English audio track found, all {} audio track(s) will be removed",
                        path.display(),
                        audio_total
                    );
                    None
                }
            }
        } else {
            None
        };

        if skip_reason.is_some() {
            // Nothing is removed; the keep-set is the whole file
            return RewritePlan {
                keep: tracks.iter().map(|t| t.id).collect(),
                kept_audio: tracks.iter().filter(|t| t.is_audio()).map(|t| t.id).collect(),
                dropped_audio: Vec::new(),
                needs_rewrite: false,
                default_audio: None,
                skip_reason,
            };
        }

        let default_audio = if self.set_default_audio {
            kept_audio.first().copied()
        } else {
            None
        };

        RewritePlan {
            keep,
            kept_audio,
            dropped_audio,
            needs_rewrite: true,
            default_audio,
            skip_reason: None,
        }
    }
}
