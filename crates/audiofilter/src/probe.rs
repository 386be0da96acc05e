use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use serde::Deserialize;
use crate::error::ProbeError;

/// Kind of elementary stream inside a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Video,
    Audio,
    Subtitle,
    Other,
}

impl TrackKind {
    fn from_identify(kind: &str) -> Self {
        match kind {
            "video" => TrackKind::Video,
            "audio" => TrackKind::Audio,
            "subtitles" | "subtitle" => TrackKind::Subtitle,
            _ => TrackKind::Other,
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrackKind::Video => "video",
            TrackKind::Audio => "audio",
            TrackKind::Subtitle => "subtitle",
            TrackKind::Other => "other",
        };
        f.write_str(s)
    }
}

/// One track as reported by the identification tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackInfo {
    /// Track id, unique within the file
    pub id: u32,
    pub kind: TrackKind,
    /// Raw language tag, `None` when the container carries none
    pub language: Option<String>,
    /// Codec name (informational)
    pub codec: Option<String>,
    pub default_track: bool,
    pub name: Option<String>,
}

impl TrackInfo {
    pub fn is_audio(&self) -> bool {
        self.kind == TrackKind::Audio
    }
}

/// Top-level `mkvmerge -J` document
#[derive(Debug, Deserialize)]
struct IdentifyReport {
    container: Option<IdentifyContainer>,
    tracks: Option<Vec<IdentifyTrack>>,
    #[serde(default)]
    errors: Vec<String>,
    #[serde(default)]
    warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct IdentifyContainer {
    recognized: bool,
    supported: bool,
    #[serde(rename = "type")]
    format: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdentifyTrack {
    id: u32,
    #[serde(rename = "type")]
    kind: String,
    codec: Option<String>,
    #[serde(default)]
    properties: IdentifyTrackProperties,
}

#[derive(Debug, Default, Deserialize)]
struct IdentifyTrackProperties {
    language: Option<String>,
    language_ietf: Option<String>,
    default_track: Option<bool>,
    track_name: Option<String>,
}

impl IdentifyTrackProperties {
    /// ISO 639-2 tag first, IETF tag when the former is missing or undetermined
    fn language_tag(&self) -> Option<String> {
        let usable = |tag: &Option<String>| {
            tag.as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case("und"))
                .map(str::to_string)
        };
        usable(&self.language)
            .or_else(|| usable(&self.language_ietf))
            .or_else(|| self.language.clone())
    }
}

/// Parse identification JSON into tracks, failing closed on any schema problem.
pub fn parse_identify_output(path: &Path, json: &str) -> Result<Vec<TrackInfo>, ProbeError> {
    let report: IdentifyReport = serde_json::from_str(json).map_err(|e| ProbeError::Malformed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    for warning in &report.warnings {
        log::debug!("identify warning for {}: {}", path.display(), warning);
    }

    let container = report.container.ok_or_else(|| ProbeError::Malformed {
        path: path.to_path_buf(),
        message: "missing container section".to_string(),
    })?;

    if !container.recognized || !container.supported {
        let message = if report.errors.is_empty() {
            format!(
                "recognized={}, supported={}",
                container.recognized, container.supported
            )
        } else {
            report.errors.join("; ")
        };
        return Err(ProbeError::Unrecognized {
            path: path.to_path_buf(),
            message,
        });
    }

    let raw_tracks = report.tracks.ok_or_else(|| ProbeError::Malformed {
        path: path.to_path_buf(),
        message: "missing tracks list".to_string(),
    })?;

    let mut seen = HashSet::new();
    let mut tracks = Vec::with_capacity(raw_tracks.len());
    for raw in raw_tracks {
        if !seen.insert(raw.id) {
            return Err(ProbeError::Malformed {
                path: path.to_path_buf(),
                message: format!("duplicate track id {}", raw.id),
            });
        }
        tracks.push(TrackInfo {
            id: raw.id,
            kind: TrackKind::from_identify(&raw.kind),
            language: raw.properties.language_tag(),
            codec: raw.codec,
            default_track: raw.properties.default_track.unwrap_or(false),
            name: raw.properties.track_name,
        });
    }

    log::debug!(
        "identified {} ({}): {} track(s)",
        path.display(),
        container.format.as_deref().unwrap_or("unknown container"),
        tracks.len()
    );

    Ok(tracks)
}
