// Shared helpers for the pipeline tests.
//
// "Media files" here are mkvmerge -J documents: FakeToolkit identifies a file
// by parsing its content and remuxes by writing a filtered document.

#![allow(dead_code)]

use audiofilter::probe::parse_identify_output;
use audiofilter::{MediaToolkit, ProbeError, RewriteError, RewritePlan, TrackInfo};
use serde_json::{json, Value};
use std::cell::{Cell, RefCell};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// What the fake remux should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemuxBehavior {
    /// Write the filtered document
    Succeed,
    /// Write a truncated document, then report a tool failure
    FailAfterPartialWrite,
    /// Write the filtered document, then append to the source as another writer would
    AppendToSource,
    /// Report success but keep every track
    IgnorePlan,
}

pub struct FakeToolkit {
    behavior: RemuxBehavior,
    pub identify_calls: Cell<usize>,
    pub remux_calls: RefCell<Vec<(PathBuf, PathBuf)>>,
}

impl FakeToolkit {
    pub fn new() -> Self {
        Self::with_behavior(RemuxBehavior::Succeed)
    }

    pub fn with_behavior(behavior: RemuxBehavior) -> Self {
        FakeToolkit {
            behavior,
            identify_calls: Cell::new(0),
            remux_calls: RefCell::new(Vec::new()),
        }
    }

    pub fn remux_count(&self) -> usize {
        self.remux_calls.borrow().len()
    }
}

impl MediaToolkit for FakeToolkit {
    fn identify(&self, path: &Path) -> Result<Vec<TrackInfo>, ProbeError> {
        self.identify_calls.set(self.identify_calls.get() + 1);
        let content = fs::read_to_string(path).map_err(|e| ProbeError::Failed {
            tool: "fake".to_string(),
            path: path.to_path_buf(),
            code: Some(2),
            message: e.to_string(),
        })?;
        parse_identify_output(path, &content)
    }

    fn remux(&self, source: &Path, destination: &Path, plan: &RewritePlan) -> Result<(), RewriteError> {
        self.remux_calls
            .borrow_mut()
            .push((source.to_path_buf(), destination.to_path_buf()));

        let failed = |message: &str| RewriteError::Failed {
            tool: "fake".to_string(),
            path: source.to_path_buf(),
            code: Some(2),
            message: message.to_string(),
        };

        let content = fs::read_to_string(source).map_err(|e| failed(&e.to_string()))?;
        let mut doc: Value = serde_json::from_str(&content).map_err(|e| failed(&e.to_string()))?;

        match self.behavior {
            RemuxBehavior::FailAfterPartialWrite => {
                fs::write(destination, &content[..content.len() / 2]).map_err(|e| failed(&e.to_string()))?;
                Err(failed("simulated write error"))
            }
            RemuxBehavior::IgnorePlan => {
                fs::write(destination, content).map_err(|e| failed(&e.to_string()))
            }
            RemuxBehavior::Succeed | RemuxBehavior::AppendToSource => {
                let tracks = doc["tracks"].as_array().cloned().unwrap_or_default();
                let kept: Vec<Value> = tracks
                    .into_iter()
                    .filter(|t| {
                        t["id"]
                            .as_u64()
                            .map(|id| plan.keep.contains(&(id as u32)))
                            .unwrap_or(false)
                    })
                    .enumerate()
                    .map(|(new_id, mut t)| {
                        let old_id = t["id"].as_u64().unwrap_or(0) as u32;
                        if t["type"] == "audio" {
                            t["properties"]["default_track"] = json!(plan.default_audio == Some(old_id));
                        }
                        t["id"] = json!(new_id);
                        t
                    })
                    .collect();
                doc["tracks"] = Value::Array(kept);
                fs::write(destination, doc.to_string()).map_err(|e| failed(&e.to_string()))?;
                if self.behavior == RemuxBehavior::AppendToSource {
                    let mut source_file = fs::OpenOptions::new()
                        .append(true)
                        .open(source)
                        .map_err(|e| failed(&e.to_string()))?;
                    source_file.write_all(b"\n").map_err(|e| failed(&e.to_string()))?;
                }
                Ok(())
            }
        }
    }
}

/// Build an identify document from (type, language) pairs; ids follow order
pub fn media_doc(tracks: &[(&str, Option<&str>)]) -> String {
    let tracks: Vec<Value> = tracks
        .iter()
        .enumerate()
        .map(|(id, (kind, language))| {
            let mut properties = json!({});
            if let Some(lang) = language {
                properties["language"] = json!(lang);
            }
            json!({"id": id, "type": kind, "codec": "fake", "properties": properties})
        })
        .collect();
    json!({
        "container": {"recognized": true, "supported": true, "type": "Matroska"},
        "errors": [],
        "warnings": [],
        "tracks": tracks,
    })
    .to_string()
}

pub fn write_media(dir: &Path, name: &str, tracks: &[(&str, Option<&str>)]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, media_doc(tracks)).expect("write media fixture");
    path
}

/// Video, English audio, French audio, English subtitles
pub fn mixed_tracks() -> Vec<(&'static str, Option<&'static str>)> {
    vec![
        ("video", Some("und")),
        ("audio", Some("eng")),
        ("audio", Some("fre")),
        ("subtitles", Some("eng")),
    ]
}

pub fn temp_files_in(dir: &Path) -> Vec<PathBuf> {
    fs::read_dir(dir)
        .expect("read dir")
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| audiofilter::rewrite::is_temp_file(p))
        .collect()
}
