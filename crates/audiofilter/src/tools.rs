//! mkvmerge location and invocation.
//!
//! Both external capabilities (identification and remuxing) are served by
//! mkvmerge. The [`MediaToolkit`] trait is the seam the rest of the crate
//! depends on.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use log::{debug, info, warn};
use crate::error::{ProbeError, RewriteError, ToolError};
use crate::plan::RewritePlan;
use crate::probe::{parse_identify_output, TrackInfo};

const MKVMERGE: &str = "mkvmerge";

/// Exit code mkvmerge uses for "finished with warnings"
const EXIT_WARNINGS: i32 = 1;

/// Identification and remux capabilities used by the pipeline
pub trait MediaToolkit {
    /// List the tracks of a container without modifying it
    fn identify(&self, path: &Path) -> Result<Vec<TrackInfo>, ProbeError>;

    /// Write a copy of `source` holding only the tracks the plan keeps to `destination`
    fn remux(&self, source: &Path, destination: &Path, plan: &RewritePlan) -> Result<(), RewriteError>;
}

/// [`MediaToolkit`] backed by the mkvmerge executable
#[derive(Debug, Clone)]
pub struct Mkvmerge {
    bin: PathBuf,
}

impl Mkvmerge {
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Mkvmerge { bin: bin.into() }
    }

    /// Locate mkvmerge (explicit directory, PATH, then common install locations)
    pub fn locate(tools_dir: Option<&Path>) -> Result<Self, ToolError> {
        locate_tool(MKVMERGE, tools_dir).map(Self::new)
    }

    pub fn bin(&self) -> &Path {
        &self.bin
    }

    /// Run `mkvmerge --version` and return the version line
    pub fn preflight(&self) -> Result<String, ToolError> {
        let output = Command::new(&self.bin)
            .arg("--version")
            .output()
            .map_err(|e| ToolError::Unusable {
                tool: MKVMERGE.to_string(),
                path: self.bin.clone(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(ToolError::Unusable {
                tool: MKVMERGE.to_string(),
                path: self.bin.clone(),
                message: format!("--version exited with {}", output.status),
            });
        }

        let version = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or("unknown version")
            .trim()
            .to_string();
        info!("mkvmerge found: {} ({})", self.bin.display(), version);
        Ok(version)
    }
}

impl MediaToolkit for Mkvmerge {
    fn identify(&self, path: &Path) -> Result<Vec<TrackInfo>, ProbeError> {
        debug!("Running: {} -J {}", self.bin.display(), path.display());

        let output = Command::new(&self.bin)
            .arg("-J")
            .arg(path)
            .output()
            .map_err(|source| ProbeError::Spawn {
                tool: MKVMERGE.to_string(),
                path: path.to_path_buf(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let code = output.status.code();
        if !output.status.success() && code != Some(EXIT_WARNINGS) {
            // mkvmerge reports unreadable containers through the JSON errors list
            if let Err(err @ ProbeError::Unrecognized { .. }) = parse_identify_output(path, &stdout) {
                return Err(err);
            }
            return Err(ProbeError::Failed {
                tool: MKVMERGE.to_string(),
                path: path.to_path_buf(),
                code,
                message: failure_message(&output.stderr, &output.stdout),
            });
        }

        parse_identify_output(path, &stdout)
    }

    fn remux(&self, source: &Path, destination: &Path, plan: &RewritePlan) -> Result<(), RewriteError> {
        let args = remux_args(source, destination, plan);
        debug!(
            "Running: {} {}",
            self.bin.display(),
            args.iter().map(|a| a.to_string_lossy()).collect::<Vec<_>>().join(" ")
        );

        let output = Command::new(&self.bin)
            .args(&args)
            .output()
            .map_err(|source_err| RewriteError::Spawn {
                tool: MKVMERGE.to_string(),
                path: source.to_path_buf(),
                source: source_err,
            })?;

        match output.status.code() {
            Some(0) => Ok(()),
            Some(EXIT_WARNINGS) => {
                warn!(
                    "mkvmerge finished with warnings for {}: {}",
                    source.display(),
                    failure_message(&output.stderr, &output.stdout)
                );
                Ok(())
            }
            code => Err(RewriteError::Failed {
                tool: MKVMERGE.to_string(),
                path: source.to_path_buf(),
                code,
                message: failure_message(&output.stderr, &output.stdout),
            }),
        }
    }
}

/// Build the mkvmerge argument list for a plan
pub fn remux_args(source: &Path, destination: &Path, plan: &RewritePlan) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-o".into(), destination.as_os_str().to_owned()];

    if plan.kept_audio.is_empty() {
        args.push("--no-audio".into());
    } else {
        let ids: Vec<String> = plan.kept_audio.iter().map(|id| id.to_string()).collect();
        args.push("--audio-tracks".into());
        args.push(ids.join(",").into());
    }

    if let Some(default_id) = plan.default_audio {
        for id in &plan.kept_audio {
            let flag = if *id == default_id { "yes" } else { "no" };
            args.push("--default-track-flag".into());
            args.push(format!("{}:{}", id, flag).into());
        }
    }

    args.push(source.as_os_str().to_owned());
    args
}

/// Locate an executable: explicit directory, PATH, then well-known install locations
pub fn locate_tool(name: &str, tools_dir: Option<&Path>) -> Result<PathBuf, ToolError> {
    let exe_name = executable_name(name);

    if let Some(dir) = tools_dir {
        let candidate = dir.join(&exe_name);
        if candidate.is_file() {
            return Ok(candidate);
        }
        return Err(ToolError::NotInDirectory {
            tool: exe_name,
            path: candidate,
        });
    }

    if let Ok(path) = which::which(&exe_name) {
        return Ok(path);
    }

    let found = common_install_dirs()
        .into_iter()
        .map(|dir| dir.join(&exe_name))
        .find(|candidate| candidate.is_file());
    found.ok_or(ToolError::NotFound { tool: exe_name })
}

fn executable_name(name: &str) -> String {
    if cfg!(windows) {
        format!("{}.exe", name)
    } else {
        name.to_string()
    }
}

fn common_install_dirs() -> Vec<PathBuf> {
    if cfg!(windows) {
        vec![
            PathBuf::from(r"C:\Program Files\MKVToolNix"),
            PathBuf::from(r"C:\Program Files (x86)\MKVToolNix"),
            PathBuf::from(r"C:\MKVToolNix"),
        ]
    } else {
        let mut dirs: Vec<PathBuf> = [
            "/usr/bin",
            "/usr/local/bin",
            "/opt/mkvtoolnix/bin",
            "/snap/bin",
            "/usr/local/mkvtoolnix/bin",
            "/home/linuxbrew/.linuxbrew/bin",
        ]
        .iter()
        .map(PathBuf::from)
        .collect();
        if let Some(home) = std::env::var_os("HOME") {
            dirs.push(PathBuf::from(home).join(".local/bin"));
        }
        dirs
    }
}

/// Prefer stderr; mkvmerge prints most diagnostics on stdout
fn failure_message(stderr: &[u8], stdout: &[u8]) -> String {
    let stderr = String::from_utf8_lossy(stderr);
    let text = if stderr.trim().is_empty() {
        String::from_utf8_lossy(stdout)
    } else {
        stderr
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        "no diagnostic output".to_string()
    } else {
        trimmed.to_string()
    }
}
