//! Atomic in-place rewrite of a container.
//!
//! The remux output is written to a temporary file next to the original and
//! renamed over it only after the tool succeeded and the output checked out.
//! The temporary file is held as a [`TempPath`], so every early return removes
//! it and the original is never touched on failure.

use std::fs;
use std::path::{Path, PathBuf};
use log::{debug, error, info, warn};
use tempfile::TempPath;
use walkdir::WalkDir;
use crate::config::FilterConfig;
use crate::error::{FilesystemError, Result, RewriteError};
use crate::plan::RewritePlan;
use crate::tools::MediaToolkit;

/// Marker embedded in temporary file names
pub const TEMP_MARKER: &str = ".audiofilter-";

/// Suffix of temporary files
pub const TEMP_SUFFIX: &str = ".tmp";

/// Sizes before and after a successful rewrite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteReport {
    pub bytes_before: u64,
    pub bytes_after: u64,
}

impl RewriteReport {
    pub fn bytes_saved(&self) -> u64 {
        self.bytes_before.saturating_sub(self.bytes_after)
    }
}

/// Replaces a file with its filtered remux, or leaves it untouched
#[derive(Debug, Clone)]
pub struct AtomicRewriter {
    verify_output: bool,
    rewrite_extensions: Vec<String>,
}

impl AtomicRewriter {
    pub fn new(verify_output: bool, rewrite_extensions: Vec<String>) -> Self {
        AtomicRewriter {
            verify_output,
            rewrite_extensions,
        }
    }

    pub fn from_config(cfg: &FilterConfig) -> Self {
        Self::new(cfg.verify_output, cfg.rewrite_extensions.clone())
    }

    /// Remux `path` according to `plan` and atomically swap the result in
    pub fn rewrite<T: MediaToolkit + ?Sized>(
        &self,
        toolkit: &T,
        path: &Path,
        plan: &RewritePlan,
    ) -> Result<RewriteReport> {
        self.check_container(path)?;

        let before = fs::metadata(path).map_err(|e| FilesystemError::new("stat", path, e))?;
        let temp = create_temp_path(path)?;
        debug!("Temporary output for {}: {}", path.display(), temp.display());

        toolkit.remux(path, &temp, plan)?;

        if self.verify_output {
            verify_output(toolkit, path, &temp, plan)?;
        }

        let current = fs::metadata(path).map_err(|e| FilesystemError::new("stat", path, e))?;
        if current.len() != before.len() || current.modified().ok() != before.modified().ok() {
            return Err(RewriteError::SourceChanged {
                path: path.to_path_buf(),
            }
            .into());
        }

        fs::set_permissions(&temp, before.permissions())
            .map_err(|e| FilesystemError::new("copy permissions", temp.to_path_buf(), e))?;
        let bytes_after = fs::metadata(&temp)
            .map_err(|e| FilesystemError::new("stat", temp.to_path_buf(), e))?
            .len();

        swap_into_place(temp, path)?;

        info!(
            "Replaced {} ({} -> {} bytes)",
            path.display(),
            before.len(),
            bytes_after
        );

        Ok(RewriteReport {
            bytes_before: before.len(),
            bytes_after,
        })
    }

    /// Reject files whose container the remux tool cannot write back in place
    pub fn check_container(&self, path: &Path) -> std::result::Result<(), RewriteError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_string();
        if self
            .rewrite_extensions
            .iter()
            .any(|r| r.eq_ignore_ascii_case(&extension))
        {
            Ok(())
        } else {
            Err(RewriteError::UnsupportedContainer {
                path: path.to_path_buf(),
                extension,
            })
        }
    }
}

/// Longest slice of the original file name embedded in a temp name
const TEMP_NAME_CHARS: usize = 64;

/// Allocate `.<name>.audiofilter-XXXXXX.tmp` in the original's directory
fn create_temp_path(path: &Path) -> Result<TempPath> {
    let dir = parent_dir(path);
    // Long names are cut so the temp name stays within NAME_MAX
    let file_name: String = path
        .file_name()
        .map(|n| n.to_string_lossy().chars().take(TEMP_NAME_CHARS).collect())
        .unwrap_or_default();

    let temp = tempfile::Builder::new()
        .prefix(&format!(".{}{}", file_name, TEMP_MARKER))
        .suffix(TEMP_SUFFIX)
        .tempfile_in(&dir)
        .map_err(|e| FilesystemError::new("create temporary file", dir, e))?;
    Ok(temp.into_temp_path())
}

/// Single same-directory rename. On failure the returned TempPath is dropped,
/// which removes the temporary file.
fn swap_into_place(temp: TempPath, path: &Path) -> Result<()> {
    temp.persist(path)
        .map_err(|e| FilesystemError::new("rename", path, e.error))?;
    Ok(())
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Re-identify the output and compare track counts with the plan
fn verify_output<T: MediaToolkit + ?Sized>(
    toolkit: &T,
    original: &Path,
    output: &Path,
    plan: &RewritePlan,
) -> std::result::Result<(), RewriteError> {
    let fail = |message: String| RewriteError::Verification {
        path: original.to_path_buf(),
        message,
    };

    let size = fs::metadata(output)
        .map_err(|e| fail(format!("cannot stat output: {}", e)))?
        .len();
    if size == 0 {
        return Err(fail("output is empty".to_string()));
    }

    let tracks = toolkit
        .identify(output)
        .map_err(|e| fail(format!("output is not a readable container: {}", e)))?;

    let audio = tracks.iter().filter(|t| t.is_audio()).count();
    if tracks.len() != plan.keep.len() || audio != plan.kept_audio.len() {
        return Err(fail(format!(
            "expected {} track(s) with {} audio, found {} with {} audio",
            plan.keep.len(),
            plan.kept_audio.len(),
            tracks.len(),
            audio
        )));
    }
    Ok(())
}

/// True for temporary files created by [`AtomicRewriter`]
pub fn is_temp_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| name.starts_with('.') && name.contains(TEMP_MARKER) && name.ends_with(TEMP_SUFFIX))
        .unwrap_or(false)
}

/// Remove temporary files left behind by an interrupted earlier run.
/// Returns the number of files deleted.
pub fn cleanup_stale_temp_files(root: &Path) -> usize {
    let mut cleaned = 0;
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Error reading directory entry: {}", e);
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || !is_temp_file(path) {
            continue;
        }
        match fs::remove_file(path) {
            Ok(()) => {
                info!("🗑️  Deleted stale temp file: {}", path.display());
                cleaned += 1;
            }
            Err(e) => error!("Failed to delete stale temp file {}: {}", path.display(), e),
        }
    }
    cleaned
}
