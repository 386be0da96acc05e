use std::path::{Path, PathBuf};
use anyhow::{bail, Result};
use walkdir::WalkDir;
use log::{debug, info, warn};
use crate::rewrite::is_temp_file;

/// Recursively collect media files under `root`, sorted by path.
///
/// Only regular files whose extension (case-insensitive) is listed are kept;
/// leftover temporary files from the rewriter are ignored.
pub fn find_media_files(root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        bail!("Folder not found: {}", root.display());
    }
    if !root.is_dir() {
        bail!("Path is not a directory: {}", root.display());
    }

    info!("Scanning directory: {}", root.display());

    let mut files = Vec::new();
    let mut entry_count = 0;
    for entry in WalkDir::new(root).follow_links(false) {
        entry_count += 1;
        if entry_count % 1000 == 0 {
            info!("Scanned {} entries so far in {}...", entry_count, root.display());
        }

        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Error reading directory entry: {}", e);
                continue;
            }
        };

        let path = entry.path();
        if !entry.file_type().is_file() || is_temp_file(path) {
            continue;
        }

        let matches = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false);

        if matches {
            debug!("Found media file: {}", path.display());
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    info!("Scan complete: {} entries, {} media file(s)", entry_count, files.len());
    Ok(files)
}
