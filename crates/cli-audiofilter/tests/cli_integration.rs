use assert_cmd::Command;
use predicates::str::contains;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

const MIXED: &str = r#"{"container":{"recognized":true,"supported":true,"type":"Matroska"},"tracks":[{"id":0,"type":"video","properties":{}},{"id":1,"type":"audio","properties":{"language":"eng"}},{"id":2,"type":"audio","properties":{"language":"ger"}}]}"#;
const FILTERED: &str = r#"{"container":{"recognized":true,"supported":true,"type":"Matroska"},"tracks":[{"id":0,"type":"video","properties":{}},{"id":1,"type":"audio","properties":{"language":"eng","default_track":true}}]}"#;

fn eng_audio_cmd() -> Command {
    Command::cargo_bin("eng-audio").expect("Failed to find eng-audio binary")
}

/// Directory holding a shell script that behaves like mkvmerge for JSON fixtures
#[cfg(unix)]
fn fake_tools_dir() -> Result<TempDir, Box<dyn Error>> {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir()?;
    let script = r#"#!/bin/sh
case "$1" in
  --version) echo "mkvmerge v80.0 ('Fake') 64-bit"; exit 0;;
  -J) cat "$2"; exit 0;;
  -o)
    out="$2"
    for last; do :; done
    if [ -f "$last.after" ]; then cp "$last.after" "$out"; exit 0; fi
    echo "Error: simulated remux failure" >&2
    exit 2;;
esac
exit 2
"#;
    let path = dir.path().join("mkvmerge");
    fs::write(&path, script)?;
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
    Ok(dir)
}

fn library_with_mixed_file(with_remux_output: bool) -> Result<(TempDir, PathBuf), Box<dyn Error>> {
    let library = tempdir()?;
    let movie = library.path().join("movie.mkv");
    fs::write(&movie, MIXED)?;
    if with_remux_output {
        fs::write(library.path().join("movie.mkv.after"), FILTERED)?;
    }
    Ok((library, movie))
}

fn read_log(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_default()
}

#[test]
fn test_help_lists_options() -> Result<(), Box<dyn Error>> {
    eng_audio_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("--dry-run"))
        .stdout(contains("--mkv-tools-path"))
        .stdout(contains("BACK UP YOUR FILES"));
    Ok(())
}

#[test]
fn test_root_argument_is_required() -> Result<(), Box<dyn Error>> {
    eng_audio_cmd().assert().failure();
    Ok(())
}

#[test]
fn test_missing_tool_directory_fails() -> Result<(), Box<dyn Error>> {
    let empty_tools = tempdir()?;
    let library = tempdir()?;

    eng_audio_cmd()
        .arg(library.path())
        .arg("--dry-run")
        .arg("--mkv-tools-path")
        .arg(empty_tools.path())
        .assert()
        .failure()
        .stderr(contains("MKVToolNix"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_missing_root_fails() -> Result<(), Box<dyn Error>> {
    let tools = fake_tools_dir()?;
    let logs = tempdir()?;

    eng_audio_cmd()
        .arg("surely/this/does/not/exist")
        .arg("--dry-run")
        .arg("--mkv-tools-path")
        .arg(tools.path())
        .arg("--log-file")
        .arg(logs.path().join("outcomes.log"))
        .assert()
        .failure()
        .stderr(contains("Folder not found"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_dry_run_reports_without_modifying() -> Result<(), Box<dyn Error>> {
    let tools = fake_tools_dir()?;
    let (library, movie) = library_with_mixed_file(true)?;
    let logs = tempdir()?;
    let log_file = logs.path().join("outcomes.log");

    eng_audio_cmd()
        .arg(library.path())
        .arg("--dry-run")
        .arg("--mkv-tools-path")
        .arg(tools.path())
        .arg("--log-file")
        .arg(&log_file)
        .assert()
        .success()
        .stdout(contains("DRY RUN MODE"))
        .stdout(contains("Files that would be modified: 1"));

    assert_eq!(fs::read_to_string(&movie)?, MIXED);
    assert!(read_log(&log_file).contains("DRY-RUN"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_apply_rewrites_and_cleans_stale_temp() -> Result<(), Box<dyn Error>> {
    let tools = fake_tools_dir()?;
    let (library, movie) = library_with_mixed_file(true)?;
    let stale = library.path().join(".movie.mkv.audiofilter-Ab12Cd.tmp");
    fs::write(&stale, "partial")?;
    let logs = tempdir()?;
    let log_file = logs.path().join("outcomes.log");

    eng_audio_cmd()
        .arg(library.path())
        .arg("--yes")
        .arg("--mkv-tools-path")
        .arg(tools.path())
        .arg("--log-file")
        .arg(&log_file)
        .assert()
        .success()
        .stdout(contains("Files modified: 1"));

    assert_eq!(fs::read_to_string(&movie)?, FILTERED);
    assert!(!stale.exists());
    assert!(read_log(&log_file).contains("MODIFIED"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_failed_file_sets_exit_code() -> Result<(), Box<dyn Error>> {
    let tools = fake_tools_dir()?;
    let (library, movie) = library_with_mixed_file(false)?;
    let logs = tempdir()?;
    let log_file = logs.path().join("outcomes.log");

    eng_audio_cmd()
        .arg(library.path())
        .arg("--yes")
        .arg("--mkv-tools-path")
        .arg(tools.path())
        .arg("--log-file")
        .arg(&log_file)
        .assert()
        .failure()
        .stdout(contains("Files with errors: 1"));

    assert_eq!(fs::read_to_string(&movie)?, MIXED);
    let log = read_log(&log_file);
    assert!(log.contains("FAILED"));
    assert!(log.contains("simulated remux failure"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_declined_confirmation_changes_nothing() -> Result<(), Box<dyn Error>> {
    let tools = fake_tools_dir()?;
    let (library, movie) = library_with_mixed_file(true)?;
    let logs = tempdir()?;

    eng_audio_cmd()
        .arg(library.path())
        .arg("--mkv-tools-path")
        .arg(tools.path())
        .arg("--log-file")
        .arg(logs.path().join("outcomes.log"))
        .write_stdin("no\n")
        .assert()
        .success()
        .stdout(contains("Operation cancelled."));

    assert_eq!(fs::read_to_string(&movie)?, MIXED);
    Ok(())
}
