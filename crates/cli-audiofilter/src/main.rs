use anyhow::{Context, Result};
use audiofilter::{
    config::{FilterConfig, ProcessingMode, UntaggedPolicy},
    rewrite, scan, BatchSummary, FileProcessor, Mkvmerge, OutcomeLog,
};
use clap::Parser;
use humansize::{format_size, DECIMAL};
use log::{error, info, warn, LevelFilter};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

/// Remove non-English audio tracks from video files using mkvmerge
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = None,
    after_help = "WARNING: This tool modifies files in place. BACK UP YOUR FILES FIRST!"
)]
struct Args {
    /// Folder containing video files to process (subdirectories included)
    root: PathBuf,

    /// Show what would be done without modifying any file
    #[arg(long)]
    dry_run: bool,

    /// Directory containing the MKVToolNix executables (optional if in PATH)
    #[arg(long, value_name = "DIR")]
    mkv_tools_path: Option<PathBuf>,

    /// Path to configuration file (JSON or TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Append per-file outcomes to this file
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Treat audio tracks without a language tag as English
    #[arg(long)]
    keep_untagged: bool,

    /// Do not ask for confirmation before modifying files
    #[arg(short, long)]
    yes: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // RUST_LOG wins; --verbose raises the default from info to debug
    let default_level = if args.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .format_timestamp_secs()
        .init();

    let mut cfg = FilterConfig::load_config(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(dir) = args.mkv_tools_path.clone() {
        cfg.mkv_tools_path = Some(dir);
    }
    if let Some(log_file) = args.log_file.clone() {
        cfg.outcome_log = log_file;
    }
    if args.keep_untagged {
        cfg.untagged_audio = UntaggedPolicy::Keep;
    }

    let mode = if args.dry_run { ProcessingMode::DryRun } else { ProcessingMode::Apply };

    info!("Configuration loaded:");
    info!("  English codes: {:?}", cfg.english_codes);
    info!("  Untagged audio: {:?}", cfg.untagged_audio);
    info!("  No-English audio: {:?}", cfg.no_english_audio);
    info!("  Outcome log: {}", cfg.outcome_log.display());

    // Pre-flight: without mkvmerge nothing can be processed
    let mkvmerge = match Mkvmerge::locate(cfg.mkv_tools_path.as_deref()) {
        Ok(tool) => tool,
        Err(e) => return Ok(tool_missing(&e.to_string())),
    };
    if let Err(e) = mkvmerge.preflight() {
        return Ok(tool_missing(&e.to_string()));
    }

    if mode == ProcessingMode::Apply && !args.yes && !confirm()? {
        println!("Operation cancelled.");
        return Ok(ExitCode::SUCCESS);
    }

    println!("\nProcessing folder: {}", args.root.display());
    if mode.is_dry_run() {
        println!("DRY RUN MODE: No files will be modified");
    }

    let files = scan::find_media_files(&args.root, &cfg.media_extensions)
        .context("Failed to scan input folder")?;

    if mode == ProcessingMode::Apply {
        let cleaned = rewrite::cleanup_stale_temp_files(&args.root);
        if cleaned > 0 {
            warn!("Removed {} temp file(s) left by an interrupted run", cleaned);
        }
    }

    if files.is_empty() {
        println!("No video files found in {}", args.root.display());
        return Ok(ExitCode::SUCCESS);
    }
    info!("Found {} video files to process", files.len());

    let mut outcome_log = OutcomeLog::open(&cfg.outcome_log)
        .with_context(|| format!("Failed to open outcome log: {}", cfg.outcome_log.display()))?;

    let processor = FileProcessor::from_config(mkvmerge, &cfg, mode);
    let summary = processor.process_batch(&files, &mut outcome_log);

    print_summary(&summary, mode, &cfg);

    if summary.has_failures() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn tool_missing(message: &str) -> ExitCode {
    error!("{}", message);
    eprintln!("Error: {}", message);
    eprintln!("\nMake sure MKVToolNix is installed and either:");
    eprintln!("1. Add it to your system PATH, or");
    eprintln!("2. Specify the path using --mkv-tools-path");
    ExitCode::FAILURE
}

fn confirm() -> Result<bool> {
    println!("WARNING: This tool will modify your video files directly!");
    println!("Make sure you have backed up your files before proceeding.");
    print!("Do you want to continue? (yes/no): ");
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "yes" | "y"))
}

fn print_summary(summary: &BatchSummary, mode: ProcessingMode, cfg: &FilterConfig) {
    println!("\n=== Processing Complete ===");
    println!("Total files found: {}", summary.total);
    if mode.is_dry_run() {
        println!("Files that would be modified: {}", summary.planned);
    } else {
        println!("Files modified: {}", summary.modified);
        println!("Space reclaimed: {}", format_size(summary.bytes_saved, DECIMAL));
    }
    println!("Files skipped: {}", summary.skipped);
    println!("Files with errors: {}", summary.failed);

    if summary.has_failures() {
        println!("\nCheck {} for detailed error information", cfg.outcome_log.display());
    }
}
