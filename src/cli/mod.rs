//! # CLI Module
//!
//! Command-line interface for the duplicate video cleaner.
//!
//! ## Usage
//! ```bash
//! # Scan a directory for duplicates
//! video-dedup scan ~/Videos
//!
//! # Only the top level, JSON output
//! video-dedup scan ~/Videos --no-recurse --output json
//!
//! # Move every extra copy into a cleanup folder
//! video-dedup clean ~/Videos --cleanup ~/Videos-duplicates
//!
//! # Check what ffprobe sees for one file
//! video-dedup probe ~/Videos/clip.mkv
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use console::{style, Term};
use duplicate_video_cleaner::core::metadata::{FfprobeExtractor, MetadataExtractor};
use duplicate_video_cleaner::core::pipeline::{MoveSummary, ScanId, ScanOrchestrator, ScanResults};
use duplicate_video_cleaner::core::scanner::{validate_path, ScanConfig};
use duplicate_video_cleaner::error::{MoveError, Result, VideoDedupError};
use duplicate_video_cleaner::events::{Event, EventBus, EventReceiver};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Duplicate Video Cleaner - Move extra copies aside, never delete
#[derive(Parser, Debug)]
#[command(name = "video-dedup")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan a directory for duplicate videos
    Scan {
        /// Directory to scan
        path: PathBuf,

        #[command(flatten)]
        scan: ScanArgs,
    },

    /// Scan, then move every extra copy into a cleanup directory
    Clean {
        /// Directory to scan
        path: PathBuf,

        /// Where extra copies are moved to, mirroring their layout
        #[arg(long)]
        cleanup: PathBuf,

        /// Only move these files (may be repeated)
        #[arg(long = "only", value_name = "FILE")]
        only: Vec<PathBuf>,

        #[command(flatten)]
        scan: ScanArgs,
    },

    /// Check that a path exists and report its kind
    Validate {
        path: PathBuf,
    },

    /// Print the metadata extracted for one file
    Probe {
        file: PathBuf,

        /// ffprobe executable
        #[arg(long, env = "VIDEO_DEDUP_FFPROBE", default_value = "ffprobe")]
        ffprobe: PathBuf,
    },
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Only scan the top level of the directory
    #[arg(long)]
    no_recurse: bool,

    /// Skip hidden files and directories
    #[arg(long)]
    skip_hidden: bool,

    /// Output format
    #[arg(short, long, default_value = "pretty")]
    output: OutputFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// ffprobe executable
    #[arg(long, env = "VIDEO_DEDUP_FFPROBE", default_value = "ffprobe")]
    ffprobe: PathBuf,

    /// Give up on a file after this many seconds
    #[arg(long, value_name = "SECS")]
    probe_timeout: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (paths only)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { path, scan } => {
            duplicate_video_cleaner::init_tracing(log_directive(scan.verbose));
            run_scan(&path, &scan)
        }
        Commands::Clean {
            path,
            cleanup,
            only,
            scan,
        } => {
            duplicate_video_cleaner::init_tracing(log_directive(scan.verbose));
            run_clean(&path, cleanup, only, &scan)
        }
        Commands::Validate { path } => {
            duplicate_video_cleaner::init_tracing(log_directive(false));
            println!("{}", serde_json::to_string_pretty(&validate_path(&path))?);
            Ok(())
        }
        Commands::Probe { file, ffprobe } => {
            duplicate_video_cleaner::init_tracing(log_directive(false));
            let metadata = FfprobeExtractor::new().with_program(ffprobe).extract(&file);
            println!("{}", serde_json::to_string_pretty(&metadata)?);
            Ok(())
        }
    }
}

fn log_directive(verbose: bool) -> &'static str {
    if verbose {
        "duplicate_video_cleaner=debug"
    } else {
        "duplicate_video_cleaner=warn"
    }
}

/// A finished scan plus the live handles needed to move its files
struct CompletedScan {
    orchestrator: ScanOrchestrator,
    receiver: EventReceiver,
    scan_id: ScanId,
    results: ScanResults,
}

fn run_scan(path: &Path, args: &ScanArgs) -> Result<()> {
    let term = Term::stderr();
    print_header(&term, args.output);

    let scan = scan_to_completion(path, args)?;

    match args.output {
        OutputFormat::Pretty => print_pretty_results(&term, &scan.results, args.verbose),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&scan.results)?),
        OutputFormat::Minimal => print_minimal_results(&scan.results),
    }

    Ok(())
}

fn run_clean(path: &Path, cleanup: PathBuf, only: Vec<PathBuf>, args: &ScanArgs) -> Result<()> {
    let term = Term::stderr();
    print_header(&term, args.output);

    let scan = scan_to_completion(path, args)?;
    if args.output == OutputFormat::Pretty {
        print_pretty_results(&term, &scan.results, args.verbose);
    }

    // Scan paths are absolute, so match against absolute selections
    let only: Vec<PathBuf> = only
        .into_iter()
        .map(|p| p.canonicalize().unwrap_or(p))
        .collect();

    let ticket = match scan
        .orchestrator
        .start_move(&scan.scan_id, cleanup, Some(&only))
    {
        Ok(ticket) => ticket,
        Err(MoveError::NothingToMove) => {
            print_nothing_to_move(&term, args.output)?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let progress = progress_bar(args.output, ticket.total_files as u64);
    let summary = loop {
        let Some(event) = scan.receiver.recv() else {
            return Err(VideoDedupError::EventStreamClosed("move"));
        };
        if event.scan_id() != scan.scan_id {
            continue;
        }
        match event {
            Event::MoveProgress {
                progress: step,
                message,
                ..
            } => {
                if let Some(ref pb) = progress {
                    pb.set_position(step.current as u64);
                    pb.set_message(message);
                }
            }
            Event::MoveComplete { results, .. } => break results,
            _ => {}
        }
    };
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    match args.output {
        OutputFormat::Pretty => print_pretty_move(&term, &summary, args.verbose),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Minimal => {
            for result in summary.move_results.iter().filter(|r| r.success) {
                if let Some(ref destination) = result.destination_path {
                    println!("{}", destination.display());
                }
            }
        }
    }

    Ok(())
}

fn scan_to_completion(path: &Path, args: &ScanArgs) -> Result<CompletedScan> {
    let bus = EventBus::new();
    let receiver = bus.subscribe();

    let extractor = FfprobeExtractor::new()
        .with_program(args.ffprobe.clone())
        .with_timeout(args.probe_timeout.map(Duration::from_secs));

    let orchestrator = ScanOrchestrator::builder()
        .scan_config(ScanConfig {
            include_hidden: !args.skip_hidden,
            ..ScanConfig::default()
        })
        .extractor(extractor)
        .events(bus)
        .build();

    let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let scan_id = orchestrator.start_scan(root, !args.no_recurse)?;

    let progress = progress_bar(args.output, 0);
    loop {
        let Some(event) = receiver.recv() else {
            return Err(VideoDedupError::EventStreamClosed("scan"));
        };
        if event.scan_id() != scan_id {
            continue;
        }
        match event {
            Event::ScanProgress {
                phase,
                message,
                progress: step,
                ..
            } => {
                if let Some(ref pb) = progress {
                    if let Some(step) = step {
                        pb.set_length(step.total as u64);
                        pb.set_position(step.current as u64);
                    }
                    let message = message.unwrap_or_else(|| phase.to_string());
                    if args.verbose {
                        pb.println(format!("  {} {}", style(phase).dim(), message));
                    }
                    pb.set_message(message);
                }
            }
            Event::ScanComplete { .. } => break,
            Event::ScanError { error, .. } => {
                if let Some(pb) = progress {
                    pb.abandon_with_message(error.clone());
                }
                return Err(VideoDedupError::ScanFailed(error));
            }
            _ => {}
        }
    }
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let results = orchestrator
        .get_scan(&scan_id)
        .and_then(|record| record.results)
        .ok_or_else(|| VideoDedupError::ScanFailed(format!("results for {scan_id} are missing")))?;

    Ok(CompletedScan {
        orchestrator,
        receiver,
        scan_id,
        results,
    })
}

fn progress_bar(output: OutputFormat, length: u64) -> Option<ProgressBar> {
    if output != OutputFormat::Pretty {
        return None;
    }
    let pb = ProgressBar::new(length);
    if let Ok(bar_style) =
        ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(bar_style.progress_chars("█▓░"));
    }
    Some(pb)
}

fn print_header(term: &Term, output: OutputFormat) {
    if output == OutputFormat::Pretty {
        term.write_line(&format!(
            "{} {}",
            style("Duplicate Video Cleaner").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }
}

fn print_pretty_results(term: &Term, results: &ScanResults, verbose: bool) {
    term.write_line(&format!("{} Scan Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} video files found",
        style(results.video_count).cyan()
    ))
    .ok();

    let Some(ref summary) = results.summary else {
        term.write_line("").ok();
        term.write_line("  No video files found.").ok();
        return;
    };

    term.write_line(&format!(
        "  {} duplicate groups",
        style(summary.duplicate_group_count).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} files to move",
        style(summary.total_files_to_move).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} potential space savings",
        style(format!(
            "{:.2} MB ({:.2} GB)",
            summary.space_to_save_mb, summary.space_to_save_gb
        ))
        .yellow()
    ))
    .ok();
    term.write_line("").ok();

    if results.duplicate_groups.is_empty() {
        term.write_line(&format!("  {} No duplicates found!", style("🎉").green()))
            .ok();
        return;
    }

    term.write_line(&format!("{}", style("Duplicate Groups:").bold().underlined()))
        .ok();
    term.write_line("").ok();

    for group in &results.duplicate_groups {
        term.write_line(&format!(
            "  {} {} {} ({} files, {:.2} MB to save)",
            style(format!("Group {}:", group.group_number)).bold(),
            style(&group.resolution_label).yellow(),
            style(format!("{:.2}s", group.duration_seconds)).yellow(),
            group.file_count,
            group.space_to_save_mb
        ))
        .ok();

        for video in group.members() {
            let marker = if video.file_path == group.kept_file.file_path {
                style("★").green().to_string()
            } else {
                style("○").dim().to_string()
            };
            term.write_line(&format!(
                "    {} {} {}",
                marker,
                display_path(&video.file_path),
                style(format!("{:.2} MB", video.size_mb)).dim()
            ))
            .ok();
        }

        if verbose {
            term.write_line(&format!(
                "    {} {}",
                style("Keeping:").dim(),
                style(&group.kept_file.file_name).dim()
            ))
            .ok();
        }
        term.write_line("").ok();
    }

    term.write_line(&format!(
        "{}",
        style("Nothing is deleted: extras are moved into the cleanup folder.").dim()
    ))
    .ok();
}

fn print_minimal_results(results: &ScanResults) {
    for file in &results.files_to_move {
        println!("{}", file.source_path.display());
    }
}

fn print_pretty_move(term: &Term, summary: &MoveSummary, verbose: bool) {
    term.write_line("").ok();
    term.write_line(&format!("{} Move Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();
    term.write_line(&format!(
        "  {} of {} files moved ({} GB)",
        style(summary.success_count).cyan(),
        summary.total_files,
        style(format!("{:.2}", summary.total_gb_moved)).yellow()
    ))
    .ok();

    if summary.failure_count > 0 {
        term.write_line(&format!(
            "  {} failed",
            style(summary.failure_count).red().bold()
        ))
        .ok();
    }

    for result in &summary.move_results {
        match (&result.destination_path, &result.error) {
            (_, Some(error)) => {
                term.write_line(&format!(
                    "    {} {}: {}",
                    style("✗").red(),
                    display_path(&result.source_path),
                    error
                ))
                .ok();
            }
            (Some(destination), None) if verbose => {
                term.write_line(&format!(
                    "    {} {} -> {}",
                    style("✓").green(),
                    display_path(&result.source_path),
                    display_path(destination)
                ))
                .ok();
            }
            _ => {}
        }
    }
}

fn print_nothing_to_move(term: &Term, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Pretty => {
            term.write_line("").ok();
            term.write_line(&format!(
                "{} No duplicates found, nothing to move.",
                style("✓").green().bold()
            ))
            .ok();
        }
        OutputFormat::Json => {
            let empty = MoveSummary {
                total_files: 0,
                success_count: 0,
                failure_count: 0,
                total_bytes_moved: 0,
                total_gb_moved: 0.0,
                move_results: Vec::new(),
            };
            println!("{}", serde_json::to_string_pretty(&empty)?);
        }
        OutputFormat::Minimal => {}
    }
    Ok(())
}

/// Shorten paths under the home directory to `~/...`
fn display_path(path: &Path) -> String {
    match dirs::home_dir() {
        Some(home) => match path.strip_prefix(&home) {
            Ok(rest) => format!("~/{}", rest.display()),
            Err(_) => path.display().to_string(),
        },
        None => path.display().to_string(),
    }
}
