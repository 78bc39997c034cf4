//! # CLI Module
//!
//! Command-line interface for media-tidy.
//!
//! ## Usage
//! ```bash
//! # Preview every step (dry-run is the default)
//! media-tidy --dir ~/memories all
//!
//! # Quarantine duplicates for real, without the prompt
//! media-tidy --dir ~/memories dedupe --apply --yes
//!
//! # JSON output
//! media-tidy --dir ~/memories shorten --output json
//! ```

mod output;

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use media_tidy::core::config::{TidyConfig, DEFAULT_QUARANTINE_DIR};
use media_tidy::core::operations::{
    self, apply_plan, plan_delete_overlays, plan_find_duplicates, plan_flatten, plan_rename,
    plan_shorten, OperationKind, OperationReport,
};
use media_tidy::core::CancellationToken;
use media_tidy::error::Result;
use media_tidy::events::{ApplyEvent, Event, EventChannel, EventSender, HashEvent, ScanEvent};
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread::{self, JoinHandle};
use tracing::warn;

/// Media Tidy - Date, dedupe and rename exported photos and videos
#[derive(Parser, Debug)]
#[command(name = "media-tidy")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory to tidy
    #[arg(short, long, global = true, default_value = ".")]
    dir: PathBuf,

    /// Change files on disk (without this every command is a dry-run)
    #[arg(long, global = true)]
    apply: bool,

    /// Do not ask for confirmation before applying
    #[arg(short, long, global = true)]
    yes: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "pretty")]
    output: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Name of the quarantine subdirectory for duplicates
    #[arg(long, global = true, default_value = DEFAULT_QUARANTINE_DIR)]
    quarantine_dir: String,

    /// Include hidden files
    #[arg(long, global = true)]
    include_hidden: bool,

    /// Follow symbolic links
    #[arg(long, global = true)]
    follow_symlinks: bool,

    /// Hashing threads (0 = one per core)
    #[arg(long, global = true, default_value = "0")]
    threads: usize,

    /// Extra directory to search for overlays (repeatable)
    #[arg(long = "overlay-dir", global = true)]
    overlay_dirs: Vec<PathBuf>,

    /// Do not search ~/Downloads/chat_media for overlays
    #[arg(long, global = true)]
    no_default_overlay_dir: bool,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Commands {
    /// Move every file in a subdirectory up to the root
    Flatten,
    /// Prefix root files with their YYYY-MM-DD_ date
    Rename,
    /// Delete overlay images
    Overlays,
    /// Move byte-identical copies into the quarantine directory
    Dedupe,
    /// Rename dated files to YYYY-MM-DD-NNN.ext
    Shorten,
    /// Flatten, rename, delete overlays and dedupe, in that order
    All,
}

impl Commands {
    /// The single operation this command runs; `None` for `all`
    fn operation(self) -> Option<OperationKind> {
        match self {
            Commands::Flatten => Some(OperationKind::Flatten),
            Commands::Rename => Some(OperationKind::Rename),
            Commands::Overlays => Some(OperationKind::DeleteOverlays),
            Commands::Dedupe => Some(OperationKind::FindDuplicates),
            Commands::Shorten => Some(OperationKind::Shorten),
            Commands::All => None,
        }
    }

    fn wants_overlay_dirs(self) -> bool {
        matches!(self, Commands::Overlays | Commands::All)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (one path per line)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    media_tidy::init_tracing(cli.verbose);

    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        warn!(error = %e, "cannot install Ctrl-C handler");
    }

    let config = build_config(&cli, cancel)?;
    let term = Term::stderr();

    if cli.output == OutputFormat::Pretty {
        output::print_header(&term, &config);
    }

    let reports = match cli.command.operation() {
        Some(kind) => run_single(kind, &cli, &config, &term)?,
        None => run_all(&cli, &config, &term)?,
    };

    let failed = reports
        .iter()
        .any(|r| r.cancelled || !r.failures.is_empty());
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn build_config(cli: &Cli, cancel: CancellationToken) -> Result<TidyConfig> {
    let mut builder = TidyConfig::builder(&cli.dir)
        .dry_run(!cli.apply)
        .quarantine_dir_name(cli.quarantine_dir.clone())
        .include_hidden(cli.include_hidden)
        .follow_symlinks(cli.follow_symlinks)
        .hash_threads(cli.threads)
        .cancel_token(cancel);

    if cli.command.wants_overlay_dirs() {
        for dir in &cli.overlay_dirs {
            builder = builder.extra_overlay_dir(dir);
        }
        if !cli.no_default_overlay_dir {
            if let Some(chat_media) = dirs::download_dir()
                .map(|d| d.join("chat_media"))
                .filter(|d| d.is_dir())
            {
                builder = builder.extra_overlay_dir(chat_media);
            }
        }
    }

    Ok(builder.build()?)
}

fn run_single(
    kind: OperationKind,
    cli: &Cli,
    config: &TidyConfig,
    term: &Term,
) -> Result<Vec<OperationReport>> {
    let (sender, progress) = spawn_progress(cli.output);

    let mut duplicates = None;
    let plan = match kind {
        OperationKind::Flatten => plan_flatten(config, &sender),
        OperationKind::Rename => plan_rename(config, &sender),
        OperationKind::DeleteOverlays => plan_delete_overlays(config, &sender),
        OperationKind::Shorten => plan_shorten(config, &sender).map(|(plan, _)| plan),
        OperationKind::FindDuplicates => plan_find_duplicates(config, &sender).map(|(plan, scan)| {
            duplicates = Some(scan);
            plan
        }),
    };
    let plan = match plan {
        Ok(plan) => plan,
        Err(e) => {
            finish_progress(sender, progress);
            return Err(e);
        }
    };

    output::print_plan(term, cli.output, &plan, duplicates.as_ref(), cli.verbose);

    if !config.dry_run && !plan.is_empty() && !cli.yes && !confirm(term, plan.actions.len()) {
        finish_progress(sender, progress);
        term.write_line(&format!("{}", style("Aborted, nothing changed.").yellow()))
            .ok();
        return Ok(Vec::new());
    }

    let report = apply_plan(&plan, config, &sender);
    finish_progress(sender, progress);

    output::print_reports(term, cli.output, std::slice::from_ref(&report));
    Ok(vec![report])
}

fn run_all(cli: &Cli, config: &TidyConfig, term: &Term) -> Result<Vec<OperationReport>> {
    let (sender, progress) = spawn_progress(cli.output);
    let result = operations::run_all_gated(config, &sender, |plan| {
        output::print_plan(term, cli.output, plan, None, cli.verbose);
        if config.dry_run || plan.is_empty() || cli.yes || confirm(term, plan.actions.len()) {
            return true;
        }
        term.write_line(&format!(
            "{}",
            style(format!("Skipped {}, nothing changed.", plan.operation)).yellow()
        ))
        .ok();
        false
    });
    finish_progress(sender, progress);

    let reports = result?;
    output::print_reports(term, cli.output, &reports);
    Ok(reports)
}

/// Ask `Proceed? [y/N]` on the terminal. Anything but yes declines.
fn confirm(term: &Term, actions: usize) -> bool {
    let prompt = format!(
        "{} {} action(s) will change files. Proceed? [y/N] ",
        style("?").yellow().bold(),
        actions
    );
    if term.write_str(&prompt).is_err() {
        return false;
    }
    match term.read_line() {
        Ok(answer) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

/// Progress bar fed by events on a background thread. Only drawn for pretty output.
fn spawn_progress(format: OutputFormat) -> (EventSender, JoinHandle<()>) {
    let (sender, receiver) = EventChannel::new();

    let progress = if format == OutputFormat::Pretty {
        Some(ProgressBar::new_spinner())
    } else {
        None
    };
    let bar_style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓░");

    let handle = thread::spawn(move || {
        let Some(pb) = progress else {
            // Drain so senders never see a full channel
            for _ in receiver.iter() {}
            return;
        };

        for event in receiver.iter() {
            match event {
                Event::Scan(ScanEvent::Started { root }) => {
                    pb.reset();
                    pb.set_style(ProgressStyle::default_spinner());
                    pb.set_message(format!("Scanning {}", root.display()));
                }
                Event::Scan(ScanEvent::FileFound { .. }) => pb.inc(1),
                Event::Scan(ScanEvent::Completed { .. }) => pb.finish_and_clear(),
                Event::Hash(HashEvent::Started { total_files }) => {
                    pb.reset();
                    pb.set_style(bar_style.clone());
                    pb.set_length(total_files as u64);
                    pb.set_message("Hashing");
                }
                Event::Hash(HashEvent::Progress(p)) => pb.set_position(p.completed as u64),
                Event::Hash(HashEvent::Completed { .. }) => pb.finish_and_clear(),
                Event::Apply(ApplyEvent::Started {
                    operation,
                    total,
                    dry_run,
                }) => {
                    pb.reset();
                    pb.set_style(bar_style.clone());
                    pb.set_length(total as u64);
                    let verb = if dry_run { "Previewing" } else { "Applying" };
                    pb.set_message(format!("{verb} {operation}"));
                }
                Event::Apply(ApplyEvent::Progress(p)) => pb.set_position(p.completed as u64),
                Event::Apply(ApplyEvent::Completed { .. }) => pb.finish_and_clear(),
                _ => {}
            }
        }
        pb.finish_and_clear();
    });

    (sender, handle)
}

fn finish_progress(sender: EventSender, handle: JoinHandle<()>) {
    drop(sender);
    handle.join().ok();
}
