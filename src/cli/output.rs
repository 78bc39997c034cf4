//! Rendering of plans and reports.
//!
//! Pretty output goes to stderr through `console`; JSON and minimal output go
//! to stdout. JSON is one document per line: a `plan` line before applying,
//! then one `report` line per operation.

use super::OutputFormat;
use console::{style, Term};
use media_tidy::core::config::TidyConfig;
use media_tidy::core::duplicates::DuplicateScan;
use media_tidy::core::operations::{OperationPlan, OperationReport, PlannedAction};
use serde_json::json;
use std::path::Path;

pub(crate) fn print_header(term: &Term, config: &TidyConfig) {
    term.write_line(&format!(
        "{} {}",
        style("Media Tidy").bold().cyan(),
        style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
    ))
    .ok();
    term.write_line(&format!(
        "  {} {}",
        style("Directory:").dim(),
        display_path(&config.root)
    ))
    .ok();
    if config.dry_run {
        term.write_line(&format!(
            "  {}",
            style("Dry-run: nothing will be changed (use --apply)").yellow()
        ))
        .ok();
    }
    term.write_line("").ok();
}

pub(crate) fn print_plan(
    term: &Term,
    format: OutputFormat,
    plan: &OperationPlan,
    duplicates: Option<&DuplicateScan>,
    verbose: bool,
) {
    match format {
        OutputFormat::Pretty => print_pretty_plan(term, plan, duplicates, verbose),
        OutputFormat::Json => print_json_plan(plan, duplicates),
        OutputFormat::Minimal => {
            for action in &plan.actions {
                match action {
                    PlannedAction::Move(m) => println!(
                        "{}\t{}",
                        m.original_path.display(),
                        m.destination().display()
                    ),
                    PlannedAction::Delete(path) => println!("{}", path.display()),
                }
            }
        }
    }
}

fn print_pretty_plan(
    term: &Term,
    plan: &OperationPlan,
    duplicates: Option<&DuplicateScan>,
    verbose: bool,
) {
    term.write_line(&format!(
        "{} {}",
        style("Plan:").bold().underlined(),
        style(plan.operation).cyan()
    ))
    .ok();

    if let Some(scan) = duplicates {
        term.write_line(&format!(
            "  {} files scanned, {} hashed, {} ruled out by size",
            style(scan.stats.files_scanned).cyan(),
            style(scan.stats.candidates_hashed).cyan(),
            style(scan.stats.skipped_by_size).dim()
        ))
        .ok();
        term.write_line(&format!(
            "  {} duplicate(s) in {} group(s), {} reclaimable",
            style(scan.duplicate_count()).cyan(),
            style(scan.groups.len()).cyan(),
            style(format_bytes(scan.reclaimable_bytes())).yellow()
        ))
        .ok();

        if verbose {
            for group in &scan.groups {
                term.write_line(&format!(
                    "    {} {}",
                    style("★").green(),
                    display_path(&group.original)
                ))
                .ok();
                for dup in &group.duplicates {
                    term.write_line(&format!("    {} {}", style("○").dim(), display_path(dup)))
                        .ok();
                }
            }
        }
    }

    if plan.actions.is_empty() {
        term.write_line(&format!("  {} Nothing to do", style("✓").green()))
            .ok();
    }

    for action in &plan.actions {
        let line = match action {
            PlannedAction::Move(m) => {
                let marker = if m.had_collision() {
                    style("⚠").yellow().to_string()
                } else {
                    style("→").dim().to_string()
                };
                format!(
                    "  {} {} {}",
                    display_path(&m.original_path),
                    marker,
                    m.final_name.to_string_lossy()
                )
            }
            PlannedAction::Delete(path) => {
                format!("  {} {}", style("✗").red(), display_path(path))
            }
        };
        term.write_line(&line).ok();
    }

    if !plan.skipped.is_empty() {
        term.write_line(&format!(
            "  {} file(s) skipped",
            style(plan.skipped.len()).dim()
        ))
        .ok();
    }
    for error in &plan.errors {
        term.write_line(&format!("  {} {}", style("!").red(), error))
            .ok();
    }
    term.write_line("").ok();
}

fn print_json_plan(plan: &OperationPlan, duplicates: Option<&DuplicateScan>) {
    let actions: Vec<_> = plan
        .actions
        .iter()
        .map(|action| match action {
            PlannedAction::Move(m) => json!({
                "action": "move",
                "from": m.original_path,
                "to": m.destination(),
                "collision": m.had_collision(),
            }),
            PlannedAction::Delete(path) => json!({
                "action": "delete",
                "path": path,
            }),
        })
        .collect();

    let mut doc = json!({
        "kind": "plan",
        "operation": plan.operation,
        "actions": actions,
        "skipped": plan.skipped,
        "errors": plan.errors,
    });
    if let Some(scan) = duplicates {
        doc["duplicates"] = json!({
            "stats": scan.stats,
            "groups": scan.groups,
            "reclaimable_bytes": scan.reclaimable_bytes(),
        });
    }
    println!("{doc}");
}

pub(crate) fn print_reports(term: &Term, format: OutputFormat, reports: &[OperationReport]) {
    match format {
        OutputFormat::Pretty => {
            for report in reports {
                print_pretty_report(term, report);
            }
        }
        OutputFormat::Json => {
            for report in reports {
                let mut doc = json!(report);
                doc["kind"] = json!("report");
                println!("{doc}");
            }
        }
        OutputFormat::Minimal => {
            for report in reports {
                for (path, _) in &report.failures {
                    eprintln!("{}", path.display());
                }
            }
        }
    }
}

fn print_pretty_report(term: &Term, report: &OperationReport) {
    let verb = if report.dry_run { "would succeed" } else { "succeeded" };
    let mark = if report.failures.is_empty() && !report.cancelled {
        style("✓").green().bold()
    } else {
        style("!").red().bold()
    };

    term.write_line(&format!(
        "{} {}: {}/{} {} in {:.1}s",
        mark,
        style(report.operation).bold(),
        style(report.succeeded).cyan(),
        report.attempted,
        verb,
        report.duration_ms as f64 / 1000.0
    ))
    .ok();

    for (path, message) in &report.failures {
        term.write_line(&format!(
            "    {} {}: {}",
            style("✗").red(),
            display_path(path),
            message
        ))
        .ok();
    }
    if report.cancelled {
        term.write_line(&format!(
            "    {}",
            style("Cancelled: remaining actions were not applied").yellow()
        ))
        .ok();
    }
}

/// Show paths under the home directory as `~/...`
fn display_path(path: &Path) -> String {
    match dirs::home_dir().and_then(|home| path.strip_prefix(home).ok().map(Path::to_path_buf)) {
        Some(rel) => format!("~/{}", rel.display()),
        None => path.display().to_string(),
    }
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
