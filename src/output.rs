//! Output formatting and styling module.
//!
//! All operator-facing output goes through [`OutputFormatter`]: status lines
//! while a run progresses, and the rendered [`RunSummary`] or [`Plan`] once it
//! is done. The core returns structured results; only this module decides how
//! they look.

use crate::conflict::ConflictOutcome;
use crate::organizer::Plan;
use crate::summary::RunSummary;
use colored::*;
use std::sync::atomic::{AtomicBool, Ordering};

static STATUS_TO_STDERR: AtomicBool = AtomicBool::new(false);

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Sends success, warning and info lines to stderr instead of stdout.
    ///
    /// Used when stdout carries a machine-readable document such as JSON.
    pub fn status_to_stderr(enabled: bool) {
        STATUS_TO_STDERR.store(enabled, Ordering::Relaxed);
    }

    fn status(line: String) {
        if STATUS_TO_STDERR.load(Ordering::Relaxed) {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }

    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use extidy::output::OutputFormatter;
    /// OutputFormatter::success("photo.jpg → jpg/");
    /// ```
    pub fn success(message: &str) {
        Self::status(format!("{} {}", "✓".green(), message));
    }

    /// Prints an error message in red with an X mark, on stderr.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        Self::status(format!("{} {}", "⚠".yellow(), message));
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        Self::status(message.cyan().to_string());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Prints the outcome of one organize run.
    ///
    /// Conflict counts are only shown when at least one conflict occurred.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use extidy::output::OutputFormatter;
    /// use extidy::summary::RunSummary;
    /// use std::path::Path;
    ///
    /// let mut summary = RunSummary::new(Path::new("/home/user/Downloads"));
    /// summary.record_move("pdf");
    /// OutputFormatter::run_summary(&summary);
    /// ```
    pub fn run_summary(summary: &RunSummary) {
        Self::header(&format!("SUMMARY: {}", summary.directory.display()));
        Self::plain(&format!(
            "Started {}",
            summary.started_at.format("%Y-%m-%d %H:%M:%S")
        ));

        if summary.moved.is_empty() {
            Self::plain("No files were moved.");
        } else {
            let rows: Vec<(&str, usize)> = summary
                .moved
                .iter()
                .map(|(ext, count)| (ext.as_str(), *count))
                .collect();
            Self::count_table("Extension", &rows, summary.total_moved());
        }

        let conflicts = &summary.conflicts;
        if conflicts.total() > 0 {
            Self::header("CONFLICTS");
            for outcome in [
                ConflictOutcome::Overwritten,
                ConflictOutcome::RenamedIncoming,
                ConflictOutcome::RenamedExisting,
                ConflictOutcome::Skipped,
            ] {
                println!("  {:<17} {}", outcome.as_str(), conflicts.get(outcome));
            }
        }

        if !summary.skipped.is_empty() {
            Self::header(&format!("SKIPPED ({})", summary.skipped.len()));
            for skipped in &summary.skipped {
                println!("  - {} {}", skipped.name, format!("({})", skipped.reason).dimmed());
            }
        }
    }

    /// Prints what a dry run found.
    pub fn plan(plan: &Plan) {
        Self::dry_run_notice(&format!("Analyzing {}", plan.directory.display()));

        if plan.moves.is_empty() {
            Self::plain("No files found to organize.");
        }
        for planned in &plan.moves {
            let mut notes = Vec::new();
            if planned.creates_folder {
                notes.push("new folder");
            }
            if planned.conflict {
                notes.push("conflict");
            }
            let suffix = if notes.is_empty() {
                String::new()
            } else {
                format!(" [{}]", notes.join(", "))
            };
            println!(
                " - {} → {}/{}",
                planned.name,
                planned.extension,
                suffix.yellow()
            );
        }

        for skipped in &plan.skipped {
            println!(" - {} {}", skipped.name, format!("(stays: {})", skipped.reason).dimmed());
        }

        if plan.conflicts() > 0 {
            Self::warning(&format!(
                "{} file(s) would need conflict resolution",
                plan.conflicts()
            ));
        }
        Self::success("Dry run complete. No files were modified.");
    }

    /// Prints a two-column count table with a total row.
    fn count_table(label: &str, rows: &[(&str, usize)], total: usize) {
        let width = rows
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0)
            .max(label.len());

        println!("{:<width$} | {}", label.bold(), "Files".bold(), width = width);
        println!("{}", "-".repeat(width + 10));
        for (name, count) in rows {
            println!(
                "{:<width$} | {} {}",
                name,
                count.to_string().green(),
                plural(*count),
                width = width
            );
        }
        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total.to_string().green().bold(),
            plural(total),
            width = width
        );
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}
