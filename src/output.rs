//! Terminal output for the command-line front end.
//!
//! Colored status lines, the dry-run summary table and the progress bar shown
//! while files are moved.

use crate::engine::RunSummary;
use crate::file_category::Category;
use crate::scanner::ScanReport;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeSet;

/// Centralizes all CLI output.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a progress bar for the move phase.
    ///
    /// Falls back to the default bar style if the template is rejected.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints the per-category table and the extension sets of a dry run.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dirsort::output::OutputFormatter;
    /// use dirsort::scanner::scan_report;
    /// use dirsort::config::CompiledFilters;
    /// use std::path::Path;
    ///
    /// let report = scan_report(Path::new("/tmp/inbox"), &CompiledFilters::default()).unwrap();
    /// OutputFormatter::summary_table(&report);
    /// ```
    pub fn summary_table(report: &ScanReport) {
        Self::header("SUMMARY");

        let width = Category::ALL
            .iter()
            .map(|c| c.description().len())
            .max()
            .unwrap_or(0)
            .max(8);

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = width
        );
        println!("{}", "-".repeat(width + 10));

        for category in Category::ALL {
            let count = report.count(category);
            let shown = if count == 0 {
                count.to_string().dimmed()
            } else {
                count.to_string().green()
            };
            println!(
                "{:<width$} | {} {}",
                category.description(),
                shown,
                plural(count),
                width = width
            );
        }

        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            report.total.to_string().green().bold(),
            plural(report.total),
            width = width
        );

        println!();
        println!("Known extensions:   {}", join_extensions(&report.known));
        println!("Unknown extensions: {}", join_extensions(&report.unknown));
    }

    /// Prints what a confirmed run did.
    pub fn run_summary(summary: &RunSummary) {
        Self::header("DONE");
        Self::success(&format!(
            "Moved {} {} into category folders",
            summary.relocations.len(),
            plural(summary.relocations.len())
        ));

        let relocated = summary.flatten.moves.len();
        if relocated > 0 {
            Self::info(&format!(
                "Lifted {} director{} to the top level ({} collision(s))",
                relocated,
                if relocated == 1 { "y" } else { "ies" },
                summary.flatten.collisions()
            ));
        }

        for (archive, target) in summary.expanded_archives() {
            Self::info(&format!(
                "Expanded {} into {}",
                archive.display(),
                target.display()
            ));
        }

        if !summary.prune.removed.is_empty() {
            Self::info(&format!(
                "Removed {} empty director{}",
                summary.prune.removed.len(),
                if summary.prune.removed.len() == 1 { "y" } else { "ies" }
            ));
        }
        if summary.prune.needs_another_pass() {
            Self::warning("Deeply nested folders were left behind. Run dirsort again to finish cleaning up.");
            for path in &summary.prune.descended {
                println!("    - {}", path.display());
            }
        }
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}

fn join_extensions(extensions: &BTreeSet<String>) -> String {
    if extensions.is_empty() {
        return "-".dimmed().to_string();
    }
    extensions
        .iter()
        .map(|ext| if ext.is_empty() { "(none)" } else { ext.as_str() })
        .collect::<Vec<_>>()
        .join(", ")
}
