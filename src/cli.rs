//! Command-line interface module for dirsort.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Rendering the dry-run report (table or JSON)
//! - Asking for confirmation before anything is changed
//! - Driving the confirmed run with a progress bar

use crate::config::OrganizerConfig;
use crate::engine::Organizer;
use crate::output::OutputFormatter;
use clap::Parser;
use dialoguer::Confirm;
use std::path::{Path, PathBuf};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "dirsort",
    version,
    about = "Flatten a directory tree and sort its files into category folders"
)]
pub struct Cli {
    /// Directory to organize
    pub directory: PathBuf,
    /// Only show what would be organized
    #[arg(long)]
    pub dry_run: bool,
    /// Print the report as JSON (implies --dry-run)
    #[arg(long)]
    pub json: bool,
    /// Organize without asking for confirmation
    #[arg(short = 'y', long = "yes")]
    pub assume_yes: bool,
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Turns the parsed flags into a command.
    pub fn command(&self) -> OrganizeCommand {
        if self.json {
            OrganizeCommand::Report { json: true }
        } else if self.dry_run {
            OrganizeCommand::Report { json: false }
        } else {
            OrganizeCommand::Organize {
                assume_yes: self.assume_yes,
            }
        }
    }
}

/// Represents a CLI command to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrganizeCommand {
    /// Scan and report without changing anything.
    Report {
        /// Print the report as JSON instead of a table.
        json: bool,
    },
    /// Report, confirm, then flatten, move and prune.
    Organize {
        /// Skip the confirmation prompt.
        assume_yes: bool,
    },
}

/// Runs the CLI application with the given command and directory path.
///
/// # Examples
///
/// ```no_run
/// use dirsort::cli::{run_cli, OrganizeCommand};
/// use std::path::Path;
///
/// let result = run_cli(OrganizeCommand::Report { json: false }, Path::new("/path/to/directory"));
/// if let Err(e) = result {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(command: OrganizeCommand, dir_path: &Path) -> Result<(), String> {
    run_cli_with_config(command, dir_path, None)
}

/// Runs the CLI application with an optional configuration file.
pub fn run_cli_with_config(
    command: OrganizeCommand,
    dir_path: &Path,
    config_path: Option<&Path>,
) -> Result<(), String> {
    let config = OrganizerConfig::load(config_path)
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    let organizer = Organizer::new(dir_path, config).map_err(|e| e.to_string())?;

    match command {
        OrganizeCommand::Report { json } => report(&organizer, json),
        OrganizeCommand::Organize { assume_yes } => organize(&organizer, assume_yes),
    }
}

fn report(organizer: &Organizer, json: bool) -> Result<(), String> {
    let report = organizer.dry_run().map_err(|e| e.to_string())?;

    if json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("Error rendering report: {}", e))?;
        println!("{}", rendered);
        return Ok(());
    }

    OutputFormatter::dry_run_notice(&format!(
        "Contents of {}",
        organizer.root().display()
    ));
    OutputFormatter::summary_table(&report);
    println!();
    OutputFormatter::dry_run_notice("No files were modified.");
    Ok(())
}

fn organize(organizer: &Organizer, assume_yes: bool) -> Result<(), String> {
    OutputFormatter::info(&format!("Contents of {}", organizer.root().display()));
    let execution = organizer.execute(false).map_err(|e| e.to_string())?;
    OutputFormatter::summary_table(&execution.report);
    println!();

    if !assume_yes && !confirm()? {
        OutputFormatter::info("Nothing was changed.");
        return Ok(());
    }

    let progress = OutputFormatter::create_progress_bar(execution.report.total as u64);
    let result = organizer.apply_with_progress(|relocation| {
        progress.set_message(relocation.category.dir_name());
        progress.inc(1);
    });
    progress.finish_and_clear();

    match result {
        Ok(summary) => {
            OutputFormatter::run_summary(&summary);
            Ok(())
        }
        Err(e) => {
            OutputFormatter::error(&e.to_string());
            Err("Organization stopped; the tree may be partially reorganized.".to_string())
        }
    }
}

fn confirm() -> Result<bool, String> {
    Confirm::new()
        .with_prompt("Normalize names and move files into category folders?")
        .default(false)
        .interact()
        .map_err(|e| format!("Error reading confirmation: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("arguments should parse")
    }

    #[test]
    fn test_default_command_asks_before_organizing() {
        let cli = parse(&["dirsort", "/tmp/inbox"]);
        assert_eq!(cli.directory, PathBuf::from("/tmp/inbox"));
        assert_eq!(
            cli.command(),
            OrganizeCommand::Organize { assume_yes: false }
        );
    }

    #[test]
    fn test_flags_map_to_commands() {
        assert_eq!(
            parse(&["dirsort", "d", "--dry-run"]).command(),
            OrganizeCommand::Report { json: false }
        );
        assert_eq!(
            parse(&["dirsort", "d", "--json"]).command(),
            OrganizeCommand::Report { json: true }
        );
        assert_eq!(
            parse(&["dirsort", "d", "-y"]).command(),
            OrganizeCommand::Organize { assume_yes: true }
        );
    }

    #[test]
    fn test_config_flag() {
        let cli = parse(&["dirsort", "d", "--config", "rules.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("rules.toml")));
    }

    #[test]
    fn test_directory_is_required() {
        assert!(Cli::try_parse_from(["dirsort"]).is_err());
    }
}
