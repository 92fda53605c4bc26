//! dirsort - flatten a directory tree and sort its files into category folders
//!
//! A run starts with a read-only scan that classifies every file by extension and
//! produces a report. Once confirmed, the tree is restructured: subdirectories are
//! lifted to the top level under normalized names, every file is moved into its
//! category folder under a normalized name, archives are expanded next to
//! themselves, and directories left empty are removed.

pub mod archive;
pub mod cli;
pub mod config;
pub mod engine;
pub mod file_category;
pub mod file_organizer;
pub mod flatten;
pub mod normalize;
pub mod output;
pub mod prune;
pub mod scanner;

pub use config::{CollisionPolicy, ConfigError, OrganizerConfig};
pub use engine::{Execution, Organizer, RunSummary};
pub use file_category::{Category, Classifier};
pub use file_organizer::{OrganizeError, OrganizeResult};
pub use scanner::ScanReport;

pub use cli::{OrganizeCommand, run_cli};
