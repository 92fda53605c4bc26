//! Organizer configuration.
//!
//! Settings are read from a TOML file. Two sections exist:
//! - `[organize]` controls how the tree is restructured (directory collision
//!   policy, archive expansion, prune passes)
//! - `[filters]` decides which files take part at all (hidden files, exact
//!   names, extensions, glob and regex exclusions, include overrides)
//!
//! # Configuration File Format
//!
//! ```toml
//! [organize]
//! collision = "merge"        # merge | replace | rename | error
//! expand_archives = true
//! prune_passes = 1
//!
//! [filters]
//! enable_hidden_files = true
//!
//! [filters.exclude]
//! filenames = [".DS_Store", "Thumbs.db"]
//! patterns = ["*.tmp", "node_modules/**"]
//! extensions = ["bak"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//! ```

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during configuration loading and filter compilation.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    #[error("Invalid glob pattern '{0}': expected *.ext or dir/**")]
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided with the actual error reason.
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern {
        /// The regex pattern that failed to compile.
        pattern: String,
        /// The reason why the pattern is invalid.
        reason: String,
    },
    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// What the flattener does when a relocated directory lands on an existing one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Move the incoming entries into the existing directory. Clashing files
    /// are overwritten by the incoming ones.
    #[default]
    Merge,
    /// Delete the existing directory; the incoming one takes its name.
    Replace,
    /// Give the incoming directory the first free `name_N`.
    Rename,
    /// Abort the flatten phase.
    Error,
}

/// Full configuration for one organizer run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizerConfig {
    #[serde(default)]
    pub organize: OrganizeRules,
    #[serde(default)]
    pub filters: FilterRules,
}

/// Rules for the mutating phases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizeRules {
    /// Directory collision handling during flattening.
    #[serde(default)]
    pub collision: CollisionPolicy,

    /// Whether archives are expanded after being moved. Defaults to true.
    #[serde(default = "default_true")]
    pub expand_archives: bool,

    /// How many times the pruner may run while directories are left behind.
    #[serde(default = "default_prune_passes")]
    pub prune_passes: u32,
}

impl Default for OrganizeRules {
    fn default() -> Self {
        Self {
            collision: CollisionPolicy::default(),
            expand_archives: true,
            prune_passes: default_prune_passes(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_prune_passes() -> u32 {
    1
}

/// Root-level filter rules configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether to include hidden files (starting with "."). Defaults to true.
    #[serde(default = "default_true")]
    pub enable_hidden_files: bool,

    /// Rules for excluding files.
    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Rules for including files (whitelist, overrides exclude rules).
    #[serde(default)]
    pub include: IncludeRules,
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            enable_hidden_files: true,
            exclude: ExcludeRules::default(),
            include: IncludeRules::default(),
        }
    }
}

/// Rules for excluding files from organization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., ".DS_Store", "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns to exclude, matched against the path relative to the root.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// File extensions to exclude (e.g., "bak", "tmp", "log").
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns to exclude, matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

/// Rules for including files, overriding exclude rules (whitelist).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    /// Glob patterns that override exclude rules.
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl OrganizerConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.dirsortrc.toml` in the current directory
    /// 3. Look for `~/.config/dirsort/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read,
    /// or if any discovered file is not valid TOML.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".dirsortrc.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("dirsort")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }
}

impl FilterRules {
    /// Compile the rules into matchers.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob patterns are invalid.
    pub fn compile(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(self)
    }
}

/// Pre-compiled filter rules.
#[derive(Debug, Clone)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = compile_globs(&rules.exclude.patterns)?;
        let include_patterns = compile_globs(&rules.include.patterns)?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns,
            exclude_regexes,
            include_patterns,
        })
    }

    /// Check if a file takes part in organization.
    ///
    /// `relative_path` is the file's path relative to the operation root.
    /// Checks are performed in this order, with early termination:
    /// 1. Include patterns (whitelist) - if matched, always include
    /// 2. Hidden file filter - if hidden and disabled, exclude
    /// 3. Exact filename match - if matched, exclude
    /// 4. File extension match - if matched, exclude
    /// 5. Glob pattern match - if matched, exclude
    /// 6. Regex pattern match - if matched, exclude
    /// 7. Default: include
    pub fn should_include(&self, relative_path: &Path) -> bool {
        let file_name = relative_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.matches_any(&self.include_patterns, relative_path) {
            return true;
        }

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = relative_path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return false;
            }
        }

        if self.matches_any(&self.exclude_patterns, relative_path) {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
    }

    fn matches_any(&self, patterns: &[Pattern], path: &Path) -> bool {
        patterns.iter().any(|pattern| pattern.matches_path(path))
    }
}

impl Default for CompiledFilters {
    fn default() -> Self {
        // The default rules hold no patterns, so compilation cannot fail.
        Self {
            enable_hidden_files: true,
            exclude_filenames: HashSet::new(),
            exclude_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
            include_patterns: Vec::new(),
        }
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
        })
        .collect()
}
