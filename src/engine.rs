//! One reorganization run over an operation root.
//!
//! [`Organizer`] owns everything a run needs: the root, the configuration, the
//! normalizer and the archive extractor. A run is either a dry run (scan and
//! report) or a confirmed run (flatten, move, prune, in that order).
//!
//! The organizer assumes it is the only writer under the root for the whole
//! call. Nothing is locked; every phase depends on the tree left by the one
//! before it.

use crate::archive::{ArchiveExpander, Extractor};
use crate::config::{CompiledFilters, OrganizerConfig};
use crate::file_organizer::{FileOrganizer, OrganizeError, OrganizeResult, Relocation};
use crate::flatten::{FlattenReport, Flattener};
use crate::normalize::{Normalizer, Transliterator};
use crate::prune::{PruneOutcome, Pruner};
use crate::scanner::{self, ScanReport};
use std::io;
use std::path::{Path, PathBuf};

/// What a confirmed run did.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Directory relocations and created category folders.
    pub flatten: FlattenReport,
    /// Every file that was moved.
    pub relocations: Vec<Relocation>,
    /// Leftover directory cleanup.
    pub prune: PruneOutcome,
}

impl RunSummary {
    /// Archives that were expanded, with their target directories.
    pub fn expanded_archives(&self) -> impl Iterator<Item = (&Path, &Path)> {
        self.relocations.iter().filter_map(|r| {
            r.expanded_into
                .as_deref()
                .map(|target| (r.new_path.as_path(), target))
        })
    }
}

/// Result of [`Organizer::execute`].
#[derive(Debug, Clone)]
pub struct Execution {
    /// The dry-run report, computed before anything changed.
    pub report: ScanReport,
    /// Present when the run was confirmed.
    pub applied: Option<RunSummary>,
}

/// Reorganizes one directory tree.
pub struct Organizer {
    root: PathBuf,
    config: OrganizerConfig,
    filters: CompiledFilters,
    normalizer: Box<dyn Normalizer>,
    extractor: Box<dyn Extractor>,
}

impl Organizer {
    /// Creates an organizer with the default normalizer and extractor.
    ///
    /// # Errors
    ///
    /// Fails if `root` is not a directory or the filter rules do not compile.
    pub fn new(root: impl Into<PathBuf>, config: OrganizerConfig) -> OrganizeResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(OrganizeError::InvalidBasePath {
                path: root,
                source: io::Error::new(io::ErrorKind::NotFound, "base path is not a directory"),
            });
        }
        let filters = config.filters.compile()?;

        Ok(Self {
            root,
            config,
            filters,
            normalizer: Box::new(Transliterator),
            extractor: Box::new(ArchiveExpander),
        })
    }

    /// Replaces the name normalizer.
    pub fn with_normalizer(mut self, normalizer: impl Normalizer + 'static) -> Self {
        self.normalizer = Box::new(normalizer);
        self
    }

    /// Replaces the archive extractor.
    pub fn with_extractor(mut self, extractor: impl Extractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    /// The operation root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The configuration this organizer runs with.
    pub fn config(&self) -> &OrganizerConfig {
        &self.config
    }

    /// Classifies every file without changing anything.
    pub fn dry_run(&self) -> OrganizeResult<ScanReport> {
        log::info!("Scanning {}", self.root.display());
        scanner::scan_report(&self.root, &self.filters)
    }

    /// Single entry point: always reports, and applies the changes only when
    /// `confirmed` is true.
    pub fn execute(&self, confirmed: bool) -> OrganizeResult<Execution> {
        let report = self.dry_run()?;
        let applied = if confirmed {
            Some(self.apply()?)
        } else {
            None
        };
        Ok(Execution { report, applied })
    }

    /// Runs flatten, move and prune.
    pub fn apply(&self) -> OrganizeResult<RunSummary> {
        self.apply_with_progress(|_| {})
    }

    /// Like [`Organizer::apply`], calling `on_move` after every file move.
    ///
    /// The first error stops the run; phases that already ran are not undone.
    pub fn apply_with_progress<F>(&self, on_move: F) -> OrganizeResult<RunSummary>
    where
        F: FnMut(&Relocation),
    {
        let flatten = self.flattener().flatten()?;

        let relocations = FileOrganizer::new(
            &self.root,
            self.normalizer.as_ref(),
            self.extractor.as_ref(),
            &self.filters,
        )
        .expand_archives(self.config.organize.expand_archives)
        .move_all(on_move)?;

        let prune = self.prune()?;

        log::info!(
            "Organized {} file(s) under {}",
            relocations.len(),
            self.root.display()
        );
        Ok(RunSummary {
            flatten,
            relocations,
            prune,
        })
    }

    /// Runs the pruner up to `prune_passes` times while directories are left behind.
    pub fn prune(&self) -> OrganizeResult<PruneOutcome> {
        let pruner = Pruner::new(&self.root);
        let mut outcome = pruner.prune()?;

        let mut passes = 1;
        while outcome.needs_another_pass() && passes < self.config.organize.prune_passes {
            let before = outcome.descended.len();
            let later = pruner.prune()?;
            let stalled = later.removed.is_empty() && later.descended.len() >= before;
            outcome.absorb(later);
            passes += 1;
            if stalled {
                break;
            }
        }
        Ok(outcome)
    }

    fn flattener(&self) -> Flattener<'_> {
        Flattener::new(
            &self.root,
            self.normalizer.as_ref(),
            self.config.organize.collision,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_category::Category;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_new_rejects_missing_root() {
        let result = Organizer::new("/non/existent/path", OrganizerConfig::default());
        assert!(matches!(result, Err(OrganizeError::InvalidBasePath { .. })));
    }

    #[test]
    fn test_execute_without_confirmation_only_reports() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("a.pdf"), "pdf").unwrap();

        let organizer = Organizer::new(temp_dir.path(), OrganizerConfig::default()).unwrap();
        let execution = organizer.execute(false).unwrap();

        assert_eq!(execution.report.count(Category::Document), 1);
        assert!(execution.applied.is_none());
        assert!(temp_dir.path().join("a.pdf").is_file());
        assert!(!temp_dir.path().join("documents").exists());
    }

    #[test]
    fn test_execute_confirmed_applies_all_phases() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir(root.join("Inbox")).unwrap();
        fs::write(root.join("Inbox/a.pdf"), "pdf").unwrap();

        let organizer = Organizer::new(root, OrganizerConfig::default()).unwrap();
        let execution = organizer.execute(true).unwrap();
        let summary = execution.applied.expect("run was confirmed");

        assert_eq!(summary.relocations.len(), 1);
        assert!(summary.prune.is_clean());
        assert!(root.join("documents/a.pdf").is_file());
        assert!(!root.join("Inbox").exists());
    }

    #[test]
    fn test_custom_normalizer_is_used() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::write(root.join("song.mp3"), "mp3").unwrap();

        let organizer = Organizer::new(root, OrganizerConfig::default())
            .unwrap()
            .with_normalizer(|name: &str| name.to_uppercase());
        organizer.apply().unwrap();

        assert!(root.join("audio/SONG.mp3").is_file());
    }

    #[test]
    fn test_extra_prune_passes_clean_deep_trees() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir_all(root.join("a/b/c/d")).unwrap();

        let mut config = OrganizerConfig::default();
        config.organize.prune_passes = 5;
        let organizer = Organizer::new(root, config).unwrap();
        let summary = organizer.apply().unwrap();

        assert!(summary.prune.is_clean());
        assert!(!root.join("a").exists());
    }

    #[test]
    fn test_prune_stops_when_nothing_changes() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir_all(root.join("keep")).unwrap();
        fs::write(root.join("keep/.hidden"), "x").unwrap();

        let mut config = OrganizerConfig::default();
        config.organize.prune_passes = 10;
        config.filters.enable_hidden_files = false;
        let organizer = Organizer::new(root, config).unwrap();
        let summary = organizer.apply().unwrap();

        assert_eq!(summary.prune.descended, vec![root.join("keep")]);
        assert!(root.join("keep/.hidden").is_file());
    }
}
