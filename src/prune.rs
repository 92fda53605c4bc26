//! Removing directories left empty by the move phase.
//!
//! Each directory goes through a small state machine:
//!
//! ```text
//! untouched -> removal attempted -> removed
//!                                \-> descended (not empty: children pruned, directory kept)
//! ```
//!
//! A descended directory is not retried in the same pass, so a tree nested more
//! than one level deep can need another pass. The [`PruneOutcome`] says so.

use crate::file_category::Category;
use crate::file_organizer::{OrganizeError, OrganizeResult};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Terminal state of one directory visited by the pruner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneState {
    /// The directory was empty and is gone.
    Removed,
    /// The directory was not empty; its children were pruned instead.
    Descended,
}

/// Result of one pruning pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneOutcome {
    /// Directories that were removed.
    pub removed: Vec<PathBuf>,
    /// Non-empty directories that were descended into and left in place.
    pub descended: Vec<PathBuf>,
}

impl PruneOutcome {
    /// Returns true when nothing was left behind.
    pub fn is_clean(&self) -> bool {
        self.descended.is_empty()
    }

    /// Returns true when another pass may remove more directories.
    pub fn needs_another_pass(&self) -> bool {
        !self.is_clean()
    }

    fn record(&mut self, path: PathBuf, state: PruneState) {
        match state {
            PruneState::Removed => self.removed.push(path),
            PruneState::Descended => self.descended.push(path),
        }
    }

    /// Folds a later pass into this outcome. Only the latest pass decides
    /// what is still left behind.
    pub fn absorb(&mut self, later: PruneOutcome) {
        self.removed.extend(later.removed);
        self.descended = later.descended;
    }
}

/// Removes empty non-category directories under the operation root.
pub struct Pruner<'a> {
    root: &'a Path,
}

impl<'a> Pruner<'a> {
    pub fn new(root: &'a Path) -> Self {
        Self { root }
    }

    /// Runs one pruning pass over the root's children.
    ///
    /// Category folders directly under the root are never touched. Failing to
    /// remove a directory for any reason other than it being non-empty is an
    /// error.
    pub fn prune(&self) -> OrganizeResult<PruneOutcome> {
        let mut outcome = PruneOutcome::default();
        self.prune_dir(self.root, true, &mut outcome)?;

        if outcome.needs_another_pass() {
            log::warn!(
                "Deeply nested directories remain under {} ({} left); run the organizer again",
                self.root.display(),
                outcome.descended.len()
            );
        }
        Ok(outcome)
    }

    fn prune_dir(&self, dir: &Path, is_root: bool, outcome: &mut PruneOutcome) -> OrganizeResult<()> {
        for child in sub_dirs(dir)? {
            let is_category = child
                .file_name()
                .is_some_and(|name| Category::is_category_dir(&name.to_string_lossy()));
            if is_root && is_category {
                continue;
            }
            let state = self.attempt(&child, outcome)?;
            outcome.record(child, state);
        }
        Ok(())
    }

    fn attempt(&self, dir: &Path, outcome: &mut PruneOutcome) -> OrganizeResult<PruneState> {
        match fs::remove_dir(dir) {
            Ok(()) => {
                log::debug!("Removed empty directory {}", dir.display());
                Ok(PruneState::Removed)
            }
            Err(e) if is_not_empty(&e, dir) => {
                log::debug!("{} is not empty, descending", dir.display());
                self.prune_dir(dir, false, outcome)?;
                Ok(PruneState::Descended)
            }
            Err(e) => Err(OrganizeError::RemoveFailed {
                path: dir.to_path_buf(),
                source: e,
            }),
        }
    }
}

/// Some platforms report a non-empty directory with a generic error kind, so
/// the directory itself is checked as well.
fn is_not_empty(error: &io::Error, dir: &Path) -> bool {
    error.kind() == io::ErrorKind::DirectoryNotEmpty
        || fs::read_dir(dir).is_ok_and(|mut entries| entries.next().is_some())
}

fn sub_dirs(dir: &Path) -> OrganizeResult<Vec<PathBuf>> {
    let read_err = |e: io::Error| OrganizeError::ReadDirFailed {
        path: dir.to_path_buf(),
        source: e,
    };

    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        if entry.file_type().map_err(read_err)?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_removes_empty_directories() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir(root.join("Photos")).unwrap();
        fs::create_dir(root.join("Music")).unwrap();

        let outcome = Pruner::new(root).prune().unwrap();

        assert!(outcome.is_clean());
        assert_eq!(outcome.removed.len(), 2);
        assert!(!root.join("Photos").exists());
        assert!(!root.join("Music").exists());
    }

    #[test]
    fn test_never_removes_category_dirs() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        for category in Category::ALL {
            fs::create_dir(root.join(category.dir_name())).unwrap();
        }

        let outcome = Pruner::new(root).prune().unwrap();

        assert!(outcome.removed.is_empty());
        for category in Category::ALL {
            assert!(root.join(category.dir_name()).is_dir());
        }
    }

    #[test]
    fn test_category_names_below_root_are_prunable() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir_all(root.join("old/images")).unwrap();

        let outcome = Pruner::new(root).prune().unwrap();

        assert_eq!(outcome.descended, vec![root.join("old")]);
        assert!(!root.join("old/images").exists());
    }

    #[test]
    fn test_nested_empty_dirs_need_another_pass() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir_all(root.join("a/b/c")).unwrap();

        let pruner = Pruner::new(root);
        let first = pruner.prune().unwrap();

        assert!(first.needs_another_pass());
        assert_eq!(first.removed, vec![root.join("a/b/c")]);
        assert_eq!(first.descended, vec![root.join("a/b"), root.join("a")]);
        assert!(root.join("a/b").is_dir());

        let second = pruner.prune().unwrap();
        assert!(second.needs_another_pass());
        let third = pruner.prune().unwrap();
        assert!(third.is_clean());
        assert!(!root.join("a").exists());
    }

    #[test]
    fn test_directory_with_files_is_kept() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir(root.join("keep")).unwrap();
        fs::write(root.join("keep/file.txt"), "data").unwrap();

        let outcome = Pruner::new(root).prune().unwrap();

        assert_eq!(outcome.descended, vec![root.join("keep")]);
        assert!(root.join("keep/file.txt").is_file());
    }

    #[test]
    fn test_absorb_keeps_latest_leftovers() {
        let mut first = PruneOutcome {
            removed: vec![PathBuf::from("/r/a/b")],
            descended: vec![PathBuf::from("/r/a")],
        };
        first.absorb(PruneOutcome {
            removed: vec![PathBuf::from("/r/a")],
            descended: Vec::new(),
        });

        assert!(first.is_clean());
        assert_eq!(first.removed.len(), 2);
    }
}
