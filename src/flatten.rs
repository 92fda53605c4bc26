//! Lifting subdirectories to the operation root.
//!
//! Flattening only looks at the immediate children of one directory. Each child
//! directory is moved to `root/<normalized name>`, where `root` is always the
//! operation root, even when the children belong to a deeper directory. After
//! that the category folders are created under the root.

use crate::config::CollisionPolicy;
use crate::file_category::Category;
use crate::file_organizer::{OrganizeError, OrganizeResult};
use crate::normalize::Normalizer;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// What happened to one relocated directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryMove {
    /// Moved to a free destination.
    Moved { from: PathBuf, to: PathBuf },
    /// Contents moved into an existing destination.
    Merged { from: PathBuf, into: PathBuf },
    /// The existing destination was deleted and replaced.
    Replaced { from: PathBuf, to: PathBuf },
    /// Moved under a suffixed name because the destination was taken.
    Renamed {
        from: PathBuf,
        wanted: PathBuf,
        to: PathBuf,
    },
}

impl DirectoryMove {
    /// Returns true if the move ran into an existing destination.
    pub fn collided(&self) -> bool {
        !matches!(self, DirectoryMove::Moved { .. })
    }
}

/// Outcome of the flatten phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenReport {
    /// One entry per relocated directory, in processing order.
    pub moves: Vec<DirectoryMove>,
    /// Category folders that did not exist before.
    pub created_category_dirs: Vec<PathBuf>,
}

impl FlattenReport {
    /// Number of relocations that hit an existing destination.
    pub fn collisions(&self) -> usize {
        self.moves.iter().filter(|m| m.collided()).count()
    }
}

/// Moves subdirectories to the operation root under their normalized names.
pub struct Flattener<'a> {
    root: &'a Path,
    normalizer: &'a dyn Normalizer,
    policy: CollisionPolicy,
}

impl<'a> Flattener<'a> {
    pub fn new(root: &'a Path, normalizer: &'a dyn Normalizer, policy: CollisionPolicy) -> Self {
        Self {
            root,
            normalizer,
            policy,
        }
    }

    /// Relocates the root's subdirectories, then ensures the category folders exist.
    pub fn flatten(&self) -> OrganizeResult<FlattenReport> {
        let mut report = FlattenReport {
            moves: self.relocate_children(self.root)?,
            ..Default::default()
        };
        report.created_category_dirs = self.ensure_category_dirs()?;
        log::info!(
            "Flattened {} director(ies), {} collision(s)",
            report.moves.len(),
            report.collisions()
        );
        Ok(report)
    }

    /// Moves every immediate subdirectory of `dir` to the operation root.
    ///
    /// Children are listed once up front and handled in name order. A child
    /// whose destination is its own path stays put, and so do the category
    /// folders of the root.
    pub fn relocate_children(&self, dir: &Path) -> OrganizeResult<Vec<DirectoryMove>> {
        let mut moves = Vec::new();
        for child in child_dirs(dir)? {
            let name = child
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if dir == self.root && Category::is_category_dir(&name) {
                continue;
            }
            let destination = self.root.join(self.normalizer.normalize(&name));
            if destination == child {
                continue;
            }
            moves.push(self.relocate(&child, destination)?);
        }
        Ok(moves)
    }

    fn relocate(&self, from: &Path, to: PathBuf) -> OrganizeResult<DirectoryMove> {
        if fs::symlink_metadata(&to).is_err() {
            rename_dir(from, &to)?;
            log::debug!("Relocated {} -> {}", from.display(), to.display());
            return Ok(DirectoryMove::Moved {
                from: from.to_path_buf(),
                to,
            });
        }

        log::debug!(
            "{} collides with {} ({:?})",
            from.display(),
            to.display(),
            self.policy
        );
        match self.policy {
            CollisionPolicy::Error => Err(OrganizeError::FlattenCollision {
                from: from.to_path_buf(),
                to,
            }),
            // A file in the way is never deleted; it still has to be sorted.
            _ if !is_real_dir(&to) => self.rename_beside(from, to),
            CollisionPolicy::Replace => {
                remove_any(&to)?;
                rename_dir(from, &to)?;
                Ok(DirectoryMove::Replaced {
                    from: from.to_path_buf(),
                    to,
                })
            }
            CollisionPolicy::Rename => self.rename_beside(from, to),
            CollisionPolicy::Merge => {
                merge_into(from, &to)?;
                Ok(DirectoryMove::Merged {
                    from: from.to_path_buf(),
                    into: to,
                })
            }
        }
    }

    fn rename_beside(&self, from: &Path, wanted: PathBuf) -> OrganizeResult<DirectoryMove> {
        let free = free_name(&wanted);
        rename_dir(from, &free)?;
        Ok(DirectoryMove::Renamed {
            from: from.to_path_buf(),
            wanted,
            to: free,
        })
    }

    /// Creates the category folders that are missing and returns them.
    pub fn ensure_category_dirs(&self) -> OrganizeResult<Vec<PathBuf>> {
        let mut created = Vec::new();
        for category in Category::ALL {
            let path = self.root.join(category.dir_name());
            if path.is_dir() {
                continue;
            }
            fs::create_dir_all(&path).map_err(|e| OrganizeError::DirectoryCreationFailed {
                path: path.clone(),
                source: e,
            })?;
            created.push(path);
        }
        Ok(created)
    }
}

/// Immediate subdirectories of `dir`, sorted by name.
fn child_dirs(dir: &Path) -> OrganizeResult<Vec<PathBuf>> {
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

fn rename_dir(from: &Path, to: &Path) -> OrganizeResult<()> {
    fs::rename(from, to).map_err(|e| OrganizeError::DirectoryMoveFailed {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source: e,
    })
}

fn remove_any(path: &Path) -> OrganizeResult<()> {
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|e| OrganizeError::RemoveFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// True for a directory that is not reached through a symlink.
fn is_real_dir(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|meta| meta.is_dir())
}

/// First `name_N` next to `taken` that does not exist.
fn free_name(taken: &Path) -> PathBuf {
    let base = taken
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    (1..)
        .map(|n| taken.with_file_name(format!("{}_{}", base, n)))
        .find(|candidate| fs::symlink_metadata(candidate).is_err())
        .unwrap_or_else(|| taken.to_path_buf())
}

/// Moves the entries of `from` into `into`, recursing into directories present
/// on both sides, then removes `from`.
fn merge_into(from: &Path, into: &Path) -> OrganizeResult<()> {
    let read_err = |e: io::Error| OrganizeError::ReadDirFailed {
        path: from.to_path_buf(),
        source: e,
    };

    for entry in fs::read_dir(from).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let source = entry.path();
        let target = into.join(entry.file_name());
        let source_is_dir = entry.file_type().map_err(read_err)?.is_dir();

        let target_exists = fs::symlink_metadata(&target).is_ok();
        let target_is_dir = is_real_dir(&target);

        if source_is_dir && target_is_dir {
            merge_into(&source, &target)?;
            continue;
        }

        // Only a file replaces a file; a kind mismatch goes beside the target.
        let target = if target_exists && (source_is_dir || target_is_dir) {
            free_name(&target)
        } else {
            target
        };
        if source_is_dir {
            rename_dir(&source, &target)?;
        } else {
            fs::rename(&source, &target).map_err(|e| OrganizeError::FileMoveFailure {
                from: source.clone(),
                to: target.clone(),
                source: e,
            })?;
        }
    }

    fs::remove_dir(from).map_err(|e| OrganizeError::RemoveFailed {
        path: from.to_path_buf(),
        source: e,
    })
}
