/// Moving files into category directories.
///
/// This module holds the error type shared by every mutating phase and the
/// [`FileOrganizer`], which relocates each file under the operation root to
/// `root/<category>/<normalized stem><extension>` and expands archives on arrival.
use crate::archive::{ArchiveError, Extractor};
use crate::config::{CompiledFilters, ConfigError};
use crate::file_category::Category;
use crate::normalize::Normalizer;
use crate::scanner;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during file organization operations.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The base directory path is invalid or doesn't exist.
    #[error("Invalid base path {}: {source}", .path.display())]
    InvalidBasePath { path: PathBuf, source: io::Error },
    /// A directory listing could not be read.
    #[error("Error reading directory {}: {source}", .path.display())]
    ReadDirFailed { path: PathBuf, source: io::Error },
    /// Recursive traversal hit an unreadable entry.
    #[error("Error walking directory tree: {0}")]
    Walk(#[from] walkdir::Error),
    /// Failed to create a category directory.
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },
    /// Failed to relocate a directory during flattening.
    #[error("Failed to move directory {} to {}: {source}", .from.display(), .to.display())]
    DirectoryMoveFailed {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
    /// A relocated directory collided with an existing one under the `error` policy.
    #[error("Directory {} collides with existing {}", .from.display(), .to.display())]
    FlattenCollision { from: PathBuf, to: PathBuf },
    /// Failed to move a file to its category directory.
    #[error("Failed to move {} to {}: {source}", .from.display(), .to.display())]
    FileMoveFailure {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
    /// An archive was moved but could not be expanded.
    #[error("Failed to expand archive {}: {source}", .archive.display())]
    ArchiveExpansionFailed {
        archive: PathBuf,
        source: ArchiveError,
    },
    /// A directory could not be removed for a reason other than being non-empty.
    #[error("Failed to remove directory {}: {source}", .path.display())]
    RemoveFailed { path: PathBuf, source: io::Error },
    /// The configuration could not be loaded or compiled.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Records where a single file went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    /// The path of the file before it was moved.
    pub original_path: PathBuf,
    /// The path of the file after it was moved.
    pub new_path: PathBuf,
    /// The category the file was sorted into.
    pub category: Category,
    /// Where the archive was expanded to, for archives.
    pub expanded_into: Option<PathBuf>,
}

/// Moves every file under the operation root into its category directory.
pub struct FileOrganizer<'a> {
    root: &'a Path,
    normalizer: &'a dyn Normalizer,
    extractor: &'a dyn Extractor,
    filters: &'a CompiledFilters,
    expand_archives: bool,
}

impl<'a> FileOrganizer<'a> {
    /// Creates an organizer for `root`.
    pub fn new(
        root: &'a Path,
        normalizer: &'a dyn Normalizer,
        extractor: &'a dyn Extractor,
        filters: &'a CompiledFilters,
    ) -> Self {
        Self {
            root,
            normalizer,
            extractor,
            filters,
            expand_archives: true,
        }
    }

    /// Enables or disables expansion of archives after they are moved.
    pub fn expand_archives(mut self, enabled: bool) -> Self {
        self.expand_archives = enabled;
        self
    }

    /// Computes the category and destination of a file.
    ///
    /// The stem goes through the normalizer; the extension is kept verbatim,
    /// including its casing.
    ///
    /// # Examples
    ///
    /// ```
    /// use dirsort::archive::ArchiveExpander;
    /// use dirsort::config::CompiledFilters;
    /// use dirsort::file_category::Category;
    /// use dirsort::file_organizer::FileOrganizer;
    /// use dirsort::normalize::Transliterator;
    /// use std::path::Path;
    ///
    /// let filters = CompiledFilters::default();
    /// let root = Path::new("/data");
    /// let organizer = FileOrganizer::new(root, &Transliterator, &ArchiveExpander, &filters);
    ///
    /// let (category, destination) = organizer.destination_for(Path::new("/data/sub/Фото 1.JPG"));
    /// assert_eq!(category, Category::Image);
    /// assert_eq!(destination, Path::new("/data/images/Foto_1.JPG"));
    /// ```
    pub fn destination_for(&self, file_path: &Path) -> (Category, PathBuf) {
        let ext = file_path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        let category = Category::for_extension(&ext).unwrap_or(Category::Other);

        let stem = file_path
            .file_stem()
            .map(|s| s.to_string_lossy())
            .unwrap_or_default();
        let mut file_name = self.normalizer.normalize(&stem);
        if !ext.is_empty() {
            file_name.push('.');
            file_name.push_str(&ext);
        }

        (category, self.root.join(category.dir_name()).join(file_name))
    }

    /// Moves one file into its category directory and expands it if it is an archive.
    ///
    /// The category directory is created if it does not exist yet. A file that
    /// already sits at its destination is left in place. A file with the same
    /// destination name is overwritten.
    pub fn move_to_category(&self, file_path: &Path) -> OrganizeResult<Relocation> {
        let (category, destination) = self.destination_for(file_path);

        if let Some(category_dir) = destination.parent()
            && !category_dir.is_dir()
        {
            fs::create_dir_all(category_dir).map_err(|e| {
                OrganizeError::DirectoryCreationFailed {
                    path: category_dir.to_path_buf(),
                    source: e,
                }
            })?;
        }

        if destination != file_path {
            fs::rename(file_path, &destination).map_err(|e| OrganizeError::FileMoveFailure {
                from: file_path.to_path_buf(),
                to: destination.clone(),
                source: e,
            })?;
            log::debug!("Moved {} -> {}", file_path.display(), destination.display());
        }

        let expanded_into = if category == Category::Archive && self.expand_archives {
            Some(self.expand(&destination)?)
        } else {
            None
        };

        Ok(Relocation {
            original_path: file_path.to_path_buf(),
            new_path: destination,
            category,
            expanded_into,
        })
    }

    /// Expands an archive into a sibling directory named after its stem.
    ///
    /// On failure the archive stays where it was moved to.
    fn expand(&self, archive: &Path) -> OrganizeResult<PathBuf> {
        let stem = archive
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let target = archive.with_file_name(stem);

        self.extractor
            .expand(archive, &target)
            .map_err(|e| OrganizeError::ArchiveExpansionFailed {
                archive: archive.to_path_buf(),
                source: e,
            })?;
        log::debug!("Expanded {} into {}", archive.display(), target.display());
        Ok(target)
    }

    /// Moves every file under the root.
    ///
    /// The file listing is taken once, before anything moves, so files that
    /// appear during the run (expanded archive contents) are left where they
    /// land. Files that disappeared since the listing are skipped. `on_move` is
    /// called after each relocation. The first error aborts the phase.
    pub fn move_all<F>(&self, mut on_move: F) -> OrganizeResult<Vec<Relocation>>
    where
        F: FnMut(&Relocation),
    {
        if !self.root.is_dir() {
            return Err(OrganizeError::InvalidBasePath {
                path: self.root.to_path_buf(),
                source: io::Error::new(io::ErrorKind::NotFound, "base path is not a directory"),
            });
        }

        let files = scanner::list_files(self.root, self.filters)?;
        log::info!("Moving {} file(s) under {}", files.len(), self.root.display());

        let mut relocations = Vec::with_capacity(files.len());
        for file_path in files {
            if fs::symlink_metadata(&file_path).is_err() {
                log::debug!("Skipping vanished file {}", file_path.display());
                continue;
            }
            let relocation = self.move_to_category(&file_path)?;
            on_move(&relocation);
            relocations.push(relocation);
        }
        Ok(relocations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveExpander;
    use crate::normalize::Transliterator;
    use std::cell::RefCell;
    use tempfile::TempDir;

    /// Records calls instead of unpacking anything.
    struct RecordingExtractor {
        calls: RefCell<Vec<(PathBuf, PathBuf)>>,
        fail: bool,
    }

    impl RecordingExtractor {
        fn new(fail: bool) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                fail,
            }
        }
    }

    impl Extractor for RecordingExtractor {
        fn expand(&self, archive: &Path, destination: &Path) -> Result<usize, ArchiveError> {
            self.calls
                .borrow_mut()
                .push((archive.to_path_buf(), destination.to_path_buf()));
            if self.fail {
                Err(ArchiveError::UnsupportedFormat(archive.to_path_buf()))
            } else {
                Ok(0)
            }
        }
    }

    #[test]
    fn test_destination_keeps_extension_casing() {
        let filters = CompiledFilters::default();
        let root = Path::new("/base");
        let organizer = FileOrganizer::new(root, &Transliterator, &ArchiveExpander, &filters);

        let (category, dest) = organizer.destination_for(Path::new("/base/a b.Mp3"));
        assert_eq!(category, Category::Audio);
        assert_eq!(dest, Path::new("/base/audio/a_b.Mp3"));

        let (category, dest) = organizer.destination_for(Path::new("/base/x/README"));
        assert_eq!(category, Category::Other);
        assert_eq!(dest, Path::new("/base/other/README"));
    }

    #[test]
    fn test_move_to_category_creates_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        let file_path = base_path.join("test.txt");
        fs::write(&file_path, "test content").expect("Failed to write test file");

        let filters = CompiledFilters::default();
        let organizer = FileOrganizer::new(base_path, &Transliterator, &ArchiveExpander, &filters);
        let relocation = organizer
            .move_to_category(&file_path)
            .expect("Failed to move file");

        assert_eq!(relocation.category, Category::Document);
        assert!(!file_path.exists());
        assert!(base_path.join("documents/test.txt").is_file());
    }

    #[test]
    fn test_move_all_reaches_nested_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        fs::create_dir_all(base_path.join("deep/er")).unwrap();
        fs::write(base_path.join("deep/er/song.ogg"), "la").unwrap();
        fs::write(base_path.join("clip.MOV"), "frames").unwrap();

        let filters = CompiledFilters::default();
        let organizer = FileOrganizer::new(base_path, &Transliterator, &ArchiveExpander, &filters);
        let mut seen = 0;
        let relocations = organizer.move_all(|_| seen += 1).expect("move_all failed");

        assert_eq!(relocations.len(), 2);
        assert_eq!(seen, 2);
        assert!(base_path.join("audio/song.ogg").is_file());
        assert!(base_path.join("video/clip.MOV").is_file());
    }

    #[test]
    fn test_archive_is_expanded_next_to_itself() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        fs::write(base_path.join("backup.tar"), "tar bytes").unwrap();

        let filters = CompiledFilters::default();
        let extractor = RecordingExtractor::new(false);
        let organizer = FileOrganizer::new(base_path, &Transliterator, &extractor, &filters);
        let relocations = organizer.move_all(|_| {}).unwrap();

        let archive = base_path.join("archives/backup.tar");
        let target = base_path.join("archives/backup");
        assert_eq!(relocations[0].expanded_into.as_deref(), Some(target.as_path()));
        assert_eq!(extractor.calls.borrow().as_slice(), &[(archive, target)]);
    }

    #[test]
    fn test_expansion_disabled() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        fs::write(base_path.join("backup.zip"), "zip bytes").unwrap();

        let filters = CompiledFilters::default();
        let extractor = RecordingExtractor::new(false);
        let organizer = FileOrganizer::new(base_path, &Transliterator, &extractor, &filters)
            .expand_archives(false);
        organizer.move_all(|_| {}).unwrap();

        assert!(base_path.join("archives/backup.zip").is_file());
        assert!(extractor.calls.borrow().is_empty());
    }

    #[test]
    fn test_expansion_failure_propagates_and_keeps_archive() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        fs::write(base_path.join("broken.zip"), "not really").unwrap();

        let filters = CompiledFilters::default();
        let extractor = RecordingExtractor::new(true);
        let organizer = FileOrganizer::new(base_path, &Transliterator, &extractor, &filters);
        let result = organizer.move_all(|_| {});

        assert!(matches!(
            result,
            Err(OrganizeError::ArchiveExpansionFailed { .. })
        ));
        assert!(base_path.join("archives/broken.zip").is_file());
    }

    #[test]
    fn test_move_all_invalid_base_path() {
        let filters = CompiledFilters::default();
        let organizer = FileOrganizer::new(
            Path::new("/non/existent/path"),
            &Transliterator,
            &ArchiveExpander,
            &filters,
        );
        assert!(matches!(
            organizer.move_all(|_| {}),
            Err(OrganizeError::InvalidBasePath { .. })
        ));
    }
}
