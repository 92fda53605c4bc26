//! Read-only traversal of the operation root.
//!
//! The scanner walks the whole tree depth-first and classifies every file it
//! finds without touching the filesystem. Its output feeds the dry-run report.

use crate::config::CompiledFilters;
use crate::file_category::{Category, Classifier, ExtensionRegistry};
use crate::file_organizer::OrganizeResult;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Summary of a dry run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Number of files per category. Every category is present.
    pub counts: BTreeMap<Category, usize>,
    /// Uppercased extensions that matched a category.
    pub known: BTreeSet<String>,
    /// Uppercased extensions that fell through to `Other`.
    pub unknown: BTreeSet<String>,
    /// Sum of all counts.
    pub total: usize,
}

impl ScanReport {
    /// Folds a scan result and the classifier's registry into a report.
    pub fn new(categories: &[Category], registry: ExtensionRegistry) -> Self {
        let mut counts: BTreeMap<Category, usize> =
            Category::ALL.iter().map(|category| (*category, 0)).collect();
        for category in categories {
            *counts.entry(*category).or_insert(0) += 1;
        }

        Self {
            counts,
            known: registry.known,
            unknown: registry.unknown,
            total: categories.len(),
        }
    }

    /// Returns the number of files in `category`.
    pub fn count(&self, category: Category) -> usize {
        self.counts.get(&category).copied().unwrap_or(0)
    }
}

/// Lists every non-directory entry under `root`, depth-first in file-name order.
///
/// Paths are absolute (joined onto `root`). Files rejected by `filters`, which
/// see the path relative to `root`, are left out.
pub fn list_files(root: &Path, filters: &CompiledFilters) -> OrganizeResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
    {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if filters.should_include(relative) {
            files.push(entry.into_path());
        } else {
            log::debug!("Filtered out {}", relative.display());
        }
    }
    Ok(files)
}

/// Classifies every file under `dir`, one category per file.
///
/// Nothing on disk is created, moved or deleted. Repeating the call on an
/// unchanged tree yields the same sequence.
pub fn scan(
    dir: &Path,
    classifier: &mut Classifier,
    filters: &CompiledFilters,
) -> OrganizeResult<Vec<Category>> {
    let files = list_files(dir, filters)?;
    Ok(files
        .iter()
        .map(|path| classifier.classify_path(path))
        .collect())
}

/// Scans `dir` with a fresh classifier and builds the dry-run report.
pub fn scan_report(dir: &Path, filters: &CompiledFilters) -> OrganizeResult<ScanReport> {
    let mut classifier = Classifier::new();
    let categories = scan(dir, &mut classifier, filters)?;
    Ok(ScanReport::new(&categories, classifier.into_registry()))
}
