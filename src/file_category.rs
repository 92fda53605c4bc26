//! File categorization by extension.
//!
//! Every file maps to exactly one [`Category`]. The [`Classifier`] wraps the pure
//! lookup and remembers which extensions it has seen, split into the ones that
//! matched a category and the ones that fell through to [`Category::Other`].
//!
//! # Examples
//!
//! ```
//! use dirsort::file_category::{Category, Classifier};
//!
//! let mut classifier = Classifier::new();
//! assert_eq!(classifier.classify(".JPG"), Category::Image);
//! assert_eq!(classifier.classify("xyz"), Category::Other);
//! assert!(classifier.registry().known.contains("JPG"));
//! assert!(classifier.registry().unknown.contains("XYZ"));
//! ```

use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;

/// A fixed classification bucket.
///
/// Variants are declared in lookup order; the derived `Ord` follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    /// Archive files (ZIP, GZ, TAR)
    #[serde(rename = "archives")]
    Archive,
    /// Video files (AVI, MP4, MOV, MKV)
    #[serde(rename = "video")]
    Video,
    /// Audio files (MP3, OGG, WAV, AMR)
    #[serde(rename = "audio")]
    Audio,
    /// Document files (DOC, DOCX, TXT, PDF, XLSX, PPTX)
    #[serde(rename = "documents")]
    Document,
    /// Image files (JPEG, PNG, JPG, SVG)
    #[serde(rename = "images")]
    Image,
    /// Anything not listed above
    #[serde(rename = "other")]
    Other,
}

impl Category {
    /// All categories, in lookup order.
    pub const ALL: [Category; 6] = [
        Category::Archive,
        Category::Video,
        Category::Audio,
        Category::Document,
        Category::Image,
        Category::Other,
    ];

    /// Returns the directory name for this category.
    ///
    /// # Examples
    ///
    /// ```
    /// use dirsort::file_category::Category;
    ///
    /// assert_eq!(Category::Image.dir_name(), "images");
    /// assert_eq!(Category::Archive.dir_name(), "archives");
    /// assert_eq!(Category::Other.dir_name(), "other");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Archive => "archives",
            Category::Video => "video",
            Category::Audio => "audio",
            Category::Document => "documents",
            Category::Image => "images",
            Category::Other => "other",
        }
    }

    /// Returns a human-readable label used in the summary table.
    pub fn description(&self) -> &'static str {
        match self {
            Category::Archive => "Archives",
            Category::Video => "Video",
            Category::Audio => "Audio",
            Category::Document => "Documents",
            Category::Image => "Images",
            Category::Other => "Other types",
        }
    }

    /// Recognized extensions, uppercase, without the leading dot.
    ///
    /// `Other` owns none; it matches whatever the rest do not.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Category::Archive => &["ZIP", "GZ", "TAR"],
            Category::Video => &["AVI", "MP4", "MOV", "MKV"],
            Category::Audio => &["MP3", "OGG", "WAV", "AMR"],
            Category::Document => &["DOC", "DOCX", "TXT", "PDF", "XLSX", "PPTX"],
            Category::Image => &["JPEG", "PNG", "JPG", "SVG"],
            Category::Other => &[],
        }
    }

    /// Returns true when `name` is one of the category folder names.
    pub fn is_category_dir(name: &str) -> bool {
        Self::ALL.iter().any(|category| category.dir_name() == name)
    }

    /// Looks up the owning category without recording anything.
    ///
    /// A single leading dot is ignored and the comparison is case-insensitive.
    pub fn for_extension(ext: &str) -> Option<Category> {
        let ext = ext.strip_prefix('.').unwrap_or(ext);
        Self::ALL.into_iter().find(|category| {
            category
                .extensions()
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
    }
}

/// Extensions seen by a [`Classifier`], uppercased.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtensionRegistry {
    /// Extensions that matched a category.
    pub known: BTreeSet<String>,
    /// Extensions that fell through to `Other`. A file with no extension
    /// contributes the empty string.
    pub unknown: BTreeSet<String>,
}

/// Maps extensions to categories and records what it has seen.
///
/// One classifier belongs to one reorganization run; create a fresh one for
/// every scan so the registry reflects a single pass over the tree.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    registry: ExtensionRegistry,
}

impl Classifier {
    /// Creates a classifier with an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies an extension and records it in the registry.
    ///
    /// Never fails: anything unmapped is [`Category::Other`].
    pub fn classify(&mut self, ext: &str) -> Category {
        let ext = ext.strip_prefix('.').unwrap_or(ext);
        let upper = ext.to_uppercase();

        match Category::for_extension(ext) {
            Some(category) => {
                self.registry.known.insert(upper);
                category
            }
            None => {
                self.registry.unknown.insert(upper);
                Category::Other
            }
        }
    }

    /// Classifies a path by its extension.
    pub fn classify_path(&mut self, path: &Path) -> Category {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy())
            .unwrap_or_default();
        self.classify(&ext)
    }

    /// Returns the extensions recorded so far.
    pub fn registry(&self) -> &ExtensionRegistry {
        &self.registry
    }

    /// Consumes the classifier, returning its registry.
    pub fn into_registry(self) -> ExtensionRegistry {
        self.registry
    }
}
