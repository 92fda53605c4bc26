//! Name normalization for files and directories.
//!
//! The organizer only relies on the [`Normalizer`] contract: a pure string
//! transform whose output is safe to use as a single path component. The default
//! [`Transliterator`] turns non-Latin scripts into ASCII with `deunicode` and
//! replaces everything outside `[A-Za-z0-9_]` with `_`.

use deunicode::deunicode;
use regex::Regex;
use std::sync::LazyLock;

/// Anything that is not a word character in the ASCII sense.
static RE_NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]").expect("Invalid regex"));

/// Turns a file stem or directory name into a filesystem-safe form.
///
/// Implementations must be pure and must not return a string containing a path
/// separator.
pub trait Normalizer {
    /// Returns the normalized form of `name`.
    fn normalize(&self, name: &str) -> String;
}

impl<F> Normalizer for F
where
    F: Fn(&str) -> String,
{
    fn normalize(&self, name: &str) -> String {
        self(name)
    }
}

/// Default normalizer: transliterate, then sanitize.
///
/// # Examples
///
/// ```
/// use dirsort::normalize::{Normalizer, Transliterator};
///
/// let normalizer = Transliterator;
/// assert_eq!(normalizer.normalize("Звіт 2024"), "Zvit_2024");
/// assert_eq!(normalizer.normalize("holiday-photos"), "holiday_photos");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Transliterator;

impl Normalizer for Transliterator {
    fn normalize(&self, name: &str) -> String {
        let latin = deunicode(name);
        let cleaned = RE_NON_WORD.replace_all(&latin, "_");
        if cleaned.is_empty() {
            "_".to_string()
        } else {
            cleaned.into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transliterates_cyrillic() {
        let normalizer = Transliterator;
        assert_eq!(normalizer.normalize("Фото"), "Foto");
        assert_eq!(normalizer.normalize("Документи"), "Dokumenti");
    }

    #[test]
    fn test_replaces_punctuation_and_spaces() {
        let normalizer = Transliterator;
        assert_eq!(normalizer.normalize("my file (1)"), "my_file__1_");
        assert_eq!(normalizer.normalize(".hidden"), "_hidden");
    }

    #[test]
    fn test_keeps_ascii_word_characters() {
        let normalizer = Transliterator;
        assert_eq!(normalizer.normalize("Report_2024"), "Report_2024");
    }

    #[test]
    fn test_is_idempotent() {
        let normalizer = Transliterator;
        for name in ["Фото відпустка", "a.b-c", "already_clean"] {
            let once = normalizer.normalize(name);
            assert_eq!(normalizer.normalize(&once), once);
        }
    }

    #[test]
    fn test_empty_name_becomes_placeholder() {
        assert_eq!(Transliterator.normalize(""), "_");
    }

    #[test]
    fn test_closure_normalizer() {
        let upper = |name: &str| name.to_uppercase();
        assert_eq!(upper.normalize("photos"), "PHOTOS");
    }
}
