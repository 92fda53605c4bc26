//! Archive expansion.
//!
//! The mover hands every file classified as an archive to an [`Extractor`]. The
//! default [`ArchiveExpander`] sniffs the container with `infer` and falls back to
//! the file extension, then unpacks zip, tar, tar.gz and plain gzip files.

use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

const TAR_BLOCK_LEN: u64 = 512;

/// Errors raised while expanding an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The file is not in a format the expander understands.
    #[error("Unsupported archive format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
    /// The zip container is corrupt or unreadable.
    #[error("Invalid or corrupt ZIP: {0}")]
    Zip(#[from] zip::result::ZipError),
    /// Reading the archive or writing its contents failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Expands an archive into a destination directory.
pub trait Extractor {
    /// Unpacks `archive` into `destination`, creating it if needed, and returns
    /// the number of files written. Existing files in `destination` are
    /// overwritten.
    fn expand(&self, archive: &Path, destination: &Path) -> Result<usize, ArchiveError>;
}

/// Container formats the default expander can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar,
    TarGz,
    /// A single gzip-compressed file.
    Gzip,
}

impl ArchiveFormat {
    /// Detects the format from the file content, falling back to its name.
    pub fn detect(path: &Path) -> Option<Self> {
        let sniffed = infer::get_from_path(path)
            .ok()
            .flatten()
            .and_then(|kind| match kind.mime_type() {
                "application/zip" => Some(Self::Zip),
                "application/x-tar" => Some(Self::Tar),
                "application/gzip" => Some(Self::gzip_flavor(path)),
                _ => None,
            });

        sniffed.or_else(|| Self::from_name(path))
    }

    /// Detects the format from the file name alone.
    pub fn from_name(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        match ext.as_str() {
            "zip" => Some(Self::Zip),
            "tar" => Some(Self::Tar),
            "tgz" => Some(Self::TarGz),
            "gz" => Some(Self::gzip_flavor(path)),
            _ => None,
        }
    }

    /// Tells a gzipped tarball from a single compressed file.
    ///
    /// The decompressed stream is checked for the tar header magic, so a
    /// renamed tarball (`site_tar.gz`) is still unpacked as tar. The name is
    /// only consulted when the stream cannot be read.
    fn gzip_flavor(path: &Path) -> Self {
        match gzip_holds_tar(path) {
            Some(true) => Self::TarGz,
            Some(false) => Self::Gzip,
            None if gzip_name_says_tar(path) => Self::TarGz,
            None => Self::Gzip,
        }
    }
}

/// Decompresses the first tar header block of a gzip file and checks it.
fn gzip_holds_tar(path: &Path) -> Option<bool> {
    let mut head = Vec::with_capacity(TAR_BLOCK_LEN as usize);
    GzDecoder::new(File::open(path).ok()?)
        .take(TAR_BLOCK_LEN)
        .read_to_end(&mut head)
        .ok()?;
    Some(infer::archive::is_tar(&head))
}

fn gzip_name_says_tar(path: &Path) -> bool {
    let inner_is_tar = path
        .file_stem()
        .map(Path::new)
        .and_then(Path::extension)
        .is_some_and(|ext| ext.eq_ignore_ascii_case("tar"));
    let is_tgz = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("tgz"));
    inner_is_tar || is_tgz
}

/// Default [`Extractor`] backed by the `zip`, `tar` and `flate2` crates.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveExpander;

impl Extractor for ArchiveExpander {
    fn expand(&self, archive: &Path, destination: &Path) -> Result<usize, ArchiveError> {
        let format = ArchiveFormat::detect(archive)
            .ok_or_else(|| ArchiveError::UnsupportedFormat(archive.to_path_buf()))?;

        fs::create_dir_all(destination)?;

        let count = match format {
            ArchiveFormat::Zip => extract_zip(archive, destination)?,
            ArchiveFormat::Tar => extract_tar(File::open(archive)?, destination)?,
            ArchiveFormat::TarGz => {
                extract_tar(GzDecoder::new(File::open(archive)?), destination)?
            }
            ArchiveFormat::Gzip => extract_gzip(archive, destination)?,
        };

        log::debug!(
            "Expanded {} file(s) from {} into {}",
            count,
            archive.display(),
            destination.display()
        );
        Ok(count)
    }
}

fn extract_zip(archive_path: &Path, dest_path: &Path) -> Result<usize, ArchiveError> {
    let file = File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    let mut count = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;

        let entry_path = match entry.enclosed_name() {
            Some(p) => p,
            None => {
                log::warn!("Skipping unsafe zip entry: {}", entry.name());
                continue;
            }
        };

        let output_path = dest_path.join(entry_path);

        if entry.is_dir() {
            fs::create_dir_all(&output_path)?;
        } else {
            if let Some(parent) = output_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut outfile = File::create(&output_path)?;
            io::copy(&mut entry, &mut outfile)?;
            count += 1;
        }
    }
    Ok(count)
}

fn extract_tar<R: io::Read>(reader: R, dest_path: &Path) -> Result<usize, ArchiveError> {
    let mut archive = tar::Archive::new(reader);

    let mut count = 0;
    for entry in archive.entries()? {
        let mut entry = entry?;
        let is_file = entry.header().entry_type().is_file();
        // `unpack_in` refuses paths escaping the destination and reports false.
        if !entry.unpack_in(dest_path)? {
            log::warn!("Skipping unsafe tar entry: {}", entry.path()?.display());
            continue;
        }
        if is_file {
            count += 1;
        }
    }
    Ok(count)
}

fn extract_gzip(archive_path: &Path, dest_path: &Path) -> Result<usize, ArchiveError> {
    let name = archive_path
        .file_stem()
        .ok_or_else(|| ArchiveError::UnsupportedFormat(archive_path.to_path_buf()))?;

    let mut decoder = GzDecoder::new(File::open(archive_path)?);
    let mut outfile = File::create(dest_path.join(name))?;
    io::copy(&mut decoder, &mut outfile)?;
    Ok(1)
}
