//! Uniform read access over the two archive families.
//!
//! ZIP-family archives (`.cbz`/`.zip`/`.epub`) go through the [`zip`] crate;
//! everything else (`.cbr`/`.rar`, `.cb7`/`.7z`, `.cbt`/`.tar.gz`) goes
//! through the general backend. A probe picks the backend by extension
//! fast-path first, then by actually trying to open the file, so mislabelled
//! archives (a ZIP renamed to `.cbr` notwithstanding the rar fast-path, or a
//! RAR renamed to `.cbz`) still resolve.

mod general;
mod zip_backend;

pub use general::GeneralBackend;
pub use zip_backend::ZipBackend;

use crate::error::{ArchiveError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::result::ZipError;

/// Archive family as reported by the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArchiveFamily {
    /// ZIP-family content (cbz, zip, epub).
    Zip,
    /// General-family content (rar, 7z, tar.gz).
    Rar,
    /// No backend could open the file.
    Unsupported,
}

/// One entry of an opened archive.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    /// Full path of the entry inside the archive, `/`-separated.
    pub full_name: String,
    /// True for directory entries.
    pub is_directory: bool,
    /// Compressed size in bytes (uncompressed size where the container does
    /// not track a packed size).
    pub compressed_size: u64,
    /// Uncompressed size in bytes.
    pub uncompressed_size: u64,
    /// Last-modified time where the container records one.
    pub last_modified: Option<zip::DateTime>,
    /// True when the source container kept the bytes uncompressed.
    pub stored: bool,
}

/// Read capabilities of one archive family.
///
/// Backends hold only the archive path; every call opens and closes its own
/// handle, which keeps them trivially shareable across worker threads.
pub trait ArchiveBackend: Send + Sync + std::fmt::Debug {
    /// Which family this backend serves.
    fn family(&self) -> ArchiveFamily;

    /// All entries of the archive, in container order.
    fn entries(&self) -> Result<Vec<ArchiveEntry>>;

    /// Whole contents of the named entry.
    fn read_entry(&self, name: &str) -> Result<Vec<u8>>;
}

/// Select and open a backend for the given file.
///
/// May open the file up to twice (once per family attempt); callers must
/// tolerate this cost. Failure modes stay distinct: a file whose content
/// never looked like an archive is `NotAnArchive`, a real read error is
/// `Io`/`Corrupt`, and a file that carries an archive signature no backend
/// could open is `Unsupported`.
pub fn open(path: &Path) -> Result<Box<dyn ArchiveBackend>> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    // RAR is the one format the ZIP attempt could not mistake anyway, and
    // rar archives are common enough to deserve the extension fast-path.
    let ext = name.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase());
    if matches!(ext.as_deref(), Some("cbr" | "rar")) {
        return Ok(Box::new(GeneralBackend::rar(path)));
    }

    match ZipBackend::open(path) {
        Ok(backend) => return Ok(Box::new(backend)),
        // Content is not ZIP; the general family gets its turn.
        Err(ArchiveError::Zip(ZipError::InvalidArchive(_) | ZipError::UnsupportedArchive(_))) => {}
        Err(other) => return Err(other),
    }
    if let Ok(backend) = GeneralBackend::open(path) {
        return Ok(Box::new(backend));
    }

    if has_archive_signature(path) {
        Err(ArchiveError::Unsupported(path.to_path_buf()))
    } else {
        Err(ArchiveError::NotAnArchive(path.to_path_buf()))
    }
}

/// Whether the file starts with a known archive signature (ZIP, RAR, 7z or
/// gzip). Distinguishes "never was an archive" from "an archive every
/// backend refused".
fn has_archive_signature(path: &Path) -> bool {
    let mut magic = [0u8; 8];
    let Ok(mut file) = File::open(path) else {
        return false;
    };
    if file.read_exact(&mut magic).is_err() {
        return false;
    }
    magic.starts_with(b"PK")
        || magic.starts_with(b"Rar!")
        || magic.starts_with(b"7z\xBC\xAF\x27\x1C")
        || magic.starts_with(&[0x1F, 0x8B])
}

/// Determine the archive family of an existing file without keeping a
/// backend around.
pub fn probe(path: &Path) -> ArchiveFamily {
    match open(path) {
        Ok(backend) => backend.family(),
        Err(_) => ArchiveFamily::Unsupported,
    }
}
