use std::path::PathBuf;
use thiserror::Error;

/// Main error type for archive operations.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The path exists but neither its extension nor its content identify a
    /// supported archive.
    #[error("Not an archive: {0}")]
    NotAnArchive(PathBuf),

    /// Every backend refused to open the file.
    #[error("Unsupported archive format: {0}")]
    Unsupported(PathBuf),

    /// A backend failed while reading archive structure or entry data.
    #[error("Corrupt archive: {0}")]
    Corrupt(String),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP backend error.
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// An entry named by the caller (explicit cover, sidecar) is absent.
    #[error("Entry not found in archive: {0}")]
    EntryMissing(String),

    /// A page range exceeds the filtered image list. Never clamped.
    #[error("Page range {min}-{max} out of bounds for {len} pages")]
    RangeOutOfBounds {
        /// Requested lower bound (inclusive).
        min: usize,
        /// Requested upper bound (inclusive).
        max: usize,
        /// Number of pages actually available.
        len: usize,
    },

    /// A page-range string failed to parse.
    #[error("Malformed page range: {0:?}")]
    MalformedRange(String),

    /// The `ComicInfo.xml` sidecar is not well-formed XML.
    #[error("Malformed ComicInfo.xml: {0}")]
    MalformedSidecar(#[from] roxmltree::Error),

    /// Image decoding or encoding error.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Extraction to disk failed; surrounding tasks must abort.
    #[error("Extraction failed: {0}")]
    ExtractFailed(String),

    /// The operation observed its cancellation signal.
    #[error("Operation cancelled")]
    Cancelled,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;
