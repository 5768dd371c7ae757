//! comicarc: a codec for comic book archives.
//!
//! Treats each archive (CBZ/ZIP/EPUB, CBR/RAR, CB7/7z, CBT/tar.gz) as a
//! virtual collection of pages: random access by page-index range, canonical
//! cover election by filename convention, on-demand repackaging of a page
//! window into a fresh ZIP, `ComicInfo.xml` sidecar parsing, and chapter
//! extraction from sidecar bookmarks or page names.
//!
//! # Features
//!
//! - Two read backends behind one trait: ZIP-family and the general family
//!   (RAR v4/v5, 7z, tar.gz), selected by a content probe
//! - Natural ordering of pages (`page2` before `page10`)
//! - Cover-appendix handling for page ranges that start at page 0
//! - Defensive filtering of `__MACOSX` folders and resource-fork sidecars
//! - Per-archive failure isolation: a corrupt file is one report and one
//!   empty result, never a poisoned scan
//! - Cooperative cancellation for extraction and repackaging

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Archive backends and the family probe.
pub mod archive;
/// Chapter extraction from bookmarks and page names.
pub mod chapters;
/// Path classification predicates.
pub mod classify;
/// Top-level archive operations.
pub mod codec;
/// `ComicInfo.xml` sidecar parsing.
pub mod comicinfo;
/// Configuration and CLI.
pub mod config;
/// Cover election.
pub mod cover;
/// Filesystem abstraction.
pub mod directory;
/// Cover thumbnail encoding.
pub mod encoder;
/// Error types.
pub mod error;
/// Shared value records.
pub mod media;
/// Natural string ordering.
pub mod natural;
/// Media error reporting.
pub mod report;
/// Scanner-facing records and filename parsing.
pub mod scan;
/// Entry selection and page-range projection.
pub mod select;


pub use archive::ArchiveFamily;
pub use codec::{ArchiveCodec, CancelFlag};
pub use comicinfo::ComicInfo;
pub use config::{Cli, Command, Config};
pub use error::{ArchiveError, Result};
pub use media::{FileMetadata, PageInfo, PageRange};
pub use scan::ParserInfo;
