//! Value records shared between the codec and its callers.

use crate::error::{ArchiveError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::str::FromStr;

/// An inclusive window over the filtered image list of an archive.
///
/// Indices are zero-based and interpreted against the natural-ordered image
/// list with the cover entry already split off, never against raw archive
/// entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRange {
    /// First page index (inclusive).
    pub min: usize,
    /// Last page index (inclusive).
    pub max: usize,
}

impl PageRange {
    /// Parse an optional range: the empty string means "no range".
    pub fn parse_opt(s: &str) -> Result<Option<PageRange>> {
        if s.is_empty() {
            return Ok(None);
        }
        s.parse().map(Some)
    }

    /// Number of pages the window covers.
    pub fn len(&self) -> usize {
        self.max - self.min + 1
    }

    /// A range is never empty by construction.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl FromStr for PageRange {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || ArchiveError::MalformedRange(s.to_string());
        let (min, max) = s.split_once('-').ok_or_else(malformed)?;
        let min: usize = min.parse().map_err(|_| malformed())?;
        let max: usize = max.parse().map_err(|_| malformed())?;
        if min > max {
            return Err(malformed());
        }
        Ok(PageRange { min, max })
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

/// Everything the codec needs to know about one archive on disk.
///
/// Small value record, cheap to clone; `(path, page-range string)` is its
/// identity and doubles as the codec's cache key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Absolute filesystem path of the archive.
    pub path: PathBuf,
    /// Optional page window; `None` means the whole archive.
    pub page_range: Option<PageRange>,
    /// File size in bytes; `-1` when unknown.
    pub file_size: i64,
    /// Optional entry-name override for the cover. When set, it is used
    /// verbatim instead of the cover-name heuristic.
    pub cover_file: Option<String>,
}

impl FileMetadata {
    /// Metadata for a whole archive with unknown size.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            page_range: None,
            file_size: -1,
            cover_file: None,
        }
    }

    /// Metadata restricted to a page window.
    pub fn with_range(path: impl Into<PathBuf>, range: PageRange) -> Self {
        Self {
            page_range: Some(range),
            ..Self::new(path)
        }
    }

    /// The page range rendered the way it identifies this record
    /// (empty string when absent).
    pub fn range_string(&self) -> String {
        self.page_range.map(|r| r.to_string()).unwrap_or_default()
    }
}

impl PartialEq for FileMetadata {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.page_range == other.page_range
    }
}

impl Eq for FileMetadata {}

impl Hash for FileMetadata {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
        self.page_range.hash(state);
    }
}

/// One page of an opened archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Entry name inside the archive.
    pub name: String,
    /// Zero-based index into the filtered image list.
    pub index: usize,
    /// Compressed size of the entry in bytes.
    pub size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_parses() {
        assert_eq!("0-5".parse::<PageRange>().unwrap(), PageRange { min: 0, max: 5 });
        assert_eq!("7-7".parse::<PageRange>().unwrap().len(), 1);
        assert_eq!(PageRange::parse_opt("").unwrap(), None);
        assert_eq!(
            PageRange::parse_opt("3-9").unwrap(),
            Some(PageRange { min: 3, max: 9 })
        );
    }

    #[test]
    fn range_rejects_garbage() {
        for s in ["5", "a-b", "1-", "-3", "5-2", "1-2-3", " 1-2"] {
            assert!(
                matches!(s.parse::<PageRange>(), Err(ArchiveError::MalformedRange(_))),
                "{s:?} should be malformed"
            );
        }
    }

    #[test]
    fn range_round_trips_through_display() {
        let range: PageRange = "12-40".parse().unwrap();
        assert_eq!(range.to_string(), "12-40");
    }

    #[test]
    fn metadata_identity_is_path_and_range() {
        let a = FileMetadata::with_range("/x/a.cbz", PageRange { min: 0, max: 1 });
        let mut b = a.clone();
        b.file_size = 9000;
        b.cover_file = Some("cover.jpg".into());
        assert_eq!(a, b);

        let c = FileMetadata::new("/x/a.cbz");
        assert_ne!(a, c);
        assert_eq!(c.range_string(), "");
        assert_eq!(a.range_string(), "0-1");
    }
}
