//! Scanner-facing records and filename parsing.
//!
//! The codec's callers describe each file with a [`ParserInfo`]; the helpers
//! here pull chapter labels, volume numbers and human titles out of the
//! free-form text found in filenames and sidecar bookmarks.

use crate::comicinfo::ComicInfo;
use crate::media::FileMetadata;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

/// Sentinel meaning "chapter unknown".
pub const DEFAULT_CHAPTER: &str = "0";

/// Sentinel meaning "not part of any volume".
pub const LOOSE_LEAF_VOLUME: &str = "0";

static CHAPTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\b(?:chapter|chap|ch|c)\.?\s*|第)(\d+(?:\.\d+)?)").unwrap()
});

static BARE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)?$").unwrap());

static VOLUME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bv(?:ol(?:ume)?)?\.?\s*(\d+(?:\.\d+)?)").unwrap());

static EDITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)[\(\[\{][^\)\]\}]*\b(?:omnibus|complete|digital|danke(?:-empire)?|uncensored|full[ -]?color|f2|remastered)\b[^\)\]\}]*[\)\]\}]",
    )
    .unwrap()
});

/// The scanner's result record for one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserInfo {
    /// Series the file belongs to.
    pub series: String,
    /// Volume designation, [`LOOSE_LEAF_VOLUME`] when unknown.
    pub volumes: String,
    /// Chapter designation, [`DEFAULT_CHAPTER`] when unknown.
    pub chapters: String,
    /// Human title, often empty.
    pub title: String,
    /// Specials (omakes, one-shots) are never split into chapters.
    pub is_special: bool,
    /// The file this record describes.
    pub metadata: FileMetadata,
    /// Sidecar metadata, when the archive carries one.
    pub comic_info: Option<ComicInfo>,
}

impl ParserInfo {
    /// Record with unknown volume and chapter for the given file.
    pub fn new(metadata: FileMetadata) -> Self {
        Self {
            series: String::new(),
            volumes: LOOSE_LEAF_VOLUME.to_string(),
            chapters: DEFAULT_CHAPTER.to_string(),
            title: String::new(),
            is_special: false,
            metadata,
            comic_info: None,
        }
    }
}

/// Contract of the EPUB book parser. Books carry their own metadata, so the
/// codec only ever consumes a pre-populated record.
pub trait BookService: Send + Sync {
    /// Parse one book file into a scanner record, or nothing when the file
    /// is not a parseable book.
    fn parse_info(&self, path: &Path) -> Option<ParserInfo>;
}

/// Remove edition tags (`(Omnibus)`, `[Digital]`, …) from a title fragment.
pub fn strip_edition_tags(text: &str) -> String {
    EDITION_RE.replace_all(text, "").trim().to_string()
}

/// Parse a chapter label out of free text.
///
/// Explicit chapter markers (`Chapter 12`, `ch. 3`, `c001`, `第4話`) always
/// count; a bare number (`"7"`) only when `allow_bare` is set, because bookmarks
/// are chapter names, but a bare numeral in a page filename is just a page
/// number. Returns [`DEFAULT_CHAPTER`] when nothing matches.
pub fn parse_chapter_label(text: &str, allow_bare: bool) -> String {
    let text = text.trim();
    if let Some(caps) = CHAPTER_RE.captures(text) {
        return normalize_number(&caps[1]);
    }
    if allow_bare && BARE_NUMBER_RE.is_match(text) {
        return normalize_number(text);
    }
    DEFAULT_CHAPTER.to_string()
}

/// Parse a volume designation out of free text, or [`LOOSE_LEAF_VOLUME`].
pub fn parse_volume(text: &str) -> String {
    match VOLUME_RE.captures(text) {
        Some(caps) => normalize_number(&caps[1]),
        None => LOOSE_LEAF_VOLUME.to_string(),
    }
}

/// Series name and volume from an archive file stem, e.g.
/// `"One Piece v03"` → `("One Piece", "3")`.
pub fn parse_series_volume(stem: &str) -> (String, String) {
    let cleaned = strip_edition_tags(stem);
    let volume = parse_volume(&cleaned);

    let series_end = VOLUME_RE
        .find(&cleaned)
        .or_else(|| CHAPTER_RE.find(&cleaned))
        .map(|m| m.start())
        .unwrap_or(cleaned.len());
    let series = cleaned[..series_end]
        .trim_end_matches(['-', '_', '#', ' '])
        .trim()
        .to_string();
    (series, volume)
}

/// The human title a path segment carries after its chapter marker, e.g.
/// `"Ch. 2 - The Duel"` → `"The Duel"`.
pub fn parse_bookmark_title(segment: &str) -> Option<String> {
    let cleaned = strip_edition_tags(segment);
    let m = CHAPTER_RE.captures(&cleaned)?;
    let after = cleaned[m.get(0)?.end()..]
        .trim_start_matches([' ', '-', '_', ':', '.', '~'])
        .trim();
    if after.is_empty() {
        None
    } else {
        Some(after.to_string())
    }
}

/// Drop leading zeros so `007` and `7` label the same chapter.
fn normalize_number(text: &str) -> String {
    let (int, frac) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text, None),
    };
    let int = int.trim_start_matches('0');
    let int = if int.is_empty() { "0" } else { int };
    match frac {
        Some(frac) => format!("{int}.{frac}"),
        None => int.to_string(),
    }
}
