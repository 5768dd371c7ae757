//! Path classification predicates.
//!
//! Pure, side-effect-free verdicts over entry names and paths. Everything the
//! selector and cover finder filter on lives here so the rules stay in one
//! place.

use regex::Regex;

/// Extensions recognized as page images.
const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "avif", "jxl", "bmp", "tiff",
];

/// Extensions recognized as comic archives.
const ARCHIVE_EXTENSIONS: &[&str] = &["cbz", "zip", "cbr", "rar", "cb7", "7z", "cbt"];

/// Folder names that never contribute entries.
pub const MACOS_METADATA_FOLDER: &str = "__MACOSX";

/// Prefix of macOS resource-fork sidecar files.
pub const MACOS_SIDECAR_PREFIX: &str = "._";

/// Final extension of a name, lowercased, without the dot.
fn extension(name: &str) -> Option<String> {
    let base = base_name(name);
    base.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Final path segment of an entry name, tolerant of both separators.
pub fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// Directory component of an entry name (empty for root entries).
pub fn directory_name(name: &str) -> &str {
    match name.rsplit_once(['/', '\\']) {
        Some((dir, _)) => dir,
        None => "",
    }
}

/// Base name with its final extension removed. Used as the natural-order
/// sort key.
pub fn without_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => name,
    }
}

/// True iff the name's extension is a supported page image format.
pub fn is_image(name: &str) -> bool {
    extension(name).is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// True iff the name's extension is a supported comic archive format.
pub fn is_archive(name: &str) -> bool {
    if name.to_ascii_lowercase().ends_with(".tar.gz") {
        return true;
    }
    extension(name).is_some_and(|ext| ARCHIVE_EXTENSIONS.contains(&ext.as_str()))
}

/// True iff the name has an `epub` extension.
pub fn is_epub(name: &str) -> bool {
    extension(name).is_some_and(|ext| ext == "epub")
}

/// True iff the file name (without extension) marks a cover image.
pub fn is_cover(name: &str) -> bool {
    is_cover_with(name, None)
}

/// [`is_cover`] with an optional user-configured pattern on top of the fixed
/// `cover`/`folder` convention.
pub fn is_cover_with(name: &str, extra: Option<&Regex>) -> bool {
    let stem = without_extension(base_name(name));
    if stem.eq_ignore_ascii_case("cover") || stem.eq_ignore_ascii_case("folder") {
        return true;
    }
    extra.is_some_and(|re| re.is_match(stem))
}

/// True iff any directory segment of the path is blacklisted (`__MACOSX` or
/// dotfile-prefixed).
pub fn has_blacklisted_folder(path: &str) -> bool {
    let dir = directory_name(path);
    dir.split(['/', '\\'])
        .filter(|segment| !segment.is_empty())
        .any(|segment| segment == MACOS_METADATA_FOLDER || segment.starts_with('.'))
}

/// True iff the file name is a macOS resource-fork sidecar (`._` prefix).
pub fn is_macos_sidecar(name: &str) -> bool {
    base_name(name).starts_with(MACOS_SIDECAR_PREFIX)
}
