//! Cover election.
//!
//! Picks the single entry name that represents an archive, by filename
//! convention only; content is never inspected.

use crate::archive::ArchiveEntry;
use crate::classify;
use crate::natural;
use regex::Regex;
use std::path::Path;

/// Find the cover entry among an archive's entries, or none when no image
/// survives filtering.
///
/// Priority: an image named like a cover; else the first image sitting in a
/// folder named after the archive itself; else the first image of the first
/// folder; natural order breaks every tie.
pub fn find_cover_name(
    entries: &[ArchiveEntry],
    archive_path: &Path,
    cover_regex: Option<&Regex>,
) -> Option<String> {
    let images: Vec<&ArchiveEntry> = entries
        .iter()
        .filter(|e| {
            !e.is_directory
                && classify::is_image(&e.full_name)
                && !classify::has_blacklisted_folder(&e.full_name)
                && !classify::is_macos_sidecar(&e.full_name)
        })
        .collect();

    if let Some(found) = images
        .iter()
        .filter(|e| classify::is_cover_with(&e.full_name, cover_regex))
        .min_by(|a, b| cmp_base(a, b))
    {
        return Some(found.full_name.clone());
    }

    let stem = archive_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    if let Some(found) = images
        .iter()
        .filter(|e| classify::directory_name(&e.full_name) == stem)
        .min_by(|a, b| cmp_base(a, b))
    {
        return Some(found.full_name.clone());
    }

    let first_dir = images
        .iter()
        .map(|e| classify::directory_name(&e.full_name))
        .min_by(|a, b| natural::compare(a, b))?;
    if let Some(found) = images
        .iter()
        .filter(|e| classify::directory_name(&e.full_name) == first_dir)
        .min_by(|a, b| cmp_base(a, b))
    {
        return Some(found.full_name.clone());
    }

    images
        .iter()
        .min_by(|a, b| cmp_base(a, b))
        .map(|e| e.full_name.clone())
}

fn cmp_base(a: &ArchiveEntry, b: &ArchiveEntry) -> std::cmp::Ordering {
    natural::compare(
        classify::without_extension(classify::base_name(&a.full_name)),
        classify::without_extension(classify::base_name(&b.full_name)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> ArchiveEntry {
        ArchiveEntry {
            full_name: name.to_string(),
            is_directory: name.ends_with('/'),
            compressed_size: 0,
            uncompressed_size: 0,
            last_modified: None,
            stored: false,
        }
    }

    fn find(names: &[&str], archive: &str) -> Option<String> {
        let entries: Vec<ArchiveEntry> = names.iter().map(|n| entry(n)).collect();
        find_cover_name(&entries, Path::new(archive), None)
    }

    #[test]
    fn cover_named_image_wins() {
        assert_eq!(
            find(&["001.jpg", "002.jpg", "cover.jpg"], "/lib/v1.cbz"),
            Some("cover.jpg".to_string())
        );
        assert_eq!(
            find(&["001.jpg", "scans/folder.png"], "/lib/v1.cbz"),
            Some("scans/folder.png".to_string())
        );
    }

    #[test]
    fn archive_named_folder_beats_other_folders() {
        assert_eq!(
            find(&["extras/000.jpg", "v1/005.jpg", "v1/001.jpg"], "/lib/v1.cbz"),
            Some("v1/001.jpg".to_string())
        );
    }

    #[test]
    fn first_folder_first_image_otherwise() {
        assert_eq!(
            find(&["b/001.jpg", "a/002.jpg", "a/010.jpg"], "/lib/v9.cbz"),
            Some("a/002.jpg".to_string())
        );
        // Root entries sort as the empty folder, ahead of any named one.
        assert_eq!(
            find(&["zz.jpg", "a/001.jpg"], "/lib/v9.cbz"),
            Some("zz.jpg".to_string())
        );
    }

    #[test]
    fn junk_never_elected() {
        assert_eq!(
            find(
                &["__MACOSX/cover.jpg", "._cover.jpg", "005.jpg"],
                "/lib/v1.cbz"
            ),
            Some("005.jpg".to_string())
        );
        assert_eq!(find(&["__MACOSX/cover.jpg", "notes.txt"], "/lib/v1.cbz"), None);
        assert_eq!(find(&[], "/lib/v1.cbz"), None);
    }
}
