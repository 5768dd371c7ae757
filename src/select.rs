//! Entry selection: filtering, ordering and page-range projection.
//!
//! Turns the raw entry list of an opened archive into the sequence of
//! entries an operation should visit, honoring the blacklist, natural
//! ordering and the cover-appendix rule.

use crate::archive::ArchiveEntry;
use crate::classify;
use crate::error::{ArchiveError, Result};
use crate::media::FileMetadata;
use crate::natural;
use regex::Regex;

/// Produce the ordered, filtered, possibly-sliced entry sequence for one
/// operation.
///
/// With `force_images` false and no page range on `meta`, the raw-filtered
/// entries come back in archive order; this mode serves sidecar probes that
/// need non-image entries. Otherwise only images survive, sorted naturally
/// on their extension-stripped full name, and a present page range is
/// projected with the cover-appendix rule: the cover entry is split off
/// before slicing and re-appended at the end iff the range starts at page 0.
///
/// Fails with `RangeOutOfBounds` when the range exceeds the image list; the
/// window is never clamped.
pub fn select_entries(
    entries: &[ArchiveEntry],
    meta: &FileMetadata,
    force_images: bool,
    cover_regex: Option<&Regex>,
) -> Result<Vec<ArchiveEntry>> {
    let raw: Vec<&ArchiveEntry> = entries
        .iter()
        .filter(|e| {
            !classify::has_blacklisted_folder(&e.full_name)
                && !classify::is_macos_sidecar(&e.full_name)
        })
        .collect();

    if !force_images && meta.page_range.is_none() {
        return Ok(raw.into_iter().cloned().collect());
    }

    let mut images: Vec<&ArchiveEntry> = raw
        .into_iter()
        .filter(|e| !e.is_directory && classify::is_image(&e.full_name))
        .collect();
    images.sort_by(|a, b| {
        natural::compare(
            classify::without_extension(&a.full_name),
            classify::without_extension(&b.full_name),
        )
    });

    let Some(range) = meta.page_range else {
        return Ok(images.into_iter().cloned().collect());
    };

    let cover_pos = images
        .iter()
        .position(|e| is_cover_entry(e, meta, cover_regex));
    let cover = cover_pos.map(|pos| images.remove(pos));
    let rest = images;

    if range.min >= rest.len() || range.max >= rest.len() {
        return Err(ArchiveError::RangeOutOfBounds {
            min: range.min,
            max: range.max,
            len: rest.len(),
        });
    }

    let mut slice: Vec<ArchiveEntry> = rest[range.min..=range.max]
        .iter()
        .map(|e| (*e).clone())
        .collect();
    if let Some(cover) = cover
        && range.min == 0
    {
        slice.push(cover.clone());
    }
    Ok(slice)
}

/// The entry that counts as the cover for slicing purposes: the explicit
/// override when the metadata carries one, the name convention otherwise.
fn is_cover_entry(entry: &ArchiveEntry, meta: &FileMetadata, cover_regex: Option<&Regex>) -> bool {
    match meta.cover_file.as_deref() {
        Some(name) if !name.is_empty() => entry.full_name == name,
        _ => classify::is_cover_with(&entry.full_name, cover_regex),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::PageRange;

    fn entry(name: &str) -> ArchiveEntry {
        ArchiveEntry {
            full_name: name.to_string(),
            is_directory: name.ends_with('/'),
            compressed_size: 10,
            uncompressed_size: 20,
            last_modified: None,
            stored: false,
        }
    }

    fn names(entries: &[ArchiveEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.full_name.as_str()).collect()
    }

    fn meta(range: Option<&str>) -> FileMetadata {
        let mut m = FileMetadata::new("/tmp/a.cbz");
        m.page_range = range.map(|r| r.parse::<PageRange>().unwrap());
        m
    }

    #[test]
    fn probe_mode_preserves_archive_order() {
        let entries = vec![
            entry("002.jpg"),
            entry("ComicInfo.xml"),
            entry("001.jpg"),
            entry("__MACOSX/001.jpg"),
        ];
        let selected = select_entries(&entries, &meta(None), false, None).unwrap();
        assert_eq!(names(&selected), vec!["002.jpg", "ComicInfo.xml", "001.jpg"]);
    }

    #[test]
    fn image_mode_filters_and_sorts() {
        let entries = vec![
            entry("b/10.jpg"),
            entry("b/2.jpg"),
            entry("ComicInfo.xml"),
            entry("b/"),
            entry("._junk.jpg"),
        ];
        let selected = select_entries(&entries, &meta(None), true, None).unwrap();
        assert_eq!(names(&selected), vec!["b/2.jpg", "b/10.jpg"]);
    }

    #[test]
    fn range_slices_after_cover_split() {
        let entries = vec![
            entry("001.jpg"),
            entry("002.jpg"),
            entry("003.jpg"),
            entry("cover.jpg"),
        ];

        let selected = select_entries(&entries, &meta(Some("0-1")), false, None).unwrap();
        assert_eq!(names(&selected), vec!["001.jpg", "002.jpg", "cover.jpg"]);

        let selected = select_entries(&entries, &meta(Some("1-2")), false, None).unwrap();
        assert_eq!(names(&selected), vec!["002.jpg", "003.jpg"]);
    }

    #[test]
    fn range_without_cover() {
        let entries = vec![entry("001.jpg"), entry("002.jpg")];
        let selected = select_entries(&entries, &meta(Some("0-0")), false, None).unwrap();
        assert_eq!(names(&selected), vec!["001.jpg"]);
    }

    #[test]
    fn out_of_bounds_is_an_error_not_a_clamp() {
        let entries = vec![entry("001.jpg"), entry("002.jpg"), entry("cover.jpg")];
        let err = select_entries(&entries, &meta(Some("0-2")), false, None).unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::RangeOutOfBounds { min: 0, max: 2, len: 2 }
        ));
    }

    #[test]
    fn explicit_cover_file_overrides_the_convention() {
        let entries = vec![entry("001.jpg"), entry("002.jpg"), entry("cover.jpg")];
        let mut m = meta(Some("0-0"));
        m.cover_file = Some("002.jpg".to_string());
        let selected = select_entries(&entries, &m, false, None).unwrap();
        // 002.jpg is split off as the cover; cover.jpg stays a normal page.
        assert_eq!(names(&selected), vec!["001.jpg", "002.jpg"]);
    }

    #[test]
    fn configured_cover_regex_extends_the_convention() {
        let entries = vec![entry("!0000.jpg"), entry("001.jpg"), entry("002.jpg")];
        let re = Regex::new(r"^!0+$").unwrap();
        let selected = select_entries(&entries, &meta(Some("0-0")), false, Some(&re)).unwrap();
        assert_eq!(names(&selected), vec!["001.jpg", "!0000.jpg"]);
    }
}
