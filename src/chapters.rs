//! Chapter extraction.
//!
//! An archive marked as a volume often carries no chapter information at
//! all. When its sidecar bookmarks (or, failing that, its page filenames)
//! reveal chapter boundaries, the single scanner record is split into one
//! record per chapter, each restricted to its page window.

use crate::comicinfo::ComicInfo;
use crate::media::{PageInfo, PageRange};
use crate::scan::{self, DEFAULT_CHAPTER, LOOSE_LEAF_VOLUME, ParserInfo};

/// One detected chapter boundary before windows are computed.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ChapterMark {
    /// Index of the first page known to belong to the chapter.
    page: usize,
    /// Normalized chapter label.
    label: String,
    /// Human title, possibly empty.
    title: String,
}

/// Split one volume record into per-chapter records.
///
/// Only records that are not specials, still carry the default chapter and
/// do belong to a volume are candidates; anything else comes back unchanged
/// as a single-element list. Bookmarks from the sidecar are preferred;
/// page filenames are the fallback. When neither source yields a chapter
/// the record also comes back unchanged.
pub fn extract_chapters(info: &ParserInfo, pages: &[PageInfo]) -> Vec<ParserInfo> {
    if info.is_special
        || info.chapters != DEFAULT_CHAPTER
        || info.volumes == LOOSE_LEAF_VOLUME
        || pages.is_empty()
    {
        return vec![info.clone()];
    }

    let marks = dedup_marks(
        marks_from_bookmarks(info.comic_info.as_ref(), pages.len())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| marks_from_filenames(pages)),
    );
    if marks.is_empty() {
        return vec![info.clone()];
    }

    let mut out = Vec::with_capacity(marks.len());
    for (i, mark) in marks.iter().enumerate() {
        let start = if i == 0 { 0 } else { mark.page };
        let end = match marks.get(i + 1) {
            Some(next) => next.page.saturating_sub(1),
            None => pages.len() - 1,
        };
        if end < start {
            tracing::debug!(label = %mark.label, "Skipping empty chapter window");
            continue;
        }

        let window = &pages[start..=end];
        let size: u64 = window.iter().map(|p| p.size).sum();
        let cover = chapter_cover(info.comic_info.as_ref(), window);

        let mut chapter = info.clone();
        chapter.chapters = mark.label.clone();
        if !mark.title.is_empty() {
            chapter.title = mark.title.clone();
        }
        chapter.metadata.page_range = Some(PageRange { min: start, max: end });
        chapter.metadata.file_size = size as i64;
        chapter.metadata.cover_file = if cover.is_empty() { None } else { Some(cover) };
        out.push(chapter);
    }

    if out.is_empty() { vec![info.clone()] } else { out }
}

/// Chapter marks from sidecar bookmarks, or `None` when there is no sidecar
/// page table to read.
fn marks_from_bookmarks(comic_info: Option<&ComicInfo>, page_count: usize) -> Option<Vec<ChapterMark>> {
    let info = comic_info?;
    if info.pages.is_empty() {
        return None;
    }

    let marks = info
        .pages
        .iter()
        .filter(|p| !p.bookmark.is_empty() && p.image >= 0 && (p.image as usize) < page_count)
        .filter_map(|p| {
            let label = scan::parse_chapter_label(&p.bookmark, true);
            if label == DEFAULT_CHAPTER {
                return None;
            }
            let title = scan::parse_bookmark_title(&p.bookmark).unwrap_or_default();
            Some(ChapterMark {
                page: p.image as usize,
                label,
                title,
            })
        })
        .collect();
    Some(marks)
}

/// Chapter marks inferred from page paths: the label from the file name,
/// the title from whichever path segment carries one.
fn marks_from_filenames(pages: &[PageInfo]) -> Vec<ChapterMark> {
    pages
        .iter()
        .enumerate()
        .filter_map(|(index, page)| {
            let stem = scan::strip_edition_tags(&page.name);
            let label = scan::parse_chapter_label(&stem, false);
            if label == DEFAULT_CHAPTER {
                return None;
            }
            let title = page
                .name
                .split(['/', '\\'])
                .find_map(scan::parse_bookmark_title)
                .unwrap_or_default();
            Some(ChapterMark {
                page: index,
                label,
                title,
            })
        })
        .collect()
}

/// Keep the first occurrence of every label, preserving order.
fn dedup_marks(marks: Vec<ChapterMark>) -> Vec<ChapterMark> {
    let mut seen = std::collections::HashSet::new();
    marks
        .into_iter()
        .filter(|m| seen.insert(m.label.clone()))
        .collect()
}

/// First page of the window the sidecar declares as a cover, or empty.
fn chapter_cover(comic_info: Option<&ComicInfo>, window: &[PageInfo]) -> String {
    let Some(info) = comic_info else {
        return String::new();
    };
    window
        .iter()
        .find(|page| {
            info.pages
                .iter()
                .any(|p| p.image as usize == page.index && p.kind.is_cover())
        })
        .map(|page| page.name.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comicinfo::{ComicPage, PageType};
    use crate::media::FileMetadata;

    fn pages(n: usize) -> Vec<PageInfo> {
        (0..n)
            .map(|i| PageInfo {
                name: format!("{i:03}.jpg"),
                index: i,
                size: 100,
            })
            .collect()
    }

    fn volume_info(comic_info: Option<ComicInfo>) -> ParserInfo {
        let mut info = ParserInfo::new(FileMetadata::new("/lib/Series v01.cbz"));
        info.series = "Series".to_string();
        info.volumes = "1".to_string();
        info.comic_info = comic_info;
        info
    }

    fn sidecar(bookmarks: &[(i32, &str)]) -> ComicInfo {
        ComicInfo {
            pages: bookmarks
                .iter()
                .map(|(image, bookmark)| ComicPage {
                    image: *image,
                    bookmark: bookmark.to_string(),
                    kind: PageType::Story,
                })
                .collect(),
            ..ComicInfo::default()
        }
    }

    #[test]
    fn bookmarks_split_a_volume() {
        let info = volume_info(Some(sidecar(&[
            (0, "Chapter 1"),
            (4, "Chapter 2"),
            (7, "Chapter 3"),
        ])));
        let chapters = extract_chapters(&info, &pages(10));

        assert_eq!(chapters.len(), 3);
        assert_eq!(chapters[0].chapters, "1");
        assert_eq!(chapters[0].metadata.range_string(), "0-3");
        assert_eq!(chapters[1].metadata.range_string(), "4-6");
        assert_eq!(chapters[2].metadata.range_string(), "7-9");
        assert_eq!(chapters[2].chapters, "3");
        assert_eq!(chapters[0].metadata.file_size, 400);
        assert_eq!(chapters[2].metadata.file_size, 300);
    }

    #[test]
    fn first_chapter_absorbs_leading_pages() {
        let info = volume_info(Some(sidecar(&[(2, "Chapter 5"), (6, "Chapter 6")])));
        let chapters = extract_chapters(&info, &pages(8));

        assert_eq!(chapters.len(), 2);
        // Front matter before the first bookmark belongs to the first chapter.
        assert_eq!(chapters[0].metadata.range_string(), "0-5");
        assert_eq!(chapters[1].metadata.range_string(), "6-7");
    }

    #[test]
    fn duplicate_labels_keep_first_occurrence() {
        let info = volume_info(Some(sidecar(&[
            (0, "Chapter 1"),
            (3, "Chapter 1"),
            (5, "Chapter 2"),
        ])));
        let chapters = extract_chapters(&info, &pages(8));

        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].metadata.range_string(), "0-4");
        assert_eq!(chapters[1].metadata.range_string(), "5-7");
    }

    #[test]
    fn filenames_are_the_fallback_source() {
        let info = volume_info(None);
        let page_list: Vec<PageInfo> = ["ch1/001.jpg", "ch1/002.jpg", "ch2/001.jpg", "ch2/002.jpg"]
            .iter()
            .enumerate()
            .map(|(i, n)| PageInfo {
                name: n.to_string(),
                index: i,
                size: 10,
            })
            .collect();

        let chapters = extract_chapters(&info, &page_list);
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].chapters, "1");
        assert_eq!(chapters[0].metadata.range_string(), "0-1");
        assert_eq!(chapters[1].chapters, "2");
        assert_eq!(chapters[1].metadata.range_string(), "2-3");
    }

    #[test]
    fn chapter_titles_come_from_bookmarks() {
        let info = volume_info(Some(sidecar(&[
            (0, "Chapter 1 - Awakening"),
            (5, "Chapter 2"),
        ])));
        let chapters = extract_chapters(&info, &pages(10));
        assert_eq!(chapters[0].title, "Awakening");
        assert_eq!(chapters[1].title, "");
    }

    #[test]
    fn sidecar_covers_are_attached() {
        let mut ci = sidecar(&[(0, "Chapter 1"), (5, "Chapter 2")]);
        ci.pages.push(ComicPage {
            image: 5,
            bookmark: String::new(),
            kind: PageType::InnerCover,
        });
        let info = volume_info(Some(ci));

        let chapters = extract_chapters(&info, &pages(10));
        assert_eq!(chapters[0].metadata.cover_file, None);
        assert_eq!(chapters[1].metadata.cover_file, Some("005.jpg".to_string()));
    }

    #[test]
    fn specials_and_known_chapters_pass_through() {
        let mut special = volume_info(Some(sidecar(&[(0, "Chapter 1")])));
        special.is_special = true;
        assert_eq!(extract_chapters(&special, &pages(4)).len(), 1);

        let mut chaptered = volume_info(Some(sidecar(&[(0, "Chapter 1")])));
        chaptered.chapters = "4".to_string();
        assert_eq!(extract_chapters(&chaptered, &pages(4)).len(), 1);

        let mut loose = volume_info(Some(sidecar(&[(0, "Chapter 1")])));
        loose.volumes = LOOSE_LEAF_VOLUME.to_string();
        assert_eq!(extract_chapters(&loose, &pages(4)).len(), 1);
    }

    #[test]
    fn no_source_means_unchanged() {
        let info = volume_info(None);
        let result = extract_chapters(&info, &pages(5));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].metadata.page_range, None);
        assert_eq!(result[0].chapters, DEFAULT_CHAPTER);
    }
}
