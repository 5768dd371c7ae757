//! `ComicInfo.xml` sidecar parsing.
//!
//! The schema is the ComicRack one as commonly found in the wild; the parser
//! is deliberately lenient. Unknown elements are ignored and empty leaf
//! elements bind to nothing, with one exception: `Page` elements are kept
//! even when empty, because their presence is itself meaningful.

use crate::error::Result;
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

/// Role of one page as declared by the sidecar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageType {
    /// The front cover.
    FrontCover,
    /// A secondary cover inside the book.
    InnerCover,
    /// Recap of previous events.
    Roundup,
    /// Regular story page.
    #[default]
    Story,
    /// Advertisement page.
    Advertisement,
    /// Editorial content.
    Editorial,
    /// Letters column.
    Letters,
    /// Preview of another work.
    Preview,
    /// The back cover.
    BackCover,
    /// Anything else.
    Other,
    /// Marked deleted in the source.
    Deleted,
}

impl PageType {
    fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "frontcover" => PageType::FrontCover,
            "innercover" => PageType::InnerCover,
            "roundup" => PageType::Roundup,
            "story" | "" => PageType::Story,
            "advertisement" => PageType::Advertisement,
            "editorial" => PageType::Editorial,
            "letters" => PageType::Letters,
            "preview" => PageType::Preview,
            "backcover" => PageType::BackCover,
            "deleted" => PageType::Deleted,
            _ => PageType::Other,
        }
    }

    /// True for page types that can serve as a chapter cover.
    pub fn is_cover(&self) -> bool {
        matches!(self, PageType::FrontCover | PageType::InnerCover)
    }
}

/// One `<Page>` element of the sidecar.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComicPage {
    /// Zero-based page index the element annotates.
    pub image: i32,
    /// Free-text bookmark, often a chapter name.
    pub bookmark: String,
    /// Declared role of the page.
    pub kind: PageType,
}

/// Bibliographic metadata carried by a `ComicInfo.xml` sidecar.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComicInfo {
    /// Series name.
    pub series: Option<String>,
    /// Series name in the original language.
    pub localized_series: Option<String>,
    /// Volume designation.
    pub volume: Option<String>,
    /// Issue or chapter number.
    pub number: Option<String>,
    /// Book title.
    pub title: Option<String>,
    /// Sortable form of the title.
    pub title_sort: Option<String>,
    /// Synopsis.
    pub summary: Option<String>,
    /// Writer credit.
    pub writer: Option<String>,
    /// Genre tags.
    pub genre: Option<String>,
    /// Format designation (e.g. "TPB", "Web").
    pub format: Option<String>,
    /// Declared page count (0 when absent).
    pub page_count: i32,
    /// Per-page annotations.
    pub pages: Vec<ComicPage>,
}

impl ComicInfo {
    /// Parse sidecar XML. Fails with `MalformedSidecar` on XML errors;
    /// callers treat that as "no sidecar".
    pub fn parse(xml: &str) -> Result<ComicInfo> {
        let doc = Document::parse(xml)?;
        let mut info = ComicInfo::default();

        for node in doc.root_element().children().filter(|n| n.is_element()) {
            match node.tag_name().name() {
                "Series" => info.series = leaf_text(&node),
                "LocalizedSeries" => info.localized_series = leaf_text(&node),
                "Volume" => info.volume = leaf_text(&node),
                "Number" => info.number = leaf_text(&node),
                "Title" => info.title = leaf_text(&node),
                "TitleSort" => info.title_sort = leaf_text(&node),
                "Summary" => info.summary = leaf_text(&node),
                "Writer" => info.writer = leaf_text(&node),
                "Genre" => info.genre = leaf_text(&node),
                "Format" => info.format = leaf_text(&node),
                "PageCount" => {
                    info.page_count = leaf_text(&node)
                        .and_then(|t| t.parse().ok())
                        .unwrap_or(0);
                }
                "Pages" => {
                    for page in node
                        .children()
                        .filter(|n| n.is_element() && n.tag_name().name() == "Page")
                    {
                        info.pages.push(parse_page(&page));
                    }
                }
                _ => {}
            }
        }

        info.clean();
        Ok(info)
    }

    /// Normalize after binding: clamp the declared page count and keep page
    /// annotations sorted by the index they refer to.
    fn clean(&mut self) {
        if self.page_count < 0 {
            self.page_count = 0;
        }
        self.pages.sort_by_key(|p| p.image);
    }
}

/// Text of a leaf element, or nothing when empty or whitespace-only. This is
/// where empty leaves get stripped.
fn leaf_text(node: &Node) -> Option<String> {
    node.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
}

fn parse_page(node: &Node) -> ComicPage {
    ComicPage {
        image: node
            .attribute("Image")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0),
        bookmark: node
            .attribute("Bookmark")
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
        kind: PageType::parse(node.attribute("Type").unwrap_or_default()),
    }
}
