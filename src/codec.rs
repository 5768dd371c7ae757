//! Top-level archive operations.
//!
//! Each operation opens its own archive handle, walks the entries the
//! selector hands it, and isolates its own failures: a file that is not an
//! archive is only logged, real backend errors are reported through the
//! [`MediaErrorReporter`], and either way the operation returns its
//! documented empty value, so one bad archive can never poison a scan. The
//! exception is [`ArchiveCodec::extract_to_dir`], which rethrows because its
//! callers must abort the surrounding task.

use crate::archive::{self, ArchiveEntry, ArchiveFamily};
use crate::classify;
use crate::comicinfo::ComicInfo;
use crate::cover;
use crate::directory::DirectoryService;
use crate::encoder::{CoverFormat, ImageEncoder};
use crate::error::{ArchiveError, Result};
use crate::media::{FileMetadata, PageInfo};
use crate::report::{ErrorProducer, MediaErrorReporter};
use crate::select;
use regex::Regex;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Cooperative cancellation signal, checked between entries, never in the
/// middle of an entry read.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// A signal that never fires.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn checkpoint(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(ArchiveError::Cancelled);
        }
        Ok(())
    }
}

/// The archive codec. Stateless apart from its collaborators, so one
/// instance can serve a whole worker pool.
pub struct ArchiveCodec {
    encoder: Arc<dyn ImageEncoder>,
    dirs: Arc<dyn DirectoryService>,
    reporter: Arc<dyn MediaErrorReporter>,
    cover_regex: Option<Regex>,
}

impl ArchiveCodec {
    /// Codec over the given collaborators.
    pub fn new(
        encoder: Arc<dyn ImageEncoder>,
        dirs: Arc<dyn DirectoryService>,
        reporter: Arc<dyn MediaErrorReporter>,
    ) -> Self {
        Self {
            encoder,
            dirs,
            reporter,
            cover_regex: None,
        }
    }

    /// Extend the cover-name convention with a user-configured pattern.
    pub fn with_cover_regex(mut self, regex: Option<Regex>) -> Self {
        self.cover_regex = regex;
        self
    }

    /// Probe which family, if any, can open the file.
    ///
    /// Only files that exist and whose extension classifies as archive or
    /// epub are probed; the probe itself may open the file up to twice.
    pub fn can_open(&self, path: &Path) -> ArchiveFamily {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if !path.is_file() || !(classify::is_archive(name) || classify::is_epub(name)) {
            return ArchiveFamily::Unsupported;
        }
        archive::probe(path)
    }

    /// Number of pages in the archive's filtered image list. `0` on any
    /// failure, with an error report.
    pub fn page_count(&self, meta: &FileMetadata) -> usize {
        match self.selected_images(meta) {
            Ok(entries) => entries.len(),
            Err(e) => {
                self.report(meta, "Could not count pages", &e);
                0
            }
        }
    }

    /// The filtered image list as `(name, index, compressed size)` records.
    /// Empty on any failure, with an error report.
    pub fn list_pages(&self, meta: &FileMetadata) -> Vec<PageInfo> {
        match self.selected_images(meta) {
            Ok(entries) => entries
                .iter()
                .enumerate()
                .map(|(index, e)| PageInfo {
                    name: e.full_name.clone(),
                    index,
                    size: e.compressed_size,
                })
                .collect(),
            Err(e) => {
                self.report(meta, "Could not list pages", &e);
                Vec::new()
            }
        }
    }

    /// Resolve the archive's cover entry and hand its bytes to the image
    /// encoder. Returns the thumbnail path, or an empty string on failure.
    pub fn cover_image(
        &self,
        meta: &FileMetadata,
        out_name: &str,
        out_dir: &Path,
        format: CoverFormat,
        size: u32,
    ) -> String {
        match self.cover_image_inner(meta, out_name, out_dir, format, size) {
            Ok(path) => path,
            Err(e) => {
                self.report(meta, "Could not extract cover image", &e);
                String::new()
            }
        }
    }

    fn cover_image_inner(
        &self,
        meta: &FileMetadata,
        out_name: &str,
        out_dir: &Path,
        format: CoverFormat,
        size: u32,
    ) -> Result<String> {
        let backend = archive::open(&meta.path)?;
        let entries = backend.entries()?;

        // The explicit override is taken verbatim; the heuristic is the
        // fallback when the named entry is gone.
        let cover_name = match meta.cover_file.as_deref().filter(|n| !n.is_empty()) {
            Some(name) if entries.iter().any(|e| e.full_name == name) => name.to_string(),
            _ => cover::find_cover_name(&entries, &meta.path, self.cover_regex.as_ref())
                .ok_or_else(|| ArchiveError::EntryMissing("cover image".to_string()))?,
        };

        let data = backend.read_entry(&cover_name)?;
        self.encoder
            .write_cover_thumbnail(&data, out_name, out_dir, format, size)
    }

    /// Parse the archive's `ComicInfo.xml`, if it carries one.
    ///
    /// A malformed sidecar is common in the wild and is treated as "no
    /// sidecar" without a report; backend failures are reported.
    pub fn comic_info(&self, meta: &FileMetadata) -> Option<ComicInfo> {
        match self.comic_info_inner(meta) {
            Ok(info) => info,
            Err(ArchiveError::MalformedSidecar(e)) => {
                tracing::debug!(path = %meta.path.display(), error = %e, "Ignoring malformed ComicInfo.xml");
                None
            }
            Err(e) => {
                self.report(meta, "Could not read ComicInfo.xml", &e);
                None
            }
        }
    }

    fn comic_info_inner(&self, meta: &FileMetadata) -> Result<Option<ComicInfo>> {
        let backend = archive::open(&meta.path)?;
        let entries = backend.entries()?;

        let Some(entry) = find_sidecar(&entries) else {
            return Ok(None);
        };
        let data = backend.read_entry(&entry.full_name)?;
        let xml = String::from_utf8_lossy(&data);
        ComicInfo::parse(&xml).map(Some)
    }

    /// Extract the selected entries to `dest`, preserving relative paths.
    ///
    /// Idempotent: when `dest` already exists the call returns immediately.
    /// When the archive nests everything in a single root folder, that level
    /// is flattened away after extraction. A page range starting at 0 drags
    /// the `ComicInfo.xml` sidecar along. Unlike the other operations this
    /// one rethrows, as `ExtractFailed`, because callers must abort.
    pub fn extract_to_dir(&self, meta: &FileMetadata, dest: &Path, cancel: &CancelFlag) -> Result<()> {
        if dest.exists() {
            tracing::debug!(dest = %dest.display(), "Extraction target exists, skipping");
            return Ok(());
        }

        match self.extract_inner(meta, dest, cancel) {
            Ok(()) => Ok(()),
            Err(e) => {
                // Never leave partial output behind.
                let _ = self.dirs.clear_and_delete(dest);
                if matches!(e, ArchiveError::Cancelled) {
                    return Err(e);
                }
                self.report(meta, "Could not extract archive", &e);
                Err(ArchiveError::ExtractFailed(e.to_string()))
            }
        }
    }

    fn extract_inner(&self, meta: &FileMetadata, dest: &Path, cancel: &CancelFlag) -> Result<()> {
        let backend = archive::open(&meta.path)?;
        let entries = backend.entries()?;
        let mut selected =
            select::select_entries(&entries, meta, false, self.cover_regex.as_ref())?;
        append_sidecar_for_cover_range(meta, &entries, &mut selected);

        self.dirs.ensure_directory(dest)?;
        for entry in &selected {
            cancel.checkpoint()?;
            if entry.is_directory {
                continue;
            }
            let Some(rel) = sanitize_entry_path(&entry.full_name) else {
                tracing::warn!(entry = %entry.full_name, "Skipping entry with unsafe path");
                continue;
            };
            let target = dest.join(rel);
            if let Some(parent) = target.parent() {
                self.dirs.ensure_directory(parent)?;
            }
            std::fs::write(&target, backend.read_entry(&entry.full_name)?)?;
        }

        if has_single_root(&entries) {
            self.dirs.flatten(dest)?;
        }

        tracing::debug!(
            path = %meta.path.display(),
            dest = %dest.display(),
            entries = selected.len(),
            "Extracted archive"
        );
        Ok(())
    }

    /// Repackage the archive (or its page window) as an in-memory ZIP.
    ///
    /// With no page range the file's own bytes come back untouched. With a
    /// range, the selected entries are copied into a fresh ZIP (Deflate for
    /// ZIP-sourced entries, the source's stored/compressed choice otherwise),
    /// preserving names, sizes and modification times, with the sidecar
    /// appended under the same cover-range rule as extraction. The stream is
    /// positioned at 0. On failure an empty stream is returned after the
    /// error report.
    pub fn repack_zip_stream(&self, meta: &FileMetadata, cancel: &CancelFlag) -> Cursor<Vec<u8>> {
        match self.repack_inner(meta, cancel) {
            Ok(stream) => stream,
            Err(ArchiveError::Cancelled) => {
                tracing::debug!(path = %meta.path.display(), "Repack cancelled, discarding buffer");
                Cursor::new(Vec::new())
            }
            Err(e) => {
                self.report(meta, "Could not repackage archive", &e);
                Cursor::new(Vec::new())
            }
        }
    }

    fn repack_inner(&self, meta: &FileMetadata, cancel: &CancelFlag) -> Result<Cursor<Vec<u8>>> {
        if meta.page_range.is_none() {
            return Ok(Cursor::new(std::fs::read(&meta.path)?));
        }

        let backend = archive::open(&meta.path)?;
        let entries = backend.entries()?;
        let mut selected =
            select::select_entries(&entries, meta, false, self.cover_regex.as_ref())?;
        append_sidecar_for_cover_range(meta, &entries, &mut selected);

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for entry in &selected {
            cancel.checkpoint()?;
            if entry.is_directory {
                continue;
            }

            let method = if backend.family() == ArchiveFamily::Zip || !entry.stored {
                CompressionMethod::Deflated
            } else {
                CompressionMethod::Stored
            };
            let mut options = SimpleFileOptions::default().compression_method(method);
            if let Some(modified) = entry.last_modified {
                options = options.last_modified_time(modified);
            }

            writer.start_file(entry.full_name.as_str(), options)?;
            writer.write_all(&backend.read_entry(&entry.full_name)?)?;
        }

        let mut stream = writer.finish()?;
        stream.set_position(0);
        Ok(stream)
    }

    /// Repackage into the deterministic download artifact
    /// `{temp}/comicarc_{label}_{UTC-date}.cbz`, reusing an artifact that
    /// already exists for that name.
    pub fn zip_to_disk(&self, meta: &FileMetadata, label: &str, cancel: &CancelFlag) -> Result<PathBuf> {
        let date = chrono::Utc::now().format("%Y-%m-%d");
        let target = self
            .dirs
            .temp_directory()
            .join(format!("comicarc_{label}_{date}.cbz"));
        if target.exists() {
            tracing::debug!(target = %target.display(), "Reusing existing download artifact");
            return Ok(target);
        }

        let stream = self.repack_inner(meta, cancel).inspect_err(|e| {
            if !matches!(e, ArchiveError::Cancelled) {
                self.report(meta, "Could not build download archive", e);
            }
        })?;
        self.dirs.ensure_directory(&self.dirs.temp_directory())?;
        std::fs::write(&target, stream.into_inner())?;
        Ok(target)
    }

    /// Open, select and return the image entries for `meta`.
    fn selected_images(&self, meta: &FileMetadata) -> Result<Vec<ArchiveEntry>> {
        let backend = archive::open(&meta.path)?;
        let entries = backend.entries()?;
        select::select_entries(&entries, meta, true, self.cover_regex.as_ref())
    }

    /// Funnel for per-operation failures. A file that simply is not an
    /// archive only earns a warning; everything else goes to the reporter.
    fn report(&self, meta: &FileMetadata, message: &str, cause: &ArchiveError) {
        if matches!(cause, ArchiveError::NotAnArchive(_)) {
            tracing::warn!(path = %meta.path.display(), error = %cause, "{message}");
            return;
        }
        self.reporter
            .report(&meta.path, ErrorProducer::ArchiveService, message, Some(cause));
    }
}

/// The sidecar entry, wherever it sits, as long as its folder is clean.
fn find_sidecar(entries: &[ArchiveEntry]) -> Option<&ArchiveEntry> {
    entries.iter().find(|e| {
        !e.is_directory
            && classify::base_name(&e.full_name).eq_ignore_ascii_case("comicinfo.xml")
            && !classify::has_blacklisted_folder(&e.full_name)
            && !classify::is_macos_sidecar(&e.full_name)
    })
}

/// The cover-range rule: a window that starts at page 0 also carries the
/// sidecar, so a repackaged or extracted "first chapter" keeps its metadata.
fn append_sidecar_for_cover_range(
    meta: &FileMetadata,
    entries: &[ArchiveEntry],
    selected: &mut Vec<ArchiveEntry>,
) {
    let Some(range) = meta.page_range else { return };
    if range.min != 0 {
        return;
    }
    if let Some(sidecar) = find_sidecar(entries)
        && !selected.iter().any(|e| e.full_name == sidecar.full_name)
    {
        selected.push(sidecar.clone());
    }
}

/// All non-blacklisted entries nested under one shared top-level folder.
fn has_single_root(entries: &[ArchiveEntry]) -> bool {
    let mut root: Option<&str> = None;
    let mut seen = false;
    for entry in entries {
        if classify::has_blacklisted_folder(&entry.full_name)
            || classify::is_macos_sidecar(&entry.full_name)
        {
            continue;
        }
        seen = true;
        let Some((top, _)) = entry.full_name.split_once(['/', '\\']) else {
            return false;
        };
        match root {
            None => root = Some(top),
            Some(existing) if existing == top => {}
            Some(_) => return false,
        }
    }
    seen && root.is_some()
}

/// Entry name as a safe relative path: no absolute components, no parent
/// traversal.
fn sanitize_entry_path(name: &str) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for segment in name.split(['/', '\\']) {
        match segment {
            "" | "." => continue,
            ".." => return None,
            s if s.contains(':') => return None,
            s => out.push(s),
        }
    }
    if out.as_os_str().is_empty() { None } else { Some(out) }
}
