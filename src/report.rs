//! Media error reporting.
//!
//! Failures are isolated per archive: each one becomes a single report and
//! an empty result, so a scan over thousands of files survives the corrupt
//! ones.

use crate::error::ArchiveError;
use std::fmt;
use std::path::Path;

/// Subsystem that produced a media error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorProducer {
    /// The archive codec.
    ArchiveService,
    /// The chapter extractor.
    ChapterExtractor,
}

impl fmt::Display for ErrorProducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorProducer::ArchiveService => write!(f, "ArchiveService"),
            ErrorProducer::ChapterExtractor => write!(f, "ChapterExtractor"),
        }
    }
}

/// Sink for per-file media errors.
pub trait MediaErrorReporter: Send + Sync {
    /// Record one failure against one file.
    fn report(&self, path: &Path, producer: ErrorProducer, message: &str, cause: Option<&ArchiveError>);
}

/// Reporter that forwards everything to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl MediaErrorReporter for LogReporter {
    fn report(&self, path: &Path, producer: ErrorProducer, message: &str, cause: Option<&ArchiveError>) {
        match cause {
            Some(cause) => tracing::warn!(
                path = %path.display(),
                producer = %producer,
                error = %cause,
                "{message}"
            ),
            None => tracing::warn!(path = %path.display(), producer = %producer, "{message}"),
        }
    }
}

/// Reporter that additionally counts reports, for callers that need a
/// failure tally at the end of a batch.
#[derive(Debug, Default)]
pub struct CountingReporter {
    count: std::sync::atomic::AtomicUsize,
}

impl CountingReporter {
    /// Number of reports seen so far.
    pub fn count(&self) -> usize {
        self.count.load(std::sync::atomic::Ordering::Relaxed)
    }
}

impl MediaErrorReporter for CountingReporter {
    fn report(&self, path: &Path, producer: ErrorProducer, message: &str, cause: Option<&ArchiveError>) {
        self.count.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        LogReporter.report(path, producer, message, cause);
    }
}
