//! Filesystem abstraction for extraction and temp artifacts.
//!
//! Kept behind a trait so tests and embedders can redirect disk traffic.

use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Filesystem operations the codec needs from its host.
pub trait DirectoryService: Send + Sync {
    /// Root for temporary artifacts (download zips, extraction dirs).
    fn temp_directory(&self) -> PathBuf;

    /// Create a directory and all parents.
    fn ensure_directory(&self, path: &Path) -> Result<()>;

    /// Delete a directory tree, tolerating its absence.
    fn clear_and_delete(&self, path: &Path) -> Result<()>;

    /// Copy a single file.
    fn copy_file(&self, src: &Path, dst: &Path) -> Result<()>;

    /// If `dir` contains exactly one entry and it is a directory, hoist that
    /// directory's children up one level and remove it.
    fn flatten(&self, dir: &Path) -> Result<()>;

    /// Deterministic per-label working directory under the temp root:
    /// `{temp}/{label}_{UTC-date}`. Same label and day, same path; callers
    /// invalidate by picking a fresh label.
    fn session_directory(&self, label: &str) -> PathBuf {
        let date = chrono::Utc::now().format("%Y-%m-%d");
        self.temp_directory().join(format!("{label}_{date}"))
    }
}

/// [`DirectoryService`] over the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalDirectoryService {
    temp: PathBuf,
}

impl LocalDirectoryService {
    /// Service rooted at the given temp directory.
    pub fn new(temp: impl Into<PathBuf>) -> Self {
        Self { temp: temp.into() }
    }
}

impl DirectoryService for LocalDirectoryService {
    fn temp_directory(&self) -> PathBuf {
        self.temp.clone()
    }

    fn ensure_directory(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        Ok(())
    }

    fn clear_and_delete(&self, path: &Path) -> Result<()> {
        if path.exists() {
            fs::remove_dir_all(path)?;
        }
        Ok(())
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> Result<()> {
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(src, dst)?;
        Ok(())
    }

    fn flatten(&self, dir: &Path) -> Result<()> {
        let children: Vec<_> = fs::read_dir(dir)?.collect::<std::io::Result<_>>()?;
        let [only] = children.as_slice() else {
            return Ok(());
        };
        if !only.file_type()?.is_dir() {
            return Ok(());
        }

        let inner = only.path();
        for child in fs::read_dir(&inner)? {
            let child = child?;
            fs::rename(child.path(), dir.join(child.file_name()))?;
        }
        fs::remove_dir(&inner)?;
        tracing::debug!(dir = %dir.display(), "Flattened redundant root folder");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn flatten_hoists_single_root() {
        let tmp = TempDir::new().unwrap();
        let svc = LocalDirectoryService::new(tmp.path());
        let dir = tmp.path().join("out");
        fs::create_dir_all(dir.join("root/sub")).unwrap();
        fs::write(dir.join("root/001.jpg"), b"x").unwrap();
        fs::write(dir.join("root/sub/002.jpg"), b"y").unwrap();

        svc.flatten(&dir).unwrap();

        assert!(dir.join("001.jpg").exists());
        assert!(dir.join("sub/002.jpg").exists());
        assert!(!dir.join("root").exists());
    }

    #[test]
    fn flatten_leaves_mixed_content_alone() {
        let tmp = TempDir::new().unwrap();
        let svc = LocalDirectoryService::new(tmp.path());
        let dir = tmp.path().join("out");
        fs::create_dir_all(dir.join("root")).unwrap();
        fs::write(dir.join("001.jpg"), b"x").unwrap();

        svc.flatten(&dir).unwrap();

        assert!(dir.join("001.jpg").exists());
        assert!(dir.join("root").exists());
    }

    #[test]
    fn session_directory_is_deterministic() {
        let svc = LocalDirectoryService::new("/tmp/t");
        assert_eq!(svc.session_directory("dl"), svc.session_directory("dl"));
        assert_ne!(svc.session_directory("a"), svc.session_directory("b"));
    }

    #[test]
    fn clear_and_delete_tolerates_missing() {
        let tmp = TempDir::new().unwrap();
        let svc = LocalDirectoryService::new(tmp.path());
        svc.clear_and_delete(&tmp.path().join("nope")).unwrap();
    }
}
