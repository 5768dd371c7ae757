//! ZIP-family backend (cbz, zip, epub).

use crate::archive::{ArchiveBackend, ArchiveEntry, ArchiveFamily};
use crate::error::{ArchiveError, Result};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use zip::CompressionMethod;
use zip::ZipArchive;
use zip::result::ZipError;

/// Read access to a ZIP-family archive.
#[derive(Debug)]
pub struct ZipBackend {
    path: PathBuf,
}

impl ZipBackend {
    /// Open the file as ZIP, validating the central directory once.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        ZipArchive::new(file)?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    fn archive(&self) -> Result<ZipArchive<File>> {
        let file = File::open(&self.path)?;
        Ok(ZipArchive::new(file)?)
    }
}

impl ArchiveBackend for ZipBackend {
    fn family(&self) -> ArchiveFamily {
        ArchiveFamily::Zip
    }

    fn entries(&self) -> Result<Vec<ArchiveEntry>> {
        let mut archive = self.archive()?;
        let mut entries = Vec::with_capacity(archive.len());

        for index in 0..archive.len() {
            let entry = archive.by_index(index)?;
            entries.push(ArchiveEntry {
                full_name: entry.name().replace('\\', "/"),
                is_directory: entry.is_dir(),
                compressed_size: entry.compressed_size(),
                uncompressed_size: entry.size(),
                last_modified: entry.last_modified(),
                stored: entry.compression() == CompressionMethod::Stored,
            });
        }

        Ok(entries)
    }

    fn read_entry(&self, name: &str) -> Result<Vec<u8>> {
        let mut archive = self.archive()?;
        let mut entry = archive.by_name(name).map_err(|e| match e {
            ZipError::FileNotFound => ArchiveError::EntryMissing(name.to_string()),
            other => other.into(),
        })?;

        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data)?;
        Ok(data)
    }
}
