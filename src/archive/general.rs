//! General-family backend: RAR (v4/v5), 7z and tar.gz.
//!
//! None of these containers offer cheap random access the way ZIP does, so
//! `read_entry` scans from the front until it hits the requested name. The
//! codec visits entries one operation at a time, which keeps that cost
//! acceptable for comic-sized archives.

use crate::archive::{ArchiveBackend, ArchiveEntry, ArchiveFamily};
use crate::error::{ArchiveError, Result};
use chrono::{Datelike, Timelike};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Read access to rar, 7z and tar.gz archives.
#[derive(Debug)]
pub struct GeneralBackend {
    path: PathBuf,
    kind: Kind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Rar,
    SevenZ,
    TarGz,
}

impl GeneralBackend {
    /// Backend for a file already known to be RAR (extension fast-path).
    pub fn rar(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            kind: Kind::Rar,
        }
    }

    /// Open the file with whichever general container accepts it.
    pub fn open(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        // Extension gives the likely container; content decides.
        let mut order = [Kind::SevenZ, Kind::TarGz, Kind::Rar];
        if name.ends_with(".cbt") || name.ends_with(".tar.gz") {
            order = [Kind::TarGz, Kind::SevenZ, Kind::Rar];
        } else if name.ends_with(".cbr") || name.ends_with(".rar") {
            order = [Kind::Rar, Kind::SevenZ, Kind::TarGz];
        }

        for kind in order {
            let candidate = Self {
                path: path.to_path_buf(),
                kind,
            };
            if candidate.verify() {
                return Ok(candidate);
            }
        }
        Err(ArchiveError::Unsupported(path.to_path_buf()))
    }

    /// Cheap open-and-peek check for one container kind.
    fn verify(&self) -> bool {
        match self.kind {
            Kind::Rar => unrar::Archive::new(&self.path).open_for_listing().is_ok(),
            Kind::SevenZ => {
                sevenz_rust2::SevenZReader::open(&self.path, sevenz_rust2::Password::empty())
                    .is_ok()
            }
            Kind::TarGz => self.targz_entries().is_ok(),
        }
    }

    fn rar_entries(&self) -> Result<Vec<ArchiveEntry>> {
        let archive = unrar::Archive::new(&self.path)
            .open_for_listing()
            .map_err(|e| ArchiveError::Corrupt(format!("{e:?}")))?;

        let mut entries = Vec::new();
        for header in archive {
            let header = header.map_err(|e| ArchiveError::Corrupt(format!("{e:?}")))?;
            let size = header.unpacked_size as u64;
            entries.push(ArchiveEntry {
                full_name: header.filename.to_string_lossy().replace('\\', "/"),
                is_directory: header.is_directory(),
                compressed_size: size,
                uncompressed_size: size,
                last_modified: dos_datetime(header.file_time),
                stored: false,
            });
        }
        Ok(entries)
    }

    fn rar_read(&self, name: &str) -> Result<Vec<u8>> {
        let mut archive = unrar::Archive::new(&self.path)
            .open_for_processing()
            .map_err(|e| ArchiveError::Corrupt(format!("{e:?}")))?;

        while let Some(header) = archive
            .read_header()
            .map_err(|e| ArchiveError::Corrupt(format!("{e:?}")))?
        {
            let entry_name = header.entry().filename.to_string_lossy().replace('\\', "/");
            if entry_name == name && header.entry().is_file() {
                let (data, _) = header
                    .read()
                    .map_err(|e| ArchiveError::Corrupt(format!("{e:?}")))?;
                return Ok(data);
            }
            archive = header
                .skip()
                .map_err(|e| ArchiveError::Corrupt(format!("{e:?}")))?;
        }
        Err(ArchiveError::EntryMissing(name.to_string()))
    }

    fn sevenz_entries(&self) -> Result<Vec<ArchiveEntry>> {
        let reader =
            sevenz_rust2::SevenZReader::open(&self.path, sevenz_rust2::Password::empty())
                .map_err(|e| ArchiveError::Corrupt(e.to_string()))?;

        let entries = reader
            .archive()
            .files
            .iter()
            .map(|entry| ArchiveEntry {
                full_name: entry.name().replace('\\', "/"),
                is_directory: entry.is_directory(),
                compressed_size: entry.size(),
                uncompressed_size: entry.size(),
                last_modified: None,
                stored: false,
            })
            .collect();
        Ok(entries)
    }

    fn sevenz_read(&self, name: &str) -> Result<Vec<u8>> {
        let mut reader =
            sevenz_rust2::SevenZReader::open(&self.path, sevenz_rust2::Password::empty())
                .map_err(|e| ArchiveError::Corrupt(e.to_string()))?;

        let mut found: Option<Vec<u8>> = None;
        reader
            .for_each_entries(|entry, stream| {
                if entry.name().replace('\\', "/") == name && !entry.is_directory() {
                    let mut data = Vec::new();
                    stream
                        .read_to_end(&mut data)
                        .map_err(|e| sevenz_rust2::Error::other(e.to_string()))?;
                    found = Some(data);
                    return Ok(false);
                }
                Ok(true)
            })
            .map_err(|e| ArchiveError::Corrupt(e.to_string()))?;

        found.ok_or_else(|| ArchiveError::EntryMissing(name.to_string()))
    }

    fn targz_entries(&self) -> Result<Vec<ArchiveEntry>> {
        let file = File::open(&self.path)?;
        let mut archive = tar::Archive::new(GzDecoder::new(file));

        let mut entries = Vec::new();
        for entry in archive.entries()? {
            let entry = entry?;
            let size = entry.header().size()?;
            entries.push(ArchiveEntry {
                full_name: entry.path()?.to_string_lossy().replace('\\', "/"),
                is_directory: entry.header().entry_type().is_dir(),
                compressed_size: size,
                uncompressed_size: size,
                last_modified: entry.header().mtime().ok().and_then(unix_datetime),
                // tar members are not individually compressed.
                stored: true,
            });
        }
        Ok(entries)
    }

    fn targz_read(&self, name: &str) -> Result<Vec<u8>> {
        let file = File::open(&self.path)?;
        let mut archive = tar::Archive::new(GzDecoder::new(file));

        for entry in archive.entries()? {
            let mut entry = entry?;
            if entry.path()?.to_string_lossy().replace('\\', "/") == name {
                let mut data = Vec::with_capacity(entry.header().size()? as usize);
                entry.read_to_end(&mut data)?;
                return Ok(data);
            }
        }
        Err(ArchiveError::EntryMissing(name.to_string()))
    }
}

impl ArchiveBackend for GeneralBackend {
    fn family(&self) -> ArchiveFamily {
        ArchiveFamily::Rar
    }

    fn entries(&self) -> Result<Vec<ArchiveEntry>> {
        match self.kind {
            Kind::Rar => self.rar_entries(),
            Kind::SevenZ => self.sevenz_entries(),
            Kind::TarGz => self.targz_entries(),
        }
    }

    fn read_entry(&self, name: &str) -> Result<Vec<u8>> {
        match self.kind {
            Kind::Rar => self.rar_read(name),
            Kind::SevenZ => self.sevenz_read(name),
            Kind::TarGz => self.targz_read(name),
        }
    }
}

/// RAR stores MS-DOS timestamps: date in the high word, time in the low.
fn dos_datetime(dos: u32) -> Option<zip::DateTime> {
    zip::DateTime::try_from_msdos((dos >> 16) as u16, (dos & 0xFFFF) as u16).ok()
}

fn unix_datetime(secs: u64) -> Option<zip::DateTime> {
    let dt = chrono::DateTime::from_timestamp(i64::try_from(secs).ok()?, 0)?;
    zip::DateTime::from_date_and_time(
        u16::try_from(dt.year()).ok()?,
        dt.month() as u8,
        dt.day() as u8,
        dt.hour() as u8,
        dt.minute() as u8,
        dt.second() as u8,
    )
    .ok()
}
