use crate::encoder::CoverFormat;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Comic archive codec: pages, covers, metadata and chapter extraction.
#[derive(Parser, Debug, Clone)]
#[command(name = "comicarc")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file.
    #[arg(short, long, env = "COMICARC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List the pages of an archive.
    Pages {
        /// Path to the archive.
        path: PathBuf,

        /// Page range to project, e.g. "0-9".
        #[arg(short, long)]
        range: Option<String>,

        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Extract the cover image as a thumbnail.
    Cover {
        /// Path to the archive.
        path: PathBuf,

        /// Output directory (defaults to the configured covers dir).
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Output file name without extension (defaults to the archive stem).
        #[arg(short, long)]
        name: Option<String>,

        /// Thumbnail encoding.
        #[arg(short, long, value_enum, default_value_t)]
        format: CoverFormat,

        /// Maximum thumbnail width in pixels.
        #[arg(short, long)]
        size: Option<u32>,
    },

    /// Show archive family, page count and sidecar metadata.
    Info {
        /// Path to the archive.
        path: PathBuf,

        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Extract an archive (or a page range of it) to a directory.
    Extract {
        /// Path to the archive.
        path: PathBuf,

        /// Destination directory (defaults to a temp session directory).
        #[arg(short, long)]
        dest: Option<PathBuf>,

        /// Page range to extract, e.g. "0-9".
        #[arg(short, long)]
        range: Option<String>,
    },

    /// Repackage a page range into a new cbz under the temp directory.
    Repack {
        /// Path to the archive.
        path: PathBuf,

        /// Page range to repackage, e.g. "0-9".
        #[arg(short, long)]
        range: String,

        /// Artifact label (defaults to the archive stem).
        #[arg(short, long)]
        label: Option<String>,
    },

    /// Infer chapter boundaries from bookmarks or page names.
    Chapters {
        /// Path to the archive.
        path: PathBuf,

        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Probe every archive under a directory and report failures.
    Check {
        /// Directory to walk.
        dir: PathBuf,

        /// Number of parallel workers.
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Create a default config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
}

/// Main configuration from TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Cover extraction configuration.
    #[serde(default)]
    pub covers: CoversConfig,

    /// Temp artifact configuration.
    #[serde(default)]
    pub temp: TempConfig,

    /// Check command configuration.
    #[serde(default)]
    pub check: CheckConfig,
}

/// Cover extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoversConfig {
    /// Directory for extracted cover thumbnails.
    #[serde(default = "default_covers_dir")]
    pub dir: PathBuf,

    /// Maximum thumbnail width in pixels.
    #[serde(default = "default_thumbnail_size")]
    pub thumbnail_size: u32,

    /// Extra cover-name pattern on top of the cover/folder convention.
    #[serde(default)]
    pub regex: Option<String>,
}

impl Default for CoversConfig {
    fn default() -> Self {
        Self {
            dir: default_covers_dir(),
            thumbnail_size: default_thumbnail_size(),
            regex: None,
        }
    }
}

fn default_covers_dir() -> PathBuf {
    PathBuf::from("data/covers")
}

fn default_thumbnail_size() -> u32 {
    320
}

/// Temp artifact configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TempConfig {
    /// Root for download archives and extraction directories.
    #[serde(default = "default_temp_dir")]
    pub dir: PathBuf,
}

impl Default for TempConfig {
    fn default() -> Self {
        Self {
            dir: default_temp_dir(),
        }
    }
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("comicarc")
}

/// Check command configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Number of parallel workers for the check command.
    /// Keep low for NAS/network storage to avoid saturation.
    #[serde(default = "default_check_workers")]
    pub workers: usize,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            workers: default_check_workers(),
        }
    }
}

fn default_check_workers() -> usize {
    2
}

impl Config {
    /// Load configuration from file.
    pub fn load(path: &PathBuf) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            crate::error::ArchiveError::Config(format!("Failed to parse config file: {}", e))
        })
    }

    /// Find config file in default locations.
    pub fn find_config_file() -> Option<PathBuf> {
        let candidates = [
            PathBuf::from("config.toml"),
            PathBuf::from("comicarc.toml"),
            dirs::config_dir()
                .map(|p| p.join("comicarc").join("config.toml"))
                .unwrap_or_default(),
            PathBuf::from("/etc/comicarc/config.toml"),
        ];

        candidates.into_iter().find(|p| p.exists())
    }

    /// Compiled cover-name pattern, if one is configured and valid.
    pub fn cover_regex(&self) -> Option<regex::Regex> {
        let pattern = self.covers.regex.as_deref()?;
        match regex::Regex::new(pattern) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::warn!(pattern, error = %e, "Ignoring invalid cover regex");
                None
            }
        }
    }

    /// Generate default config file content.
    pub fn generate_default() -> String {
        r#"# comicarc configuration

[covers]
# dir = "/var/lib/comicarc/covers"
thumbnail_size = 320
# Extra cover-name pattern on top of cover/folder, matched against the
# file stem. Example: leading-zero scan markers like "!0000".
# regex = "^!0+$"

[temp]
# dir = "/tmp/comicarc"

[check]
# Parallel workers for `comicarc check`
workers = 2
"#
        .to_string()
    }
}
