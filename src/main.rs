//! comicarc command line entry point.

use clap::Parser;
use comicarc::{
    ArchiveCodec, CancelFlag, Cli, Command, Config, FileMetadata, PageRange,
    chapters, classify,
    directory::{DirectoryService, LocalDirectoryService},
    encoder::{CoverFormat, ThumbnailEncoder},
    report::{CountingReporter, LogReporter},
    scan,
};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "comicarc=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = cli.config.clone().or_else(Config::find_config_file);
    let config = if let Some(ref path) = config_path {
        Config::load(path)?
    } else {
        Config::default()
    };

    match cli.command {
        Command::Pages { path, range, json } => cmd_pages(&config, path, range, json),
        Command::Cover {
            path,
            out_dir,
            name,
            format,
            size,
        } => cmd_cover(&config, path, out_dir, name, format, size),
        Command::Info { path, json } => cmd_info(&config, path, json),
        Command::Extract { path, dest, range } => cmd_extract(&config, path, dest, range),
        Command::Repack { path, range, label } => cmd_repack(&config, path, range, label),
        Command::Chapters { path, json } => cmd_chapters(&config, path, json),
        Command::Check { dir, workers } => cmd_check(&config, dir, workers),
        Command::Init { force } => cmd_init(force),
    }
}

/// Codec wired to the configured collaborators.
fn build_codec(config: &Config) -> ArchiveCodec {
    ArchiveCodec::new(
        Arc::new(ThumbnailEncoder),
        Arc::new(LocalDirectoryService::new(config.temp.dir.clone())),
        Arc::new(LogReporter),
    )
    .with_cover_regex(config.cover_regex())
}

/// Metadata for a path with an optional range argument.
fn metadata_for(path: PathBuf, range: Option<&str>) -> anyhow::Result<FileMetadata> {
    let mut meta = FileMetadata::new(path);
    meta.page_range = PageRange::parse_opt(range.unwrap_or_default())?;
    if let Ok(len) = std::fs::metadata(&meta.path).map(|m| m.len()) {
        meta.file_size = len as i64;
    }
    Ok(meta)
}

fn archive_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("archive")
        .to_string()
}

/// List pages.
fn cmd_pages(
    config: &Config,
    path: PathBuf,
    range: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let codec = build_codec(config);
    let meta = metadata_for(path, range.as_deref())?;
    let pages = codec.list_pages(&meta);

    if json {
        println!("{}", serde_json::to_string_pretty(&pages)?);
        return Ok(());
    }

    if pages.is_empty() {
        println!("No pages found.");
        return Ok(());
    }
    println!("{:<6} {:<12} NAME", "PAGE", "SIZE");
    println!("{}", "-".repeat(60));
    for page in pages {
        println!("{:<6} {:<12} {}", page.index, page.size, page.name);
    }
    Ok(())
}

/// Extract the cover thumbnail.
fn cmd_cover(
    config: &Config,
    path: PathBuf,
    out_dir: Option<PathBuf>,
    name: Option<String>,
    format: CoverFormat,
    size: Option<u32>,
) -> anyhow::Result<()> {
    let codec = build_codec(config);
    let out_dir = out_dir.unwrap_or_else(|| config.covers.dir.clone());
    let name = name.unwrap_or_else(|| archive_stem(&path));
    let size = size.unwrap_or(config.covers.thumbnail_size);
    let meta = metadata_for(path, None)?;

    let written = codec.cover_image(&meta, &name, &out_dir, format, size);
    if written.is_empty() {
        anyhow::bail!("No cover could be extracted from {}", meta.path.display());
    }
    println!("{}", written);
    Ok(())
}

/// Show family, page count and sidecar metadata.
fn cmd_info(config: &Config, path: PathBuf, json: bool) -> anyhow::Result<()> {
    let codec = build_codec(config);
    let meta = metadata_for(path, None)?;

    let family = codec.can_open(&meta.path);
    let pages = codec.page_count(&meta);
    let comic_info = codec.comic_info(&meta);
    let (series, volume) = scan::parse_series_volume(&archive_stem(&meta.path));

    if json {
        let value = serde_json::json!({
            "path": meta.path,
            "family": family,
            "pages": pages,
            "series": series,
            "volume": volume,
            "comic_info": comic_info,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Archive:  {}", meta.path.display());
    println!("Family:   {:?}", family);
    println!("Pages:    {}", pages);
    println!("Series:   {} (volume {})", series, volume);
    match comic_info {
        Some(info) => {
            println!("Sidecar:  ComicInfo.xml");
            if let Some(series) = info.series {
                println!("  Series: {}", series);
            }
            if let Some(title) = info.title {
                println!("  Title:  {}", title);
            }
            println!("  Declared pages: {}", info.page_count);
            println!("  Page annotations: {}", info.pages.len());
        }
        None => println!("Sidecar:  none"),
    }
    Ok(())
}

/// Extract to a directory.
fn cmd_extract(
    config: &Config,
    path: PathBuf,
    dest: Option<PathBuf>,
    range: Option<String>,
) -> anyhow::Result<()> {
    let codec = build_codec(config);
    let dirs = LocalDirectoryService::new(config.temp.dir.clone());
    let meta = metadata_for(path, range.as_deref())?;
    let dest = dest.unwrap_or_else(|| dirs.session_directory(&archive_stem(&meta.path)));

    codec.extract_to_dir(&meta, &dest, &CancelFlag::new())?;
    println!("{}", dest.display());
    Ok(())
}

/// Repackage a page range into a download artifact.
fn cmd_repack(
    config: &Config,
    path: PathBuf,
    range: String,
    label: Option<String>,
) -> anyhow::Result<()> {
    let codec = build_codec(config);
    let label = label.unwrap_or_else(|| archive_stem(&path));
    let meta = metadata_for(path, Some(&range))?;

    let target = codec.zip_to_disk(&meta, &label, &CancelFlag::new())?;
    println!("{}", target.display());
    Ok(())
}

/// Infer chapters.
fn cmd_chapters(config: &Config, path: PathBuf, json: bool) -> anyhow::Result<()> {
    let codec = build_codec(config);
    let meta = metadata_for(path, None)?;
    let pages = codec.list_pages(&meta);

    let (series, volume) = scan::parse_series_volume(&archive_stem(&meta.path));
    let mut info = scan::ParserInfo::new(meta);
    info.series = series;
    // Chapter inference only applies to volumes; a file with no volume
    // marker is treated as volume 1 for interactive use.
    info.volumes = if volume == scan::LOOSE_LEAF_VOLUME {
        "1".to_string()
    } else {
        volume
    };
    info.comic_info = codec.comic_info(&info.metadata);

    let chapters = chapters::extract_chapters(&info, &pages);
    if json {
        println!("{}", serde_json::to_string_pretty(&chapters)?);
        return Ok(());
    }

    if chapters.len() == 1 && chapters[0].metadata.page_range.is_none() {
        println!("No chapter boundaries found.");
        return Ok(());
    }
    println!("{:<10} {:<10} {:<14} TITLE", "CHAPTER", "PAGES", "SIZE");
    println!("{}", "-".repeat(60));
    for chapter in chapters {
        println!(
            "{:<10} {:<10} {:<14} {}",
            chapter.chapters,
            chapter.metadata.range_string(),
            chapter.metadata.file_size,
            chapter.title
        );
    }
    Ok(())
}

/// Probe every archive under a directory on a bounded worker pool. One
/// corrupt file is one report, never an aborted run.
fn cmd_check(config: &Config, dir: PathBuf, workers: Option<usize>) -> anyhow::Result<()> {
    let reporter = Arc::new(CountingReporter::default());
    let codec = ArchiveCodec::new(
        Arc::new(ThumbnailEncoder),
        Arc::new(LocalDirectoryService::new(config.temp.dir.clone())),
        reporter.clone(),
    )
    .with_cover_regex(config.cover_regex());

    let files: Vec<PathBuf> = walkdir::WalkDir::new(&dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter(|e| {
            let name = e.file_name().to_string_lossy();
            classify::is_archive(&name) || classify::is_epub(&name)
        })
        .map(|e| e.into_path())
        .collect();

    if files.is_empty() {
        println!("No archives found under {}", dir.display());
        return Ok(());
    }

    let workers = workers.unwrap_or(config.check.workers).max(1);
    tracing::info!(files = files.len(), workers, "Checking archives");
    let start = std::time::Instant::now();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()?;

    let total_pages = AtomicUsize::new(0);
    let processed = AtomicUsize::new(0);
    let total = files.len();

    pool.install(|| {
        files.par_iter().for_each(|path| {
            let meta = FileMetadata::new(path.clone());
            total_pages.fetch_add(codec.page_count(&meta), Ordering::Relaxed);

            let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
            if done % 100 == 0 || done == total {
                tracing::info!("Checked {}/{}", done, total);
            }
        });
    });

    let failures = reporter.count();
    println!(
        "Checked {} archives in {:.1?}: {} pages, {} failures",
        total,
        start.elapsed(),
        total_pages.load(Ordering::Relaxed),
        failures
    );
    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Create a default config file.
fn cmd_init(force: bool) -> anyhow::Result<()> {
    let config_path = PathBuf::from("config.toml");

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, Config::generate_default())?;
    println!("Created config file: {}", config_path.display());
    println!("\nEdit config.toml, then try: comicarc info /path/to/volume.cbz");
    Ok(())
}
