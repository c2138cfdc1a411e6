use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use metafeed::atom::FeedAssembler;
use metafeed::config::FileConfig;
use metafeed::page::{load_pages, PageSource};

#[derive(Parser, Debug)]
#[command(
    name = "metafeed",
    version,
    about = "Build an Atom feed from the meta tags of HTML pages"
)]
struct Args {
    /// TOML file with feed settings; flags below override it
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Site root; file pages are published under it
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Public URL of the feed itself
    #[arg(long, value_name = "URL")]
    feed_url: Option<String>,

    /// Feed title
    #[arg(long)]
    title: Option<String>,

    /// Feed author name
    #[arg(long, value_name = "NAME")]
    author: Option<String>,

    /// Feed author email
    #[arg(long, value_name = "ADDRESS")]
    email: Option<String>,

    /// Feed summary
    #[arg(long)]
    summary: Option<String>,

    /// Number of pages loaded at the same time
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// Write the feed here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// HTML files or http(s) URLs, in feed order
    #[arg(value_name = "PAGE")]
    pages: Vec<String>,
}

impl Args {
    fn overrides(&self) -> FileConfig {
        FileConfig {
            base_url: self.base_url.clone(),
            feed_url: self.feed_url.clone(),
            title: self.title.clone(),
            author_name: self.author.clone(),
            author_email: self.email.clone(),
            summary: self.summary.clone(),
            concurrency: self.concurrency,
            ..FileConfig::default()
        }
    }
}

/// Writes `content` to a temp file next to `path`, syncs it, then renames it
/// over `path`, so readers never see a partial feed.
fn write_atomically(path: &Path, content: &str) -> Result<()> {
    use std::time::{SystemTime, UNIX_EPOCH};

    let random_suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp_path = path.with_extension(format!("tmp.{:016x}", random_suffix));

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .with_context(|| {
            format!(
                "Failed to create temporary file '{}': check directory permissions",
                temp_path.display()
            )
        })?;

    file.write_all(content.as_bytes()).with_context(|| {
        let _ = std::fs::remove_file(&temp_path);
        format!("Failed to write feed to '{}'", temp_path.display())
    })?;

    file.sync_all().with_context(|| {
        let _ = std::fs::remove_file(&temp_path);
        format!("Failed to sync '{}' to disk", temp_path.display())
    })?;

    drop(file);

    std::fs::rename(&temp_path, path).with_context(|| {
        let _ = std::fs::remove_file(&temp_path);
        format!(
            "Failed to rename '{}' to '{}'",
            temp_path.display(),
            path.display()
        )
    })?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the feed, so diagnostics go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let file_config = match &args.config {
        Some(path) => FileConfig::load(path)
            .with_context(|| format!("Failed to load config '{}'", path.display()))?,
        None => FileConfig::default(),
    };
    let config = file_config.merge(args.overrides());
    let options = config.load_options();
    let settings = config.into_settings()?;

    let sources = args
        .pages
        .iter()
        .map(|arg| PageSource::from_arg(arg, &settings.base_url))
        .collect::<Result<Vec<_>, _>>()?;

    if sources.is_empty() {
        tracing::warn!("No pages given, the feed will have no entries");
    }

    let client = reqwest::Client::builder()
        .timeout(options.timeout)
        .build()
        .context("Failed to build HTTP client")?;

    // Every page must load before anything is written.
    let pages = load_pages(&sources, &client, &options)
        .await
        .context("Failed to load pages")?;

    let xml = FeedAssembler::new(settings, pages)
        .to_xml()
        .context("Failed to serialize feed")?;

    match &args.output {
        Some(path) => {
            write_atomically(path, &xml)?;
            tracing::info!(path = %path.display(), "Wrote feed");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{xml}").context("Failed to write feed to stdout")?;
        }
    }

    Ok(())
}
