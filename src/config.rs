//! Feed configuration file parser.
//!
//! The file is TOML and every key is optional; values given on the command
//! line override it. Unknown keys are accepted by serde but logged, since
//! they are usually typos.
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::atom::FeedSettings;
use crate::page::LoadOptions;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    /// A feed field needed to build the feed was given nowhere.
    #[error("Missing required setting `{0}` (set it in the config file or on the command line)")]
    MissingField(&'static str),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Raw feed configuration as read from a file or assembled from flags.
///
/// All fields are optional here; [`FileConfig::into_settings`] checks that
/// the required ones ended up present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Site root the page paths are published under.
    pub base_url: Option<String>,

    /// Public URL of the generated feed.
    pub feed_url: Option<String>,

    pub title: Option<String>,

    pub author_name: Option<String>,

    pub author_email: Option<String>,

    /// Feed-level `<summary>`.
    pub summary: Option<String>,

    /// Pages loaded at the same time.
    pub concurrency: Option<usize>,

    /// Per-page fetch timeout in seconds.
    pub timeout_secs: Option<u64>,

    /// Largest accepted page, in bytes.
    pub max_page_bytes: Option<usize>,
}

impl FileConfig {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 9] = [
        "base_url",
        "feed_url",
        "title",
        "author_name",
        "author_email",
        "summary",
        "concurrency",
        "timeout_secs",
        "max_page_bytes",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Err(ConfigError::Io)`; the path was asked for explicitly
    /// - Empty file → `Ok(FileConfig::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let meta = std::fs::metadata(path)?;
        if meta.len() > Self::MAX_FILE_SIZE {
            return Err(ConfigError::TooLarge(format!(
                "Config file is {} bytes (max {} bytes)",
                meta.len(),
                Self::MAX_FILE_SIZE
            )));
        }

        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        // Parse the TOML content first as a raw table to detect unknown keys
        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: FileConfig = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Layers `overrides` on top of `self`; any value set in `overrides` wins.
    pub fn merge(self, overrides: FileConfig) -> Self {
        Self {
            base_url: overrides.base_url.or(self.base_url),
            feed_url: overrides.feed_url.or(self.feed_url),
            title: overrides.title.or(self.title),
            author_name: overrides.author_name.or(self.author_name),
            author_email: overrides.author_email.or(self.author_email),
            summary: overrides.summary.or(self.summary),
            concurrency: overrides.concurrency.or(self.concurrency),
            timeout_secs: overrides.timeout_secs.or(self.timeout_secs),
            max_page_bytes: overrides.max_page_bytes.or(self.max_page_bytes),
        }
    }

    /// Page loading limits, with defaults for anything unset.
    pub fn load_options(&self) -> LoadOptions {
        let defaults = LoadOptions::default();
        LoadOptions {
            timeout: self
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            max_bytes: self.max_page_bytes.unwrap_or(defaults.max_bytes),
            concurrency: self.concurrency.unwrap_or(defaults.concurrency).max(1),
        }
    }

    /// Converts into feed settings.
    ///
    /// Empty email and summary values count as not configured.
    pub fn into_settings(self) -> Result<FeedSettings, ConfigError> {
        Ok(FeedSettings {
            base_url: self.base_url.ok_or(ConfigError::MissingField("base_url"))?,
            feed_url: self.feed_url.ok_or(ConfigError::MissingField("feed_url"))?,
            title: self.title.ok_or(ConfigError::MissingField("title"))?,
            author_name: self
                .author_name
                .ok_or(ConfigError::MissingField("author_name"))?,
            author_email: self.author_email.filter(|email| !email.is_empty()),
            summary: self.summary.filter(|summary| !summary.is_empty()),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
