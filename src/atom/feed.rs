use chrono::{DateTime, SubsecRound, Utc};

use super::{Diagnostics, Entry, TracingDiagnostics};
use crate::page::Page;

/// Feed-level values, fixed for one generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSettings {
    /// Site root; the feed's alternate link and the category scheme.
    pub base_url: String,
    /// Where the feed is published; its `id` and `self` link.
    pub feed_url: String,
    pub title: String,
    pub author_name: String,
    pub author_email: Option<String>,
    pub summary: Option<String>,
}

/// A complete Atom document, ready to serialize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomFeed {
    pub title: String,
    pub id: String,
    pub updated: DateTime<Utc>,
    pub self_link: String,
    pub alternate_link: String,
    pub author_name: String,
    pub author_email: Option<String>,
    pub summary: Option<String>,
    pub entries: Vec<Entry>,
}

/// Builds an [`AtomFeed`] from settings and an ordered page collection.
#[derive(Debug, Clone)]
pub struct FeedAssembler {
    settings: FeedSettings,
    pages: Vec<Page>,
}

impl FeedAssembler {
    pub fn new(settings: FeedSettings, pages: Vec<Page>) -> Self {
        Self { settings, pages }
    }

    /// Assembles the feed, logging defaulted metadata as warnings.
    pub fn generate(&self) -> AtomFeed {
        self.generate_with(&TracingDiagnostics)
    }

    /// Assembles the feed, reporting defaulted metadata to `diagnostics`.
    ///
    /// The feed's `updated` is always the current time. One entry is
    /// produced per page, in page order; an empty collection yields a feed
    /// without entries.
    pub fn generate_with(&self, diagnostics: &dyn Diagnostics) -> AtomFeed {
        let generated_at = Utc::now().trunc_subsecs(0);
        let settings = &self.settings;

        let entries: Vec<Entry> = self
            .pages
            .iter()
            .map(|page| Entry::from_page(page, &settings.base_url, generated_at, diagnostics))
            .collect();

        tracing::info!(
            feed = %settings.feed_url,
            entries = entries.len(),
            "Assembled feed"
        );

        AtomFeed {
            title: settings.title.clone(),
            id: settings.feed_url.clone(),
            updated: generated_at,
            self_link: settings.feed_url.clone(),
            alternate_link: settings.base_url.clone(),
            author_name: settings.author_name.clone(),
            author_email: non_empty(&settings.author_email),
            summary: non_empty(&settings.summary),
            entries,
        }
    }

    /// Assembles the feed and renders it as indented XML.
    pub fn to_xml(&self) -> anyhow::Result<String> {
        self.generate().to_xml()
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.clone().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn settings() -> FeedSettings {
        FeedSettings {
            base_url: "http://x.test".to_string(),
            feed_url: "http://x.test/feed.xml".to_string(),
            title: "T".to_string(),
            author_name: "N".to_string(),
            author_email: None,
            summary: None,
        }
    }

    fn titled(title: &str, url: &str) -> Page {
        Page::parse(
            &format!("<html><head><title>{title}</title></head></html>"),
            url,
        )
    }

    #[test]
    fn test_feed_level_fields() {
        let before = Utc::now().trunc_subsecs(0);
        let feed = FeedAssembler::new(settings(), Vec::new()).generate();

        assert_eq!(feed.title, "T");
        assert_eq!(feed.id, "http://x.test/feed.xml");
        assert_eq!(feed.self_link, "http://x.test/feed.xml");
        assert_eq!(feed.alternate_link, "http://x.test");
        assert_eq!(feed.author_name, "N");
        assert_eq!(feed.author_email, None);
        assert_eq!(feed.summary, None);
        assert!(feed.entries.is_empty());
        assert!(feed.updated >= before);
    }

    #[test]
    fn test_optional_feed_fields() {
        let mut settings = settings();
        settings.author_email = Some("n@x.test".to_string());
        settings.summary = Some("All the pages".to_string());

        let feed = FeedAssembler::new(settings, Vec::new()).generate();

        assert_eq!(feed.author_email.as_deref(), Some("n@x.test"));
        assert_eq!(feed.summary.as_deref(), Some("All the pages"));
    }

    #[test]
    fn test_empty_optional_fields_are_dropped() {
        let mut settings = settings();
        settings.author_email = Some(String::new());
        settings.summary = Some(String::new());

        let feed = FeedAssembler::new(settings, Vec::new()).generate();

        assert_eq!(feed.author_email, None);
        assert_eq!(feed.summary, None);
    }

    #[test]
    fn test_entries_keep_page_order() {
        let pages = vec![
            titled("Zebra", "http://x.test/z.html"),
            titled("Apple", "http://x.test/a.html"),
            titled("Mango", "http://x.test/m.html"),
        ];

        let feed = FeedAssembler::new(settings(), pages).generate();

        let urls: Vec<&str> = feed.entries.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "http://x.test/z.html",
                "http://x.test/a.html",
                "http://x.test/m.html"
            ]
        );
    }

    #[test]
    fn test_defaulted_dates_share_feed_timestamp() {
        let pages = vec![
            titled("A", "http://x.test/a.html"),
            titled("B", "http://x.test/b.html"),
        ];

        let feed = FeedAssembler::new(settings(), pages).generate();

        assert!(feed.entries.iter().all(|e| e.updated == feed.updated));
    }
}
