use chrono::{DateTime, Utc};

use super::Diagnostics;
use crate::page::Page;

/// An Atom `<category>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub scheme: String,
    pub term: String,
}

/// One `<entry>` of the feed, built from a single page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub author: Option<String>,
    /// `None` when the page has neither `<title>` nor `DC.title`; the
    /// element is still written, empty.
    pub title: Option<String>,
    /// Page URL, used for both the alternate link and the entry id.
    pub url: String,
    /// Description, or the title when the page has none.
    pub summary: Option<String>,
    pub updated: DateTime<Utc>,
    pub categories: Vec<Category>,
}

impl Entry {
    /// Maps a page to an entry.
    ///
    /// A missing description falls back to the title and a missing date to
    /// `generated_at`; both substitutions are reported to `diagnostics`.
    /// Keywords become categories under `base_url`, in order, duplicates
    /// included.
    pub fn from_page(
        page: &Page,
        base_url: &str,
        generated_at: DateTime<Utc>,
        diagnostics: &dyn Diagnostics,
    ) -> Self {
        let title = page.title().map(str::to_owned);
        if title.is_none() {
            tracing::debug!(url = %page.url(), "Page has no title, writing an empty one");
        }

        let summary = match page.description() {
            Some(description) => Some(description.to_owned()),
            None => {
                diagnostics.missing_description(page.url());
                title.clone()
            }
        };

        let updated = match page.date() {
            Some(date) => date.and_utc(),
            None => {
                diagnostics.missing_date(page.url());
                generated_at
            }
        };

        let categories = page
            .keywords()
            .unwrap_or_default()
            .into_iter()
            .map(|term| Category {
                scheme: base_url.to_owned(),
                term,
            })
            .collect();

        Self {
            author: page.author().map(str::to_owned),
            title,
            url: page.url().to_owned(),
            summary,
            updated,
            categories,
        }
    }
}
