use std::io::Read;

use chrono::NaiveDateTime;
use scraper::{ElementRef, Html};

use super::charset::decode_html;
use super::date::parse_date;
use super::PageError;

/// Candidate `<meta name>` values, tried in order, for each field.
const TITLE_META: &str = "DC.title";
const AUTHOR_NAMES: &[&str] = &["DC.creator", "author"];
const DESCRIPTION_NAMES: &[&str] = &["DC.description", "description"];
// TODO: accept "DC.subject.keywords" as a keyword source too.
const KEYWORD_NAMES: &[&str] = &["DC.subject", "keywords"];
const DATE_NAMES: &[&str] = &["DC.date", "date"];

/// A `<meta>` element reduced to what lookups need.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MetaTag {
    /// Lowercased `name` attribute.
    name: String,
    content: Option<String>,
}

/// Publication metadata of a single HTML page.
///
/// The document is parsed once, at construction. The `<title>` text and all
/// named `<meta>` elements are collected in document order; every accessor
/// recomputes its value from that snapshot.
#[derive(Debug, Clone)]
pub struct Page {
    url: String,
    head_title: Option<String>,
    meta: Vec<MetaTag>,
}

impl Page {
    /// Parses an HTML document whose canonical location is `url`.
    ///
    /// The HTML parser recovers from malformed markup, so this never fails;
    /// read failures are reported by [`Page::from_reader`].
    pub fn parse(html: &str, url: impl Into<String>) -> Self {
        let document = Html::parse_document(html);
        let root = document.root_element();

        let head_title = root
            .children()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "head")
            .and_then(|head| {
                head.children()
                    .filter_map(ElementRef::wrap)
                    .find(|el| el.value().name() == "title")
            })
            .map(|title| title.text().collect::<String>());

        let meta = root
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() == "meta")
            .filter_map(|el| {
                let name = el.value().attr("name")?;
                Some(MetaTag {
                    name: name.to_lowercase(),
                    content: el.value().attr("content").map(str::to_owned),
                })
            })
            .collect();

        Self {
            url: url.into(),
            head_title,
            meta,
        }
    }

    /// Reads a whole HTML document from `reader` and parses it.
    ///
    /// The bytes are decoded by their declared charset; see
    /// [`Page::from_bytes`].
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Stream`] if reading fails.
    pub fn from_reader<R: Read>(mut reader: R, url: impl Into<String>) -> Result<Self, PageError> {
        let url = url.into();
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|source| PageError::Stream {
                url: url.clone(),
                source,
            })?;
        Ok(Self::from_bytes(&bytes, None, url))
    }

    /// Decodes raw HTML and parses it.
    ///
    /// `content_type` is the HTTP `Content-Type` header, when there is one;
    /// its charset takes precedence over a `<meta charset>` in the document.
    /// Pages without any charset label are read as UTF-8, falling back to
    /// windows-1252.
    pub fn from_bytes(bytes: &[u8], content_type: Option<&str>, url: impl Into<String>) -> Self {
        Self::parse(&decode_html(bytes, content_type), url)
    }

    /// Canonical URL supplied by the caller.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Content of the first `<meta>` whose `name` equals `name`, ignoring case.
    ///
    /// Elements with an empty or missing `content` never count as a match;
    /// the scan moves on to later elements instead.
    pub fn meta(&self, name: &str) -> Option<&str> {
        let name = name.to_lowercase();
        self.meta
            .iter()
            .filter(|tag| tag.name == name)
            .filter_map(|tag| tag.content.as_deref())
            .find(|content| !content.is_empty())
    }

    /// Text of the document's `<head><title>`, if the element exists.
    pub fn head_title(&self) -> Option<&str> {
        self.head_title.as_deref()
    }

    /// First present value among the candidate meta names, in order.
    pub fn first_meta(&self, names: &[&str]) -> Option<&str> {
        names.iter().find_map(|name| self.meta(name))
    }

    /// Document title, falling back to `DC.title`.
    pub fn title(&self) -> Option<&str> {
        self.head_title().or_else(|| self.meta(TITLE_META))
    }

    pub fn author(&self) -> Option<&str> {
        self.first_meta(AUTHOR_NAMES)
    }

    pub fn description(&self) -> Option<&str> {
        self.first_meta(DESCRIPTION_NAMES)
    }

    /// Comma-separated keywords, trimmed, in source order.
    ///
    /// Elements that are empty after trimming are dropped; `None` if nothing
    /// is left.
    pub fn keywords(&self) -> Option<Vec<String>> {
        let keywords: Vec<String> = self
            .first_meta(KEYWORD_NAMES)?
            .split(',')
            .map(str::trim)
            .filter(|keyword| !keyword.is_empty())
            .map(str::to_owned)
            .collect();
        (!keywords.is_empty()).then_some(keywords)
    }

    /// Publication date, parsed best-effort from `DC.date` or `date`.
    pub fn date(&self) -> Option<NaiveDateTime> {
        parse_date(self.first_meta(DATE_NAMES)?)
    }
}
