//! HTML page loading and metadata extraction.
//!
//! A [`Page`] is built once from a fully parsed document and answers
//! metadata queries through fallback chains of `<meta>` tag names:
//!
//! - **Extraction**: [`Page`] exposes `title`, `author`, `description`,
//!   `keywords` and `date`, each optional
//! - **Decoding**: page bytes are decoded by their declared charset, so
//!   legacy encodings such as ISO-8859-1 load like UTF-8 pages
//! - **Dates**: [`parse_date`] turns free-form date text into a timestamp
//! - **Sources**: [`PageSource`] reads pages from disk or over HTTP, and
//!   [`load_pages`] loads a whole batch while keeping the input order
//!
//! # Example
//!
//! ```ignore
//! use metafeed::page::{load_pages, LoadOptions, PageSource};
//!
//! let sources = vec![PageSource::from_arg("posts/hello.html", "https://example.com")?];
//! let pages = load_pages(&sources, &reqwest::Client::new(), &LoadOptions::default()).await?;
//! assert_eq!(pages[0].url(), "https://example.com/posts/hello.html");
//! ```

mod charset;
mod date;
mod extract;
mod source;

pub use date::parse_date;
pub use extract::Page;
pub use source::{load_pages, LoadOptions, PageError, PageSource};
