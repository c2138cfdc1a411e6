//! Atom 1.0 feed assembly and serialization.
//!
//! - [`Entry::from_page`] maps one [`Page`](crate::page::Page) to an `<entry>`
//! - [`FeedAssembler`] wraps the entries of a page collection in a `<feed>`
//! - [`AtomFeed::to_xml`] renders the result with indentation
//!
//! Missing optional metadata is defaulted during mapping and reported
//! through a [`Diagnostics`] sink instead of being returned.

mod diagnostics;
mod entry;
mod feed;
mod writer;

use chrono::{DateTime, SecondsFormat, Utc};

pub use diagnostics::{Diagnostics, TracingDiagnostics};
pub use entry::{Category, Entry};
pub use feed::{AtomFeed, FeedAssembler, FeedSettings};

/// Atom XML namespace, declared as the default namespace of `<feed>`.
pub const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/Atom";

/// Formats a timestamp as RFC 3339 with whole seconds and a `Z` designator.
pub fn rfc3339(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}
