//! Generates an Atom feed from the `<meta>` tags of HTML pages.
//!
//! Pages are loaded and parsed up front ([`page`]), each one is mapped to an
//! `<entry>`, and the entries are wrapped in a `<feed>` ([`atom`]). The
//! feed-level values come from a TOML file or the command line ([`config`]).

pub mod atom;
pub mod config;
pub mod page;
