//! End-to-end tests: HTML pages in, Atom document out.
//!
//! Generated feeds are re-parsed with `feed-rs` so the assertions check what
//! a feed reader would actually see.

use std::cell::RefCell;

use chrono::{DateTime, SubsecRound, Utc};
use metafeed::atom::{Diagnostics, FeedAssembler, FeedSettings};
use metafeed::page::Page;
use pretty_assertions::assert_eq;

#[derive(Default)]
struct RecordingDiagnostics {
    missing_description: RefCell<Vec<String>>,
    missing_date: RefCell<Vec<String>>,
}

impl Diagnostics for RecordingDiagnostics {
    fn missing_description(&self, url: &str) {
        self.missing_description.borrow_mut().push(url.to_string());
    }

    fn missing_date(&self, url: &str) {
        self.missing_date.borrow_mut().push(url.to_string());
    }
}

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

fn page_a() -> Page {
    Page::parse(
        r#"<!DOCTYPE html>
<html>
  <head>
    <title>A Title</title>
    <meta name="author" content="Jane">
    <meta name="DC.subject" content="x, y">
  </head>
  <body><p>First page</p></body>
</html>"#,
        "http://x.test/a.html",
    )
}

fn page_b() -> Page {
    Page::parse(
        "<html><head><title>B Title</title></head><body></body></html>",
        "http://x.test/b.html",
    )
}

fn reparse(xml: &str) -> feed_rs::model::Feed {
    feed_rs::parser::parse(xml.as_bytes()).expect("generated feed should parse")
}

// ============================================================================
// Scenario
// ============================================================================

#[test]
fn test_two_page_scenario() {
    let assembler = FeedAssembler::new(settings(), vec![page_a(), page_b()]);
    let xml = assembler.to_xml().unwrap();
    let feed = reparse(&xml);

    assert_eq!(feed.title.map(|t| t.content).as_deref(), Some("T"));
    assert_eq!(feed.id, "http://x.test/feed.xml");
    assert_eq!(feed.authors[0].name, "N");
    assert_eq!(feed.entries.len(), 2);

    let a = &feed.entries[0];
    assert_eq!(a.id, "http://x.test/a.html");
    assert_eq!(a.title.as_ref().map(|t| t.content.as_str()), Some("A Title"));
    assert_eq!(a.authors.len(), 1);
    assert_eq!(a.authors[0].name, "Jane");
    let terms: Vec<&str> = a.categories.iter().map(|c| c.term.as_str()).collect();
    assert_eq!(terms, vec!["x", "y"]);
    assert!(a
        .categories
        .iter()
        .all(|c| c.scheme.as_deref() == Some("http://x.test")));

    let b = &feed.entries[1];
    assert_eq!(b.id, "http://x.test/b.html");
    assert_eq!(b.title.as_ref().map(|t| t.content.as_str()), Some("B Title"));
    assert!(b.authors.is_empty());
    assert!(b.categories.is_empty());
}

#[test]
fn test_scenario_raw_structure() {
    let xml = FeedAssembler::new(settings(), vec![page_a(), page_b()])
        .to_xml()
        .unwrap();

    assert_eq!(xml.matches("<entry>").count(), 2);
    assert_eq!(xml.matches("<author>").count(), 2); // feed + entry A
    assert!(!xml.contains("<email>"));
    assert!(xml.find("http://x.test/a.html").unwrap() < xml.find("http://x.test/b.html").unwrap());
}

// ============================================================================
// Round trip
// ============================================================================

#[test]
fn test_round_trip_preserves_entries() {
    let pages: Vec<Page> = (0..5)
        .rev()
        .map(|i| {
            Page::parse(
                &format!(
                    r#"<html><head><title>Post {i} &amp; more</title>
                       <meta name="keywords" content="k{i}, shared, k{i}">
                       <meta name="date" content="2024-03-0{} 09:00:00"></head></html>"#,
                    i + 1
                ),
                format!("http://x.test/posts/{i}.html"),
            )
        })
        .collect();
    let expected: Vec<(String, String, Vec<String>)> = pages
        .iter()
        .map(|p| {
            (
                p.url().to_string(),
                p.title().unwrap().to_string(),
                p.keywords().unwrap(),
            )
        })
        .collect();

    let xml = FeedAssembler::new(settings(), pages).to_xml().unwrap();
    let feed = reparse(&xml);

    assert_eq!(feed.entries.len(), expected.len());
    for (entry, (url, title, keywords)) in feed.entries.iter().zip(&expected) {
        assert_eq!(&entry.id, url);
        assert_eq!(entry.links[0].href, *url);
        assert_eq!(entry.title.as_ref().map(|t| &t.content), Some(title));
        let terms: Vec<String> = entry.categories.iter().map(|c| c.term.clone()).collect();
        assert_eq!(&terms, keywords);
    }
    assert_eq!(expected[0].1, "Post 4 & more");
}

#[test]
fn test_empty_page_collection_is_valid_feed() {
    let mut settings = settings();
    settings.author_email = Some("n@x.test".to_string());
    settings.summary = Some("Nothing yet".to_string());

    let xml = FeedAssembler::new(settings, Vec::new()).to_xml().unwrap();
    let feed = reparse(&xml);

    assert!(feed.entries.is_empty());
    assert_eq!(feed.authors[0].email.as_deref(), Some("n@x.test"));
    assert!(xml.contains("<summary>Nothing yet</summary>"));
}

// ============================================================================
// Defaulting
// ============================================================================

#[test]
fn test_missing_description_defaults_to_title() {
    let diagnostics = RecordingDiagnostics::default();
    let page = Page::parse(
        r#"<html><head><title>Hello</title><meta name="date" content="2024-01-15"></head></html>"#,
        "http://x.test/hello.html",
    );

    let feed = FeedAssembler::new(settings(), vec![page]).generate_with(&diagnostics);

    assert_eq!(feed.entries[0].summary.as_deref(), Some("Hello"));
    assert_eq!(
        *diagnostics.missing_description.borrow(),
        vec!["http://x.test/hello.html".to_string()]
    );
    assert!(diagnostics.missing_date.borrow().is_empty());
    assert!(feed.to_xml().unwrap().contains("<summary>Hello</summary>"));
}

#[test]
fn test_missing_date_defaults_to_now() {
    let diagnostics = RecordingDiagnostics::default();
    let start = Utc::now().trunc_subsecs(0);
    let page = Page::parse(
        r#"<html><head><title>Hello</title><meta name="description" content="d">
           <meta name="DC.date" content="the other day"></head></html>"#,
        "http://x.test/undated.html",
    );

    let xml = FeedAssembler::new(settings(), vec![page])
        .generate_with(&diagnostics)
        .to_xml()
        .unwrap();

    let updated = xml
        .split("<updated>")
        .nth(2)
        .and_then(|rest| rest.split("</updated>").next())
        .expect("entry updated element");
    let parsed = DateTime::parse_from_rfc3339(updated).expect("valid RFC 3339");
    assert!(parsed.with_timezone(&Utc) >= start);
    assert_eq!(
        *diagnostics.missing_date.borrow(),
        vec!["http://x.test/undated.html".to_string()]
    );
}

#[test]
fn test_page_date_used_verbatim() {
    let page = Page::parse(
        r#"<html><head><title>Dated</title><meta name="description" content="d">
           <meta name="date" content="2021-07-04T18:05:09+05:00"></head></html>"#,
        "http://x.test/dated.html",
    );

    let xml = FeedAssembler::new(settings(), vec![page]).to_xml().unwrap();

    assert!(xml.contains("<updated>2021-07-04T18:05:09Z</updated>"));
}
