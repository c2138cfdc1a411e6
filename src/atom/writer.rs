use std::io::{Cursor, Write};

use anyhow::{Context, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::{rfc3339, AtomFeed, Entry, ATOM_NAMESPACE};

impl AtomFeed {
    /// Renders the feed as an indented Atom 1.0 document.
    ///
    /// Element order follows the assembled structure exactly; nothing is
    /// reordered, deduplicated or added beyond the XML declaration.
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .context("Failed to write XML declaration")?;

        let mut feed = BytesStart::new("feed");
        feed.push_attribute(("xmlns", ATOM_NAMESPACE));
        writer
            .write_event(Event::Start(feed))
            .context("Failed to write feed element")?;

        write_text_element(&mut writer, "title", &self.title)?;
        write_text_element(&mut writer, "id", &self.id)?;
        write_text_element(&mut writer, "updated", &rfc3339(&self.updated))?;

        let mut self_link = BytesStart::new("link");
        self_link.push_attribute(("href", self.self_link.as_str()));
        self_link.push_attribute(("rel", "self"));
        writer
            .write_event(Event::Empty(self_link))
            .context("Failed to write self link")?;

        let mut alternate = BytesStart::new("link");
        alternate.push_attribute(("href", self.alternate_link.as_str()));
        writer
            .write_event(Event::Empty(alternate))
            .context("Failed to write site link")?;

        write_author(&mut writer, &self.author_name, self.author_email.as_deref())?;

        if let Some(ref summary) = self.summary {
            write_text_element(&mut writer, "summary", summary)?;
        }

        for entry in &self.entries {
            write_entry(&mut writer, entry)
                .with_context(|| format!("Failed to write entry for {}", entry.url))?;
        }

        writer
            .write_event(Event::End(BytesEnd::new("feed")))
            .context("Failed to write feed end")?;

        let result = writer.into_inner().into_inner();
        String::from_utf8(result).context("Generated feed contains invalid UTF-8")
    }
}

fn write_entry<W: Write>(writer: &mut Writer<W>, entry: &Entry) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("entry")))?;

    if let Some(ref author) = entry.author {
        write_author(writer, author, None)?;
    }

    write_text_element(writer, "title", entry.title.as_deref().unwrap_or_default())?;

    let mut link = BytesStart::new("link");
    link.push_attribute(("rel", "alternate"));
    link.push_attribute(("type", "text/html"));
    link.push_attribute(("href", entry.url.as_str()));
    writer.write_event(Event::Empty(link))?;

    write_text_element(writer, "id", &entry.url)?;
    write_text_element(writer, "summary", entry.summary.as_deref().unwrap_or_default())?;
    write_text_element(writer, "updated", &rfc3339(&entry.updated))?;

    for category in &entry.categories {
        let mut element = BytesStart::new("category");
        element.push_attribute(("scheme", category.scheme.as_str()));
        element.push_attribute(("term", category.term.as_str()));
        writer.write_event(Event::Empty(element))?;
    }

    writer.write_event(Event::End(BytesEnd::new("entry")))?;
    Ok(())
}

fn write_author<W: Write>(writer: &mut Writer<W>, name: &str, email: Option<&str>) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new("author")))
        .context("Failed to write author element")?;
    write_text_element(writer, "name", name)?;
    if let Some(email) = email {
        write_text_element(writer, "email", email)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("author")))
        .context("Failed to write author end")?;
    Ok(())
}

/// Writes `<name>text</name>`, or `<name/>` when `text` is empty.
fn write_text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    if text.is_empty() {
        writer
            .write_event(Event::Empty(BytesStart::new(name)))
            .with_context(|| format!("Failed to write {name} element"))?;
        return Ok(());
    }

    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .with_context(|| format!("Failed to write {name} element"))?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .with_context(|| format!("Failed to write {name} text"))?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .with_context(|| format!("Failed to write {name} end"))?;
    Ok(())
}
