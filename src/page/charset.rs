use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

/// How far into the document a `<meta charset>` declaration is looked for.
const PRESCAN_LIMIT: usize = 1024;

/// Decodes raw HTML bytes to text.
///
/// The encoding is taken from, in order: a byte order mark, the `charset`
/// parameter of `content_type`, a `charset=` declaration near the top of the
/// document. Without any label the bytes are read as UTF-8, and as
/// windows-1252 if they are not valid UTF-8. Undecodable bytes become
/// U+FFFD; decoding never fails.
pub(crate) fn decode_html<'a>(bytes: &'a [u8], content_type: Option<&str>) -> Cow<'a, str> {
    let label = content_type
        .and_then(charset_param)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .or_else(|| prescan_charset(bytes));

    let encoding = match label {
        Some(encoding) => encoding,
        None if std::str::from_utf8(bytes).is_ok() => UTF_8,
        None => WINDOWS_1252,
    };

    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!(encoding = used.name(), "Replaced undecodable bytes in page");
    }
    text
}

/// Value of a `charset=` parameter, without quotes.
fn charset_param(text: &str) -> Option<&str> {
    let lower = text.to_ascii_lowercase();
    let start = lower.find("charset=")? + "charset=".len();
    let value = text[start..].trim_start_matches(['"', '\'', ' ']);
    let end = value
        .find(|c: char| matches!(c, '"' | '\'' | ';' | '>' | '/') || c.is_whitespace())
        .unwrap_or(value.len());
    let value = &value[..end];
    (!value.is_empty()).then_some(value)
}

/// Looks for `<meta charset=...>` or an `http-equiv` content type declaring
/// a charset at the start of the document.
fn prescan_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(PRESCAN_LIMIT)];
    let head = String::from_utf8_lossy(head);
    charset_param(&head).and_then(|label| Encoding::for_label(label.as_bytes()))
}
