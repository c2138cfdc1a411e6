/// Receives notices about metadata that had to be defaulted.
///
/// These are observations only; implementations must not influence the
/// generated feed.
pub trait Diagnostics {
    /// The page has no description; its title is used as the summary.
    fn missing_description(&self, url: &str);

    /// The page has no usable date; the generation time is used instead.
    fn missing_date(&self, url: &str);
}

/// Reports defaulted metadata as `WARN` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn missing_description(&self, url: &str) {
        tracing::warn!(url = %url, "Missing summary, using title instead");
    }

    fn missing_date(&self, url: &str) {
        tracing::warn!(url = %url, "Missing date, using generation time instead");
    }
}
