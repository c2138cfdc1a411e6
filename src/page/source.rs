use std::path::PathBuf;
use std::time::Duration;

use futures::stream::{self, StreamExt, TryStreamExt};
use thiserror::Error;
use url::Url;

use super::Page;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_PAGE_SIZE: usize = 10 * 1024 * 1024; // 10MB
const DEFAULT_CONCURRENCY: usize = 8;

/// Errors that abort loading a page.
///
/// Any of these is fatal for the whole feed: a batch is never assembled from
/// a subset of its pages.
#[derive(Debug, Error)]
pub enum PageError {
    /// The page argument is neither a usable path nor an HTTP(S) URL
    #[error("invalid page URL: {0}")]
    InvalidUrl(String),
    /// Local file could not be read
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Reading from a caller-supplied stream failed
    #[error("failed to read page {url}: {source}")]
    Stream {
        url: String,
        #[source]
        source: std::io::Error,
    },
    /// File pages must be given relative to the site root
    #[error("page path '{}' is absolute; pass it relative to the site root", .0.display())]
    AbsolutePath(PathBuf),
    /// HTTP request failed
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error fetching {url}: status {status}")]
    HttpStatus { url: String, status: u16 },
    /// Fetch exceeded the configured timeout
    #[error("timed out fetching {0}")]
    Timeout(String),
    /// Page body exceeded the configured size limit
    #[error("page {url} is larger than {limit} bytes")]
    TooLarge { url: String, limit: usize },
}

/// Limits applied while loading a batch of pages.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Per-page budget for a remote fetch, body included.
    pub timeout: Duration,
    /// Largest accepted page body.
    pub max_bytes: usize,
    /// Pages loaded at the same time.
    pub concurrency: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_bytes: MAX_PAGE_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Where a page's HTML comes from, paired with its canonical URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSource {
    /// HTML file on disk, published at `url`.
    File { path: PathBuf, url: String },
    /// HTML fetched over HTTP; the fetched URL is also the canonical one.
    Remote { url: Url },
}

impl PageSource {
    /// Classifies a command-line page argument.
    ///
    /// `http://` and `https://` arguments are fetched as-is. Anything else is
    /// a file path relative to the site root, published at `base_url` joined
    /// with the path. Absolute paths are rejected.
    pub fn from_arg(arg: &str, base_url: &str) -> Result<Self, PageError> {
        if arg.starts_with("http://") || arg.starts_with("https://") {
            let url = Url::parse(arg).map_err(|e| PageError::InvalidUrl(format!("{arg}: {e}")))?;
            return Ok(Self::Remote { url });
        }

        let relative = arg.replace('\\', "/");
        if relative.starts_with('/') || std::path::Path::new(arg).is_absolute() {
            return Err(PageError::AbsolutePath(PathBuf::from(arg)));
        }
        let relative = relative.trim_start_matches("./");
        if relative.is_empty() {
            return Err(PageError::InvalidUrl(arg.to_owned()));
        }

        Ok(Self::File {
            path: PathBuf::from(arg),
            url: format!("{}/{}", base_url.trim_end_matches('/'), relative),
        })
    }

    /// Canonical URL the page will be published under.
    pub fn url(&self) -> &str {
        match self {
            Self::File { url, .. } => url,
            Self::Remote { url } => url.as_str(),
        }
    }

    /// Reads and parses the page. The file or connection is closed before
    /// this returns, on success and on error alike.
    pub async fn load(
        &self,
        client: &reqwest::Client,
        options: &LoadOptions,
    ) -> Result<Page, PageError> {
        let (bytes, content_type) = match self {
            Self::File { path, url } => {
                let bytes = tokio::fs::read(path).await.map_err(|source| PageError::Io {
                    path: path.clone(),
                    source,
                })?;
                if bytes.len() > options.max_bytes {
                    return Err(PageError::TooLarge {
                        url: url.clone(),
                        limit: options.max_bytes,
                    });
                }
                (bytes, None)
            }
            Self::Remote { url } => {
                tokio::time::timeout(options.timeout, fetch_bytes(client, url, options.max_bytes))
                    .await
                    .map_err(|_| PageError::Timeout(url.to_string()))??
            }
        };

        let page = Page::from_bytes(&bytes, content_type.as_deref(), self.url());
        tracing::debug!(url = %page.url(), bytes = bytes.len(), "Loaded page");
        Ok(page)
    }
}

/// Fetches a response body and its `Content-Type`, refusing anything larger
/// than `max_bytes`.
async fn fetch_bytes(
    client: &reqwest::Client,
    url: &Url,
    max_bytes: usize,
) -> Result<(Vec<u8>, Option<String>), PageError> {
    let response = client.get(url.clone()).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(PageError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let too_large = || PageError::TooLarge {
        url: url.to_string(),
        limit: max_bytes,
    };

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len > max_bytes as u64 {
            return Err(too_large());
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > max_bytes {
            return Err(too_large());
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok((bytes, content_type))
}

/// Loads every source, at most `options.concurrency` at a time.
///
/// Pages come back in the order of `sources`. The first failure, in that
/// order, aborts the batch and is returned.
pub async fn load_pages(
    sources: &[PageSource],
    client: &reqwest::Client,
    options: &LoadOptions,
) -> Result<Vec<Page>, PageError> {
    let pages: Vec<Page> = stream::iter(sources)
        .map(|source| source.load(client, options))
        .buffered(options.concurrency.max(1))
        .try_collect()
        .await?;

    tracing::info!(count = pages.len(), "Loaded pages");
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_arg_file_joins_base_url() {
        let source = PageSource::from_arg("posts/a.html", "http://x.test/").unwrap();
        assert_eq!(
            source,
            PageSource::File {
                path: PathBuf::from("posts/a.html"),
                url: "http://x.test/posts/a.html".to_string(),
            }
        );
    }

    #[test]
    fn test_from_arg_strips_dot_slash() {
        let source = PageSource::from_arg("./a.html", "http://x.test").unwrap();
        assert_eq!(source.url(), "http://x.test/a.html");
    }

    #[test]
    fn test_from_arg_remote() {
        let source = PageSource::from_arg("https://x.test/a.html", "http://ignored.test").unwrap();
        assert!(matches!(source, PageSource::Remote { .. }));
        assert_eq!(source.url(), "https://x.test/a.html");
    }

    #[test]
    fn test_from_arg_rejects_bad_url() {
        let result = PageSource::from_arg("http://", "http://x.test");
        assert!(matches!(result, Err(PageError::InvalidUrl(_))));
    }

    #[test]
    fn test_from_arg_rejects_empty_path() {
        let result = PageSource::from_arg("./", "http://x.test");
        assert!(matches!(result, Err(PageError::InvalidUrl(_))));
    }

    #[test]
    fn test_from_arg_rejects_absolute_path() {
        let result = PageSource::from_arg("/home/u/site/a.html", "http://x.test");
        assert!(matches!(result, Err(PageError::AbsolutePath(_))));
    }

    #[test]
    fn test_from_arg_nested_relative_path() {
        let source = PageSource::from_arg("site/posts/a.html", "http://x.test").unwrap();
        assert_eq!(source.url(), "http://x.test/site/posts/a.html");
    }

    #[test]
    fn test_default_options() {
        let options = LoadOptions::default();
        assert_eq!(options.timeout, Duration::from_secs(30));
        assert_eq!(options.max_bytes, 10 * 1024 * 1024);
        assert_eq!(options.concurrency, 8);
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let source = PageSource::File {
            path: PathBuf::from("/nonexistent/metafeed/page.html"),
            url: "http://x.test/page.html".to_string(),
        };
        let result = source
            .load(&reqwest::Client::new(), &LoadOptions::default())
            .await;
        assert!(matches!(result, Err(PageError::Io { .. })));
    }
}
