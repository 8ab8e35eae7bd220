//! Raw-text acquisition for a dataset: local files or HTTP(S) URLs.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use lens_core::error::{LensError, Result};
use reqwest::Client;

/// Per-request timeout for remote sources.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Where a dataset's raw text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    Url(String),
}

impl Source {
    /// Classify `location`: `http://` and `https://` prefixes are URLs,
    /// anything else is a filesystem path.
    pub fn parse(location: &str) -> Self {
        let lower = location.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Source::Url(location.to_string())
        } else {
            Source::File(PathBuf::from(location))
        }
    }

    /// Read the whole document. Each call is a single attempt.
    pub async fn fetch(&self, client: &Client) -> Result<String> {
        match self {
            Source::File(path) => {
                tracing::debug!(path = %path.display(), "reading data file");
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| LensError::FileRead {
                        path: path.clone(),
                        source,
                    })
            }
            Source::Url(url) => {
                let target = cache_busted(url, chrono::Utc::now().timestamp_millis());
                tracing::debug!(url = %target, "fetching data url");

                let fetch_error = |message: String| LensError::Fetch {
                    source_name: url.clone(),
                    message,
                };

                let response = client
                    .get(&target)
                    .send()
                    .await
                    .map_err(|e| fetch_error(e.to_string()))?;

                if !response.status().is_success() {
                    return Err(fetch_error(format!("server returned {}", response.status())));
                }

                response.text().await.map_err(|e| fetch_error(e.to_string()))
            }
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::File(path) => write!(f, "{}", path.display()),
            Source::Url(url) => f.write_str(url),
        }
    }
}

/// HTTP client shared by every remote fetch of a session.
pub fn create_client() -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| LensError::Config(format!("Failed to create HTTP client: {e}")))
}

/// Append a `v=<millis>` query parameter so intermediaries never serve a
/// stale copy.
fn cache_busted(url: &str, millis: i64) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}v={millis}")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve exactly one HTTP response on a local port and return its URL.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });
        format!("http://{addr}/data/expensas.csv")
    }

    // ── parse ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_parse_classifies_locations() {
        assert_eq!(
            Source::parse("https://example.com/x.csv"),
            Source::Url("https://example.com/x.csv".to_string())
        );
        assert_eq!(
            Source::parse("HTTP://example.com/x.csv"),
            Source::Url("HTTP://example.com/x.csv".to_string())
        );
        assert_eq!(
            Source::parse("data/expensas.csv"),
            Source::File(PathBuf::from("data/expensas.csv"))
        );
    }

    #[test]
    fn test_cache_buster_separator() {
        assert_eq!(cache_busted("http://h/a.csv", 42), "http://h/a.csv?v=42");
        assert_eq!(cache_busted("http://h/a.csv?x=1", 42), "http://h/a.csv?x=1&v=42");
    }

    // ── fetch: file ───────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_fetch_file_reads_contents() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("expensas.csv");
        std::fs::write(&path, "mes,categoria,monto\n2024-01,Food,1\n").unwrap();

        let client = create_client().unwrap();
        let text = Source::File(path).fetch(&client).await.unwrap();
        assert!(text.starts_with("mes,categoria,monto"));
    }

    #[tokio::test]
    async fn test_fetch_missing_file_is_file_read_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let client = create_client().unwrap();
        let err = Source::File(dir.path().join("missing.csv"))
            .fetch(&client)
            .await
            .unwrap_err();
        assert!(matches!(err, LensError::FileRead { .. }));
    }

    // ── fetch: url ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_fetch_url_success() {
        let url = serve_once("200 OK", "mes,monto\n2024-01,5\n").await;
        let client = create_client().unwrap();
        let text = Source::Url(url).fetch(&client).await.unwrap();
        assert_eq!(text, "mes,monto\n2024-01,5\n");
    }

    #[tokio::test]
    async fn test_fetch_url_non_success_is_fetch_error() {
        let url = serve_once("404 Not Found", "nope").await;
        let client = create_client().unwrap();
        let err = Source::Url(url.clone()).fetch(&client).await.unwrap_err();
        match err {
            LensError::Fetch {
                source_name,
                message,
            } => {
                assert_eq!(source_name, url);
                assert!(message.contains("404"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
