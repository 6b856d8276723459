// src/fetch/mod.rs

use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, warn};
use url::Url;

use crate::config::FetchConfig;

const USER_AGENT: &str = concat!("gradewatch/", env!("CARGO_PKG_VERSION"));

/// Supplies the raw page for a course. Any error means "no new data this
/// sweep" to the caller.
#[allow(async_fn_in_trait)]
pub trait Fetch {
    async fn fetch(&self, url: &Url) -> Result<String>;
}

/// HTTP fetcher with per-request timeout and exponential-backoff retries.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_retries: u32,
    initial_backoff_ms: u64,
}

impl HttpFetcher {
    pub fn new(cfg: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(cfg.timeout())
            .user_agent(USER_AGENT)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            client,
            max_retries: cfg.max_retries,
            initial_backoff_ms: cfg.backoff_ms,
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// One GET; non-2xx is an error.
    async fn get_page(&self, url: &Url) -> Result<String> {
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("GET {}", url))?
            .error_for_status()?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .with_context(|| format!("reading body from {}", url))?;
        debug!(%url, %status, bytes = body.len(), "fetched page");
        Ok(body)
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String> {
        let mut attempt = 0;
        loop {
            match self.get_page(url).await {
                Ok(body) => return Ok(body),
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    let delay = backoff_ms(self.initial_backoff_ms, attempt);
                    warn!(%url, attempt, delay_ms = delay, error = %e, "fetch failed, retrying");
                    sleep(Duration::from_millis(delay)).await;
                }
                Err(e) => {
                    error!(%url, attempts = attempt + 1, error = %e, "giving up on fetch");
                    return Err(e);
                }
            }
        }
    }
}

/// Delay before retry number `attempt` (1-based).
fn backoff_ms(initial: u64, attempt: u32) -> u64 {
    initial.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answer a single request with `status` and `body`.
    async fn serve_once(status: &'static str, body: &'static str) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let _ = sock.read(&mut buf).await;
            let resp = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            sock.write_all(resp.as_bytes()).await.unwrap();
        });
        Url::parse(&format!("http://{}/scores.html", addr)).unwrap()
    }

    fn no_retries() -> HttpFetcher {
        HttpFetcher::new(&FetchConfig {
            timeout_secs: 5,
            max_retries: 0,
            backoff_ms: 1,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let url = serve_once("200 OK", "<table></table>").await;
        assert_eq!(no_retries().fetch(&url).await.unwrap(), "<table></table>");
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let url = serve_once("503 Service Unavailable", "busy").await;
        assert!(no_retries().fetch(&url).await.is_err());
    }

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(backoff_ms(500, 1), 500);
        assert_eq!(backoff_ms(500, 2), 1000);
        assert_eq!(backoff_ms(500, 3), 2000);
        assert_eq!(backoff_ms(u64::MAX, 4), u64::MAX);
    }

    #[tokio::test]
    async fn test_unreachable_host_fails_after_retries() {
        let fetcher = HttpFetcher::new(&FetchConfig {
            timeout_secs: 1,
            max_retries: 1,
            backoff_ms: 1,
        })
        .unwrap();
        let url = Url::parse("http://127.0.0.1:9/scores.html").unwrap();
        assert!(fetcher.fetch(&url).await.is_err());
    }
}
