//! HTTP fetcher with timeout, bounded retry and politeness

use super::rate_limit::GlobalRateLimiter;
use super::retry::{PoliteDelay, RetryPolicy};
use crate::config::CrawlConfig;
use crate::error::{Error, Result};
use reqwest::{Client, StatusCode};
use std::borrow::Cow;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Settings the fetcher is built from
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub user_agent: String,
    pub timeout: Duration,
    pub max_attempts: u32,
    pub delay: PoliteDelay,
    pub max_requests_per_second: u32,
}

impl FetchSettings {
    pub fn from_config(config: &CrawlConfig) -> Self {
        let (min, max) = config.polite_delay_range();
        Self {
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
            max_attempts: config.max_retries,
            delay: PoliteDelay::new(min, max),
            max_requests_per_second: config.max_requests_per_second,
        }
    }
}

/// A successfully fetched resource
#[derive(Debug, Clone)]
pub struct FetchedResource {
    /// Final URL after redirects
    pub url: Url,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl FetchedResource {
    /// Body decoded as text, lossily
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Issues GET requests for the crawler and the downloader
#[derive(Debug)]
pub struct Fetcher {
    client: Client,
    retry: RetryPolicy,
    limiter: GlobalRateLimiter,
}

impl Fetcher {
    /// Create a new fetcher
    pub fn new(settings: FetchSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&settings.user_agent)
            .timeout(settings.timeout)
            .gzip(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| Error::Crawl(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            retry: RetryPolicy::new(settings.max_attempts, settings.delay),
            limiter: GlobalRateLimiter::new(settings.max_requests_per_second),
        })
    }

    /// Fetch a URL, retrying on network failure or non-200 status
    ///
    /// Returns `None` once every attempt has failed; the failure is logged
    /// here and never propagated.
    pub async fn fetch(&self, url: &Url) -> Option<FetchedResource> {
        match self.retry.run(|_| self.fetch_once(url)).await {
            Ok(resource) => Some(resource),
            Err(e) => {
                warn!(
                    "Unavailable after {} attempts: {} ({})",
                    self.retry.max_attempts(),
                    url,
                    e
                );
                None
            }
        }
    }

    /// Pause between independent requests
    pub async fn polite_pause(&self) {
        self.retry.delay().pause().await;
    }

    async fn fetch_once(&self, url: &Url) -> Result<FetchedResource> {
        self.limiter.wait().await;
        debug!("Fetching: {}", url);

        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::Crawl(format!("HTTP {}: {}", status, url)));
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = response.bytes().await?.to_vec();

        Ok(FetchedResource {
            url: final_url,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub(crate) fn test_settings() -> FetchSettings {
        FetchSettings {
            user_agent: "crestmirror-test".to_string(),
            timeout: Duration::from_secs(5),
            max_attempts: 3,
            delay: PoliteDelay::none(),
            max_requests_per_second: 1000,
        }
    }

    #[tokio::test]
    async fn test_fetch_returns_body_and_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/escudoteca/index.html"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(b"<html></html>".to_vec(), "text/html"),
            )
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(test_settings()).unwrap();
        let url = Url::parse(&format!("{}/escudoteca/index.html", server.uri())).unwrap();
        let resource = fetcher.fetch(&url).await.expect("page should be fetched");

        assert_eq!(resource.content_type.as_deref(), Some("text/html"));
        assert_eq!(resource.text(), "<html></html>");
    }

    #[tokio::test]
    async fn test_fetch_gives_up_after_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/escudoteca/broken.png"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(test_settings()).unwrap();
        let url = Url::parse(&format!("{}/escudoteca/broken.png", server.uri())).unwrap();

        assert!(fetcher.fetch(&url).await.is_none());
        server.verify().await;
    }

    #[tokio::test]
    async fn test_fetch_times_out_each_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/escudoteca/slow.png"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .expect(3)
            .mount(&server)
            .await;

        let mut settings = test_settings();
        settings.timeout = Duration::from_millis(200);
        let fetcher = Fetcher::new(settings).unwrap();
        let url = Url::parse(&format!("{}/escudoteca/slow.png", server.uri())).unwrap();

        assert!(fetcher.fetch(&url).await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_recovers_from_transient_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/escudoteca/flaky.png"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/escudoteca/flaky.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89, b'P', b'N', b'G']))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(test_settings()).unwrap();
        let url = Url::parse(&format!("{}/escudoteca/flaky.png", server.uri())).unwrap();
        let resource = fetcher.fetch(&url).await.expect("third attempt succeeds");

        assert_eq!(resource.body, vec![0x89, b'P', b'N', b'G']);
    }
}
