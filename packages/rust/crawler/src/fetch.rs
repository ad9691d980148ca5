//! Page fetcher: one HTTP GET per page, parsed into an HTML document.
//!
//! Any transport failure or non-2xx status becomes [`TopicScrapeError::Fetch`].

use std::time::Duration;

use reqwest::Client;
use scraper::Html;
use tracing::{debug, instrument};
use url::Url;

use topicscrape_shared::{Result, ScrapeConfig, TopicScrapeError};

/// Maximum number of redirects followed per request.
const MAX_REDIRECTS: usize = 5;

/// HTTP fetcher returning parsed HTML documents.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    /// Create a fetcher with the given user agent and per-request timeout.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(timeout)
            .build()
            .map_err(|e| {
                TopicScrapeError::config(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self { client })
    }

    /// Create a fetcher from the runtime scrape configuration.
    pub fn from_config(config: &ScrapeConfig) -> Result<Self> {
        Self::new(&config.user_agent, config.timeout)
    }

    /// GET `url` and return the response body.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch_text(&self, url: &Url) -> Result<String> {
        debug!("fetching page");

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| TopicScrapeError::fetch(url.as_str(), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TopicScrapeError::fetch(url.as_str(), format!("HTTP {status}")));
        }

        let body = response.text().await.map_err(|e| {
            TopicScrapeError::fetch(url.as_str(), format!("body read failed: {e}"))
        })?;

        debug!(bytes = body.len(), "page fetched");
        Ok(body)
    }

    /// GET `url` and parse the body as an HTML document.
    pub async fn fetch(&self, url: &Url) -> Result<Html> {
        let body = self.fetch_text(url).await?;
        Ok(Html::parse_document(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Selector;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> PageFetcher {
        PageFetcher::new("topicscrape-test", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn fetch_parses_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/topics"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html><body><h1>Topics</h1></body></html>"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/topics", server.uri())).unwrap();
        let doc = fetcher().fetch(&url).await.unwrap();

        let h1 = Selector::parse("h1").unwrap();
        let heading = doc.select(&h1).next().unwrap();
        assert_eq!(heading.text().collect::<String>(), "Topics");
    }

    #[tokio::test]
    async fn non_success_status_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/topics/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/topics/missing", server.uri())).unwrap();
        let err = fetcher().fetch_text(&url).await.unwrap_err();

        assert!(matches!(err, TopicScrapeError::Fetch { .. }));
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn transport_failure_is_fetch_error() {
        let server = MockServer::start().await;
        let url = Url::parse(&format!("{}/topics", server.uri())).unwrap();
        drop(server);

        let err = fetcher().fetch_text(&url).await.unwrap_err();
        assert!(matches!(err, TopicScrapeError::Fetch { .. }));
    }
}
