use crate::config::SessionConfig;
use crate::domain::ports::PageFetcher;
use crate::utils::error::Result;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use reqwest::Client;
use std::time::Duration;

/// Plain HTTP page loader configured like the original browser session.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(session: &SessionConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Ok(lang) = HeaderValue::from_str(&session.accept_language) {
            headers.insert(ACCEPT_LANGUAGE, lang);
        } else {
            tracing::warn!(
                "Ignoring unusable Accept-Language value: {:?}",
                session.accept_language
            );
        }

        let client = Client::builder()
            .user_agent(session.user_agent.clone())
            .default_headers(headers)
            .danger_accept_invalid_certs(session.accept_invalid_certs)
            .timeout(Duration::from_secs(session.request_timeout_seconds))
            .build()?;

        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        tracing::debug!("Response status: {}", response.status());

        let body = response.error_for_status()?.text().await?;
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_USER_AGENT;
    use crate::utils::error::AppError;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_fetch_sends_session_headers() {
        let server = MockServer::start();
        let page_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/shops")
                .header("user-agent", DEFAULT_USER_AGENT)
                .header("accept-language", "en");
            then.status(200).body("<html><body>ok</body></html>");
        });

        let fetcher = HttpFetcher::new(&SessionConfig::default()).unwrap();
        let body = fetcher.fetch(&server.url("/shops")).await.unwrap();

        page_mock.assert();
        assert!(body.contains("ok"));
    }

    #[tokio::test]
    async fn test_fetch_error_status_is_fatal() {
        let server = MockServer::start();
        let page_mock = server.mock(|when, then| {
            when.method(GET).path("/shops/missing");
            then.status(404);
        });

        let fetcher = HttpFetcher::new(&SessionConfig::default()).unwrap();
        let err = fetcher
            .fetch(&server.url("/shops/missing"))
            .await
            .unwrap_err();

        page_mock.assert();
        assert!(matches!(err, AppError::HttpError(_)));
    }
}
