use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Errors from a single outbound JSON fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never produced a response body (DNS, TLS, timeout, reset).
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    /// A body arrived but was not JSON.
    #[error("invalid JSON from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("http client error: {0}")]
    Client(String),
}

/// Outbound GET returning a JSON document.
///
/// The resolver and the minter only ever talk to LNURL servers through this
/// seam, so a deployment can swap transports and tests can answer from a
/// table.
pub trait JsonFetcher: Send + Sync {
    fn get_json(
        &self,
        url: &Url,
    ) -> impl Future<Output = Result<serde_json::Value, FetchError>> + Send;
}

/// [`JsonFetcher`] backed by `reqwest` with a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("paywall/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { http })
    }

    pub fn from_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl JsonFetcher for HttpFetcher {
    async fn get_json(&self, url: &Url) -> Result<serde_json::Value, FetchError> {
        let resp = self
            .http
            .get(url.clone())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        // LNURL servers report errors as JSON bodies, often with a non-2xx
        // status; the caller inspects the document either way.
        let status = resp.status();
        if !status.is_success() {
            tracing::debug!(%url, status = status.as_u16(), "non-success LNURL response");
        }

        let bytes = resp.bytes().await.map_err(|e| FetchError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_fetcher_builds() {
        assert!(HttpFetcher::new(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_fetch_error_messages() {
        let err = FetchError::Transport {
            url: "https://example.com/x".to_string(),
            reason: "timed out".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "request to https://example.com/x failed: timed out"
        );
    }

    #[tokio::test]
    async fn test_stub_records_calls() {
        let stub = testing::StubFetcher::new()
            .json("https://example.com/a", serde_json::json!({"ok": true}));
        let url = Url::parse("https://example.com/a").unwrap();
        let body = stub.get_json(&url).await.unwrap();
        assert_eq!(body["ok"], true);

        let missing = Url::parse("https://example.com/b").unwrap();
        assert!(stub.get_json(&missing).await.is_err());
        assert_eq!(
            stub.calls(),
            vec!["https://example.com/a", "https://example.com/b"]
        );
    }
}
