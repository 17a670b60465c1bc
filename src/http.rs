use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use wreq::{StatusCode, header::USER_AGENT};

use crate::error::{AppResult, FetchError};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0";

/// Anything that can hand back the HTML behind a URL.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

pub struct HttpPageSource {
    client: wreq::Client,
}

impl HttpPageSource {
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let client = wreq::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        debug!(url = %url, "fetching page");
        let transport = |source| FetchError::Transport { url: url.to_string(), source };

        let resp = self
            .client
            .get(url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await
            .map_err(transport)?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::Status { url: url.to_string(), status: status.as_u16() });
        }

        resp.text().await.map_err(transport)
    }
}
