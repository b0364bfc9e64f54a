use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;

use crate::{RenderError, Result};

/// Default timeout for a content-type probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Header-only lookup of a resource's content type.
#[async_trait]
pub trait ContentTypeProbe: Send + Sync {
    /// Returns the `content-type` header, or `None` when the response has none.
    async fn content_type(&self, url: &str) -> Result<Option<String>>;
}

/// [`ContentTypeProbe`] issuing `HEAD` requests with reqwest.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    http: Client,
}

impl HttpProbe {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_PROBE_TIMEOUT, None)
    }

    pub fn with_timeout(timeout: Duration, user_agent: Option<&str>) -> Result<Self> {
        let mut builder = Client::builder().timeout(timeout);
        if let Some(agent) = user_agent {
            builder = builder.user_agent(agent.to_string());
        }
        let http = builder.build().map_err(RenderError::Network)?;
        Ok(Self { http })
    }

    /// The underlying client, bounded by the probe timeout.
    pub fn client(&self) -> &Client {
        &self.http
    }
}

#[async_trait]
impl ContentTypeProbe for HttpProbe {
    async fn content_type(&self, url: &str) -> Result<Option<String>> {
        let response = self
            .http
            .head(url)
            .send()
            .await
            .map_err(|err| RenderError::probe(url, err.to_string()))?;

        Ok(response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string))
    }
}
