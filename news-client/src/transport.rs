use crate::error::{Error, Result};
use crate::request::ApiRequest;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use surf::{Client, RequestBuilder, Url};
use utils::surf_logging::SurfLogging;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Performs one network round-trip for a request.
///
/// Implementations return the parsed response body, or fail on any non-2xx
/// status, connection problem or malformed body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<Value>;
}

#[derive(Clone, Debug)]
pub struct SurfTransport {
    http: Client,
    timeout: Duration,
}

impl Default for SurfTransport {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl SurfTransport {
    pub fn new(timeout: Duration) -> Self {
        Self {
            http: Client::new().with(SurfLogging),
            timeout,
        }
    }

    async fn execute(&self, request: &ApiRequest) -> Result<Value> {
        let url = Url::parse(request.url())
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", request.url(), e)))?;
        let mut builder =
            RequestBuilder::new(*request.method(), url).header("content-type", "application/json");
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body() {
            builder = builder.body_json(body)?;
        }

        let mut response = self.http.send(builder).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.into(),
                url: request.url().clone(),
            });
        }

        let bytes = response.body_bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl Transport for SurfTransport {
    async fn send(&self, request: &ApiRequest) -> Result<Value> {
        match tokio::time::timeout(self.timeout, self.execute(request)).await {
            Ok(result) => {
                if let Err(e) = &result {
                    log::error!("API request failed: {}", e);
                }
                result
            }
            Err(_) => {
                log::error!("API request to {} timed out", request.url());
                Err(Error::Timeout(self.timeout))
            }
        }
    }
}
