use std::future::Future;

use serde_json::Value;

use super::GoogleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamMethod {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamRequest {
    pub method: UpstreamMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

/// One outbound HTTP exchange. Non-2xx statuses are returned as responses,
/// only connection-level failures are errors.
pub trait Transport: Send + Sync {
    fn send(&self, request: UpstreamRequest) -> impl Future<Output = Result<UpstreamResponse, GoogleError>> + Send;
}

/// `reqwest`-backed transport. The client is built once and shared; default
/// timeouts apply.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        HttpTransport {
            client: reqwest::Client::new(),
        }
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, GoogleError> {
        let builder = match request.method {
            UpstreamMethod::Get => self.client.get(&request.url),
            UpstreamMethod::Post => self.client.post(&request.url),
        };
        let builder = builder.query(&request.query);
        let builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder,
        };

        let response = builder
            .send()
            .await
            .map_err(|e| GoogleError::Transport(e.without_url().to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| GoogleError::Transport(e.without_url().to_string()))?;

        Ok(UpstreamResponse { status, body })
    }
}
