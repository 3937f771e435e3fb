//! Google Cloud REST proxies (Translate v2, Text-to-Speech v1, Vision v1).
//!
//! Every call is a single request authenticated with the shared API key;
//! there are no retries. Request validation happens before the transport is
//! touched.

pub mod translate;
pub mod transport;
pub mod tts;
pub mod vision;

use serde_json::Value;
use thiserror::Error;

use crate::config::GoogleEndpoints;

pub use transport::{HttpTransport, Transport, UpstreamMethod, UpstreamRequest, UpstreamResponse};

#[derive(Debug, Error)]
pub enum GoogleError {
    #[error("upstream returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("request to upstream failed: {0}")]
    Transport(String),

    #[error("unexpected upstream response: {0}")]
    InvalidResponse(String),
}

/// Shared-key client for the Google APIs, generic over the transport.
#[derive(Debug, Clone)]
pub struct GoogleApi<T = HttpTransport> {
    transport: T,
    api_key: String,
    endpoints: GoogleEndpoints,
}

impl<T: Transport> GoogleApi<T> {
    pub fn new(transport: T, api_key: impl Into<String>, endpoints: GoogleEndpoints) -> Self {
        GoogleApi {
            transport,
            api_key: api_key.into(),
            endpoints,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn endpoints(&self) -> &GoogleEndpoints {
        &self.endpoints
    }

    pub(crate) async fn post_json(&self, base: &str, path: &str, body: Value) -> Result<Value, GoogleError> {
        self.call(UpstreamRequest {
            method: UpstreamMethod::Post,
            url: join_url(base, path),
            query: vec![("key".to_string(), self.api_key.clone())],
            body: Some(body),
        })
        .await
    }

    pub(crate) async fn get_json(
        &self,
        base: &str,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Value, GoogleError> {
        let mut query: Vec<(String, String)> = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        query.push(("key".to_string(), self.api_key.clone()));

        self.call(UpstreamRequest {
            method: UpstreamMethod::Get,
            url: join_url(base, path),
            query,
            body: None,
        })
        .await
    }

    async fn call(&self, request: UpstreamRequest) -> Result<Value, GoogleError> {
        let url = request.url.clone();
        let response = self.transport.send(request).await?;
        interpret(response).inspect_err(|e| log::warn!("Google API call to {url} failed: {e}"))
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// Turn a raw upstream response into JSON, or an error carrying the upstream
/// status and `error.message`.
pub(crate) fn interpret(response: UpstreamResponse) -> Result<Value, GoogleError> {
    let parsed = serde_json::from_str::<Value>(&response.body);

    if !(200..300).contains(&response.status) {
        let message = parsed
            .ok()
            .and_then(|v| {
                v.pointer("/error/message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .or_else(|| Some(response.body.trim().to_string()).filter(|b| !b.is_empty()))
            .unwrap_or_else(|| format!("Upstream request failed with status {}", response.status));
        return Err(GoogleError::Status {
            status: response.status,
            message,
        });
    }

    parsed.map_err(|e| GoogleError::InvalidResponse(format!("body is not JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> UpstreamResponse {
        UpstreamResponse { status, body: body.to_string() }
    }

    #[test]
    fn success_is_parsed() {
        let value = interpret(response(200, r#"{"data":{"translations":[]}}"#)).expect("ok");
        assert!(value["data"]["translations"].is_array());
    }

    #[test]
    fn google_error_message_is_relayed() {
        let body = r#"{"error":{"code":403,"message":"API key not valid. Please pass a valid API key.","status":"PERMISSION_DENIED"}}"#;
        match interpret(response(403, body)) {
            Err(GoogleError::Status { status, message }) => {
                assert_eq!(status, 403);
                assert_eq!(message, "API key not valid. Please pass a valid API key.");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn non_json_error_body_is_relayed_raw() {
        match interpret(response(503, "Service Unavailable\n")) {
            Err(GoogleError::Status { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "Service Unavailable");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn empty_error_body_gets_a_message() {
        match interpret(response(500, "")) {
            Err(GoogleError::Status { message, .. }) => assert!(message.contains("500")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn garbled_success_is_invalid() {
        assert!(matches!(
            interpret(response(200, "<html>")),
            Err(GoogleError::InvalidResponse(_))
        ));
    }

    #[test]
    fn urls_join_cleanly() {
        assert_eq!(join_url("https://x.test/v1/", "/voices"), "https://x.test/v1/voices");
        assert_eq!(join_url("https://x.test/v2", ""), "https://x.test/v2");
    }
}
