use super::error::{GlideError, Result};
use async_trait::async_trait;
use log::{debug, warn};
use serde_json::Value;
use std::fmt;
use std::time::Instant;

/// Root of the classic function API
pub const DEFAULT_API_ROOT: &str = "https://api.glideapp.io/api/function";

/// The two function endpoints: reads go to one, all writes to the other
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    QueryTables,
    MutateTables,
}

impl Endpoint {
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::QueryTables => "queryTables",
            Endpoint::MutateTables => "mutateTables",
        }
    }

    /// Fully-qualified URL under the given API root
    pub fn url(&self, api_root: &str) -> String {
        format!("{}/{}", api_root.trim_end_matches('/'), self.name())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sends a JSON body to an endpoint and returns the parsed JSON response
///
/// Implementations:
/// - `HttpTransport`: authenticated HTTPS POST via reqwest
/// - `MockTransport` (tests): canned responses, records every call
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, endpoint: Endpoint, body: Value) -> Result<Value>;
}

/// Bearer-token authenticated HTTP transport
#[derive(Clone)]
pub struct HttpTransport {
    http_client: reqwest::Client,
    api_root: String,
    token: String,
}

impl HttpTransport {
    /// Create a transport against the default API root
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_api_root(DEFAULT_API_ROOT, token)
    }

    pub fn with_api_root(api_root: impl Into<String>, token: impl Into<String>) -> Self {
        HttpTransport {
            http_client: reqwest::Client::new(),
            api_root: api_root.into(),
            token: token.into(),
        }
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, endpoint: Endpoint, body: Value) -> Result<Value> {
        let url = endpoint.url(&self.api_root);
        let start = Instant::now();
        debug!("POST {}", url);

        // .json() sets Content-Type: application/json
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        debug!(
            "{} responded {} in {}ms",
            endpoint,
            status,
            start.elapsed().as_millis()
        );

        if !status.is_success() {
            let status_text = status.canonical_reason().unwrap_or("").to_string();
            warn!("{} failed: {} {}", endpoint, status.as_u16(), status_text);
            return Err(GlideError::Http {
                status: status.as_u16(),
                status_text,
            });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Transport returning queued responses in order
    #[derive(Default)]
    pub struct MockTransport {
        responses: Mutex<VecDeque<Result<Value>>>,
        calls: Mutex<Vec<(Endpoint, Value)>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(self, response: Value) -> Self {
            self.responses.lock().unwrap().push_back(Ok(response));
            self
        }

        pub fn fail(self, error: GlideError) -> Self {
            self.responses.lock().unwrap().push_back(Err(error));
            self
        }

        pub fn calls(&self) -> Vec<(Endpoint, Value)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&self, endpoint: Endpoint, body: Value) -> Result<Value> {
            self.calls.lock().unwrap().push((endpoint, body));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| {
                    Err(GlideError::UnexpectedResponse(
                        "no more mock responses".into(),
                    ))
                })
        }
    }
}
