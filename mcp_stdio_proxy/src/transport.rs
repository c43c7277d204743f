//! HTTP transport client: one POST per forwarded JSON-RPC message.

use crate::error::TransportError;
use crate::proxy::ProxyConfig;
use serde_json::Value;
use url::Url;

/// Forwards individual JSON-RPC messages to a remote HTTP endpoint.
///
/// Cheap to clone; the underlying `reqwest::Client` connection pool is
/// shared between clones.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
    auth_token: Option<String>,
}

impl HttpTransport {
    /// Builds a transport from the immutable proxy configuration.
    ///
    /// The configured request timeout is installed on the shared client;
    /// no other bound is imposed on individual calls.
    pub fn new(config: &ProxyConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            auth_token: config.auth_token.clone(),
        })
    }

    /// Sends `message` as an HTTP POST and returns the decoded JSON response
    /// body.
    ///
    /// Exactly one attempt is made per call. Failures are classified into
    /// [`TransportError`] variants so their display strings can be embedded
    /// in the error envelope written back to the stdio client.
    pub async fn send(&self, message: &Value) -> Result<Value, TransportError> {
        let mut request = self.client.post(self.endpoint.clone()).json(message);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
