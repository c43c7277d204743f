//! stdio-to-HTTP forwarding loop.
//!
//! Each stdin line is handled by its own task: decode, dispatch over HTTP,
//! then hand exactly one reply line to a single writer task. Replies may
//! leave stdout in a different order than their requests arrived; JSON-RPC
//! clients correlate by message id, not by position.

use crate::error::Result;
use crate::transport::HttpTransport;
use futures::StreamExt;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::{Semaphore, mpsc};
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tracing::warn;
use url::Url;

/// JSON-RPC internal error code carried by every synthesized envelope.
const INTERNAL_ERROR_CODE: i64 = -32603;

/// Longest accepted input line. Excess is reported as a decode failure on
/// that line; the codec discards up to the next newline and the loop
/// continues.
const MAX_LINE_BYTES: usize = 8 * 1024 * 1024;

/// Configuration for the proxy, immutable after startup.
///
/// # Example
///
/// ```rust
/// use mcp_stdio_proxy::ProxyConfig;
///
/// let config = ProxyConfig {
///     endpoint: "https://mcp.example.com/mcp".parse().unwrap(),
///     auth_token: Some("api-key".into()),
///     ..ProxyConfig::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Remote JSON-RPC endpoint receiving one HTTP POST per input line.
    pub endpoint: Url,

    /// Bearer credential for the `Authorization` header. When `None`, the
    /// header is omitted entirely rather than sent empty.
    pub auth_token: Option<String>,

    /// Per-request timeout installed on the HTTP client.
    pub request_timeout: Duration,

    /// Maximum number of lines dispatched concurrently. A fast producer
    /// blocks the reader once this many requests are in flight.
    pub max_in_flight: usize,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:3000/mcp".parse().unwrap(),
            auth_token: None,
            request_timeout: Duration::from_secs(30),
            max_in_flight: 64,
        }
    }
}

/// Runs the proxy over real stdin/stdout until stdin reaches end-of-stream.
///
/// Already-dispatched lines drain before the function returns, so every
/// accepted input line still yields its reply line.
pub async fn run(config: ProxyConfig) -> Result<()> {
    let transport = HttpTransport::new(&config)?;
    run_with_io(&config, transport, tokio::io::stdin(), tokio::io::stdout()).await
}

/// Same loop over arbitrary streams, so tests can drive the proxy with
/// in-memory pipes instead of process stdio.
pub async fn run_with_io<R, W>(
    config: &ProxyConfig,
    transport: HttpTransport,
    input: R,
    output: W,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<String>(config.max_in_flight.max(1));

    // Sole owner of the output stream. Whole lines only, flushed per line,
    // so concurrent completions never interleave partial frames.
    let writer = tokio::spawn(async move {
        let mut output = output;
        while let Some(line) = rx.recv().await {
            output.write_all(line.as_bytes()).await?;
            output.write_all(b"\n").await?;
            output.flush().await?;
        }
        Ok::<_, std::io::Error>(())
    });

    let limiter = Arc::new(Semaphore::new(config.max_in_flight.max(1)));
    let mut lines = FramedRead::new(input, LinesCodec::new_with_max_length(MAX_LINE_BYTES));

    while let Some(frame) = lines.next().await {
        let line = match frame {
            Ok(line) => line,
            Err(LinesCodecError::Io(e)) => return Err(e.into()),
            Err(e) => {
                warn!("rejecting input line: {e}");
                let reply = error_envelope(Value::Null, &e.to_string()).to_string();
                if tx.send(reply).await.is_err() {
                    break;
                }
                continue;
            }
        };

        let Ok(permit) = Arc::clone(&limiter).acquire_owned().await else {
            break;
        };
        let transport = transport.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let _permit = permit;
            let reply = process_line(&transport, &line).await;
            // A closed channel means the loop is already tearing down.
            let _ = tx.send(reply).await;
        });
    }

    // End-of-stream: in-flight dispatches still hold channel clones, so the
    // writer drains them and exits once the last sender drops.
    drop(tx);
    writer.await??;
    Ok(())
}

/// Drives one inbound line through decode, dispatch, and reply synthesis.
/// Always returns exactly one line to write back.
async fn process_line(transport: &HttpTransport, line: &str) -> String {
    let message: Value = match serde_json::from_str(line) {
        Ok(message) => message,
        Err(e) => {
            warn!("inbound line is not valid JSON: {e}");
            return error_envelope(Value::Null, &e.to_string()).to_string();
        }
    };

    // Keep the caller's id so failures past this point stay correlatable.
    let id = message.get("id").cloned().unwrap_or(Value::Null);

    match transport.send(&message).await {
        Ok(response) => response.to_string(),
        Err(e) => {
            warn!("forwarding failed: {e}");
            error_envelope(id, &e.to_string()).to_string()
        }
    }
}

fn error_envelope(id: Value, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": INTERNAL_ERROR_CODE,
            "message": message,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ProxyConfig::default();
        assert_eq!(config.endpoint.as_str(), "http://127.0.0.1:3000/mcp");
        assert!(config.auth_token.is_none());
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.max_in_flight, 64);
    }

    #[test]
    fn error_envelope_shape() {
        let envelope = error_envelope(Value::Null, "boom");
        assert_eq!(envelope["jsonrpc"], "2.0");
        assert!(envelope["id"].is_null());
        assert_eq!(envelope["error"]["code"], INTERNAL_ERROR_CODE);
        assert_eq!(envelope["error"]["message"], "boom");
    }

    #[test]
    fn error_envelope_echoes_id() {
        let envelope = error_envelope(json!(42), "boom");
        assert_eq!(envelope["id"], 42);
    }

    #[tokio::test]
    async fn undecodable_line_short_circuits_before_dispatch() {
        // No remote is listening; a decode failure must reply without one.
        let transport = HttpTransport::new(&ProxyConfig::default()).unwrap();
        let reply = process_line(&transport, "{not json").await;
        let envelope: Value = serde_json::from_str(&reply).unwrap();
        assert!(envelope["id"].is_null());
        assert_eq!(envelope["error"]["code"], INTERNAL_ERROR_CODE);
    }
}
