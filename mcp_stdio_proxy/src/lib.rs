//! # MCP stdio proxy
//!
//! A stdio-to-HTTP forwarding proxy for JSON-RPC traffic.
//!
//! This crate lets a line-oriented JSON-RPC client (an MCP host such as
//! Claude Desktop) talk to a remote server that only accepts HTTP POST
//! calls, with neither side aware of the proxy. Every stdin line is decoded
//! as JSON, forwarded as one HTTP request, and answered with exactly one
//! stdout line: the remote's JSON response re-encoded, or a synthesized
//! JSON-RPC error envelope when any step fails.
//!
//! ## Architecture
//!
//! *   **Transport client**: one HTTP POST per message, with an optional
//!     bearer credential ([`transport::HttpTransport`]).
//! *   **Forwarding loop**: one task per input line, bounded by an
//!     in-flight semaphore, feeding a single serialized stdout writer
//!     ([`proxy::run`]).
//! *   **Failure containment**: per-line failures become error envelopes on
//!     stdout and never abort the loop; only missing configuration is
//!     fatal.
//!
//! ## Example
//!
//! ```rust,no_run
//! use mcp_stdio_proxy::ProxyConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ProxyConfig {
//!         endpoint: "https://mcp.example.com/mcp".parse()?,
//!         auth_token: Some("api-key".into()),
//!         ..ProxyConfig::default()
//!     };
//!     mcp_stdio_proxy::run(config).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod proxy;
pub mod transport;

pub use error::{ProxyError, Result, TransportError};
pub use proxy::{ProxyConfig, run, run_with_io};
pub use transport::HttpTransport;
