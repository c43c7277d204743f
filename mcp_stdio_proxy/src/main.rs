use anyhow::Context;
use clap::Parser;
use mcp_stdio_proxy::ProxyConfig;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

/// stdio-to-HTTP proxy for JSON-RPC traffic.
///
/// Reads newline-delimited JSON-RPC messages from stdin, forwards each one
/// as an HTTP POST to a remote endpoint, and writes exactly one JSON line
/// back to stdout per input line.
#[derive(Parser, Debug)]
#[command(name = "mcp_stdio_proxy")]
#[command(version, about)]
struct Args {
    /// Remote JSON-RPC endpoint. Falls back to MCP_SERVER_URL.
    #[arg(long)]
    url: Option<Url>,

    /// Bearer credential for the Authorization header.
    /// Falls back to MCP_AUTH_TOKEN; the header is omitted when unset.
    #[arg(long)]
    auth_token: Option<String>,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Maximum number of concurrently forwarded lines.
    #[arg(long, default_value_t = 64)]
    max_in_flight: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Diagnostics go to stderr only: stdout is the JSON-RPC channel.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let endpoint = resolve_endpoint(args.url, std::env::var("MCP_SERVER_URL").ok())?;
    let auth_token = args
        .auth_token
        .or_else(|| std::env::var("MCP_AUTH_TOKEN").ok());

    let config = ProxyConfig {
        endpoint,
        auth_token,
        request_timeout: Duration::from_secs(args.timeout_secs),
        max_in_flight: args.max_in_flight,
    };

    info!("Forwarding stdin to {}", config.endpoint);
    if config.auth_token.is_some() {
        info!("Bearer credential configured");
    }

    tokio::select! {
        result = mcp_stdio_proxy::run(config) => result?,
        result = shutdown_signal() => {
            result?;
            info!("Shutdown signal received, exiting");
        }
    }
    Ok(())
}

/// CLI flag wins over the environment. A missing or unparseable endpoint is
/// fatal here, before any input is read.
fn resolve_endpoint(flag: Option<Url>, env: Option<String>) -> anyhow::Result<Url> {
    match (flag, env) {
        (Some(url), _) => Ok(url),
        (None, Some(raw)) => {
            Url::parse(&raw).with_context(|| format!("MCP_SERVER_URL is not a valid URL: {raw}"))
        }
        (None, None) => {
            anyhow::bail!("remote endpoint is required: pass --url or set MCP_SERVER_URL")
        }
    }
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = interrupt.recv() => {}
        _ = terminate.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_endpoint_prefers_cli_flag() {
        let flag = Some("http://flag.example/mcp".parse().unwrap());
        let env = Some("http://env.example/mcp".to_string());
        let url = resolve_endpoint(flag, env).unwrap();
        assert_eq!(url.as_str(), "http://flag.example/mcp");
    }

    #[test]
    fn resolve_endpoint_falls_back_to_env() {
        let url = resolve_endpoint(None, Some("http://env.example/mcp".into())).unwrap();
        assert_eq!(url.host_str(), Some("env.example"));
    }

    #[test]
    fn resolve_endpoint_missing_is_fatal() {
        assert!(resolve_endpoint(None, None).is_err());
    }

    #[test]
    fn resolve_endpoint_rejects_unparseable_env() {
        assert!(resolve_endpoint(None, Some("not a url".into())).is_err());
    }
}
