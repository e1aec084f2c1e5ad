//! # etcd2 CLI Entry Point
//!
//! ```bash
//! etcd2 --host 10.0.0.1 set /config/mode fast --ttl 300
//! etcd2 get /config/mode
//! etcd2 ls / -r
//! etcd2 stats leader | jq .followers
//! ```
//!
//! Connection settings fall back to `ETCD2_HOST`, `ETCD2_PORT`,
//! `ETCD2_SCHEME`, `ETCD2_CA_FILE`, `ETCD2_CERT_FILE`, `ETCD2_KEY_FILE` and
//! `ETCD2_TLS_VERIFY` when the matching flag is absent.

use anyhow::Result;
use etcd2_cli::args::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    // Logs go to stderr; keep stdout clean for piping.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    etcd2_cli::run(cli).await
}
