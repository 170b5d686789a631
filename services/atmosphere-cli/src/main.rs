//! Atmosphere CLI
//!
//! Thin shell wrapper around `atmosphere-client`:
//! - `acquire` waits for an environment and prints the allocation as JSON
//! - `release` hands an allocation back and prints the service's reply
//!
//! stdout carries only the JSON result; progress and diagnostics are
//! JSON-formatted tracing events on stderr.

mod cli;
mod config;
mod error;

use std::sync::Arc;

use anyhow::{Context, Result};
use atmosphere_auth::SigningScope;
use atmosphere_client::{AcquireOptions, AtmosphereClient, TracingSink};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Command;
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // JSON logs on stderr, LOG_LEVEL / RUST_LOG filter, info by default
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .init();

    let raw: Vec<String> = std::env::args().skip(1).collect();
    let args = cli::parse(&raw)?;
    if args.command == Command::Help {
        println!("{}", cli::USAGE);
        return Ok(());
    }

    let location = Config::resolve_path(args.config.as_deref());
    let mut config = Config::load(&location)
        .with_context(|| format!("failed to load config from {}", location.path.display()))?;
    if let Some(endpoint) = args.endpoint {
        config.service.endpoint = Some(endpoint);
    }
    let endpoint = config.validate()?;

    info!(
        endpoint,
        region = %config.service.region,
        signing_service = %config.service.signing_service,
        "configuration loaded"
    );

    let scope = SigningScope::new(&config.service.region, &config.service.signing_service);
    let client = AtmosphereClient::connect(endpoint, scope)
        .context("failed to create client")?
        .with_log_sink(Arc::new(TracingSink));

    let output = match args.command {
        Command::Acquire {
            pool,
            requester,
            timeout_secs,
        } => {
            let options = AcquireOptions::new(pool, requester)
                .with_timeout_secs(timeout_secs.unwrap_or(config.acquire.timeout_secs));
            let allocation = client
                .acquire(&options)
                .await
                .context("acquire failed")?;
            serde_json::to_string_pretty(&allocation)?
        }
        Command::Release {
            allocation_id,
            outcome,
        } => {
            let reply = client
                .release(&allocation_id, &outcome)
                .await
                .with_context(|| format!("release of {allocation_id} failed"))?;
            serde_json::to_string_pretty(&reply)?
        }
        Command::Help => cli::USAGE.to_owned(),
    };

    println!("{output}");
    Ok(())
}
