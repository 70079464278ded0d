//! Google Ads command-line client
//!
//! Resolves configuration (flags > env > `google-ads.toml` > defaults),
//! builds one authenticated client and runs a single report or query.
//! Results go to stdout; logs and the OAuth consent prompt go to stderr.

mod commands;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use ads_auth::AuthType;
use ads_client::{AdsClient, ClientConfig};
use anyhow::{Context, Result};
use clap::{Args, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::Command;

#[derive(Parser, Debug)]
#[command(name = "google-ads", version, about = "Google Ads CLI", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Default)]
struct GlobalArgs {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Config file (default: $GOOGLE_ADS_CONFIG or ./google-ads.toml)
    #[arg(long, global = true)]
    config: Option<String>,

    /// OAuth token / client secrets file, or service-account key
    #[arg(long, global = true)]
    credentials: Option<PathBuf>,

    /// oauth or service_account
    #[arg(long, global = true, value_parser = parse_auth_type)]
    auth_type: Option<AuthType>,

    /// Manager account to send requests through
    #[arg(long, global = true)]
    login_customer_id: Option<String>,
}

impl GlobalArgs {
    /// Overlay flags on a loaded configuration.
    fn apply(&self, mut config: ClientConfig) -> ClientConfig {
        if let Some(ref path) = self.credentials {
            config.credentials_path = Some(path.clone());
        }
        if let Some(auth_type) = self.auth_type {
            config.auth_type = auth_type;
        }
        if let Some(ref id) = self.login_customer_id {
            config.login_customer_id = Some(id.clone());
        }
        config
    }
}

fn parse_auth_type(raw: &str) -> Result<AuthType, String> {
    raw.parse().map_err(|e: ads_auth::Error| e.to_string())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(cli: Cli) -> Result<String> {
    let config = ClientConfig::discover(cli.global.config.as_deref()).context("failed to load configuration")?;
    let config = cli.global.apply(config);
    debug!(
        credentials = ?config.credentials_path,
        auth_type = %config.auth_type,
        api_version = %config.api.version,
        "configuration loaded"
    );

    let client = AdsClient::new(config).context("failed to build API client")?;
    commands::execute(cli.command, &client, cli.global.json).await
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(out) => {
            if !out.is_empty() {
                println!("{out}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
