//! Perps market console.
//!
//! Connects a wallet to the perps market proxy on Base Sepolia, lists market
//! summaries and creates new markets.

mod config;
mod error;
mod render;

use std::{process::exit, time::Duration};

use clap::Parser;
use perps_console::{
    dashboard::Dashboard,
    wallet::{LocalWallet, RpcWallet, WalletProvider},
};
use tracing::{debug, error};

use config::{CliConfig, Command, EnvConfig, WalletSource};
use error::Result;

#[tokio::main]
async fn main() {
    // Load .env file
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Failed to load .env file: {}", e);
    }

    // Parse environment configuration
    let env_config = match EnvConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to parse environment configuration: {}", e);
            exit(1);
        }
    };

    // Parse CLI arguments
    let cli_config = CliConfig::parse();

    // Set up logging
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let chain = match env_config.chain() {
        Ok(chain) => chain,
        Err(e) => {
            eprintln!("Invalid chain configuration: {}", e);
            exit(1);
        }
    };
    debug!(?chain, "Target chain");

    let wallet_source = match env_config.wallet_source(&chain) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Invalid wallet configuration: {}", e);
            exit(1);
        }
    };

    // Default timeout is 60 seconds
    let timeout = Duration::from_secs(env_config.timeout_seconds.unwrap_or(60));
    let max_markets = env_config.max_markets.unwrap_or(10);

    let result = match wallet_source {
        WalletSource::Rpc(url) => {
            let dashboard = Dashboard::new(chain, RpcWallet::new(url))
                .with_timeout(timeout)
                .with_max_markets(max_markets);
            run(dashboard, cli_config.command).await
        }
        WalletSource::Local { signer, node_url } => {
            let dashboard = Dashboard::new(chain, LocalWallet::new(signer, node_url))
                .with_timeout(timeout)
                .with_max_markets(max_markets);
            run(dashboard, cli_config.command).await
        }
    };

    if let Err(e) = result {
        error!(%e, "Perps console command failed");
        exit(1);
    }
}

async fn run<W: WalletProvider>(mut dashboard: Dashboard<W>, command: Command) -> Result<()> {
    render::header(&dashboard);

    let connected = dashboard.connect().await;
    render::connection(&dashboard);
    connected?;

    match command {
        Command::Status => {}
        Command::Markets => {
            let fetched = dashboard.fetch_markets().await.map(|_| ());
            render::error(&dashboard);
            fetched?;
            render::markets(&dashboard);
        }
        Command::CreateMarket(args) => {
            args.apply_to(dashboard.form_mut());
            let mut statuses = dashboard.subscribe_creation_status();
            let created = {
                let create = dashboard.create_market();
                tokio::pin!(create);
                loop {
                    tokio::select! {
                        created = &mut create => break created,
                        Ok(()) = statuses.changed() => {
                            render::creation_status(*statuses.borrow_and_update());
                        }
                    }
                }
            };
            if statuses.has_changed().unwrap_or(false) {
                render::creation_status(*statuses.borrow_and_update());
            }
            render::error(&dashboard);
            if created?.market_id.is_some() {
                render::markets(&dashboard);
            }
        }
    }

    render::footer(&dashboard);
    Ok(())
}
