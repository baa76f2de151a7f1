//! Configuration for the perps console.
//!
//! Configuration comes from two sources:
//! - Environment variables (via .env file or shell): wallet and chain details
//! - CLI arguments: command and market parameters

use alloy::{primitives::Address, signers::local::PrivateKeySigner};
use clap::{Args, Parser, Subcommand};
use perps_console::{Chain, form::NewMarketForm};
use url::Url;

/// Environment configuration (wallet access, deployment overrides).
#[derive(Debug, serde::Deserialize)]
pub struct EnvConfig {
    /// JSON-RPC endpoint of an external wallet, e.g. http://127.0.0.1:1248
    pub wallet_rpc_url: Option<String>,

    /// Private key for a local signer, used when no wallet endpoint is set
    pub private_key: Option<String>,

    /// Node RPC URL for the local signer (default: the chain's public RPC)
    pub node_rpc_url: Option<String>,

    /// Chain ID override (default: 84532, Base Sepolia)
    pub chain_id: Option<u64>,

    /// Perps market proxy address override
    pub market_proxy_address: Option<String>,

    /// Optional timeout for the market creation receipt (default: 60s)
    pub timeout_seconds: Option<u64>,

    /// Maximum number of markets to list (default: 10)
    pub max_markets: Option<usize>,
}

/// Where transactions get signed.
#[derive(Debug)]
pub enum WalletSource {
    Rpc(Url),
    Local {
        signer: PrivateKeySigner,
        node_url: Url,
    },
}

impl EnvConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// Target chain, Base Sepolia unless overridden.
    pub fn chain(&self) -> Result<Chain, ConfigError> {
        let default = Chain::base_sepolia();
        let market_proxy = match &self.market_proxy_address {
            Some(address) => address
                .parse::<Address>()
                .map_err(|_| ConfigError::InvalidAddress(address.clone()))?,
            None => default.market_proxy(),
        };
        let chain_id = self.chain_id.unwrap_or(default.chain_id());
        if chain_id == default.chain_id() && market_proxy == default.market_proxy() {
            return Ok(default);
        }

        let (name, explorer_url) = if chain_id == default.chain_id() {
            (default.name().to_string(), default.explorer_url().to_string())
        } else {
            (format!("Chain {chain_id}"), String::new())
        };
        let rpc_url = self
            .node_rpc_url
            .clone()
            .unwrap_or_else(|| default.rpc_url().to_string());
        Ok(Chain::custom(
            chain_id,
            name,
            rpc_url,
            explorer_url,
            market_proxy,
        ))
    }

    /// External wallet endpoint takes precedence over a local private key.
    pub fn wallet_source(&self, chain: &Chain) -> Result<WalletSource, ConfigError> {
        if let Some(url) = &self.wallet_rpc_url {
            let url = Url::parse(url).map_err(|_| ConfigError::InvalidUrl(url.clone()))?;
            return Ok(WalletSource::Rpc(url));
        }

        let Some(private_key) = &self.private_key else {
            return Err(ConfigError::MissingWallet);
        };
        let signer = private_key
            .parse::<PrivateKeySigner>()
            .map_err(|_| ConfigError::InvalidPrivateKey)?;
        let node_url = self.node_rpc_url.as_deref().unwrap_or(chain.rpc_url());
        let node_url =
            Url::parse(node_url).map_err(|_| ConfigError::InvalidUrl(node_url.to_string()))?;
        Ok(WalletSource::Local { signer, node_url })
    }
}

/// CLI arguments.
#[derive(Debug, Parser)]
#[command(name = "perps-console")]
#[command(about = "Console for the perps market proxy on Base Sepolia")]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Connect the wallet and show the account and network
    Status,

    /// List markets with their summaries
    Markets,

    /// Create a new market
    CreateMarket(CreateMarketArgs),
}

/// New market parameters, unset ones keep the form defaults.
#[derive(Debug, Args)]
pub struct CreateMarketArgs {
    /// Market name (e.g., "Bitcoin Perpetual")
    #[arg(long)]
    pub name: String,

    /// Market symbol (e.g., "BTC-PERP")
    #[arg(long)]
    pub symbol: String,

    /// Initial price in USD (e.g., 50000)
    #[arg(long)]
    pub price: String,

    /// Max leverage (default: 10)
    #[arg(long)]
    pub max_leverage: Option<String>,

    /// Max market value (default: 1000000)
    #[arg(long)]
    pub max_market_value: Option<String>,

    /// Liquidation buffer in basis points (default: 1000, i.e. 10%)
    #[arg(long)]
    pub liquidation_buffer_ratio: Option<String>,

    /// Skew scale in wei (default: 1000000000000000000, i.e. 1.0)
    #[arg(long)]
    pub skew_scale: Option<String>,

    /// Maker fee in basis points (default: 10, i.e. 0.1%)
    #[arg(long)]
    pub maker_fee: Option<String>,

    /// Taker fee in basis points (default: 15, i.e. 0.15%)
    #[arg(long)]
    pub taker_fee: Option<String>,
}

impl CreateMarketArgs {
    /// Fill the form with the provided values.
    pub fn apply_to(&self, form: &mut NewMarketForm) {
        form.name = self.name.clone();
        form.symbol = self.symbol.clone();
        form.price = self.price.clone();
        let overrides = [
            (&self.max_leverage, &mut form.max_leverage),
            (&self.max_market_value, &mut form.max_market_value),
            (&self.liquidation_buffer_ratio, &mut form.liquidation_buffer_ratio),
            (&self.skew_scale, &mut form.skew_scale),
            (&self.maker_fee, &mut form.maker_fee),
            (&self.taker_fee, &mut form.taker_fee),
        ];
        for (value, field) in overrides {
            if let Some(value) = value {
                *field = value.clone();
            }
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Either WALLET_RPC_URL or PRIVATE_KEY has to be set")]
    MissingWallet,

    #[error("Invalid private key")]
    InvalidPrivateKey,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> EnvConfig {
        EnvConfig {
            wallet_rpc_url: None,
            private_key: None,
            node_rpc_url: None,
            chain_id: None,
            market_proxy_address: None,
            timeout_seconds: None,
            max_markets: None,
        }
    }

    #[test]
    fn test_default_chain() {
        let chain = env().chain().unwrap();
        assert_eq!(chain.chain_id(), 84532);
        assert_eq!(chain.name(), "Base Sepolia");
    }

    #[test]
    fn test_custom_chain() {
        let config = EnvConfig {
            chain_id: Some(31337),
            node_rpc_url: Some("http://127.0.0.1:8545".to_string()),
            market_proxy_address: Some(
                "0x000000000000000000000000000000000000beef".to_string(),
            ),
            ..env()
        };
        let chain = config.chain().unwrap();
        assert_eq!(chain.chain_id(), 31337);
        assert_eq!(chain.name(), "Chain 31337");
        assert_eq!(chain.rpc_url(), "http://127.0.0.1:8545");
        assert!(chain.add_chain_params().block_explorer_urls.is_empty());
    }

    #[test]
    fn test_wallet_source() {
        let chain = Chain::base_sepolia();
        assert!(matches!(
            env().wallet_source(&chain),
            Err(ConfigError::MissingWallet)
        ));

        let config = EnvConfig {
            wallet_rpc_url: Some("http://127.0.0.1:1248".to_string()),
            private_key: Some("not a key".to_string()),
            ..env()
        };
        assert!(matches!(
            config.wallet_source(&chain),
            Ok(WalletSource::Rpc(_))
        ));

        let config = EnvConfig {
            private_key: Some(
                "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80".to_string(),
            ),
            ..env()
        };
        match config.wallet_source(&chain).unwrap() {
            WalletSource::Local { node_url, .. } => {
                assert_eq!(node_url.as_str(), "https://sepolia.base.org/")
            }
            other => panic!("unexpected wallet source: {other:?}"),
        }
    }

    #[test]
    fn test_create_market_args_keep_defaults() {
        let args = CreateMarketArgs {
            name: "Bitcoin Perpetual".to_string(),
            symbol: "BTC-PERP".to_string(),
            price: "50000".to_string(),
            max_leverage: Some("20".to_string()),
            max_market_value: None,
            liquidation_buffer_ratio: None,
            skew_scale: None,
            maker_fee: None,
            taker_fee: Some("25".to_string()),
        };
        let mut form = NewMarketForm::default();
        args.apply_to(&mut form);

        assert_eq!(form.name, "Bitcoin Perpetual");
        assert_eq!(form.max_leverage, "20");
        assert_eq!(form.max_market_value, "1000000");
        assert_eq!(form.maker_fee, "10");
        assert_eq!(form.taker_fee, "25");
    }
}
