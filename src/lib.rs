//! Perps market console.
//!
//! # Overview
//!
//! Client for the perps market proxy contract deployed on Base Sepolia:
//! connects a wallet, makes sure it is on the required chain, lists market
//! summaries and submits market creation transactions.
//!
//! [`dashboard::Dashboard`] drives the whole interaction and keeps the state
//! a user interface would show. Wallets plug in via [`wallet::WalletProvider`],
//! either an external JSON-RPC wallet ([`wallet::RpcWallet`]) signing on its
//! own, or a local private key ([`wallet::LocalWallet`]).
//!
//! # Testing
//!
//! [`testing`] module provides a scripted wallet over a mocked transport and
//! a local Anvil node.

pub mod abi;
pub mod dashboard;
pub mod display;
pub mod error;
pub mod form;
pub mod market;
pub mod num;
pub mod testing;
pub mod wallet;

use alloy::primitives::{Address, U64, address};

use crate::wallet::{AddChainParams, NativeCurrency};

#[derive(Clone, Debug)]
/// Chain the perps market is deployed on.
pub struct Chain {
    chain_id: u64,
    name: String,
    rpc_url: String,
    explorer_url: String,
    market_proxy: Address,
}

impl Chain {
    pub fn base_sepolia() -> Self {
        Self {
            chain_id: 84532,
            name: "Base Sepolia".to_string(),
            rpc_url: "https://sepolia.base.org".to_string(),
            explorer_url: "https://sepolia-explorer.base.org".to_string(),
            market_proxy: address!("0xf53Ca60F031FAf0E347D44FbaA4870da68250c8d"),
        }
    }

    pub fn custom(
        chain_id: u64,
        name: impl Into<String>,
        rpc_url: impl Into<String>,
        explorer_url: impl Into<String>,
        market_proxy: Address,
    ) -> Self {
        Self {
            chain_id,
            name: name.into(),
            rpc_url: rpc_url.into(),
            explorer_url: explorer_url.into(),
            market_proxy,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    pub fn explorer_url(&self) -> &str {
        &self.explorer_url
    }

    pub fn market_proxy(&self) -> Address {
        self.market_proxy
    }

    /// Parameters to register the chain with a wallet that does not know it yet.
    ///
    /// Chains without an explorer send an empty explorer list, wallets
    /// reject empty URLs.
    pub fn add_chain_params(&self) -> AddChainParams {
        AddChainParams {
            chain_id: U64::from(self.chain_id),
            chain_name: self.name.clone(),
            rpc_urls: vec![self.rpc_url.clone()],
            native_currency: NativeCurrency {
                name: "ETH".to_string(),
                symbol: "ETH".to_string(),
                decimals: 18,
            },
            block_explorer_urls: if self.explorer_url.is_empty() {
                vec![]
            } else {
                vec![self.explorer_url.clone()]
            },
        }
    }
}
