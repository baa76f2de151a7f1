//! Wallet access.
//!
//! [`WalletProvider`] covers the small subset of EIP-1193 the console needs:
//! account access, chain inspection and chain switching (EIP-3326 / EIP-3085),
//! plus a provider bound to the wallet's signer for contract calls.

use std::future::Future;

use alloy::{
    network::EthereumWallet,
    primitives::{Address, U64},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::client::RpcClient,
    signers::local::PrivateKeySigner,
};
use tracing::{debug, info};
use url::Url;

use crate::{Chain, error::PerpsError};

/// `wallet_addEthereumChain` request payload.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChainParams {
    pub chain_id: U64,
    pub chain_name: String,
    pub rpc_urls: Vec<String>,
    pub native_currency: NativeCurrency,
    pub block_explorer_urls: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// `wallet_switchEthereumChain` request payload.
#[derive(Clone, Copy, Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct SwitchChainParams {
    chain_id: U64,
}

/// Wallet holding the user's accounts.
pub trait WalletProvider {
    /// Asks the wallet to expose its accounts, may prompt the user.
    fn request_accounts(&self) -> impl Future<Output = Result<Vec<Address>, PerpsError>> + Send;

    /// ID of the chain the wallet is currently connected to.
    fn chain_id(&self) -> impl Future<Output = Result<u64, PerpsError>> + Send;

    /// Asks the wallet to switch to an already known chain.
    fn switch_chain(&self, chain_id: u64) -> impl Future<Output = Result<(), PerpsError>> + Send;

    /// Registers a new chain with the wallet, which also switches to it.
    fn add_chain(
        &self,
        params: &AddChainParams,
    ) -> impl Future<Output = Result<(), PerpsError>> + Send;

    /// Provider sending transactions on behalf of the wallet accounts.
    fn provider(&self) -> DynProvider;
}

/// Makes sure the wallet is on the chain the market is deployed on,
/// switching or adding the chain when it is not.
///
/// Returns the chain ID the wallet reports once done.
pub async fn ensure_chain<W: WalletProvider>(wallet: &W, chain: &Chain) -> Result<u64, PerpsError> {
    let current = wallet.chain_id().await?;
    if current == chain.chain_id() {
        return Ok(current);
    }

    info!(
        current_chain_id = current,
        required_chain_id = chain.chain_id(),
        chain = chain.name(),
        "Switching wallet chain"
    );
    match wallet.switch_chain(chain.chain_id()).await {
        Ok(()) => {}
        Err(PerpsError::UnrecognizedChain) => {
            info!(chain = chain.name(), "Chain unknown to the wallet, adding it");
            wallet.add_chain(&chain.add_chain_params()).await?;
        }
        Err(e) => return Err(e),
    }

    let switched = wallet.chain_id().await?;
    if switched != chain.chain_id() {
        return Err(PerpsError::WrongChain {
            expected: chain.chain_id(),
            actual: switched,
        });
    }
    Ok(switched)
}

/// External wallet reachable over JSON-RPC, e.g. a desktop wallet exposing
/// its EIP-1193 interface on a local HTTP endpoint.
///
/// Transactions are sent unsigned via `eth_sendTransaction`, the wallet
/// signs them after user approval.
#[derive(Clone, Debug)]
pub struct RpcWallet {
    client: RpcClient,
    provider: DynProvider,
}

impl RpcWallet {
    pub fn new(wallet_url: Url) -> Self {
        let client = RpcClient::new_http(wallet_url);
        let provider = DynProvider::new(ProviderBuilder::new().connect_client(client.clone()));
        Self { client, provider }
    }
}

impl WalletProvider for RpcWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, PerpsError> {
        let accounts = self
            .client
            .request_noparams::<Vec<Address>>("eth_requestAccounts")
            .await?;
        debug!(?accounts, "Accounts received");
        Ok(accounts)
    }

    async fn chain_id(&self) -> Result<u64, PerpsError> {
        Ok(self.provider.get_chain_id().await?)
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), PerpsError> {
        let params = [SwitchChainParams {
            chain_id: U64::from(chain_id),
        }];
        let _: () = self
            .client
            .request("wallet_switchEthereumChain", params)
            .await?;
        Ok(())
    }

    async fn add_chain(&self, params: &AddChainParams) -> Result<(), PerpsError> {
        let _: () = self
            .client
            .request("wallet_addEthereumChain", [params.clone()])
            .await?;
        Ok(())
    }

    fn provider(&self) -> DynProvider {
        self.provider.clone()
    }
}

/// Wallet backed by a single local private key, talking to a plain node.
///
/// The node decides the chain, so switching chains is not possible.
#[derive(Clone, Debug)]
pub struct LocalWallet {
    address: Address,
    provider: DynProvider,
}

impl LocalWallet {
    pub fn new(signer: PrivateKeySigner, node_url: Url) -> Self {
        let address = signer.address();
        let rpc_client = RpcClient::new_http(node_url);
        let provider = DynProvider::new(
            ProviderBuilder::new()
                .wallet(EthereumWallet::new(signer))
                .connect_client(rpc_client),
        );
        Self { address, provider }
    }

    pub fn address(&self) -> Address {
        self.address
    }
}

impl WalletProvider for LocalWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, PerpsError> {
        Ok(vec![self.address])
    }

    async fn chain_id(&self) -> Result<u64, PerpsError> {
        Ok(self.provider.get_chain_id().await?)
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), PerpsError> {
        Err(PerpsError::ChainSwitchUnsupported(chain_id))
    }

    async fn add_chain(&self, params: &AddChainParams) -> Result<(), PerpsError> {
        Err(PerpsError::ChainSwitchUnsupported(params.chain_id.to()))
    }

    fn provider(&self) -> DynProvider {
        self.provider.clone()
    }
}
