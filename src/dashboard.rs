//! Dashboard controller.
//!
//! [`Dashboard`] runs the wallet connection, market listing and market
//! creation flows one at a time and keeps the state a user interface shows:
//! connected account and chain, fetched markets, the new market form, the
//! last error text and the market creation progress.
//!
//! Market creation progress is also published on a [`watch`] channel, so
//! intermediate statuses can be shown while [`Dashboard::create_market`]
//! is still running.

use std::{fmt, time::Duration};

use alloy::{
    primitives::{Address, TxHash},
    providers::DynProvider,
    rpc::types::Log,
};
use futures::{StreamExt, stream};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::{
    Chain,
    abi::perps::PerpsMarket::{self, PerpsMarketInstance},
    error::{PerpsError, RevertReason},
    form::NewMarketForm,
    market::{self, MarketEntry, MarketId},
    wallet::{self, WalletProvider},
};

/// Default number of markets to list.
const DEFAULT_MAX_MARKETS: usize = 10;

/// Default number of market summaries fetched concurrently.
const DEFAULT_CONCURRENCY: usize = 8;

/// Default time to wait for the market creation receipt.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Progress of the last market creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreationStatus {
    Sending,
    AwaitingConfirmation(TxHash),
    Created(MarketId),
    CreatedWithoutId(TxHash),
}

/// Result of a confirmed market creation transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarketCreation {
    pub tx_hash: TxHash,
    /// ID reported by the `MarketCreated` event, if the receipt has one.
    pub market_id: Option<MarketId>,
}

#[derive(Debug)]
pub struct Dashboard<W> {
    chain: Chain,
    wallet: W,
    account: Option<Address>,
    chain_id: Option<u64>,
    market: Option<PerpsMarketInstance<DynProvider>>,
    markets: Vec<MarketEntry>,
    form: NewMarketForm,
    error: Option<String>,
    creation_status: watch::Sender<Option<CreationStatus>>,
    max_markets: usize,
    concurrency: usize,
    timeout: Duration,
}

impl<W: WalletProvider> Dashboard<W> {
    pub fn new(chain: Chain, wallet: W) -> Self {
        Self {
            chain,
            wallet,
            account: None,
            chain_id: None,
            market: None,
            markets: vec![],
            form: NewMarketForm::default(),
            error: None,
            creation_status: watch::Sender::new(None),
            max_markets: DEFAULT_MAX_MARKETS,
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the maximum number of markets to list (default: 10).
    pub fn with_max_markets(mut self, max_markets: usize) -> Self {
        self.max_markets = max_markets;
        self
    }

    /// Sets the number of market summaries fetched at once (default: 8).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Sets how long to wait for the market creation receipt (default: 60s).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.chain_id
    }

    pub fn is_connected(&self) -> bool {
        self.account.is_some() && self.market.is_some()
    }

    pub fn is_on_required_chain(&self) -> bool {
        self.chain_id == Some(self.chain.chain_id())
    }

    /// Markets from the last successful fetch.
    pub fn markets(&self) -> &[MarketEntry] {
        &self.markets
    }

    pub fn form(&self) -> &NewMarketForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut NewMarketForm {
        &mut self.form
    }

    /// Text of the last failure, cleared when a new operation starts.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn creation_status(&self) -> Option<CreationStatus> {
        *self.creation_status.borrow()
    }

    /// Receiver notified on every market creation status change, including
    /// the intermediate ones.
    pub fn subscribe_creation_status(&self) -> watch::Receiver<Option<CreationStatus>> {
        self.creation_status.subscribe()
    }

    fn set_creation_status(&self, status: Option<CreationStatus>) {
        self.creation_status.send_replace(status);
    }

    /// Connects the wallet: requests accounts, brings the wallet to the
    /// required chain and binds the market contract to the wallet signer.
    pub async fn connect(&mut self) -> Result<Address, PerpsError> {
        self.error = None;
        match self.try_connect().await {
            Ok(account) => Ok(account),
            Err(e) => {
                error!(%e, "Wallet connection failed");
                self.error = Some(user_message(&e));
                Err(e)
            }
        }
    }

    async fn try_connect(&mut self) -> Result<Address, PerpsError> {
        // Previous connection is stale once a new attempt starts
        self.account = None;
        self.chain_id = None;
        self.market = None;

        debug!("Requesting accounts");
        let accounts = self.wallet.request_accounts().await?;
        let account = *accounts.first().ok_or(PerpsError::NoAccounts)?;

        let chain_id = wallet::ensure_chain(&self.wallet, &self.chain).await?;
        self.chain_id = Some(chain_id);

        self.market = Some(PerpsMarket::new(
            self.chain.market_proxy(),
            self.wallet.provider(),
        ));
        self.account = Some(account);

        info!(
            %account,
            chain_id,
            market_proxy = %self.chain.market_proxy(),
            "Wallet connected"
        );
        Ok(account)
    }

    /// Reads market IDs and the summary of each of the first `max_markets`.
    ///
    /// A failed summary read does not fail the fetch, the market is listed
    /// without a summary instead.
    pub async fn fetch_markets(&mut self) -> Result<&[MarketEntry], PerpsError> {
        self.error = None;
        match self.load_markets().await {
            Ok(markets) => {
                self.markets = markets;
                Ok(&self.markets)
            }
            Err(e) => {
                error!(%e, "Failed to fetch markets");
                self.error = Some(match &e {
                    PerpsError::NotConnected => user_message(&e),
                    _ => format!("Failed to fetch markets: {}", user_message(&e)),
                });
                Err(e)
            }
        }
    }

    async fn load_markets(&self) -> Result<Vec<MarketEntry>, PerpsError> {
        let market = self.market.as_ref().ok_or(PerpsError::NotConnected)?;

        let mut ids = market.getMarkets().call().await?;
        ids.truncate(self.max_markets);
        debug!(?ids, "Market IDs");

        let entries = stream::iter(ids)
            .map(|id| async move {
                match market.getMarketSummary(id).call().await {
                    Ok(summary) => {
                        debug!(market_id = %id, ?summary, "Market summary");
                        MarketEntry::loaded(id, &summary)
                    }
                    Err(e) => {
                        warn!(market_id = %id, %e, "Failed to fetch market summary");
                        MarketEntry::failed(id)
                    }
                }
            })
            .buffered(self.concurrency)
            .collect::<Vec<_>>()
            .await;
        Ok(entries)
    }

    /// Submits the market creation transaction built from the current form
    /// and waits for its receipt.
    ///
    /// When the receipt carries the `MarketCreated` event the form is reset
    /// and the market list refreshed.
    pub async fn create_market(&mut self) -> Result<MarketCreation, PerpsError> {
        self.error = None;
        self.set_creation_status(None);
        let creation = match self.submit_market().await {
            Ok(creation) => creation,
            Err(e) => {
                error!(%e, "Failed to create market");
                self.error = Some(format!(
                    "Failed to create market: {}",
                    transaction_message(&e)
                ));
                self.set_creation_status(None);
                return Err(e);
            }
        };

        match creation.market_id {
            Some(market_id) => {
                info!(%market_id, tx_hash = %creation.tx_hash, "Market created");
                self.set_creation_status(Some(CreationStatus::Created(market_id)));
                self.form.reset();
                if let Err(e) = self.fetch_markets().await {
                    warn!(%e, "Failed to refresh markets after creation");
                }
            }
            None => {
                warn!(tx_hash = %creation.tx_hash, "No MarketCreated event in receipt");
                self.set_creation_status(Some(CreationStatus::CreatedWithoutId(
                    creation.tx_hash,
                )));
            }
        }
        Ok(creation)
    }

    async fn submit_market(&self) -> Result<MarketCreation, PerpsError> {
        let (market, account) = match (&self.market, self.account) {
            (Some(market), Some(account)) => (market.clone(), account),
            _ => return Err(PerpsError::NotConnected),
        };
        let params = self.form.to_params()?;

        info!(?params, "Creating market");
        self.set_creation_status(Some(CreationStatus::Sending));

        let pending_tx = market
            .createMarket(
                params.market_name,
                params.market_symbol,
                params.initial_price,
                params.max_leverage,
                params.max_market_value,
                params.liquidation_buffer_ratio,
                params.maker_fee,
                params.taker_fee,
                params.skew_scale,
            )
            .from(account)
            .send()
            .await?;

        let tx_hash = *pending_tx.tx_hash();
        info!(%tx_hash, "Market creation transaction sent");
        self.set_creation_status(Some(CreationStatus::AwaitingConfirmation(tx_hash)));

        let receipt = pending_tx
            .with_timeout(Some(self.timeout))
            .get_receipt()
            .await?;
        debug!(?receipt, "Market creation receipt");

        let market_id =
            created_market_id(receipt.status(), receipt.inner.logs(), market.address())?;
        Ok(MarketCreation { tx_hash, market_id })
    }
}

/// ID of the market created by a confirmed transaction, a failed receipt
/// status is a revert.
fn created_market_id(
    status: bool,
    logs: &[Log],
    proxy: &Address,
) -> Result<Option<MarketId>, PerpsError> {
    if !status {
        return Err(PerpsError::Reverted(Box::new(RevertReason::Unknown)));
    }
    Ok(market::market_created_ids(logs, *proxy).first().copied())
}

impl fmt::Display for CreationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sending => write!(f, "Sending transaction..."),
            Self::AwaitingConfirmation(_) => {
                write!(f, "Transaction sent! Waiting for confirmation...")
            }
            Self::Created(market_id) => {
                write!(f, "Market created successfully! Market ID: {market_id}")
            }
            Self::CreatedWithoutId(_) => write!(
                f,
                "Market created but could not find market ID in transaction receipt"
            ),
        }
    }
}

/// Text shown to the user for the given failure.
pub fn user_message(error: &PerpsError) -> String {
    match error {
        PerpsError::UserRejected => {
            "Wallet connection rejected. Please approve the connection.".to_string()
        }
        PerpsError::RequestPending => {
            "Wallet request pending. Check your wallet and try again.".to_string()
        }
        PerpsError::NotConnected => "Connect wallet first".to_string(),
        PerpsError::NoAccounts => "No accounts returned by wallet.".to_string(),
        _ => error.to_string(),
    }
}

/// Text shown to the user for a failed transaction submission.
fn transaction_message(error: &PerpsError) -> String {
    match error {
        PerpsError::UserRejected => "Transaction rejected in wallet.".to_string(),
        _ => user_message(error),
    }
}
