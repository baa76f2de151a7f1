//! Test doubles and local test environment.
//!
//! [`MockWallet`] is a scripted [`WalletProvider`] recording every request it
//! receives. Its provider runs over a mocked transport: contract reads are
//! answered in order from responses queued with [`MockWallet::push_markets`],
//! [`MockWallet::push_summary`] and [`MockWallet::push_failure`].
//!
//! [`TestNode`] spins up Anvil with the requested chain ID and hands out
//! [`LocalWallet`]s for its pre-funded accounts. [`TestNode::deploy_market`]
//! places a stand-in market proxy on it.

use std::sync::Mutex;

use alloy::{
    node_bindings::{Anvil, AnvilInstance},
    primitives::{Address, Bytes, I256, U256, address},
    providers::{DynProvider, ProviderBuilder, ext::AnvilApi},
    rpc::json_rpc::ErrorPayload,
    signers::local::PrivateKeySigner,
    transports::mock::Asserter,
};
use alloy_sol_types::{SolCall, SolEvent, SolValue};

use crate::{
    Chain,
    abi::perps::PerpsMarket,
    error::PerpsError,
    market::MarketId,
    wallet::{AddChainParams, LocalWallet, WalletProvider},
};

/// Address of the market proxy used with local test chains.
/// Nothing is deployed there on a fresh node.
pub const TEST_MARKET_PROXY: Address = address!("0x000000000000000000000000000000000000beef");

/// Request received by the [`MockWallet`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalletRequest {
    RequestAccounts,
    ChainId,
    SwitchChain(u64),
    AddChain(AddChainParams),
}

#[derive(Debug)]
struct MockState {
    chain_id: u64,
    known_chains: Vec<u64>,
    requests: Vec<WalletRequest>,
}

#[derive(derive_more::Debug)]
pub struct MockWallet {
    accounts: Vec<Address>,
    reject_accounts: bool,
    reject_switch: bool,
    state: Mutex<MockState>,
    #[debug(skip)]
    asserter: Asserter,
    provider: DynProvider,
}

impl MockWallet {
    /// Wallet connected to `chain_id` with a single account, knowing no other chains.
    pub fn new(chain_id: u64) -> Self {
        let asserter = Asserter::new();
        let provider = DynProvider::new(
            ProviderBuilder::new()
                .disable_recommended_fillers()
                .connect_mocked_client(asserter.clone()),
        );
        Self {
            accounts: vec![address!("0x00000000000000000000000000000000000a11ce")],
            reject_accounts: false,
            reject_switch: false,
            state: Mutex::new(MockState {
                chain_id,
                known_chains: vec![chain_id],
                requests: vec![],
            }),
            asserter,
            provider,
        }
    }

    pub fn with_accounts(mut self, accounts: Vec<Address>) -> Self {
        self.accounts = accounts;
        self
    }

    pub fn with_known_chains(self, chains: Vec<u64>) -> Self {
        self.state.lock().unwrap().known_chains = chains;
        self
    }

    /// User declines the connection prompt.
    pub fn rejecting_accounts(mut self) -> Self {
        self.reject_accounts = true;
        self
    }

    /// User declines the chain switch prompt.
    pub fn rejecting_switch(mut self) -> Self {
        self.reject_switch = true;
        self
    }

    pub fn accounts(&self) -> &[Address] {
        &self.accounts
    }

    pub fn requests(&self) -> Vec<WalletRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// User switches the network from within the wallet.
    pub fn set_chain_id(&self, chain_id: u64) {
        let mut state = self.state.lock().unwrap();
        state.chain_id = chain_id;
        if !state.known_chains.contains(&chain_id) {
            state.known_chains.push(chain_id);
        }
    }

    /// Queues the `getMarkets` call result.
    pub fn push_markets(&self, ids: Vec<MarketId>) {
        self.asserter
            .push_success(&Bytes::from((ids,).abi_encode_params()));
    }

    /// Queues a `getMarketSummary` call result.
    pub fn push_summary(&self, summary: PerpsMarket::MarketSummary) {
        self.asserter
            .push_success(&Bytes::from((summary,).abi_encode_params()));
    }

    /// Queues a failed RPC response.
    pub fn push_failure(&self, message: &'static str) {
        self.asserter.push_failure_msg(message);
    }

    /// Queues the user declining the next request in the wallet prompt.
    pub fn push_rejection(&self) {
        self.asserter.push_failure(ErrorPayload {
            code: 4001,
            message: "User rejected the request.".into(),
            data: None,
        });
    }

    fn record(&self, request: WalletRequest) {
        self.state.lock().unwrap().requests.push(request);
    }
}

impl WalletProvider for MockWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, PerpsError> {
        self.record(WalletRequest::RequestAccounts);
        if self.reject_accounts {
            return Err(PerpsError::UserRejected);
        }
        Ok(self.accounts.clone())
    }

    async fn chain_id(&self) -> Result<u64, PerpsError> {
        self.record(WalletRequest::ChainId);
        Ok(self.state.lock().unwrap().chain_id)
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), PerpsError> {
        self.record(WalletRequest::SwitchChain(chain_id));
        if self.reject_switch {
            return Err(PerpsError::UserRejected);
        }
        let mut state = self.state.lock().unwrap();
        if !state.known_chains.contains(&chain_id) {
            return Err(PerpsError::UnrecognizedChain);
        }
        state.chain_id = chain_id;
        Ok(())
    }

    async fn add_chain(&self, params: &AddChainParams) -> Result<(), PerpsError> {
        self.record(WalletRequest::AddChain(params.clone()));
        let chain_id = params.chain_id.to();
        let mut state = self.state.lock().unwrap();
        state.known_chains.push(chain_id);
        state.chain_id = chain_id;
        Ok(())
    }

    fn provider(&self) -> DynProvider {
        self.provider.clone()
    }
}

/// Market summary with round numbers, 18 decimals for amounts
/// and 9 decimals for the funding rate.
pub fn summary(
    name: &str,
    symbol: &str,
    open_interest: u64,
    funding_rate: i64,
    volume: u64,
    unrealized_pnl: i64,
) -> PerpsMarket::MarketSummary {
    let e18 = U256::from(10u64).pow(U256::from(18));
    PerpsMarket::MarketSummary {
        openInterest: U256::from(open_interest) * e18,
        fundingRate: I256::try_from(funding_rate).unwrap(),
        volume: U256::from(volume) * e18,
        skew: I256::ZERO,
        unrealizedPnl: I256::try_from(unrealized_pnl).unwrap()
            * I256::try_from(e18).unwrap(),
        marketName: name.to_string(),
        marketSymbol: symbol.to_string(),
    }
}

/// Local Anvil node.
#[derive(Debug)]
pub struct TestNode {
    anvil: AnvilInstance,
}

impl TestNode {
    pub fn new(chain_id: u64) -> Self {
        let anvil = Anvil::new().chain_id(chain_id).try_spawn().unwrap();
        Self { anvil }
    }

    pub fn chain_id(&self) -> u64 {
        self.anvil.chain_id()
    }

    /// Chain description pointing at this node and [`TEST_MARKET_PROXY`].
    pub fn chain(&self) -> Chain {
        Chain::custom(
            self.chain_id(),
            "Anvil",
            self.anvil.endpoint(),
            "http://localhost",
            TEST_MARKET_PROXY,
        )
    }

    /// Wallet for the node's pre-funded account `idx`.
    pub fn wallet(&self, idx: usize) -> LocalWallet {
        let signer = PrivateKeySigner::from_slice(&self.anvil.keys()[idx].to_bytes()).unwrap();
        LocalWallet::new(signer, self.anvil.endpoint_url())
    }

    /// Places a stand-in market proxy at [`TEST_MARKET_PROXY`].
    ///
    /// It lists the single market `market_id` with the given summary and
    /// emits `MarketCreated` for it on every other call.
    pub async fn deploy_market(&self, market_id: MarketId, summary: PerpsMarket::MarketSummary) {
        let provider = ProviderBuilder::new().connect_http(self.anvil.endpoint_url());
        provider
            .anvil_set_code(TEST_MARKET_PROXY, market_proxy_code(market_id, summary))
            .await
            .unwrap();
    }
}

mod op {
    pub const STOP: u8 = 0x00;
    pub const EQ: u8 = 0x14;
    pub const SHR: u8 = 0x1c;
    pub const CALLDATALOAD: u8 = 0x35;
    pub const CODECOPY: u8 = 0x39;
    pub const JUMPI: u8 = 0x57;
    pub const JUMPDEST: u8 = 0x5b;
    pub const PUSH1: u8 = 0x60;
    pub const PUSH2: u8 = 0x61;
    pub const PUSH4: u8 = 0x63;
    pub const PUSH32: u8 = 0x7f;
    pub const DUP1: u8 = 0x80;
    pub const LOG2: u8 = 0xa2;
    pub const RETURN: u8 = 0xf3;
}

/// Sizes of the fixed-length code sections below.
const SELECTOR_LOAD_LEN: usize = 6;
const DISPATCH_LEN: usize = 11;
const EMIT_LEN: usize = 82;
const RETURN_LEN: usize = 16;

/// Runtime code answering `getMarkets` and `getMarketSummary` with constant
/// data, any other call emits `MarketCreated` and stops.
///
/// Return data and event data are appended after the code and copied to
/// memory with `CODECOPY`.
fn market_proxy_code(market_id: MarketId, summary: PerpsMarket::MarketSummary) -> Bytes {
    let created = PerpsMarket::MarketCreated {
        marketId: market_id,
        marketName: summary.marketName.clone(),
        marketSymbol: summary.marketSymbol.clone(),
    }
    .encode_log_data();
    let reads = [
        (
            PerpsMarket::getMarketsCall::SELECTOR,
            (vec![market_id],).abi_encode_params(),
        ),
        (
            PerpsMarket::getMarketSummaryCall::SELECTOR,
            (summary,).abi_encode_params(),
        ),
    ];

    let bodies_start = SELECTOR_LOAD_LEN + DISPATCH_LEN * reads.len() + EMIT_LEN;
    let data_start = bodies_start + RETURN_LEN * reads.len();
    let word = |value: usize| u16::try_from(value).unwrap().to_be_bytes();

    let mut code = vec![op::PUSH1, 0, op::CALLDATALOAD, op::PUSH1, 0xe0, op::SHR];
    for (idx, (selector, _)) in reads.iter().enumerate() {
        code.extend([op::DUP1, op::PUSH4]);
        code.extend(selector);
        code.extend([op::EQ, op::PUSH2]);
        code.extend(word(bodies_start + RETURN_LEN * idx));
        code.push(op::JUMPI);
    }

    let mut offset = data_start;
    let event_data = created.data.as_ref();
    code.push(op::PUSH2);
    code.extend(word(event_data.len()));
    code.push(op::PUSH2);
    code.extend(word(offset));
    code.extend([op::PUSH1, 0, op::CODECOPY, op::PUSH32]);
    code.extend(created.topics()[1].as_slice());
    code.push(op::PUSH32);
    code.extend(created.topics()[0].as_slice());
    code.push(op::PUSH2);
    code.extend(word(event_data.len()));
    code.extend([op::PUSH1, 0, op::LOG2, op::STOP]);
    offset += event_data.len();

    for (_, output) in &reads {
        code.extend([op::JUMPDEST, op::PUSH2]);
        code.extend(word(output.len()));
        code.push(op::PUSH2);
        code.extend(word(offset));
        code.extend([op::PUSH1, 0, op::CODECOPY, op::PUSH2]);
        code.extend(word(output.len()));
        code.extend([op::PUSH1, 0, op::RETURN]);
        offset += output.len();
    }
    assert_eq!(code.len(), data_start, "market proxy code layout");

    code.extend(event_data);
    for (_, output) in reads {
        code.extend(output);
    }
    Bytes::from(code)
}
