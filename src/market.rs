use alloy::{primitives::Address, rpc::types::Log, sol_types::SolEvent};
use fastnum::{D256, UD256};

use crate::{abi::perps::PerpsMarket, num};

/// ID of the perpetual market.
pub type MarketId = u128;

/// Scale of open interest, volume, skew and PnL.
const VALUE_DECIMALS: u8 = 18;
/// Scale of the funding rate, expressed in percent.
const FUNDING_RATE_DECIMALS: u8 = 9;

const UNKNOWN_NAME: &str = "Unknown";
const UNKNOWN_SYMBOL: &str = "---";
const ERROR_NAME: &str = "Error loading";

/// On-chain statistics of a single market.
#[derive(Clone, Copy, PartialEq, derive_more::Debug)]
pub struct MarketSummary {
    #[debug("{open_interest}")]
    open_interest: UD256,
    #[debug("{funding_rate}")]
    funding_rate: D256,
    #[debug("{volume}")]
    volume: UD256,
    #[debug("{skew}")]
    skew: D256,
    #[debug("{unrealized_pnl}")]
    unrealized_pnl: D256,
}

/// Market as listed by the dashboard.
///
/// `summary` is absent when the summary read failed, the rest of the
/// list is still usable in that case.
#[derive(Clone, Debug, PartialEq)]
pub struct MarketEntry {
    id: MarketId,
    name: String,
    symbol: String,
    summary: Option<MarketSummary>,
}

impl MarketSummary {
    pub fn open_interest(&self) -> UD256 {
        self.open_interest
    }

    /// Funding rate in percent.
    pub fn funding_rate(&self) -> D256 {
        self.funding_rate
    }

    pub fn volume(&self) -> UD256 {
        self.volume
    }

    pub fn skew(&self) -> D256 {
        self.skew
    }

    pub fn unrealized_pnl(&self) -> D256 {
        self.unrealized_pnl
    }
}

impl From<&PerpsMarket::MarketSummary> for MarketSummary {
    fn from(value: &PerpsMarket::MarketSummary) -> Self {
        let value_converter = num::Converter::new(VALUE_DECIMALS);
        let funding_rate_converter = num::Converter::new(FUNDING_RATE_DECIMALS);
        Self {
            open_interest: value_converter.from_unsigned(value.openInterest),
            funding_rate: funding_rate_converter.from_signed(value.fundingRate),
            volume: value_converter.from_unsigned(value.volume),
            skew: value_converter.from_signed(value.skew),
            unrealized_pnl: value_converter.from_signed(value.unrealizedPnl),
        }
    }
}

impl MarketEntry {
    pub(crate) fn loaded(id: MarketId, summary: &PerpsMarket::MarketSummary) -> Self {
        Self {
            id,
            name: non_empty_or(&summary.marketName, UNKNOWN_NAME),
            symbol: non_empty_or(&summary.marketSymbol, UNKNOWN_SYMBOL),
            summary: Some(summary.into()),
        }
    }

    pub(crate) fn failed(id: MarketId) -> Self {
        Self {
            id,
            name: ERROR_NAME.to_string(),
            symbol: UNKNOWN_SYMBOL.to_string(),
            summary: None,
        }
    }

    pub fn id(&self) -> MarketId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn summary(&self) -> Option<&MarketSummary> {
        self.summary.as_ref()
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// Returns IDs of all markets reported created by `proxy` in the given
/// receipt logs, in log order.
pub fn market_created_ids(logs: &[Log], proxy: Address) -> Vec<MarketId> {
    logs.iter()
        .filter(|log| log.inner.address == proxy)
        .filter_map(|log| PerpsMarket::MarketCreated::decode_log(&log.inner).ok())
        .map(|log| log.data.marketId)
        .collect()
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{self, I256, U256, address};
    use fastnum::{dec256, udec256};

    use super::*;

    const PROXY: Address = address!("0xf53Ca60F031FAf0E347D44FbaA4870da68250c8d");

    fn wad(value: u64) -> U256 {
        U256::from(value) * U256::from(10u64).pow(U256::from(18))
    }

    fn raw_summary(name: &str, symbol: &str) -> PerpsMarket::MarketSummary {
        PerpsMarket::MarketSummary {
            openInterest: wad(1_250_000),
            fundingRate: I256::try_from(-12_500_000).unwrap(),
            volume: wad(42),
            skew: I256::ZERO,
            unrealizedPnl: I256::try_from(-3_500_000_000_000_000_000i128).unwrap(),
            marketName: name.to_string(),
            marketSymbol: symbol.to_string(),
        }
    }

    fn rpc_log(address: Address, data: primitives::LogData) -> Log {
        Log {
            inner: primitives::Log { address, data },
            ..Default::default()
        }
    }

    fn created(id: MarketId) -> primitives::LogData {
        PerpsMarket::MarketCreated {
            marketId: id,
            marketName: "Bitcoin Perpetual".to_string(),
            marketSymbol: "BTC-PERP".to_string(),
        }
        .encode_log_data()
    }

    #[test]
    fn test_summary_conversion() {
        let summary = MarketSummary::from(&raw_summary("Bitcoin", "BTC"));
        assert_eq!(summary.open_interest(), udec256!(1250000));
        assert_eq!(summary.funding_rate(), dec256!(-0.0125));
        assert_eq!(summary.volume(), udec256!(42));
        assert_eq!(summary.skew(), dec256!(0));
        assert_eq!(summary.unrealized_pnl(), dec256!(-3.5));
    }

    #[test]
    fn test_entry_fallback_labels() {
        let entry = MarketEntry::loaded(7, &raw_summary("", ""));
        assert_eq!(entry.id(), 7);
        assert_eq!(entry.name(), "Unknown");
        assert_eq!(entry.symbol(), "---");
        assert!(entry.summary().is_some());

        let entry = MarketEntry::failed(8);
        assert_eq!(entry.name(), "Error loading");
        assert_eq!(entry.symbol(), "---");
        assert!(entry.summary().is_none());
    }

    #[test]
    fn test_market_created_ids() {
        let other = address!("0x0000000000000000000000000000000000000bad");
        let unrelated = primitives::LogData::new_unchecked(
            vec![primitives::B256::repeat_byte(0x11)],
            primitives::Bytes::new(),
        );
        let logs = vec![
            rpc_log(PROXY, unrelated),
            rpc_log(other, created(99)),
            rpc_log(PROXY, created(3)),
            rpc_log(PROXY, created(4)),
        ];
        assert_eq!(market_created_ids(&logs, PROXY), vec![3, 4]);
    }

    #[test]
    fn test_market_created_ids_empty_receipt() {
        assert!(market_created_ids(&[], PROXY).is_empty());
    }
}
