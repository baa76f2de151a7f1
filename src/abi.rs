#[allow(clippy::too_many_arguments)]
pub mod perps {
    alloy::sol!(
        #[derive(Debug)]
        #[sol(rpc)]
        interface PerpsMarket {
            /// Aggregated market statistics, values are 18-decimal fixed point
            /// except the funding rate which carries 9 decimals.
            struct MarketSummary {
                uint256 openInterest;
                int256 fundingRate;
                uint256 volume;
                int256 skew;
                int256 unrealizedPnl;
                string marketName;
                string marketSymbol;
            }

            error Unauthorized(address account);
            error InvalidMarket(uint128 marketId);
            error InvalidParameter(string parameter, string reason);
            error MarketAlreadyExists(string marketSymbol);

            event MarketCreated(uint128 indexed marketId, string marketName, string marketSymbol);

            function getMarkets() external view returns (uint128[] memory marketIds);

            function getMarketSummary(uint128 marketId) external view returns (MarketSummary memory summary);

            function createMarket(
                string memory marketName,
                string memory marketSymbol,
                uint256 initialPrice,
                uint256 maxLeverage,
                uint256 maxMarketValue,
                uint256 liquidationBufferRatio,
                uint256 makerFee,
                uint256 takerFee,
                uint256 skewScale
            ) external returns (uint128 marketId);
        }
    );
}
