//! New market form.
//!
//! Every field stays a plain string while being edited, conversion to
//! on-chain fixed-point values happens only once the form is submitted.

use alloy::primitives::U256;

use crate::num::{self, Converter};

/// Scale of price, leverage and market value arguments.
const WAD: Converter = Converter::new(18);

const DEFAULT_MAX_LEVERAGE: &str = "10";
const DEFAULT_MAX_MARKET_VALUE: &str = "1000000";
/// 10% in basis points.
const DEFAULT_LIQUIDATION_BUFFER_RATIO: &str = "1000";
/// 1.0 in 18 decimals.
const DEFAULT_SKEW_SCALE: &str = "1000000000000000000";
/// 0.1% in basis points.
const DEFAULT_MAKER_FEE: &str = "10";
/// 0.15% in basis points.
const DEFAULT_TAKER_FEE: &str = "15";

/// Form field, used to point at the offending input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, derive_more::Display)]
pub enum Field {
    #[display("market name")]
    Name,
    #[display("symbol")]
    Symbol,
    #[display("initial price")]
    Price,
    #[display("max leverage")]
    MaxLeverage,
    #[display("max market value")]
    MaxMarketValue,
    #[display("liquidation buffer ratio")]
    LiquidationBufferRatio,
    #[display("skew scale")]
    SkewScale,
    #[display("maker fee")]
    MakerFee,
    #[display("taker fee")]
    TakerFee,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("{0} is required")]
    Missing(Field),

    #[error("invalid {0}: {1}")]
    InvalidNumber(Field, num::ParseError),

    #[error("invalid {0}: expected a whole number")]
    InvalidInteger(Field),
}

/// User input for a new market.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewMarketForm {
    pub name: String,
    pub symbol: String,
    pub price: String,
    pub max_leverage: String,
    pub max_market_value: String,
    pub liquidation_buffer_ratio: String,
    pub skew_scale: String,
    pub maker_fee: String,
    pub taker_fee: String,
}

/// Arguments of the `createMarket` contract call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateMarketParams {
    pub market_name: String,
    pub market_symbol: String,
    pub initial_price: U256,
    pub max_leverage: U256,
    pub max_market_value: U256,
    pub liquidation_buffer_ratio: U256,
    pub maker_fee: U256,
    pub taker_fee: U256,
    pub skew_scale: U256,
}

impl Default for NewMarketForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            symbol: String::new(),
            price: String::new(),
            max_leverage: DEFAULT_MAX_LEVERAGE.to_string(),
            max_market_value: DEFAULT_MAX_MARKET_VALUE.to_string(),
            liquidation_buffer_ratio: DEFAULT_LIQUIDATION_BUFFER_RATIO.to_string(),
            skew_scale: DEFAULT_SKEW_SCALE.to_string(),
            maker_fee: DEFAULT_MAKER_FEE.to_string(),
            taker_fee: DEFAULT_TAKER_FEE.to_string(),
        }
    }
}

impl NewMarketForm {
    /// Restores the initial, mostly defaulted, field values.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Converts the form into contract call arguments.
    ///
    /// Price, max leverage and max market value are 18-decimal fixed point,
    /// the remaining numeric fields are passed as raw integers.
    pub fn to_params(&self) -> Result<CreateMarketParams, FormError> {
        Ok(CreateMarketParams {
            market_name: required(&self.name, Field::Name)?.to_string(),
            market_symbol: required(&self.symbol, Field::Symbol)?.to_string(),
            initial_price: wad(&self.price, Field::Price)?,
            max_leverage: wad(&self.max_leverage, Field::MaxLeverage)?,
            max_market_value: wad(&self.max_market_value, Field::MaxMarketValue)?,
            liquidation_buffer_ratio: integer(
                &self.liquidation_buffer_ratio,
                Field::LiquidationBufferRatio,
            )?,
            maker_fee: integer(&self.maker_fee, Field::MakerFee)?,
            taker_fee: integer(&self.taker_fee, Field::TakerFee)?,
            skew_scale: integer(&self.skew_scale, Field::SkewScale)?,
        })
    }
}

fn required(value: &str, field: Field) -> Result<&str, FormError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FormError::Missing(field));
    }
    Ok(value)
}

fn wad(value: &str, field: Field) -> Result<U256, FormError> {
    WAD.parse_unsigned(required(value, field)?)
        .map_err(|e| FormError::InvalidNumber(field, e))
}

fn integer(value: &str, field: Field) -> Result<U256, FormError> {
    let value = required(value, field)?;
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FormError::InvalidInteger(field));
    }
    U256::from_str_radix(value, 10).map_err(|_| FormError::InvalidInteger(field))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn btc_form() -> NewMarketForm {
        NewMarketForm {
            name: "Bitcoin Perpetual".to_string(),
            symbol: "BTC-PERP".to_string(),
            price: "50000".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let form = NewMarketForm::default();
        assert!(form.name.is_empty());
        assert!(form.price.is_empty());
        assert_eq!(form.max_leverage, "10");
        assert_eq!(form.max_market_value, "1000000");
        assert_eq!(form.liquidation_buffer_ratio, "1000");
        assert_eq!(form.skew_scale, "1000000000000000000");
        assert_eq!(form.maker_fee, "10");
        assert_eq!(form.taker_fee, "15");
    }

    #[test]
    fn test_to_params() {
        let params = btc_form().to_params().unwrap();
        let e18 = U256::from(10u64).pow(U256::from(18));

        assert_eq!(params.market_name, "Bitcoin Perpetual");
        assert_eq!(params.market_symbol, "BTC-PERP");
        assert_eq!(params.initial_price, U256::from(50_000) * e18);
        assert_eq!(params.max_leverage, U256::from(10) * e18);
        assert_eq!(params.max_market_value, U256::from(1_000_000) * e18);
        assert_eq!(params.liquidation_buffer_ratio, U256::from(1000));
        assert_eq!(params.maker_fee, U256::from(10));
        assert_eq!(params.taker_fee, U256::from(15));
        assert_eq!(params.skew_scale, e18);
    }

    #[test]
    fn test_fractional_price() {
        let form = NewMarketForm {
            price: "0.0005".to_string(),
            ..btc_form()
        };
        assert_eq!(
            form.to_params().unwrap().initial_price,
            U256::from(500_000_000_000_000u64)
        );
    }

    #[test]
    fn test_required_fields() {
        let form = NewMarketForm {
            symbol: "  ".to_string(),
            ..btc_form()
        };
        assert_eq!(form.to_params(), Err(FormError::Missing(Field::Symbol)));

        let form = NewMarketForm {
            price: String::new(),
            ..btc_form()
        };
        assert_eq!(form.to_params(), Err(FormError::Missing(Field::Price)));
    }

    #[test]
    fn test_invalid_numbers() {
        let form = NewMarketForm {
            max_leverage: "ten".to_string(),
            ..btc_form()
        };
        assert_eq!(
            form.to_params(),
            Err(FormError::InvalidNumber(
                Field::MaxLeverage,
                num::ParseError::NotANumber
            ))
        );

        let form = NewMarketForm {
            maker_fee: "0.1".to_string(),
            ..btc_form()
        };
        assert_eq!(
            form.to_params(),
            Err(FormError::InvalidInteger(Field::MakerFee))
        );
        assert_eq!(
            FormError::InvalidInteger(Field::MakerFee).to_string(),
            "invalid maker fee: expected a whole number"
        );
    }

    #[test]
    fn test_reset() {
        let mut form = btc_form();
        form.taker_fee = "20".to_string();
        form.reset();
        assert_eq!(form, NewMarketForm::default());
    }
}
