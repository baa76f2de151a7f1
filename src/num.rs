use alloy::primitives::{I256, U256};
use fastnum::{
    UD256, bint,
    decimal::{Context, Decimal, RoundingMode, UnsignedDecimal},
};

/// Failure to read a user-provided decimal number.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("not a number")]
    NotANumber,

    #[error("too many fractional digits, at most {0} allowed")]
    TooPrecise(u8),
}

/// Fixed-point to decimal converter.
#[derive(Clone, Copy, Debug, Default)]
pub struct Converter {
    decimals: i32,
}

impl Converter {
    pub const fn new(decimals: u8) -> Self {
        Self {
            decimals: decimals as i32,
        }
    }

    pub fn decimals(&self) -> u8 {
        self.decimals as u8
    }

    pub fn from_unsigned<const N: usize>(&self, value: U256) -> UnsignedDecimal<N> {
        let unscaled = bint::UInt::<N>::from_le_slice(value.as_le_slice())
            .expect("Converter: U256 -> UInt::<N>");
        UnsignedDecimal::<N>::from_parts(
            unscaled,
            -self.decimals,
            Context::default().with_rounding_mode(RoundingMode::Floor),
        )
    }

    pub fn from_signed<const N: usize>(&self, value: I256) -> Decimal<N> {
        let unscaled = bint::UInt::<N>::from_le_slice(value.unsigned_abs().as_le_slice())
            .expect("Converter: abs(I256) -> UInt::<N>");
        Decimal::<N>::from_parts(
            unscaled,
            -self.decimals,
            match value.sign() {
                alloy::primitives::Sign::Negative => fastnum::decimal::Sign::Minus,
                alloy::primitives::Sign::Positive => fastnum::decimal::Sign::Plus,
            },
            Context::default().with_rounding_mode(RoundingMode::Floor),
        )
    }

    pub fn to_unsigned<const N: usize>(&self, value: UnsignedDecimal<N>) -> U256 {
        let rescaled = value.rescale(self.decimals as i16);
        U256::from_le_slice(rescaled.digits().to_radix_le(256).as_slice())
    }

    pub fn to_signed<const N: usize>(&self, value: Decimal<N>) -> I256 {
        let rescaled = value.rescale(self.decimals as i16);
        let mut res = I256::try_from_le_slice(rescaled.digits().to_radix_le(256).as_slice())
            .unwrap_or_default();
        if value.is_negative() {
            res = res.saturating_neg();
        }
        res
    }

    /// Reads a human-entered decimal like `"50000"` or `"0.5"` into its
    /// fixed-point representation.
    ///
    /// Only plain digits with an optional decimal point are accepted, no
    /// signs or exponents. Inputs carrying more fractional digits than the
    /// converter scale are rejected rather than silently truncated.
    pub fn parse_unsigned(&self, input: &str) -> Result<U256, ParseError> {
        let input = input.trim();
        let (int, frac) = input.split_once('.').unwrap_or((input, ""));
        let is_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (int.is_empty() && frac.is_empty()) || !is_digits(int) || !is_digits(frac) {
            return Err(ParseError::NotANumber);
        }

        let normalized = format!(
            "{}.{}",
            if int.is_empty() { "0" } else { int },
            if frac.is_empty() { "0" } else { frac }
        );
        let value = UD256::from_str(&normalized, Context::default())
            .map_err(|_| ParseError::NotANumber)?;
        let fixed = self.to_unsigned(value);
        if self.from_unsigned::<4>(fixed) != value {
            return Err(ParseError::TooPrecise(self.decimals()));
        }
        Ok(fixed)
    }
}
