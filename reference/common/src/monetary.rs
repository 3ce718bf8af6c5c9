//! Asset kinds and integer amounts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::error::LedgerError;

/// An amount in the asset's smallest indivisible unit (wei-equivalent).
pub type Amount = u128;

/// Decimal places of the native asset.
pub const NATIVE_DECIMALS: u32 = 18;

/// One whole native coin in smallest units.
pub const ONE_NATIVE: Amount = 1_000_000_000_000_000_000;

/// The asset class a request operates on.
///
/// The ordinal encoding (`0 = Native`, `1 = Token`) is part of the public
/// interface and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum AssetKind {
    /// The chain's base currency, attached directly to a call.
    Native = 0,
    /// The configured fungible token, pulled under a prior allowance.
    Token = 1,
}

impl AssetKind {
    /// Both asset kinds, in ordinal order.
    pub const ALL: [AssetKind; 2] = [AssetKind::Native, AssetKind::Token];

    /// Stable ordinal of this kind.
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Decode from the stable ordinal.
    pub fn from_ordinal(ordinal: u8) -> Result<Self, LedgerError> {
        match ordinal {
            0 => Ok(AssetKind::Native),
            1 => Ok(AssetKind::Token),
            other => Err(LedgerError::UnknownAssetKind(other)),
        }
    }

    /// Lowercase label used in logs and the CLI.
    pub fn label(self) -> &'static str {
        match self {
            AssetKind::Native => "native",
            AssetKind::Token => "token",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<u8> for AssetKind {
    type Error = LedgerError;

    fn try_from(ordinal: u8) -> Result<Self, Self::Error> {
        Self::from_ordinal(ordinal)
    }
}

impl From<AssetKind> for u8 {
    fn from(kind: AssetKind) -> Self {
        kind.ordinal()
    }
}

impl FromStr for AssetKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "native" | "eth" => Ok(AssetKind::Native),
            "token" | "erc20" => Ok(AssetKind::Token),
            other => other
                .parse::<u8>()
                .map_err(|_| LedgerError::Configuration(format!("Unknown asset kind: {s}")))
                .and_then(AssetKind::from_ordinal),
        }
    }
}

/// Errors produced when parsing a human-readable amount.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    /// Not a decimal number.
    #[error("Invalid amount: {0}")]
    Invalid(String),

    /// Negative amounts are never valid.
    #[error("Amount cannot be negative")]
    Negative,

    /// More fractional digits than the asset supports.
    #[error("Amount has {scale} fractional digits, asset supports {decimals}")]
    ExcessPrecision { scale: u32, decimals: u32 },

    /// Does not fit into the smallest-unit integer.
    #[error("Amount out of range")]
    Overflow,
}

/// Parse a decimal string such as `"1.5"` into smallest units.
pub fn parse_units(text: &str, decimals: u32) -> Result<Amount, AmountError> {
    let value = Decimal::from_str_exact(text.trim())
        .map_err(|e| AmountError::Invalid(e.to_string()))?;

    if value.is_sign_negative() && !value.is_zero() {
        return Err(AmountError::Negative);
    }

    let scale = value.scale();
    if scale > decimals {
        return Err(AmountError::ExcessPrecision { scale, decimals });
    }

    let mantissa: Amount = value.mantissa().unsigned_abs();
    10u128
        .checked_pow(decimals - scale)
        .and_then(|factor| mantissa.checked_mul(factor))
        .ok_or(AmountError::Overflow)
}

/// Render smallest units as a decimal string, trailing zeros trimmed.
///
/// Amounts beyond the decimal type's 96-bit mantissa fall back to the raw
/// integer with a `units` suffix.
pub fn format_units(amount: Amount, decimals: u32) -> String {
    i128::try_from(amount)
        .ok()
        .and_then(|raw| Decimal::try_from_i128_with_scale(raw, decimals).ok())
        .map(|value| value.normalize().to_string())
        .unwrap_or_else(|| format!("{amount} units"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_asset_kind_ordinals() {
        assert_eq!(AssetKind::Native.ordinal(), 0);
        assert_eq!(AssetKind::Token.ordinal(), 1);
        assert_eq!(AssetKind::from_ordinal(1).unwrap(), AssetKind::Token);
        assert!(matches!(
            AssetKind::from_ordinal(2),
            Err(LedgerError::UnknownAssetKind(2))
        ));
    }

    #[test]
    fn test_asset_kind_from_str() {
        assert_eq!("native".parse::<AssetKind>().unwrap(), AssetKind::Native);
        assert_eq!("Token".parse::<AssetKind>().unwrap(), AssetKind::Token);
        assert_eq!("0".parse::<AssetKind>().unwrap(), AssetKind::Native);
        assert!("gold".parse::<AssetKind>().is_err());
        assert!("7".parse::<AssetKind>().is_err());
    }

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_units("1", NATIVE_DECIMALS).unwrap(), ONE_NATIVE);
        assert_eq!(parse_units("1.05", NATIVE_DECIMALS).unwrap(), 1_050_000_000_000_000_000);
        assert_eq!(parse_units("1000", NATIVE_DECIMALS).unwrap(), 1_000 * ONE_NATIVE);
        assert_eq!(parse_units("0", NATIVE_DECIMALS).unwrap(), 0);
        assert_eq!(parse_units("-1", NATIVE_DECIMALS), Err(AmountError::Negative));
        assert_eq!(
            parse_units("0.123", 2),
            Err(AmountError::ExcessPrecision { scale: 3, decimals: 2 })
        );
        assert!(matches!(parse_units("abc", 2), Err(AmountError::Invalid(_))));
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(ONE_NATIVE, NATIVE_DECIMALS), "1");
        assert_eq!(format_units(1_050_000_000_000_000_000, NATIVE_DECIMALS), "1.05");
        assert_eq!(format_units(0, NATIVE_DECIMALS), "0");
        assert_eq!(format_units(u128::MAX, NATIVE_DECIMALS), format!("{} units", u128::MAX));
    }

    #[test]
    fn test_format_matches_decimal() {
        let formatted = format_units(123_450_000_000_000_000_000, NATIVE_DECIMALS);
        assert_eq!(formatted.parse::<Decimal>().unwrap(), dec!(123.45));
    }
}
