//! Simple-interest accrual.
//!
//! Interest is never compounded in storage. A balance record keeps the value
//! folded in at its last checkpoint; [`accrue`] inflates that value for the
//! time elapsed since. The mutating paths and the read path all go through
//! the same function so they cannot diverge.

use std::fmt;

use serde::{Deserialize, Serialize};

use depositledger_common::constants::SECONDS_PER_YEAR;
use depositledger_common::{Amount, LedgerError, Result};

/// Basis points in 100%.
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Default annual rate: 5%.
pub const DEFAULT_RATE_BPS: u32 = 500;

/// Flat annual interest rate in basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InterestRate(u32);

impl InterestRate {
    /// Create from basis points. Rates above 100% are rejected.
    pub fn from_bps(bps: u32) -> Result<Self> {
        if bps > BPS_DENOMINATOR {
            return Err(LedgerError::Configuration(format!(
                "Interest rate {bps} bps exceeds maximum {BPS_DENOMINATOR} bps"
            )));
        }
        Ok(Self(bps))
    }

    /// Rate in basis points.
    pub fn bps(&self) -> u32 {
        self.0
    }
}

impl Default for InterestRate {
    fn default() -> Self {
        Self(DEFAULT_RATE_BPS)
    }
}

impl fmt::Display for InterestRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

/// Interest earned by `principal` over `elapsed_secs`, floored.
///
/// Exactly `floor(principal * bps * elapsed / (10_000 * SECONDS_PER_YEAR))`.
/// The principal is split into whole multiples of the denominator and a
/// remainder, so the intermediate product never grows past
/// `denominator * bps * elapsed` and large balances keep accruing.
pub fn interest_for(principal: Amount, elapsed_secs: u64, rate: InterestRate) -> Result<Amount> {
    if principal == 0 || elapsed_secs == 0 || rate.bps() == 0 {
        return Ok(0);
    }

    let denominator = Amount::from(BPS_DENOMINATOR) * Amount::from(SECONDS_PER_YEAR);
    let factor = Amount::from(rate.bps())
        .checked_mul(Amount::from(elapsed_secs))
        .ok_or(LedgerError::ArithmeticOverflow)?;

    let whole = (principal / denominator)
        .checked_mul(factor)
        .ok_or(LedgerError::ArithmeticOverflow)?;
    let fraction = (principal % denominator)
        .checked_mul(factor)
        .ok_or(LedgerError::ArithmeticOverflow)?
        / denominator;

    whole
        .checked_add(fraction)
        .ok_or(LedgerError::ArithmeticOverflow)
}

/// Effective value of `principal` after `elapsed_secs` of accrual.
pub fn accrue(principal: Amount, elapsed_secs: u64, rate: InterestRate) -> Result<Amount> {
    principal
        .checked_add(interest_for(principal, elapsed_secs, rate)?)
        .ok_or(LedgerError::ArithmeticOverflow)
}
