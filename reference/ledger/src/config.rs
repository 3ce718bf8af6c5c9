//! Ledger configuration.

use depositledger_common::{Address, LedgerError, Result};

use crate::interest::{InterestRate, BPS_DENOMINATOR, DEFAULT_RATE_BPS};

/// Construction parameters of a ledger.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Address of the fungible token accepted on the Token path.
    pub token_address: Address,
    /// Annual interest rate in basis points.
    pub annual_rate_bps: u32,
    /// Log level.
    pub log_level: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            token_address: Address::ZERO,
            annual_rate_bps: DEFAULT_RATE_BPS,
            log_level: "info".to_string(),
        }
    }
}

impl LedgerConfig {
    /// Create a config for `token_address` with defaults elsewhere.
    pub fn for_token(token_address: Address) -> Self {
        Self {
            token_address,
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Reads `ERC20_CONTRACT_ADDRESS`, `INTEREST_RATE_BPS` and `LOG_LEVEL`.
    /// Unset variables keep their defaults; malformed ones are errors.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(addr) = lookup("ERC20_CONTRACT_ADDRESS") {
            config.token_address = addr.parse().map_err(|e| {
                LedgerError::Configuration(format!("ERC20_CONTRACT_ADDRESS: {e}"))
            })?;
        }

        if let Some(rate) = lookup("INTEREST_RATE_BPS") {
            config.annual_rate_bps = rate.trim().parse().map_err(|_| {
                LedgerError::Configuration(format!("INTEREST_RATE_BPS is not an integer: {rate}"))
            })?;
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            config.log_level = level;
        }

        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.token_address.is_zero() {
            return Err(LedgerError::Configuration(
                "Token address cannot be the zero address".to_string(),
            ));
        }

        if self.annual_rate_bps > BPS_DENOMINATOR {
            return Err(LedgerError::Configuration(format!(
                "Interest rate {} bps exceeds maximum {} bps",
                self.annual_rate_bps, BPS_DENOMINATOR
            )));
        }

        Ok(())
    }

    /// The configured rate.
    pub fn interest_rate(&self) -> Result<InterestRate> {
        InterestRate::from_bps(self.annual_rate_bps)
    }
}
