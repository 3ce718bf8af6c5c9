//! Error types for the deposit ledger.

use crate::{Address, Amount};
use thiserror::Error;

/// Reasons an asset transfer could not be completed by the custody layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// Caller has not authorized the ledger to pull this much token.
    #[error("Insufficient allowance: required {required}, approved {approved}")]
    InsufficientAllowance { required: Amount, approved: Amount },

    /// Source account does not hold enough of the asset.
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Amount, available: Amount },

    /// Native value attached to the call differs from the declared amount.
    #[error("Attached value {attached} does not match declared amount {declared}")]
    ValueMismatch { attached: Amount, declared: Amount },

    /// Native value attached to a call that does not accept it.
    #[error("Unexpected native value attached: {0}")]
    UnexpectedNativeValue(Amount),

    /// Ledger custody cannot cover an outbound transfer.
    #[error("Custody shortfall: required {required}, held {held}")]
    CustodyShortfall { required: Amount, held: Amount },

    /// Arithmetic overflow in the custody layer.
    #[error("Transfer amount overflow")]
    Overflow,
}

/// Main error type for ledger operations.
///
/// The display strings of `InvalidAmount`, `TransferFailed`,
/// `InsufficientBalance` and `Unauthorized` are surfaced verbatim to callers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Zero amount.
    #[error("Amount should be greater than zero")]
    InvalidAmount,

    /// The custody adapter could not move the funds.
    #[error("Transfer failed")]
    TransferFailed(#[source] TransferError),

    /// Withdrawal exceeds the accrued balance.
    #[error("Insufficient balance")]
    InsufficientBalance { requested: Amount, available: Amount },

    /// Non-owner called an owner-only operation.
    #[error("Only owner can call this function")]
    Unauthorized { caller: Address },

    /// Balance or interest arithmetic overflowed.
    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    /// Ordinal outside the asset kind encoding.
    #[error("Unknown asset kind: {0}")]
    UnknownAssetKind(u8),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl LedgerError {
    /// Check if this error is retryable.
    ///
    /// Every ledger rejection is terminal: the caller must correct the input
    /// and resubmit.
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Get a stable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            LedgerError::InvalidAmount => "INVALID_AMOUNT",
            LedgerError::TransferFailed(_) => "TRANSFER_FAILED",
            LedgerError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            LedgerError::Unauthorized { .. } => "UNAUTHORIZED",
            LedgerError::ArithmeticOverflow => "ARITHMETIC_OVERFLOW",
            LedgerError::UnknownAssetKind(_) => "UNKNOWN_ASSET_KIND",
            LedgerError::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }
}

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_reason_strings() {
        assert_eq!(
            LedgerError::InvalidAmount.to_string(),
            "Amount should be greater than zero"
        );
        assert_eq!(
            LedgerError::TransferFailed(TransferError::Overflow).to_string(),
            "Transfer failed"
        );
        assert_eq!(
            LedgerError::InsufficientBalance {
                requested: 2,
                available: 1
            }
            .to_string(),
            "Insufficient balance"
        );
        assert_eq!(
            LedgerError::Unauthorized {
                caller: Address::ZERO
            }
            .to_string(),
            "Only owner can call this function"
        );
    }

    #[test]
    fn test_transfer_failed_keeps_source() {
        let err = LedgerError::TransferFailed(TransferError::InsufficientAllowance {
            required: 100,
            approved: 0,
        });
        let source = err.source().map(|s| s.to_string());
        assert_eq!(
            source.as_deref(),
            Some("Insufficient allowance: required 100, approved 0")
        );
        assert_eq!(err.error_code(), "TRANSFER_FAILED");
        assert!(!err.is_retryable());
    }
}
