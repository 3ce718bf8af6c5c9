//! Simulation metrics.

use std::collections::BTreeMap;

use depositledger_common::{Amount, AssetKind, LedgerError};

/// Kind of ledger operation attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Deposit.
    Deposit,
    /// Withdrawal.
    Withdrawal,
    /// Read-only query.
    Query,
}

/// Simulation metrics.
#[derive(Debug, Clone, Default)]
pub struct SimulationMetrics {
    /// Total operations attempted.
    pub total_operations: u64,
    /// Operations the ledger accepted.
    pub successful_operations: u64,
    /// Operations the ledger rejected.
    pub rejected_operations: u64,
    rejections_by_code: BTreeMap<&'static str, u64>,
    deposited: BTreeMap<AssetKind, Amount>,
    withdrawn: BTreeMap<AssetKind, Amount>,
}

impl SimulationMetrics {
    /// Create new metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an accepted operation.
    pub fn record_success(&mut self, kind: OperationKind, asset: AssetKind, amount: Amount) {
        self.total_operations += 1;
        self.successful_operations += 1;

        let volume = match kind {
            OperationKind::Deposit => self.deposited.entry(asset).or_default(),
            OperationKind::Withdrawal => self.withdrawn.entry(asset).or_default(),
            OperationKind::Query => return,
        };
        *volume = volume.saturating_add(amount);
    }

    /// Record a rejected operation.
    pub fn record_rejection(&mut self, error: &LedgerError) {
        self.total_operations += 1;
        self.rejected_operations += 1;
        *self.rejections_by_code.entry(error.error_code()).or_default() += 1;
    }

    /// Rejections per error code.
    pub fn rejections(&self) -> &BTreeMap<&'static str, u64> {
        &self.rejections_by_code
    }

    /// Accepted deposit volume for `asset`.
    pub fn deposited(&self, asset: AssetKind) -> Amount {
        self.deposited.get(&asset).copied().unwrap_or(0)
    }

    /// Accepted withdrawal volume for `asset`.
    pub fn withdrawn(&self, asset: AssetKind) -> Amount {
        self.withdrawn.get(&asset).copied().unwrap_or(0)
    }

    /// Get success rate.
    pub fn success_rate(&self) -> f64 {
        if self.total_operations == 0 {
            return 0.0;
        }

        self.successful_operations as f64 / self.total_operations as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depositledger_common::TransferError;

    #[test]
    fn test_metrics() {
        let mut metrics = SimulationMetrics::new();

        metrics.record_success(OperationKind::Deposit, AssetKind::Native, 100);
        metrics.record_success(OperationKind::Deposit, AssetKind::Native, 50);
        metrics.record_success(OperationKind::Withdrawal, AssetKind::Token, 30);
        metrics.record_rejection(&LedgerError::InvalidAmount);
        metrics.record_rejection(&LedgerError::TransferFailed(TransferError::Overflow));
        metrics.record_rejection(&LedgerError::InvalidAmount);
        metrics.record_success(OperationKind::Query, AssetKind::Token, 0);

        assert_eq!(metrics.total_operations, 7);
        assert_eq!(metrics.successful_operations, 4);
        assert_eq!(metrics.rejected_operations, 3);
        assert_eq!(metrics.deposited(AssetKind::Native), 150);
        assert_eq!(metrics.withdrawn(AssetKind::Token), 30);
        assert_eq!(metrics.withdrawn(AssetKind::Native), 0);
        assert_eq!(metrics.rejections().get("INVALID_AMOUNT"), Some(&2));
        assert_eq!(metrics.rejections().get("TRANSFER_FAILED"), Some(&1));
        assert!((metrics.success_rate() - 4.0 / 7.0).abs() < f64::EPSILON);
    }
}
