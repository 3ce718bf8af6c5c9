//! Per-user, per-asset balance records.

use serde::{Deserialize, Serialize};

use depositledger_common::{Amount, LedgerError, Result, Timestamp};

use crate::interest::{self, InterestRate};

/// Stored balance of one (user, asset) pair.
///
/// `principal_plus_accrued` includes interest folded in up to `last_update`.
/// The default value is the record of a pair with no history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceRecord {
    /// Withdrawable value as of the last checkpoint.
    pub principal_plus_accrued: Amount,
    /// Accrual checkpoint, seconds since epoch.
    pub last_update: Timestamp,
}

impl BalanceRecord {
    /// Create a record checkpointed at `now`.
    pub fn new(principal_plus_accrued: Amount, now: Timestamp) -> Self {
        Self {
            principal_plus_accrued,
            last_update: now,
        }
    }

    /// Check if this record has never been touched or holds nothing.
    pub fn is_empty(&self) -> bool {
        self.principal_plus_accrued == 0
    }

    /// Seconds elapsed since the checkpoint. A clock behind the checkpoint
    /// counts as zero.
    pub fn elapsed(&self, now: Timestamp) -> u64 {
        now.saturating_sub(self.last_update)
    }

    /// Effective balance at `now`, with accrual applied.
    pub fn effective_at(&self, now: Timestamp, rate: InterestRate) -> Result<Amount> {
        interest::accrue(self.principal_plus_accrued, self.elapsed(now), rate)
    }

    /// Fold accrual up to `now` and add `amount`.
    pub fn credited(&self, amount: Amount, now: Timestamp, rate: InterestRate) -> Result<Self> {
        let balance = self
            .effective_at(now, rate)?
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        Ok(Self::new(balance, now))
    }

    /// Fold accrual up to `now` and remove `amount`.
    ///
    /// Fails with `InsufficientBalance` when `amount` exceeds the effective
    /// balance; `self` is never modified.
    pub fn debited(&self, amount: Amount, now: Timestamp, rate: InterestRate) -> Result<Self> {
        let available = self.effective_at(now, rate)?;
        let balance = available
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                requested: amount,
                available,
            })?;
        Ok(Self::new(balance, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depositledger_common::constants::SECONDS_PER_YEAR;

    const T0: Timestamp = 1_700_000_000;

    #[test]
    fn test_default_is_empty() {
        let record = BalanceRecord::default();
        assert!(record.is_empty());
        assert_eq!(record.last_update, 0);
        assert_eq!(record.effective_at(T0, InterestRate::default()).unwrap(), 0);
    }

    #[test]
    fn test_credit_folds_interest_and_rebases() {
        let rate = InterestRate::default();
        let record = BalanceRecord::new(1_000_000, T0);

        let credited = record.credited(500, T0 + SECONDS_PER_YEAR, rate).unwrap();
        assert_eq!(credited.principal_plus_accrued, 1_050_500);
        assert_eq!(credited.last_update, T0 + SECONDS_PER_YEAR);
    }

    #[test]
    fn test_debit_rejects_overdraw_without_mutation() {
        let rate = InterestRate::default();
        let record = BalanceRecord::new(1_000, T0);

        let err = record.debited(2_000, T0, rate).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientBalance {
                requested: 2_000,
                available: 1_000
            }
        );
        assert_eq!(record, BalanceRecord::new(1_000, T0));
    }

    #[test]
    fn test_debit_can_spend_interest() {
        let rate = InterestRate::default();
        let record = BalanceRecord::new(1_000_000, T0);

        let drained = record.debited(1_050_000, T0 + SECONDS_PER_YEAR, rate).unwrap();
        assert!(drained.is_empty());
    }

    #[test]
    fn test_clock_behind_checkpoint_accrues_nothing() {
        let record = BalanceRecord::new(1_000, T0);
        assert_eq!(record.elapsed(T0 - 10), 0);
        assert_eq!(record.effective_at(T0 - 10, InterestRate::default()).unwrap(), 1_000);
    }
}
