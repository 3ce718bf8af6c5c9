//! Journal of committed deposits and withdrawals.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use depositledger_common::{Address, Amount, AssetKind, Timestamp};

/// Type of journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryType {
    /// Funds moved into custody.
    Deposit,
    /// Funds moved out of custody.
    Withdrawal,
}

/// A committed balance movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique entry ID (time-ordered).
    pub id: Uuid,
    /// User whose record changed.
    pub user: Address,
    /// Asset bucket.
    pub asset: AssetKind,
    /// Deposit or withdrawal.
    pub entry_type: EntryType,
    /// Amount moved.
    pub amount: Amount,
    /// Interest folded into the record by this touch.
    pub interest_folded: Amount,
    /// Stored balance after this entry.
    pub balance_after: Amount,
    /// Ledger time of the commit.
    pub recorded_at: Timestamp,
}

impl JournalEntry {
    /// Create a deposit entry.
    pub fn deposit(
        user: Address,
        asset: AssetKind,
        amount: Amount,
        interest_folded: Amount,
        balance_after: Amount,
        recorded_at: Timestamp,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            user,
            asset,
            entry_type: EntryType::Deposit,
            amount,
            interest_folded,
            balance_after,
            recorded_at,
        }
    }

    /// Create a withdrawal entry.
    pub fn withdrawal(
        user: Address,
        asset: AssetKind,
        amount: Amount,
        interest_folded: Amount,
        balance_after: Amount,
        recorded_at: Timestamp,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            user,
            asset,
            entry_type: EntryType::Withdrawal,
            amount,
            interest_folded,
            balance_after,
            recorded_at,
        }
    }
}

/// Append-only list of committed entries.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Vec<JournalEntry>,
}

impl Journal {
    /// Create an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn record(&mut self, entry: JournalEntry) {
        self.entries.push(entry);
    }

    /// All entries in commit order.
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing was committed yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries touching `user`.
    pub fn for_user<'a>(&'a self, user: &'a Address) -> impl Iterator<Item = &'a JournalEntry> + 'a {
        self.entries.iter().filter(move |e| &e.user == user)
    }

    fn sum_where(
        &self,
        asset: AssetKind,
        entry_type: Option<EntryType>,
        f: impl Fn(&JournalEntry) -> Amount,
    ) -> Amount {
        self.entries
            .iter()
            .filter(|e| e.asset == asset)
            .filter(|e| entry_type.map_or(true, |t| e.entry_type == t))
            .fold(0, |acc: Amount, e| acc.saturating_add(f(e)))
    }

    /// Total deposited for `asset`.
    pub fn total_deposits(&self, asset: AssetKind) -> Amount {
        self.sum_where(asset, Some(EntryType::Deposit), |e| e.amount)
    }

    /// Total withdrawn for `asset`.
    pub fn total_withdrawals(&self, asset: AssetKind) -> Amount {
        self.sum_where(asset, Some(EntryType::Withdrawal), |e| e.amount)
    }

    /// Total interest folded into records for `asset`.
    pub fn total_interest(&self, asset: AssetKind) -> Amount {
        self.sum_where(asset, None, |e| e.interest_folded)
    }

    /// Deposits minus withdrawals for `asset`; negative once paid-out
    /// interest exceeds net principal.
    pub fn net_inflow(&self, asset: AssetKind) -> i128 {
        let deposits = i128::try_from(self.total_deposits(asset)).unwrap_or(i128::MAX);
        let withdrawals = i128::try_from(self.total_withdrawals(asset)).unwrap_or(i128::MAX);
        deposits.saturating_sub(withdrawals)
    }
}
