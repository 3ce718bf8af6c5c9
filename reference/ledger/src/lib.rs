//! DepositLedger Engine
//!
//! Interest-bearing deposit ledger for a native asset and one fungible
//! token. Balances accrue flat simple interest lazily from a per-record
//! checkpoint; asset movement is delegated to an [`AssetTransferAdapter`].

pub mod engine;
pub mod interest;
pub mod balance;
pub mod store;
pub mod adapter;
pub mod custody;
pub mod journal;
pub mod config;

pub use engine::{DepositLedger, SolvencyReport};
pub use interest::{accrue, InterestRate};
pub use balance::BalanceRecord;
pub use store::{BalanceStore, InMemoryBalanceStore, StoredBalance};
pub use adapter::AssetTransferAdapter;
pub use custody::{InMemoryCustody, InMemoryToken};
pub use journal::{EntryType, Journal, JournalEntry};
pub use config::LedgerConfig;
