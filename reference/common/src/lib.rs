//! DepositLedger Common Types
//!
//! Shared types for the interest-bearing deposit ledger: identities, asset
//! kinds and amounts, the error taxonomy, and clocks.

pub mod identifiers;
pub mod monetary;
pub mod error;
pub mod time;

pub use identifiers::*;
pub use monetary::*;
pub use error::*;
pub use time::*;
