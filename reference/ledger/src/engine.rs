//! Core deposit ledger engine.

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use depositledger_common::{Address, Amount, AssetKind, Clock, LedgerError, Result, Timestamp};

use crate::adapter::{AssetTransferAdapter, Inbound};
use crate::balance::BalanceRecord;
use crate::config::LedgerConfig;
use crate::interest::InterestRate;
use crate::journal::{Journal, JournalEntry};
use crate::store::BalanceStore;

/// Custody versus what the ledger owes its depositors, for one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SolvencyReport {
    /// Asset reported on.
    pub asset: AssetKind,
    /// Funds held in custody.
    pub custody: Amount,
    /// Sum of every depositor's effective balance.
    pub liabilities: Amount,
}

impl SolvencyReport {
    /// Amount by which liabilities exceed custody.
    pub fn shortfall(&self) -> Amount {
        self.liabilities.saturating_sub(self.custody)
    }

    /// Check if custody covers every depositor.
    pub fn is_solvent(&self) -> bool {
        self.custody >= self.liabilities
    }
}

/// Interest-bearing deposit ledger for the native asset and one token.
///
/// Mutating operations take `&mut self`, so a ledger has a single writer.
/// Each call validates, folds accrual, stages the new record, asks the
/// adapter to move funds and only then commits; a failure at any step
/// leaves records, journal and custody untouched.
pub struct DepositLedger<S, A, C> {
    owner: Address,
    token: Address,
    rate: InterestRate,
    store: S,
    adapter: A,
    clock: C,
    journal: Journal,
}

impl<S, A, C> DepositLedger<S, A, C>
where
    S: BalanceStore,
    A: AssetTransferAdapter,
    C: Clock,
{
    /// Create a ledger owned by `deployer`.
    pub fn new(deployer: Address, config: &LedgerConfig, store: S, adapter: A, clock: C) -> Result<Self> {
        config.validate()?;
        let rate = config.interest_rate()?;

        info!(
            owner = %deployer,
            token = %config.token_address,
            rate = %rate,
            "Deposit ledger created"
        );

        Ok(Self {
            owner: deployer,
            token: config.token_address,
            rate,
            store,
            adapter,
            clock,
            journal: Journal::new(),
        })
    }

    /// The owner identity.
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Address of the accepted token.
    pub fn erc_token(&self) -> Address {
        self.token
    }

    /// The fixed annual rate.
    pub fn interest_rate(&self) -> InterestRate {
        self.rate
    }

    /// Deposit `amount` of `asset` for `caller`.
    ///
    /// For `Native`, `attached_native` is the value riding on the call and
    /// must equal `amount`. For `Token`, it must be zero and the caller must
    /// have approved the ledger beforehand. Returns the new balance.
    #[instrument(skip(self, caller), fields(caller = %caller))]
    pub fn deposit(
        &mut self,
        caller: Address,
        amount: Amount,
        asset: AssetKind,
        attached_native: Amount,
    ) -> Result<Amount> {
        if amount == 0 {
            warn!("Deposit rejected: zero amount");
            return Err(LedgerError::InvalidAmount);
        }

        let now = self.clock.now();
        let current = self.store.load(&caller, asset);
        let interest = self.pending_interest(&current, now)?;
        let updated = current.credited(amount, now, self.rate)?;

        Inbound::for_deposit(asset, attached_native)
            .and_then(|inbound| inbound.execute(&mut self.adapter, &caller, amount))
            .map_err(|e| {
                warn!(amount = %amount, error = %e, "Deposit rejected: inbound transfer failed");
                LedgerError::TransferFailed(e)
            })?;

        self.commit(
            caller,
            asset,
            updated,
            JournalEntry::deposit(
                caller,
                asset,
                amount,
                interest,
                updated.principal_plus_accrued,
                now,
            ),
        );

        info!(
            amount = %amount,
            interest_folded = %interest,
            balance = %updated.principal_plus_accrued,
            "Deposit committed"
        );

        Ok(updated.principal_plus_accrued)
    }

    /// Withdraw `amount` of `asset` to `caller`, interest included.
    ///
    /// The remainder is re-based at the current time with accrued interest
    /// folded in. Returns the remaining balance.
    #[instrument(skip(self, caller), fields(caller = %caller))]
    pub fn withdraw(&mut self, caller: Address, amount: Amount, asset: AssetKind) -> Result<Amount> {
        if amount == 0 {
            warn!("Withdrawal rejected: zero amount");
            return Err(LedgerError::InvalidAmount);
        }

        let now = self.clock.now();
        let current = self.store.load(&caller, asset);
        let interest = self.pending_interest(&current, now)?;
        let updated = current.debited(amount, now, self.rate).map_err(|e| {
            warn!(amount = %amount, error = ?e, "Withdrawal rejected");
            e
        })?;

        self.adapter
            .push_to_caller(&caller, amount, asset)
            .map_err(|e| {
                warn!(amount = %amount, error = %e, "Withdrawal rejected: outbound transfer failed");
                LedgerError::TransferFailed(e)
            })?;

        self.commit(
            caller,
            asset,
            updated,
            JournalEntry::withdrawal(
                caller,
                asset,
                amount,
                interest,
                updated.principal_plus_accrued,
                now,
            ),
        );

        info!(
            amount = %amount,
            interest_folded = %interest,
            balance = %updated.principal_plus_accrued,
            "Withdrawal committed"
        );

        Ok(updated.principal_plus_accrued)
    }

    /// Effective balance of `caller` for `asset` right now. Does not
    /// touch stored state.
    pub fn get_balance(&self, caller: Address, asset: AssetKind) -> Result<Amount> {
        self.store
            .load(&caller, asset)
            .effective_at(self.clock.now(), self.rate)
    }

    /// Total custody for `asset`. Owner only.
    pub fn get_contract_balance(&self, caller: Address, asset: AssetKind) -> Result<Amount> {
        self.ensure_owner(caller)?;
        Ok(self.adapter.custody_balance(asset))
    }

    /// Custody against accrued liabilities for `asset`. Owner only.
    pub fn solvency(&self, caller: Address, asset: AssetKind) -> Result<SolvencyReport> {
        self.ensure_owner(caller)?;

        let now = self.clock.now();
        let liabilities = self
            .store
            .entries()
            .into_iter()
            .filter(|row| row.asset == asset)
            .try_fold(0 as Amount, |acc, row| {
                let balance = row.record.effective_at(now, self.rate)?;
                acc.checked_add(balance).ok_or(LedgerError::ArithmeticOverflow)
            })?;

        Ok(SolvencyReport {
            asset,
            custody: self.adapter.custody_balance(asset),
            liabilities,
        })
    }

    /// Stored record of `user` for `asset`, without accrual.
    pub fn record(&self, user: &Address, asset: AssetKind) -> BalanceRecord {
        self.store.load(user, asset)
    }

    /// Committed movements.
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// The transfer adapter.
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Mutable access to the transfer adapter.
    pub fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }

    /// The balance store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn ensure_owner(&self, caller: Address) -> Result<()> {
        if caller != self.owner {
            warn!(caller = %caller, "Owner-only call rejected");
            return Err(LedgerError::Unauthorized { caller });
        }
        Ok(())
    }

    fn pending_interest(&self, record: &BalanceRecord, now: Timestamp) -> Result<Amount> {
        let effective = record.effective_at(now, self.rate)?;
        let interest = effective - record.principal_plus_accrued;
        debug!(
            stored = %record.principal_plus_accrued,
            elapsed = record.elapsed(now),
            interest = %interest,
            "Accrual folded"
        );
        Ok(interest)
    }

    fn commit(&mut self, user: Address, asset: AssetKind, record: BalanceRecord, entry: JournalEntry) {
        self.store.save(user, asset, record);
        self.journal.record(entry);
    }
}
