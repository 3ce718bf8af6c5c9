//! In-process custody: native wallets plus an ERC20-style token.
//!
//! Implements [`AssetTransferAdapter`] for tests and the simulator. Transfers
//! that bypass the ledger (funding interest reserves, stray sends) go through
//! [`InMemoryCustody::send_native_to_custody`] or a plain token transfer to
//! the custody address.

use std::collections::HashMap;

use tracing::debug;

use depositledger_common::{Address, Amount, AssetKind, TransferError};

use crate::adapter::AssetTransferAdapter;

/// Fungible token with balances and allowances.
#[derive(Debug, Clone)]
pub struct InMemoryToken {
    address: Address,
    balances: HashMap<Address, Amount>,
    allowances: HashMap<(Address, Address), Amount>,
    total_supply: Amount,
}

impl InMemoryToken {
    /// Create a token with no supply.
    pub fn new(address: Address) -> Self {
        Self {
            address,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            total_supply: 0,
        }
    }

    /// Token contract address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Total minted supply.
    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Create `amount` new tokens for `to`.
    pub fn mint(&mut self, to: Address, amount: Amount) -> Result<(), TransferError> {
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TransferError::Overflow)?;
        let balance = self
            .balance_of(&to)
            .checked_add(amount)
            .ok_or(TransferError::Overflow)?;
        self.total_supply = supply;
        self.balances.insert(to, balance);
        Ok(())
    }

    /// Balance of `holder`.
    pub fn balance_of(&self, holder: &Address) -> Amount {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    /// Remaining amount `spender` may pull from `owner`.
    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    /// Set the allowance of `spender` over `owner`'s tokens.
    pub fn approve(&mut self, owner: Address, spender: Address, amount: Amount) {
        self.allowances.insert((owner, spender), amount);
    }

    /// Move tokens held by `from`.
    pub fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<(), TransferError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(TransferError::InsufficientFunds {
                required: amount,
                available,
            });
        }
        if from == to {
            return Ok(());
        }
        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TransferError::Overflow)?;

        self.balances.insert(*from, available - amount);
        self.balances.insert(*to, credited);
        Ok(())
    }

    /// Move tokens from `from` on behalf of `spender`, consuming allowance.
    pub fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TransferError> {
        let approved = self.allowance(from, spender);
        if approved < amount {
            return Err(TransferError::InsufficientAllowance {
                required: amount,
                approved,
            });
        }
        self.transfer(from, to, amount)?;
        self.allowances.insert((*from, *spender), approved - amount);
        Ok(())
    }
}

/// Custody for both asset kinds held at one ledger address.
#[derive(Debug, Clone)]
pub struct InMemoryCustody {
    custody_address: Address,
    native_wallets: HashMap<Address, Amount>,
    native_custody: Amount,
    token: InMemoryToken,
}

impl InMemoryCustody {
    /// Create custody at `custody_address` for the token at `token_address`.
    pub fn new(custody_address: Address, token_address: Address) -> Self {
        Self {
            custody_address,
            native_wallets: HashMap::new(),
            native_custody: 0,
            token: InMemoryToken::new(token_address),
        }
    }

    /// Address the ledger holds funds at (the token spender).
    pub fn custody_address(&self) -> Address {
        self.custody_address
    }

    /// The token.
    pub fn token(&self) -> &InMemoryToken {
        &self.token
    }

    /// Mutable token access, for minting and approvals.
    pub fn token_mut(&mut self) -> &mut InMemoryToken {
        &mut self.token
    }

    /// Approve the ledger to pull `amount` of `owner`'s tokens.
    pub fn approve_ledger(&mut self, owner: Address, amount: Amount) {
        let spender = self.custody_address;
        self.token.approve(owner, spender, amount);
    }

    /// Native coin held by `holder` outside the ledger.
    pub fn native_balance(&self, holder: &Address) -> Amount {
        self.native_wallets.get(holder).copied().unwrap_or(0)
    }

    /// Give `holder` native coin out of thin air (genesis allocation).
    pub fn fund_native(&mut self, holder: Address, amount: Amount) -> Result<(), TransferError> {
        let balance = self
            .native_balance(&holder)
            .checked_add(amount)
            .ok_or(TransferError::Overflow)?;
        self.native_wallets.insert(holder, balance);
        Ok(())
    }

    /// Send native coin straight to custody, bypassing the ledger.
    pub fn send_native_to_custody(&mut self, from: &Address, amount: Amount) -> Result<(), TransferError> {
        let available = self.native_balance(from);
        if available < amount {
            return Err(TransferError::InsufficientFunds {
                required: amount,
                available,
            });
        }
        let custody = self
            .native_custody
            .checked_add(amount)
            .ok_or(TransferError::Overflow)?;
        self.native_wallets.insert(*from, available - amount);
        self.native_custody = custody;
        Ok(())
    }
}

impl AssetTransferAdapter for InMemoryCustody {
    fn pull_from_caller(&mut self, caller: &Address, amount: Amount) -> Result<(), TransferError> {
        let custody = self.custody_address;
        self.token.transfer_from(&custody, caller, &custody, amount)?;
        debug!(caller = %caller, amount = %amount, "Token pulled into custody");
        Ok(())
    }

    fn accept_attached_native(
        &mut self,
        caller: &Address,
        amount: Amount,
        attached: Amount,
    ) -> Result<(), TransferError> {
        if attached != amount {
            return Err(TransferError::ValueMismatch {
                attached,
                declared: amount,
            });
        }
        self.send_native_to_custody(caller, amount)?;
        debug!(caller = %caller, amount = %amount, "Native value accepted into custody");
        Ok(())
    }

    fn push_to_caller(
        &mut self,
        caller: &Address,
        amount: Amount,
        asset: AssetKind,
    ) -> Result<(), TransferError> {
        match asset {
            AssetKind::Native => {
                if self.native_custody < amount {
                    return Err(TransferError::CustodyShortfall {
                        required: amount,
                        held: self.native_custody,
                    });
                }
                let wallet = self
                    .native_balance(caller)
                    .checked_add(amount)
                    .ok_or(TransferError::Overflow)?;
                self.native_custody -= amount;
                self.native_wallets.insert(*caller, wallet);
            }
            AssetKind::Token => {
                let custody = self.custody_address;
                let held = self.token.balance_of(&custody);
                if held < amount {
                    return Err(TransferError::CustodyShortfall {
                        required: amount,
                        held,
                    });
                }
                self.token.transfer(&custody, caller, amount)?;
            }
        }
        debug!(caller = %caller, amount = %amount, asset = %asset, "Pushed from custody");
        Ok(())
    }

    fn custody_balance(&self, asset: AssetKind) -> Amount {
        match asset {
            AssetKind::Native => self.native_custody,
            AssetKind::Token => self.token.balance_of(&self.custody_address),
        }
    }
}
