//! Asset transfer capability supplied by the environment.

use depositledger_common::{Address, Amount, AssetKind, TransferError};

/// Moves assets between callers and the ledger's custody.
///
/// Each operation is atomic: when it returns an error nothing has moved.
/// The ledger only commits its own state after the adapter succeeds.
pub trait AssetTransferAdapter {
    /// Pull `amount` of the token from `caller` into custody under the
    /// allowance `caller` granted the ledger beforehand.
    fn pull_from_caller(&mut self, caller: &Address, amount: Amount) -> Result<(), TransferError>;

    /// Take native value attached to the current call into custody.
    /// `attached` must equal `amount`.
    fn accept_attached_native(
        &mut self,
        caller: &Address,
        amount: Amount,
        attached: Amount,
    ) -> Result<(), TransferError>;

    /// Send `amount` of `asset` from custody to `caller`.
    fn push_to_caller(
        &mut self,
        caller: &Address,
        amount: Amount,
        asset: AssetKind,
    ) -> Result<(), TransferError>;

    /// Total custody held for `asset`.
    fn custody_balance(&self, asset: AssetKind) -> Amount;
}

impl<A: AssetTransferAdapter + ?Sized> AssetTransferAdapter for Box<A> {
    fn pull_from_caller(&mut self, caller: &Address, amount: Amount) -> Result<(), TransferError> {
        (**self).pull_from_caller(caller, amount)
    }

    fn accept_attached_native(
        &mut self,
        caller: &Address,
        amount: Amount,
        attached: Amount,
    ) -> Result<(), TransferError> {
        (**self).accept_attached_native(caller, amount, attached)
    }

    fn push_to_caller(
        &mut self,
        caller: &Address,
        amount: Amount,
        asset: AssetKind,
    ) -> Result<(), TransferError> {
        (**self).push_to_caller(caller, amount, asset)
    }

    fn custody_balance(&self, asset: AssetKind) -> Amount {
        (**self).custody_balance(asset)
    }
}

/// Inbound movement for a deposit, selected by asset kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Inbound {
    /// Native value riding on the call.
    AttachedNative { attached: Amount },
    /// Token pulled under allowance.
    TokenPull,
}

impl Inbound {
    /// Pick the inbound path for `asset`.
    ///
    /// Native value attached to a token deposit would be stranded in
    /// custody, so it is refused.
    pub(crate) fn for_deposit(asset: AssetKind, attached: Amount) -> Result<Self, TransferError> {
        match asset {
            AssetKind::Native => Ok(Inbound::AttachedNative { attached }),
            AssetKind::Token if attached > 0 => Err(TransferError::UnexpectedNativeValue(attached)),
            AssetKind::Token => Ok(Inbound::TokenPull),
        }
    }

    /// Execute against the adapter.
    pub(crate) fn execute<A: AssetTransferAdapter + ?Sized>(
        self,
        adapter: &mut A,
        caller: &Address,
        amount: Amount,
    ) -> Result<(), TransferError> {
        match self {
            Inbound::AttachedNative { attached } => {
                adapter.accept_attached_native(caller, amount, attached)
            }
            Inbound::TokenPull => adapter.pull_from_caller(caller, amount),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_selection() {
        assert_eq!(
            Inbound::for_deposit(AssetKind::Native, 5),
            Ok(Inbound::AttachedNative { attached: 5 })
        );
        assert_eq!(Inbound::for_deposit(AssetKind::Token, 0), Ok(Inbound::TokenPull));
        assert_eq!(
            Inbound::for_deposit(AssetKind::Token, 1),
            Err(TransferError::UnexpectedNativeValue(1))
        );
    }
}
