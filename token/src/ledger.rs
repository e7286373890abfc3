//! The ledger interface consumed by the engine.

use crate::error::LedgerError;
use ballot_types::{Address, TokenId};
use std::sync::Arc;

/// A fungible-token ledger keyed by (account, token).
///
/// Implementations apply each call atomically: a failed transfer moves nothing.
pub trait TokenLedger: Send + Sync {
    /// Current balance of `account` in `token`.
    fn balance_of(&self, account: &Address, token: &TokenId) -> Result<u128, LedgerError>;

    /// Move `amount` from `payer` to `recipient`, spending `spender`'s allowance.
    fn transfer_from(
        &self,
        spender: &Address,
        payer: &Address,
        recipient: &Address,
        token: &TokenId,
        amount: u128,
    ) -> Result<(), LedgerError>;

    /// Move `amount` from `sender` to `recipient`.
    fn transfer(
        &self,
        sender: &Address,
        recipient: &Address,
        token: &TokenId,
        amount: u128,
    ) -> Result<(), LedgerError>;
}

impl<L: TokenLedger + ?Sized> TokenLedger for Arc<L> {
    fn balance_of(&self, account: &Address, token: &TokenId) -> Result<u128, LedgerError> {
        (**self).balance_of(account, token)
    }

    fn transfer_from(
        &self,
        spender: &Address,
        payer: &Address,
        recipient: &Address,
        token: &TokenId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        (**self).transfer_from(spender, payer, recipient, token, amount)
    }

    fn transfer(
        &self,
        sender: &Address,
        recipient: &Address,
        token: &TokenId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        (**self).transfer(sender, recipient, token, amount)
    }
}
