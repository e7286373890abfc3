//! In-memory token ledger.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::LedgerError;
use crate::ledger::TokenLedger;
use ballot_types::{Address, TokenId};

#[derive(Default)]
struct LedgerState {
    /// Known tokens and their circulating supply.
    supply: HashMap<TokenId, u128>,
    /// (account, token) → balance. Absent entries read as zero.
    balances: HashMap<(Address, TokenId), u128>,
    /// (owner, spender, token) → remaining allowance.
    allowances: HashMap<(Address, Address, TokenId), u128>,
}

impl LedgerState {
    fn ensure_known(&self, token: &TokenId) -> Result<(), LedgerError> {
        if self.supply.contains_key(token) {
            Ok(())
        } else {
            Err(LedgerError::UnknownToken(token.to_string()))
        }
    }

    fn balance(&self, account: &Address, token: &TokenId) -> u128 {
        self.balances
            .get(&(account.clone(), token.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Validate the whole move before touching either balance.
    fn move_balance(
        &mut self,
        from: &Address,
        to: &Address,
        token: &TokenId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        let available = self.balance(from, token);
        let new_from = available
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                needed: amount,
                available,
            })?;
        if from == to {
            return Ok(());
        }
        let new_to = self
            .balance(to, token)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        self.balances
            .insert((from.clone(), token.clone()), new_from);
        self.balances.insert((to.clone(), token.clone()), new_to);
        Ok(())
    }
}

/// A complete fungible-token ledger held in memory.
///
/// Thread-safe; every operation takes the state lock once, so each call is
/// atomic with respect to every other call.
#[derive(Default)]
pub struct MemoryLedger {
    state: RwLock<LedgerState>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, LedgerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, LedgerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make a token known with zero supply. Idempotent.
    pub fn register_token(&self, token: &TokenId) {
        self.write().supply.entry(token.clone()).or_insert(0);
    }

    pub fn is_known(&self, token: &TokenId) -> bool {
        self.read().supply.contains_key(token)
    }

    /// Create `amount` new tokens in `account`, registering the token if needed.
    pub fn mint(&self, account: &Address, token: &TokenId, amount: u128) -> Result<(), LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let mut state = self.write();
        let supply = state.supply.get(token).copied().unwrap_or(0);
        let new_supply = supply.checked_add(amount).ok_or(LedgerError::Overflow)?;
        let new_balance = state
            .balance(account, token)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        state.supply.insert(token.clone(), new_supply);
        state
            .balances
            .insert((account.clone(), token.clone()), new_balance);
        tracing::debug!(account = %account, token = %token, amount, "minted");
        Ok(())
    }

    /// Set (not add to) the amount `spender` may pull from `owner`.
    pub fn approve(
        &self,
        owner: &Address,
        spender: &Address,
        token: &TokenId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        let mut state = self.write();
        state.ensure_known(token)?;
        state
            .allowances
            .insert((owner.clone(), spender.clone(), token.clone()), amount);
        Ok(())
    }

    pub fn allowance(&self, owner: &Address, spender: &Address, token: &TokenId) -> u128 {
        self.read()
            .allowances
            .get(&(owner.clone(), spender.clone(), token.clone()))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_supply(&self, token: &TokenId) -> Result<u128, LedgerError> {
        let state = self.read();
        state
            .supply
            .get(token)
            .copied()
            .ok_or_else(|| LedgerError::UnknownToken(token.to_string()))
    }
}

impl TokenLedger for MemoryLedger {
    fn balance_of(&self, account: &Address, token: &TokenId) -> Result<u128, LedgerError> {
        let state = self.read();
        state.ensure_known(token)?;
        Ok(state.balance(account, token))
    }

    fn transfer_from(
        &self,
        spender: &Address,
        payer: &Address,
        recipient: &Address,
        token: &TokenId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let mut state = self.write();
        state.ensure_known(token)?;
        let key = (payer.clone(), spender.clone(), token.clone());
        let allowed = state.allowances.get(&key).copied().unwrap_or(0);
        let remaining = allowed
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientAllowance {
                needed: amount,
                available: allowed,
            })?;
        state.move_balance(payer, recipient, token, amount)?;
        state.allowances.insert(key, remaining);
        Ok(())
    }

    fn transfer(
        &self,
        sender: &Address,
        recipient: &Address,
        token: &TokenId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let mut state = self.write();
        state.ensure_known(token)?;
        state.move_balance(sender, recipient, token, amount)
    }
}
