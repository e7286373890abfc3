//! Nullable token ledger: a [`MemoryLedger`] with failure injection.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use ballot_token::{LedgerError, MemoryLedger, TokenLedger};
use ballot_types::{Address, TokenId};

/// Callback run at the start of every transfer, before any balance moves.
pub type TransferHook = Arc<dyn Fn() + Send + Sync>;

/// A token ledger for tests.
///
/// Behaves exactly like [`MemoryLedger`] unless told otherwise:
/// [`fail_next_transfer`](Self::fail_next_transfer) makes the next transfer
/// return an error without moving anything, and
/// [`set_transfer_hook`](Self::set_transfer_hook) runs a callback inside each
/// transfer, which is how tests play a ledger that calls back into its caller.
#[derive(Default)]
pub struct NullLedger {
    inner: MemoryLedger,
    fail_next: Mutex<Option<LedgerError>>,
    hook: Mutex<Option<TransferHook>>,
    transfers: AtomicUsize,
}

impl NullLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// The wrapped ledger, for minting and approvals.
    pub fn inner(&self) -> &MemoryLedger {
        &self.inner
    }

    pub fn mint(&self, account: &Address, token: &TokenId, amount: u128) -> Result<(), LedgerError> {
        self.inner.mint(account, token, amount)
    }

    pub fn approve(
        &self,
        owner: &Address,
        spender: &Address,
        token: &TokenId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        self.inner.approve(owner, spender, token, amount)
    }

    /// Make the next `transfer` or `transfer_from` fail with `error`.
    pub fn fail_next_transfer(&self, error: LedgerError) {
        *self.fail_next.lock().unwrap_or_else(PoisonError::into_inner) = Some(error);
    }

    pub fn set_transfer_hook(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.hook.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(hook));
    }

    pub fn clear_transfer_hook(&self) {
        *self.hook.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Number of transfers that actually moved tokens.
    pub fn transfer_count(&self) -> usize {
        self.transfers.load(Ordering::SeqCst)
    }

    fn before_transfer(&self) -> Result<(), LedgerError> {
        // Clone out so the hook runs with no lock held.
        let hook = self
            .hook
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(hook) = hook {
            hook();
        }
        let injected = self
            .fail_next
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match injected {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn counted(&self, result: Result<(), LedgerError>) -> Result<(), LedgerError> {
        if result.is_ok() {
            self.transfers.fetch_add(1, Ordering::SeqCst);
        }
        result
    }
}

impl TokenLedger for NullLedger {
    fn balance_of(&self, account: &Address, token: &TokenId) -> Result<u128, LedgerError> {
        self.inner.balance_of(account, token)
    }

    fn transfer_from(
        &self,
        spender: &Address,
        payer: &Address,
        recipient: &Address,
        token: &TokenId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        self.before_transfer()?;
        self.counted(self.inner.transfer_from(spender, payer, recipient, token, amount))
    }

    fn transfer(
        &self,
        sender: &Address,
        recipient: &Address,
        token: &TokenId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        self.before_transfer()?;
        self.counted(self.inner.transfer(sender, recipient, token, amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gov() -> TokenId {
        TokenId::new("GOV")
    }

    #[test]
    fn test_injected_failure_applies_once() {
        let ledger = NullLedger::new();
        let (alice, bob) = (Address::new("alice"), Address::new("bob"));
        ledger.mint(&alice, &gov(), 100).unwrap();
        ledger.fail_next_transfer(LedgerError::Rejected("paused".into()));

        let err = ledger.transfer(&alice, &bob, &gov(), 10).unwrap_err();
        assert_eq!(err, LedgerError::Rejected("paused".into()));
        assert_eq!(ledger.balance_of(&alice, &gov()).unwrap(), 100);
        assert_eq!(ledger.transfer_count(), 0);

        ledger.transfer(&alice, &bob, &gov(), 10).unwrap();
        assert_eq!(ledger.balance_of(&bob, &gov()).unwrap(), 10);
        assert_eq!(ledger.transfer_count(), 1);
    }

    #[test]
    fn test_hook_runs_on_every_transfer() {
        let ledger = NullLedger::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        ledger.set_transfer_hook(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        let (alice, bob) = (Address::new("alice"), Address::new("bob"));
        ledger.mint(&alice, &gov(), 100).unwrap();
        ledger.approve(&alice, &bob, &gov(), 50).unwrap();
        ledger.transfer(&alice, &bob, &gov(), 1).unwrap();
        ledger.transfer_from(&bob, &alice, &bob, &gov(), 1).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        ledger.clear_transfer_hook();
        ledger.transfer(&alice, &bob, &gov(), 1).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
