//! Application state shared between the poller, submission flows and the
//! presentation layer.
//!
//! [`AppState`] is constructed explicitly and shared as [`SharedState`].
//! All mutations happen under the write lock, so a generation check and the
//! list replacement it guards are always observed together.

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use tokio::sync::RwLock;
use tracing::debug;

use crate::types::{FeedOrder, FormData, FormField, Generation, UserOrder};

pub type SharedState = Arc<RwLock<AppState>>;

/// List of records together with the generation that produced it.
#[derive(Clone, Debug)]
struct Versioned<T> {
    generation: Generation,
    items: Vec<T>,
}

impl<T> Default for Versioned<T> {
    fn default() -> Self {
        Self {
            generation: 0,
            items: Vec::new(),
        }
    }
}

impl<T> Versioned<T> {
    fn is_stale(&self, generation: Generation) -> bool {
        generation <= self.generation
    }
}

#[derive(Clone, Debug, Default)]
pub struct AppState {
    form: FormData,
    current_account: Option<Address>,
    account_generation: Generation,
    loading: bool,
    open: bool,
    transaction_count: Option<U256>,
    user_orders: Versioned<UserOrder>,
    feed_orders: Versioned<FeedOrder>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps the state for sharing between tasks.
    pub fn shared(self) -> SharedState {
        Arc::new(RwLock::new(self))
    }

    pub fn form(&self) -> &FormData {
        &self.form
    }

    pub fn current_account(&self) -> Option<Address> {
        self.current_account
    }

    /// Whether a user-initiated transaction is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether the deposit dialog is open.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Counter value last read from the vault or restored from storage.
    pub fn transaction_count(&self) -> Option<U256> {
        self.transaction_count
    }

    pub fn user_orders(&self) -> &[UserOrder] {
        &self.user_orders.items
    }

    pub fn feed_orders(&self) -> &[FeedOrder] {
        &self.feed_orders.items
    }

    pub fn update_form_field(&mut self, field: FormField, value: impl Into<String>) {
        self.form.set(field, value.into());
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn set_open(&mut self, open: bool) {
        self.open = open;
    }

    pub fn set_account(&mut self, account: Address) {
        if self.current_account != Some(account) {
            debug!(%account, previous = ?self.current_account, "account changed");
        }
        self.current_account = Some(account);
    }

    /// Records the account read by the refresh of `generation`, unless a
    /// newer refresh has already observed the wallet.
    ///
    /// Returns whether the account was recorded.
    pub fn observe_account(&mut self, generation: Generation, account: Address) -> bool {
        if generation <= self.account_generation {
            return false;
        }
        self.account_generation = generation;
        self.set_account(account);
        true
    }

    pub fn set_transaction_count(&mut self, count: U256) {
        self.transaction_count = Some(count);
    }

    /// Replaces the user orders unconditionally.
    pub fn replace_user_orders(&mut self, orders: Vec<UserOrder>) {
        self.user_orders.items = orders;
    }

    /// Replaces the feed orders unconditionally.
    pub fn replace_feed_orders(&mut self, orders: Vec<FeedOrder>) {
        self.feed_orders.items = orders;
    }

    /// Replaces the user orders with the ones fetched for `account` by the
    /// refresh of `generation`, unless a newer refresh has already been
    /// applied or the current account has changed since.
    ///
    /// Returns whether the orders were applied.
    pub fn apply_user_orders(
        &mut self,
        generation: Generation,
        account: Address,
        orders: Vec<UserOrder>,
    ) -> bool {
        if self.user_orders.is_stale(generation) || self.current_account != Some(account) {
            return false;
        }
        self.user_orders = Versioned {
            generation,
            items: orders,
        };
        true
    }

    /// Replaces the feed orders with the ones fetched by the refresh of
    /// `generation`, unless a newer refresh has already been applied.
    ///
    /// Returns whether the orders were applied.
    pub fn apply_feed_orders(&mut self, generation: Generation, orders: Vec<FeedOrder>) -> bool {
        if self.feed_orders.is_stale(generation) {
            return false;
        }
        self.feed_orders = Versioned {
            generation,
            items: orders,
        };
        true
    }

    /// Marks results of refreshes up to `generation` as stale
    /// without touching the current lists.
    pub fn invalidate_orders(&mut self, generation: Generation) {
        self.account_generation = self.account_generation.max(generation);
        self.user_orders.generation = self.user_orders.generation.max(generation);
        self.feed_orders.generation = self.feed_orders.generation.max(generation);
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;
    use crate::testing::{feed_orders, user_orders};

    const ALICE: Address = address!("0x1111111111111111111111111111111111111111");
    const BOB: Address = address!("0x2222222222222222222222222222222222222222");

    #[test]
    fn test_form_fields() {
        let mut state = AppState::new();
        state.update_form_field(FormField::AddressTo, "0xabc");
        state.update_form_field(FormField::Amount, "0.5");
        state.update_form_field(FormField::Amount, "0.25");
        assert_eq!(state.form().address_to(), "0xabc");
        assert_eq!(state.form().get(FormField::Amount), "0.25");
        assert_eq!(state.form().keyword(), "");
    }

    #[test]
    fn test_newer_generation_wins() {
        let mut state = AppState::new();
        state.set_account(ALICE);

        assert!(state.apply_user_orders(2, ALICE, user_orders(&[1, 2])));
        assert!(!state.apply_user_orders(1, ALICE, user_orders(&[9])));
        assert_eq!(state.user_orders().len(), 2);

        assert!(state.apply_feed_orders(2, feed_orders(&[1])));
        assert!(!state.apply_feed_orders(2, feed_orders(&[1, 2, 3])));
        assert!(state.apply_feed_orders(3, feed_orders(&[1, 2, 3])));
        assert_eq!(state.feed_orders().len(), 3);
    }

    #[test]
    fn test_orders_of_previous_account_are_discarded() {
        let mut state = AppState::new();
        state.set_account(ALICE);
        state.set_account(BOB);
        assert!(!state.apply_user_orders(1, ALICE, user_orders(&[1])));
        assert!(state.user_orders().is_empty());
    }

    #[test]
    fn test_invalidate_keeps_lists() {
        let mut state = AppState::new();
        state.set_account(ALICE);
        assert!(state.apply_user_orders(1, ALICE, user_orders(&[1])));
        state.invalidate_orders(3);
        assert!(!state.apply_user_orders(2, ALICE, user_orders(&[])));
        assert!(!state.apply_feed_orders(3, feed_orders(&[])));
        assert_eq!(state.user_orders().len(), 1);
        assert!(state.apply_feed_orders(4, feed_orders(&[])));
    }

    #[test]
    fn test_observe_account_ignores_older_refresh() {
        let mut state = AppState::new();
        assert!(state.observe_account(2, BOB));
        assert!(!state.observe_account(1, ALICE));
        assert_eq!(state.current_account(), Some(BOB));

        state.invalidate_orders(5);
        assert!(!state.observe_account(4, ALICE));
        assert_eq!(state.current_account(), Some(BOB));
        assert!(state.observe_account(6, ALICE));
        assert_eq!(state.current_account(), Some(ALICE));
    }

    #[test]
    fn test_flags() {
        let mut state = AppState::new();
        assert!(!state.is_loading());
        state.set_loading(true);
        state.set_open(true);
        assert!(state.is_loading());
        assert!(state.is_open());
        state.set_transaction_count(U256::from(7));
        assert_eq!(state.transaction_count(), Some(U256::from(7)));
    }
}
