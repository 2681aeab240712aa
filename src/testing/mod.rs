//! In-memory test doubles and fixture builders.
//!
//! [`TestWallet`] and [`TestVault`] implement [`WalletGateway`] and
//! [`OrderVault`] without a node: accounts, list entries, call latencies and
//! failures are scripted by the test, and submitted transactions are recorded
//! for inspection.
//!
//! `*_fields` / `*_entry` helpers build deterministic order entries encoded
//! the same way the vault encodes them.

use std::{
    collections::VecDeque,
    sync::{
        Mutex,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};

use alloy::{
    primitives::{Address, B256, Bytes, TxHash, U256},
    sol_types::SolValue,
};
use dashmap::DashMap;

use crate::{
    abi::schema::{FeedOrderFields, UserOrderFields},
    client::OrderVault,
    decode::OrderSchema,
    error::{ProviderError, VaultError},
    types::{FeedOrder, Limit, Offset, UserOrder},
    wallet::WalletGateway,
};

/// Deterministic user order fields, distinguished by `nonce`.
pub fn user_order_fields(nonce: u64) -> UserOrderFields {
    UserOrderFields {
        nonce: U256::from(nonce),
        indexOfPriceFeedOrder: U256::from(1),
        description: format!("order {nonce}"),
        currentAmountA: U256::from(1_000 + nonce),
        currentAmountB: U256::from(2_000 + nonce),
        userInitialAmount: U256::from(500),
        userDepositAmountA: U256::from(250),
        userDepositAmountB: U256::from(250),
        priceFeedAddress: Address::repeat_byte(0xaa),
        paramsAddress: Address::repeat_byte(0xbb),
        nonceBefore: U256::from(nonce.saturating_sub(1)),
        nonceAfter: U256::ZERO,
    }
}

/// Deterministic feed order fields, distinguished by `index`.
pub fn feed_order_fields(index: u64) -> FeedOrderFields {
    FeedOrderFields {
        index: U256::from(index),
        description: format!("ETH/USD #{index}"),
        dataFeed: Address::repeat_byte(0xcc),
        paramsAddress: Address::repeat_byte(0xbb),
        tokenA: Address::repeat_byte(0xdd),
        tokenB: Address::repeat_byte(0xee),
        initialTotalAmount: U256::from(10_000),
        currentTotalAmountA: U256::from(6_000),
        currentTotalAmountB: U256::from(4_000),
        ma1: 350_000,
        ma2: 330_000,
        maInterval: 100,
        executionInterval: 3_600,
        timeStamp: 1_700_000_000,
    }
}

pub fn user_order_entry(nonce: u64) -> Bytes {
    user_order_fields(nonce).abi_encode_params().into()
}

pub fn feed_order_entry(index: u64) -> Bytes {
    feed_order_fields(index).abi_encode_params().into()
}

pub fn user_orders(nonces: &[u64]) -> Vec<UserOrder> {
    nonces
        .iter()
        .map(|n| UserOrder::from_fields(user_order_fields(*n)))
        .collect()
}

pub fn feed_orders(indices: &[u64]) -> Vec<FeedOrder> {
    indices
        .iter()
        .map(|i| FeedOrder::from_fields(feed_order_fields(*i)))
        .collect()
}

fn tx_hash(seq: u64) -> TxHash {
    B256::left_padding_from(&seq.to_be_bytes())
}

/// Scripted wallet.
#[derive(Debug, Default)]
pub struct TestWallet {
    accounts: Mutex<Vec<Address>>,
    requestable: Mutex<Vec<Address>>,
    reject_requests: Mutex<bool>,
    transfer_error: Mutex<Option<VaultError>>,
    transfers: Mutex<Vec<(Address, Address, U256)>>,
    account_reads: AtomicUsize,
}

impl TestWallet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wallet with `accounts` already linked.
    pub fn with_accounts(accounts: Vec<Address>) -> Self {
        let wallet = Self::new();
        wallet.set_accounts(accounts);
        wallet
    }

    /// Sets the accounts visible without interaction.
    pub fn set_accounts(&self, accounts: Vec<Address>) {
        *self.accounts.lock().unwrap() = accounts;
    }

    /// Sets the accounts the user links when asked; they become visible
    /// without interaction afterwards.
    pub fn set_requestable(&self, accounts: Vec<Address>) {
        *self.requestable.lock().unwrap() = accounts;
    }

    /// Makes the user decline account requests.
    pub fn reject_requests(&self) {
        *self.reject_requests.lock().unwrap() = true;
    }

    /// Makes the next transfer fail with `err`.
    pub fn fail_next_transfer(&self, err: VaultError) {
        *self.transfer_error.lock().unwrap() = Some(err);
    }

    pub fn transfers(&self) -> Vec<(Address, Address, U256)> {
        self.transfers.lock().unwrap().clone()
    }

    /// Number of non-interactive account reads so far.
    pub fn account_reads(&self) -> usize {
        self.account_reads.load(Ordering::SeqCst)
    }
}

impl WalletGateway for TestWallet {
    async fn accounts(&self) -> Result<Vec<Address>, VaultError> {
        self.account_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, VaultError> {
        if *self.reject_requests.lock().unwrap() {
            return Err(ProviderError::UserRejected);
        }
        let linked = self.requestable.lock().unwrap().clone();
        self.set_accounts(linked.clone());
        Ok(linked)
    }

    async fn send_value_transfer(
        &self,
        from: Address,
        to: Address,
        value: U256,
    ) -> Result<TxHash, VaultError> {
        if let Some(err) = self.transfer_error.lock().unwrap().take() {
            return Err(err);
        }
        let mut transfers = self.transfers.lock().unwrap();
        transfers.push((from, to, value));
        Ok(tx_hash(transfers.len() as u64))
    }
}

/// Scripted order vault.
///
/// List calls capture the entries at call time, then wait for the next
/// scripted latency (if any) before returning them.
#[derive(Debug, Default)]
pub struct TestVault {
    user_entries: DashMap<Address, Vec<Bytes>>,
    feed_entries: Mutex<Vec<Bytes>>,
    user_latencies: Mutex<VecDeque<Duration>>,
    feed_latencies: Mutex<VecDeque<Duration>>,
    feed_error: Mutex<Option<VaultError>>,
    deposit_error: Mutex<Option<VaultError>>,
    deposits: Mutex<Vec<U256>>,
    counter: Mutex<U256>,
    user_calls: AtomicUsize,
    feed_calls: AtomicUsize,
    tx_seq: AtomicU64,
}

impl TestVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_user_entries(&self, account: Address, entries: Vec<Bytes>) {
        self.user_entries.insert(account, entries);
    }

    pub fn set_feed_entries(&self, entries: Vec<Bytes>) {
        *self.feed_entries.lock().unwrap() = entries;
    }

    /// Delays the next user order call by `latency`.
    pub fn push_user_latency(&self, latency: Duration) {
        self.user_latencies.lock().unwrap().push_back(latency);
    }

    /// Delays the next feed order call by `latency`.
    pub fn push_feed_latency(&self, latency: Duration) {
        self.feed_latencies.lock().unwrap().push_back(latency);
    }

    /// Makes the next feed order call fail with `err`.
    pub fn fail_next_feed(&self, err: VaultError) {
        *self.feed_error.lock().unwrap() = Some(err);
    }

    /// Makes the next deposit fail with `err`.
    pub fn fail_next_deposit(&self, err: VaultError) {
        *self.deposit_error.lock().unwrap() = Some(err);
    }

    pub fn deposits(&self) -> Vec<U256> {
        self.deposits.lock().unwrap().clone()
    }

    pub fn set_counter(&self, value: U256) {
        *self.counter.lock().unwrap() = value;
    }

    pub fn user_calls(&self) -> usize {
        self.user_calls.load(Ordering::SeqCst)
    }

    pub fn feed_calls(&self) -> usize {
        self.feed_calls.load(Ordering::SeqCst)
    }

    fn next_tx(&self) -> TxHash {
        tx_hash(self.tx_seq.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

fn page(entries: Vec<Bytes>, offset: Offset, limit: Limit) -> Vec<Bytes> {
    entries
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .collect()
}

impl OrderVault for TestVault {
    async fn user_orders(
        &self,
        account: Address,
        offset: Offset,
        limit: Limit,
    ) -> Result<Vec<Bytes>, VaultError> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        let entries = self
            .user_entries
            .get(&account)
            .map(|e| e.clone())
            .unwrap_or_default();
        let latency = self.user_latencies.lock().unwrap().pop_front();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        Ok(page(entries, offset, limit))
    }

    async fn feed_orders(&self, offset: Offset, limit: Limit) -> Result<Vec<Bytes>, VaultError> {
        self.feed_calls.fetch_add(1, Ordering::SeqCst);
        let entries = self.feed_entries.lock().unwrap().clone();
        let error = self.feed_error.lock().unwrap().take();
        let latency = self.feed_latencies.lock().unwrap().pop_front();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        match error {
            Some(err) => Err(err),
            None => Ok(page(entries, offset, limit)),
        }
    }

    async fn send_deposit(&self, value: U256) -> Result<TxHash, VaultError> {
        if let Some(err) = self.deposit_error.lock().unwrap().take() {
            return Err(err);
        }
        self.deposits.lock().unwrap().push(value);
        Ok(self.next_tx())
    }

    async fn store(&self, amount: U256) -> Result<TxHash, VaultError> {
        *self.counter.lock().unwrap() = amount;
        Ok(self.next_tx())
    }

    async fn counter(&self) -> Result<U256, VaultError> {
        Ok(*self.counter.lock().unwrap())
    }
}
