//! Periodic refresh of the wallet connection and both order lists.
//!
//! # Architecture
//!
//! - [`PollController::tick`] performs one refresh: reads the wallet accounts
//!   without user interaction and, when an account is linked, fetches and
//!   decodes both order lists and applies them to the [`SharedState`].
//! - [`start`] spawns a background task running a tick every interval until
//!   the returned [`PollHandle`] is stopped.
//!
//! Ticks may overlap when fetches are slower than the interval. Each tick
//! carries a [`Generation`] and the state only accepts results newer than
//! what it already holds, so the latest started refresh wins regardless of
//! completion order. A tick that finds no linked account invalidates all
//! refreshes started before it.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use alloy::primitives::Address;
use tokio::{
    sync::{mpsc, watch},
    task::{JoinHandle, JoinSet},
    time::MissedTickBehavior,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    client::OrderVault,
    decode,
    error::Error,
    state::SharedState,
    types::{FeedOrder, Generation, Limit, Offset, UserOrder},
    wallet::WalletGateway,
};

/// Default interval between two ticks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default page of user orders fetched per refresh.
const DEFAULT_USER_ORDERS_LIMIT: Limit = 1_000_000;

/// Default page of feed orders fetched per refresh.
const DEFAULT_FEED_ORDERS_LIMIT: Limit = 100;

/// Default report channel buffer size.
const DEFAULT_CHANNEL_SIZE: usize = 100;

/// Wallet connection as observed by the last tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected(Address),
}

/// What a tick did with one of the order lists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListOutcome {
    /// Fetched, decoded and applied, with the number of records.
    Applied(usize),
    /// Fetched, but a newer refresh got there first.
    Stale,
    /// Fetch or decode failed, the previous list is kept.
    Failed,
    /// Not fetched.
    Skipped,
}

/// Result of a single tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickReport {
    pub generation: Generation,
    pub connection: ConnectionState,
    pub user_orders: ListOutcome,
    pub feed_orders: ListOutcome,
}

impl TickReport {
    fn skipped(generation: Generation, connection: ConnectionState) -> Self {
        Self {
            generation,
            connection,
            user_orders: ListOutcome::Skipped,
            feed_orders: ListOutcome::Skipped,
        }
    }
}

/// Refreshes wallet connection and order lists into the shared state.
pub struct PollController<W, V> {
    wallet: Arc<W>,
    vault: Arc<V>,
    state: SharedState,
    generation: AtomicU64,
    connection: watch::Sender<ConnectionState>,
    user_orders_page: (Offset, Limit),
    feed_orders_page: (Offset, Limit),
}

impl<W: WalletGateway, V: OrderVault> PollController<W, V> {
    pub fn new(wallet: Arc<W>, vault: Arc<V>, state: SharedState) -> Self {
        Self {
            wallet,
            vault,
            state,
            generation: AtomicU64::new(0),
            connection: watch::Sender::new(ConnectionState::Disconnected),
            user_orders_page: (0, DEFAULT_USER_ORDERS_LIMIT),
            feed_orders_page: (0, DEFAULT_FEED_ORDERS_LIMIT),
        }
    }

    /// Sets the page of user orders to fetch (default: first 1000000).
    pub fn with_user_orders_page(mut self, offset: Offset, limit: Limit) -> Self {
        self.user_orders_page = (offset, limit);
        self
    }

    /// Sets the page of feed orders to fetch (default: first 100).
    pub fn with_feed_orders_page(mut self, offset: Offset, limit: Limit) -> Self {
        self.feed_orders_page = (offset, limit);
        self
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Subscribes to wallet connection changes.
    pub fn connection(&self) -> watch::Receiver<ConnectionState> {
        self.connection.subscribe()
    }

    /// Generation of the most recently started tick.
    pub fn generation(&self) -> Generation {
        self.generation.load(Ordering::SeqCst)
    }

    /// Performs a single refresh. Failures are logged and reported,
    /// never returned.
    pub async fn tick(&self) -> TickReport {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let accounts = match self.wallet.accounts().await {
            Ok(accounts) => accounts,
            Err(err) => {
                warn!(generation, %err, "failed to read wallet accounts");
                return TickReport::skipped(generation, *self.connection.borrow());
            }
        };

        let Some(account) = accounts.first().copied() else {
            info!(generation, "no accounts found");
            self.state.write().await.invalidate_orders(generation);
            self.set_connection(ConnectionState::Disconnected);
            return TickReport::skipped(generation, ConnectionState::Disconnected);
        };

        let connection = ConnectionState::Connected(account);
        if !self.state.write().await.observe_account(generation, account) {
            debug!(generation, %account, "newer refresh already observed the wallet");
            return TickReport {
                generation,
                connection,
                user_orders: ListOutcome::Stale,
                feed_orders: ListOutcome::Stale,
            };
        }
        self.set_connection(connection);

        let (user, feed) = futures::join!(self.fetch_user_orders(account), self.fetch_feed_orders());

        let mut state = self.state.write().await;
        let user_orders = match user {
            Ok(orders) => {
                let count = orders.len();
                if state.apply_user_orders(generation, account, orders) {
                    ListOutcome::Applied(count)
                } else {
                    debug!(generation, %account, "discarding stale user orders");
                    ListOutcome::Stale
                }
            }
            Err(err) => {
                warn!(generation, %account, %err, "failed to refresh user orders");
                ListOutcome::Failed
            }
        };
        let feed_orders = match feed {
            Ok(orders) => {
                let count = orders.len();
                if state.apply_feed_orders(generation, orders) {
                    ListOutcome::Applied(count)
                } else {
                    debug!(generation, "discarding stale feed orders");
                    ListOutcome::Stale
                }
            }
            Err(err) => {
                warn!(generation, %err, "failed to refresh feed orders");
                ListOutcome::Failed
            }
        };

        TickReport {
            generation,
            connection,
            user_orders,
            feed_orders,
        }
    }

    fn set_connection(&self, connection: ConnectionState) {
        let previous = self.connection.send_replace(connection);
        if previous != connection {
            info!(?previous, current = ?connection, "wallet connection changed");
        }
    }

    async fn fetch_user_orders(&self, account: Address) -> Result<Vec<UserOrder>, Error> {
        let (offset, limit) = self.user_orders_page;
        let entries = self.vault.user_orders(account, offset, limit).await?;
        Ok(decode::decode_all(&entries)?)
    }

    async fn fetch_feed_orders(&self) -> Result<Vec<FeedOrder>, Error> {
        let (offset, limit) = self.feed_orders_page;
        let entries = self.vault.feed_orders(offset, limit).await?;
        Ok(decode::decode_all(&entries)?)
    }
}

/// Receiver of tick reports.
pub struct PollReceiver {
    inner: mpsc::Receiver<TickReport>,
}

impl PollReceiver {
    /// Receives the report of the next completed tick, or `None` once the
    /// poller has stopped.
    pub async fn recv(&mut self) -> Option<TickReport> {
        self.inner.recv().await
    }
}

/// Handle to the background polling task.
pub struct PollHandle {
    cancellation_token: CancellationToken,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Stops the timer, aborts ticks still in flight and waits for the
    /// task to finish.
    pub async fn stop(self) {
        self.cancellation_token.cancel();
        if let Err(err) = self.task.await {
            error!(%err, "poller task failed");
        }
    }
}

/// Starts polling with the given interval; the first tick runs immediately.
///
/// Returns a receiver of tick reports and a handle to stop polling.
pub fn start<W, V>(controller: Arc<PollController<W, V>>, interval: Duration) -> (PollReceiver, PollHandle)
where
    W: WalletGateway + 'static,
    V: OrderVault + 'static,
{
    let (tx, rx) = mpsc::channel(DEFAULT_CHANNEL_SIZE);
    let cancellation_token = CancellationToken::new();
    let task = tokio::spawn(run(controller, interval, cancellation_token.clone(), tx));
    (
        PollReceiver { inner: rx },
        PollHandle {
            cancellation_token,
            task,
        },
    )
}

async fn run<W, V>(
    controller: Arc<PollController<W, V>>,
    interval: Duration,
    cancellation_token: CancellationToken,
    tx: mpsc::Sender<TickReport>,
) where
    W: WalletGateway + 'static,
    V: OrderVault + 'static,
{
    let mut timer = tokio::time::interval(interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut ticks = JoinSet::new();

    info!(?interval, "poller started");
    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => break,
            _ = timer.tick() => {
                let controller = controller.clone();
                let tx = tx.clone();
                ticks.spawn(async move {
                    let report = controller.tick().await;
                    if let Err(mpsc::error::TrySendError::Full(report)) = tx.try_send(report) {
                        warn!(generation = report.generation, "tick report dropped, receiver is lagging");
                    }
                });
            }
            Some(joined) = ticks.join_next(), if !ticks.is_empty() => {
                if let Err(err) = joined {
                    error!(%err, "tick task failed");
                }
            }
        }
    }

    ticks.shutdown().await;
    info!("poller stopped");
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;
    use crate::{
        state::AppState,
        testing::{TestVault, TestWallet, feed_order_entry, user_order_entry},
    };

    const ALICE: Address = address!("0x1111111111111111111111111111111111111111");

    fn controller(wallet: TestWallet, vault: TestVault) -> PollController<TestWallet, TestVault> {
        PollController::new(Arc::new(wallet), Arc::new(vault), AppState::new().shared())
    }

    #[tokio::test]
    async fn test_tick_applies_both_lists() {
        let vault = TestVault::new();
        vault.set_user_entries(ALICE, vec![user_order_entry(1), user_order_entry(2)]);
        vault.set_feed_entries(vec![feed_order_entry(1)]);
        let controller = controller(TestWallet::with_accounts(vec![ALICE]), vault);
        let mut connection = controller.connection();

        let report = controller.tick().await;
        assert_eq!(report.generation, 1);
        assert_eq!(report.connection, ConnectionState::Connected(ALICE));
        assert_eq!(report.user_orders, ListOutcome::Applied(2));
        assert_eq!(report.feed_orders, ListOutcome::Applied(1));
        assert!(connection.has_changed().unwrap());
        assert_eq!(*connection.borrow_and_update(), ConnectionState::Connected(ALICE));

        let state = controller.state().read().await;
        assert_eq!(state.current_account(), Some(ALICE));
        assert_eq!(state.user_orders().len(), 2);
        assert_eq!(state.feed_orders()[0].ma1(), Some(3_500));
    }

    #[tokio::test]
    async fn test_tick_without_accounts_skips_fetches() {
        let controller = controller(TestWallet::new(), TestVault::new());
        let report = controller.tick().await;
        assert_eq!(report, TickReport::skipped(1, ConnectionState::Disconnected));
        assert_eq!(controller.vault.user_calls(), 0);
        assert_eq!(controller.vault.feed_calls(), 0);
        assert_eq!(controller.state().read().await.current_account(), None);
    }

    #[tokio::test]
    async fn test_pages_are_forwarded() {
        let vault = TestVault::new();
        vault.set_feed_entries((0..5).map(feed_order_entry).collect());
        let controller = controller(TestWallet::with_accounts(vec![ALICE]), vault)
            .with_feed_orders_page(1, 2);

        let report = controller.tick().await;
        assert_eq!(report.feed_orders, ListOutcome::Applied(2));
        let state = controller.state().read().await;
        let indices: Vec<_> = state.feed_orders().iter().map(|o| o.index().to::<u64>()).collect();
        assert_eq!(indices, vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_ticks_every_interval() {
        let vault = TestVault::new();
        vault.set_feed_entries(vec![feed_order_entry(1)]);
        let controller = Arc::new(controller(TestWallet::with_accounts(vec![ALICE]), vault));

        let (mut reports, handle) = start(controller.clone(), DEFAULT_POLL_INTERVAL);
        let first = reports.recv().await.unwrap();
        assert_eq!(first.generation, 1);

        tokio::time::sleep(DEFAULT_POLL_INTERVAL * 2).await;
        let second = reports.recv().await.unwrap();
        let third = reports.recv().await.unwrap();
        assert_eq!((second.generation, third.generation), (2, 3));

        handle.stop().await;
        assert_eq!(reports.recv().await, None);
        assert_eq!(controller.generation(), 3);
    }
}
