//! User-initiated flows: wallet connection, value transfer, deposit and the
//! transaction counter.
//!
//! Every flow reads its inputs from the form held by the [`SharedState`].
//! Inputs are parsed before anything is sent, so a malformed amount or
//! address never reaches the wallet. The loading flag is raised for the
//! duration of a submission and lowered on success and failure alike.

use std::sync::Arc;

use alloy::primitives::{Address, TxHash, U256};
use tracing::{info, warn};

use crate::{
    client::OrderVault,
    error::Error,
    num,
    state::SharedState,
    storage::{LocalStorage, TRANSACTION_COUNT_KEY},
    types::FormField,
    wallet::WalletGateway,
};

/// Outcome of a confirmed transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferReceipt {
    pub transfer: TxHash,
    pub store: TxHash,
    pub transaction_count: U256,
}

pub struct Submitter<W, V> {
    wallet: Arc<W>,
    vault: Arc<V>,
    state: SharedState,
    storage: LocalStorage,
}

impl<W: WalletGateway, V: OrderVault> Submitter<W, V> {
    pub fn new(wallet: Arc<W>, vault: Arc<V>, state: SharedState, storage: LocalStorage) -> Self {
        Self {
            wallet,
            vault,
            state,
            storage,
        }
    }

    /// Restores the transaction counter persisted by an earlier run.
    ///
    /// An unparsable stored value is ignored.
    pub async fn load_counter(&self) -> Result<Option<U256>, Error> {
        let Some(stored) = self.storage.get_item(TRANSACTION_COUNT_KEY).await? else {
            return Ok(None);
        };
        match stored.parse::<U256>() {
            Ok(count) => {
                self.state.write().await.set_transaction_count(count);
                Ok(Some(count))
            }
            Err(err) => {
                warn!(%err, %stored, "ignoring stored transaction count");
                Ok(None)
            }
        }
    }

    /// Asks the wallet to link an account and records the first one.
    pub async fn connect_wallet(&self) -> Result<Address, Error> {
        let accounts = self.wallet.request_accounts().await?;
        let account = accounts.first().copied().ok_or(Error::NoAccounts)?;
        self.state.write().await.set_account(account);
        info!(%account, "wallet connected");
        Ok(account)
    }

    /// Sends the form's `amount` to `addressTo` from the current account,
    /// records it on the vault counter and persists the new counter value.
    pub async fn send_transaction(&self) -> Result<TransferReceipt, Error> {
        let (from, to, amount) = {
            let state = self.state.read().await;
            let from = state.current_account().ok_or(Error::NoAccounts)?;
            let form = state.form();
            (from, parse_address(form.address_to())?, parse_amount(form.amount())?)
        };

        self.state.write().await.set_loading(true);
        let result = self.transfer(from, to, amount).await;
        self.state.write().await.set_loading(false);

        let receipt = result?;
        self.persist_counter(receipt.transaction_count).await?;
        Ok(receipt)
    }

    async fn transfer(&self, from: Address, to: Address, amount: U256) -> Result<TransferReceipt, Error> {
        info!(%from, %to, ether = %num::format_ether(amount), "sending transfer");
        let transfer = self.wallet.send_value_transfer(from, to, amount).await?;
        info!(tx_hash = %transfer, "transfer confirmed");

        let store = self.vault.store(amount).await?;
        let transaction_count = self.vault.counter().await?;
        info!(tx_hash = %store, %transaction_count, "transfer recorded");

        Ok(TransferReceipt {
            transfer,
            store,
            transaction_count,
        })
    }

    /// Closes the deposit dialog and deposits the form's `amount` into the
    /// vault.
    pub async fn send_deposit(&self) -> Result<TxHash, Error> {
        let amount = {
            let mut state = self.state.write().await;
            state.set_open(false);
            parse_amount(state.form().amount())?
        };

        self.state.write().await.set_loading(true);
        let result = self.vault.send_deposit(amount).await;
        self.state.write().await.set_loading(false);

        let tx_hash = result?;
        info!(%tx_hash, ether = %num::format_ether(amount), "deposit confirmed");
        Ok(tx_hash)
    }

    /// Reads the vault counter and persists it.
    pub async fn refresh_counter(&self) -> Result<U256, Error> {
        let count = self.vault.counter().await?;
        self.persist_counter(count).await?;
        Ok(count)
    }

    async fn persist_counter(&self, count: U256) -> Result<(), Error> {
        self.state.write().await.set_transaction_count(count);
        self.storage
            .set_item(TRANSACTION_COUNT_KEY, count.to_string())
            .await?;
        Ok(())
    }
}

fn parse_address(value: &str) -> Result<Address, Error> {
    value.trim().parse().map_err(|_| Error::InvalidInput {
        field: FormField::AddressTo,
        value: value.to_owned(),
    })
}

fn parse_amount(value: &str) -> Result<U256, Error> {
    num::parse_ether(value).ok_or_else(|| Error::InvalidInput {
        field: FormField::Amount,
        value: value.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;
    use crate::{
        error::{ProviderError, VaultError},
        state::AppState,
        testing::{TestVault, TestWallet},
    };

    const ALICE: Address = address!("0x1111111111111111111111111111111111111111");
    const BOB: Address = address!("0x2222222222222222222222222222222222222222");

    struct Fixture {
        wallet: Arc<TestWallet>,
        vault: Arc<TestVault>,
        state: SharedState,
        submitter: Submitter<TestWallet, TestVault>,
        _dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let wallet = Arc::new(TestWallet::with_accounts(vec![ALICE]));
        let vault = Arc::new(TestVault::new());
        let state = AppState::new().shared();
        let submitter = Submitter::new(
            wallet.clone(),
            vault.clone(),
            state.clone(),
            LocalStorage::new(dir.path().join("storage.json")),
        );
        Fixture {
            wallet,
            vault,
            state,
            submitter,
            _dir: dir,
        }
    }

    async fn fill_form(state: &SharedState, to: &str, amount: &str) {
        let mut state = state.write().await;
        state.update_form_field(FormField::AddressTo, to);
        state.update_form_field(FormField::Amount, amount);
    }

    #[tokio::test]
    async fn test_connect_wallet() {
        let f = fixture();
        f.wallet.set_requestable(vec![BOB, ALICE]);
        assert_eq!(f.submitter.connect_wallet().await.unwrap(), BOB);
        assert_eq!(f.state.read().await.current_account(), Some(BOB));
    }

    #[tokio::test]
    async fn test_connect_wallet_rejected() {
        let f = fixture();
        f.wallet.reject_requests();
        assert!(matches!(f.submitter.connect_wallet().await, Err(Error::UserRejected)));
        assert_eq!(f.state.read().await.current_account(), None);

        let f = fixture();
        assert!(matches!(f.submitter.connect_wallet().await, Err(Error::NoAccounts)));
    }

    #[tokio::test]
    async fn test_send_transaction() {
        let f = fixture();
        f.state.write().await.set_account(ALICE);
        fill_form(&f.state, &BOB.to_string(), "0.5").await;

        let receipt = f.submitter.send_transaction().await.unwrap();
        let half = U256::from(500_000_000_000_000_000u64);
        assert_eq!(f.wallet.transfers(), vec![(ALICE, BOB, half)]);
        assert_eq!(receipt.transaction_count, half);

        let state = f.state.read().await;
        assert!(!state.is_loading());
        assert_eq!(state.transaction_count(), Some(half));
        drop(state);

        let restored = fixture_with_storage(&f);
        assert_eq!(restored.load_counter().await.unwrap(), Some(half));
    }

    fn fixture_with_storage(f: &Fixture) -> Submitter<TestWallet, TestVault> {
        Submitter::new(
            f.wallet.clone(),
            f.vault.clone(),
            AppState::new().shared(),
            f.submitter.storage.clone(),
        )
    }

    #[tokio::test]
    async fn test_send_transaction_invalid_input() {
        let f = fixture();
        f.state.write().await.set_account(ALICE);
        fill_form(&f.state, "not an address", "1").await;
        assert!(matches!(
            f.submitter.send_transaction().await,
            Err(Error::InvalidInput {
                field: FormField::AddressTo,
                ..
            })
        ));

        fill_form(&f.state, &BOB.to_string(), "lots").await;
        assert!(matches!(
            f.submitter.send_transaction().await,
            Err(Error::InvalidInput {
                field: FormField::Amount,
                ..
            })
        ));
        assert!(f.wallet.transfers().is_empty());
    }

    #[tokio::test]
    async fn test_failed_transfer_clears_loading() {
        let f = fixture();
        f.state.write().await.set_account(ALICE);
        fill_form(&f.state, &BOB.to_string(), "1").await;
        f.wallet
            .fail_next_transfer(ProviderError::InsufficientFunds("balance 0".to_string()));

        let result = f.submitter.send_transaction().await;
        assert!(matches!(
            result,
            Err(Error::Chain(ProviderError::InsufficientFunds(_)))
        ));
        let state = f.state.read().await;
        assert!(!state.is_loading());
        assert_eq!(state.transaction_count(), None);
    }

    #[tokio::test]
    async fn test_send_deposit() {
        let f = fixture();
        f.state.write().await.set_open(true);
        fill_form(&f.state, "", "2").await;

        f.submitter.send_deposit().await.unwrap();
        assert_eq!(f.vault.deposits(), vec![U256::from(2_000_000_000_000_000_000u64)]);
        let state = f.state.read().await;
        assert!(!state.is_open());
        assert!(!state.is_loading());
    }

    #[tokio::test]
    async fn test_rejected_deposit_clears_loading() {
        let f = fixture();
        fill_form(&f.state, "", "2").await;
        f.vault.fail_next_deposit(VaultError::UserRejected);
        assert!(matches!(f.submitter.send_deposit().await, Err(Error::UserRejected)));
        assert!(!f.state.read().await.is_loading());
        assert!(f.vault.deposits().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_counter() {
        let f = fixture();
        f.vault.set_counter(U256::from(7));
        assert_eq!(f.submitter.refresh_counter().await.unwrap(), U256::from(7));
        assert_eq!(f.state.read().await.transaction_count(), Some(U256::from(7)));
        assert_eq!(
            f.submitter
                .storage
                .get_item(TRANSACTION_COUNT_KEY)
                .await
                .unwrap()
                .as_deref(),
            Some("7")
        );
    }
}
