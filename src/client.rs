//! Order vault contract calls.

use std::future::Future;

use alloy::{
    primitives::{Address, Bytes, TxHash, U256},
    providers::Provider,
};
use tracing::debug;

use crate::{
    Chain,
    abi::vault::OrderVault::OrderVaultInstance,
    error::{ProviderError, RevertReason, VaultError},
    types::{Limit, Offset},
};

/// Remote calls of the order vault contract.
///
/// Every call is a single round trip, state-changing calls resolve once the
/// transaction is included.
pub trait OrderVault: Send + Sync {
    /// Encoded user orders of `account` (`getUserOrderListBytes`).
    fn user_orders(
        &self,
        account: Address,
        offset: Offset,
        limit: Limit,
    ) -> impl Future<Output = Result<Vec<Bytes>, VaultError>> + Send;

    /// Encoded price-feed orders (`getPriceFeedOrderListBytes`).
    fn feed_orders(
        &self,
        offset: Offset,
        limit: Limit,
    ) -> impl Future<Output = Result<Vec<Bytes>, VaultError>> + Send;

    /// Deposits `value` wei into the vault (`testDepositETH`).
    fn send_deposit(&self, value: U256) -> impl Future<Output = Result<TxHash, VaultError>> + Send;

    /// Records a transferred amount on the counter (`store`).
    fn store(&self, amount: U256) -> impl Future<Output = Result<TxHash, VaultError>> + Send;

    /// Current counter value (`retrieve`).
    fn counter(&self) -> impl Future<Output = Result<U256, VaultError>> + Send;
}

/// [`OrderVault`] over the deployed contract, signing with the provider's wallet.
#[derive(Clone, Debug)]
pub struct VaultClient<P> {
    instance: OrderVaultInstance<P>,
}

impl<P: Provider + Clone> VaultClient<P> {
    pub fn new(chain: &Chain, provider: P) -> Self {
        Self {
            instance: OrderVaultInstance::new(chain.vault(), provider),
        }
    }

    pub fn address(&self) -> Address {
        *self.instance.address()
    }
}

impl<P: Provider + Clone + Send + Sync> OrderVault for VaultClient<P> {
    async fn user_orders(
        &self,
        account: Address,
        offset: Offset,
        limit: Limit,
    ) -> Result<Vec<Bytes>, VaultError> {
        let entries = self
            .instance
            .getUserOrderListBytes(account, U256::from(offset), U256::from(limit))
            .call()
            .await?;
        debug!(%account, count = entries.len(), "fetched user orders");
        Ok(entries)
    }

    async fn feed_orders(&self, offset: Offset, limit: Limit) -> Result<Vec<Bytes>, VaultError> {
        let entries = self
            .instance
            .getPriceFeedOrderListBytes(U256::from(offset), U256::from(limit))
            .call()
            .await?;
        debug!(count = entries.len(), "fetched feed orders");
        Ok(entries)
    }

    async fn send_deposit(&self, value: U256) -> Result<TxHash, VaultError> {
        let pending = self.instance.testDepositETH().value(value).send().await?;
        let tx_hash = *pending.tx_hash();
        debug!(%tx_hash, %value, "deposit submitted");
        ensure_success(pending.get_receipt().await?.status(), tx_hash)
    }

    async fn store(&self, amount: U256) -> Result<TxHash, VaultError> {
        let pending = self.instance.store(amount).send().await?;
        let tx_hash = *pending.tx_hash();
        debug!(%tx_hash, %amount, "counter update submitted");
        ensure_success(pending.get_receipt().await?.status(), tx_hash)
    }

    async fn counter(&self) -> Result<U256, VaultError> {
        Ok(self.instance.retrieve().call().await?)
    }
}

fn ensure_success(status: bool, tx_hash: TxHash) -> Result<TxHash, VaultError> {
    if status {
        Ok(tx_hash)
    } else {
        Err(ProviderError::Reverted(Box::new(RevertReason::Unknown)))
    }
}
