//! Wallet access: linked accounts and signed value transfers.

use std::future::Future;

use alloy::{
    network::{EthereumWallet, TransactionBuilder},
    primitives::{Address, TxHash, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::{client::RpcClient, types::TransactionRequest},
    signers::local::PrivateKeySigner,
};
use tracing::{debug, info};
use url::Url;

use crate::error::{Error, ProviderError, RevertReason, VaultError};

/// Gas limit of a plain value transfer (`0x5208`).
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

/// Capability interface of a wallet: account discovery and value transfers.
pub trait WalletGateway: Send + Sync {
    /// Accounts available without user interaction (`eth_accounts`).
    fn accounts(&self) -> impl Future<Output = Result<Vec<Address>, VaultError>> + Send;

    /// Asks the wallet to link accounts (`eth_requestAccounts`).
    fn request_accounts(&self) -> impl Future<Output = Result<Vec<Address>, VaultError>> + Send;

    /// Sends `value` wei from `from` to `to` with [`TRANSFER_GAS_LIMIT`] and
    /// waits for the transaction to be included.
    fn send_value_transfer(
        &self,
        from: Address,
        to: Address,
        value: U256,
    ) -> impl Future<Output = Result<TxHash, VaultError>> + Send;
}

/// Wallet backed by an RPC provider.
///
/// With a local signer the signer's addresses are the linked accounts and
/// transactions are signed locally, otherwise the node's own accounts and
/// signing (`eth_sendTransaction`) are used.
#[derive(Clone, Debug)]
pub struct ProviderWallet<P> {
    provider: P,
    signers: Vec<Address>,
}

impl<P: Provider + Clone> ProviderWallet<P> {
    pub fn new(provider: P, signers: Vec<Address>) -> Self {
        Self { provider, signers }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl ProviderWallet<DynProvider> {
    /// Connects to the node at `node_url`, optionally signing with `signer`.
    /// Without a node URL there is no wallet to talk to.
    pub fn connect(node_url: Option<Url>, signer: Option<PrivateKeySigner>) -> Result<Self, Error> {
        let Some(node_url) = node_url else {
            return Err(Error::WalletMissing);
        };
        let client = RpcClient::new_http(node_url);

        match signer {
            Some(signer) => {
                let address = signer.address();
                info!(%address, "using local signer");
                let provider = DynProvider::new(
                    ProviderBuilder::new()
                        .wallet(EthereumWallet::new(signer))
                        .connect_client(client),
                );
                Ok(Self::new(provider, vec![address]))
            }
            None => {
                info!("using node-managed accounts");
                let provider = DynProvider::new(ProviderBuilder::new().connect_client(client));
                Ok(Self::new(provider, vec![]))
            }
        }
    }
}

impl<P: Provider + Clone + Send + Sync> WalletGateway for ProviderWallet<P> {
    async fn accounts(&self) -> Result<Vec<Address>, VaultError> {
        if !self.signers.is_empty() {
            return Ok(self.signers.clone());
        }
        Ok(self.provider.get_accounts().await?)
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, VaultError> {
        if !self.signers.is_empty() {
            return Ok(self.signers.clone());
        }
        let accounts: Vec<Address> = self
            .provider
            .raw_request("eth_requestAccounts".into(), [(); 0])
            .await?;
        Ok(accounts)
    }

    async fn send_value_transfer(
        &self,
        from: Address,
        to: Address,
        value: U256,
    ) -> Result<TxHash, VaultError> {
        let tx = TransactionRequest::default()
            .with_from(from)
            .with_to(to)
            .with_value(value)
            .with_gas_limit(TRANSFER_GAS_LIMIT);
        let pending = self.provider.send_transaction(tx).await?;
        let tx_hash = *pending.tx_hash();
        debug!(%tx_hash, %from, %to, %value, "transfer submitted");

        let receipt = pending.get_receipt().await?;
        if !receipt.status() {
            return Err(ProviderError::Reverted(Box::new(RevertReason::Unknown)));
        }
        Ok(tx_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> PrivateKeySigner {
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
            .parse()
            .unwrap()
    }

    #[test]
    fn test_connect_without_node_is_wallet_missing() {
        assert!(matches!(
            ProviderWallet::connect(None, None),
            Err(Error::WalletMissing)
        ));
        assert!(matches!(
            ProviderWallet::connect(None, Some(signer())),
            Err(Error::WalletMissing)
        ));
    }

    #[tokio::test]
    async fn test_local_signer_is_the_linked_account() {
        let signer = signer();
        let address = signer.address();
        let url = Url::parse("http://127.0.0.1:8545").unwrap();
        let wallet = ProviderWallet::connect(Some(url), Some(signer)).unwrap();
        assert_eq!(wallet.accounts().await.unwrap(), vec![address]);
        assert_eq!(wallet.request_accounts().await.unwrap(), vec![address]);
    }
}
