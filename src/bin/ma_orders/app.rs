//! Wiring of wallet, vault, state and flows, and execution of one command.

use std::{sync::Arc, time::Duration};

use alloy::providers::DynProvider;
use ma_orders::{
    client::VaultClient,
    poll::{self, PollController},
    state::{AppState, SharedState},
    storage::LocalStorage,
    submit::Submitter,
    types::FormField,
    wallet::ProviderWallet,
};
use tracing::{info, warn};

use crate::{
    config::{Command, EnvConfig},
    error::Result,
    view,
};

type Wallet = ProviderWallet<DynProvider>;
type Vault = VaultClient<DynProvider>;

pub struct App {
    state: SharedState,
    controller: Arc<PollController<Wallet, Vault>>,
    submitter: Submitter<Wallet, Vault>,
    poll_interval: Duration,
}

impl App {
    pub async fn try_new(config: &EnvConfig) -> Result<Self> {
        let chain = config.chain()?;
        let wallet = ProviderWallet::connect(config.node_url()?, config.signer()?)?;
        let vault = VaultClient::new(&chain, wallet.provider().clone());
        info!(
            chain_id = chain.chain_id(),
            vault = %vault.address(),
            "connected to order vault"
        );

        let wallet = Arc::new(wallet);
        let vault = Arc::new(vault);
        let state = AppState::new().shared();
        let storage = LocalStorage::new(config.storage_path());
        let submitter = Submitter::new(wallet.clone(), vault.clone(), state.clone(), storage);
        if let Err(err) = submitter.load_counter().await {
            warn!(%err, "failed to restore transaction count");
        }

        Ok(Self {
            controller: Arc::new(PollController::new(wallet, vault, state.clone())),
            state,
            submitter,
            poll_interval: config.poll_interval(),
        })
    }

    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Watch => self.watch().await?,
            Command::Orders => {
                self.controller.tick().await;
                view::print_state(&*self.state.read().await);
            }
            Command::Connect => {
                let account = self.submitter.connect_wallet().await?;
                println!("connected: {account}");
            }
            Command::Transfer {
                to,
                amount,
                keyword,
                message,
            } => {
                self.controller.tick().await;
                {
                    let mut state = self.state.write().await;
                    state.update_form_field(FormField::AddressTo, to);
                    state.update_form_field(FormField::Amount, amount);
                    state.update_form_field(FormField::Keyword, keyword);
                    state.update_form_field(FormField::Message, message);
                }
                let receipt = self.submitter.send_transaction().await?;
                println!("transfer: {}", receipt.transfer);
                println!("transactionCount: {}", receipt.transaction_count);
            }
            Command::Deposit { amount } => {
                {
                    let mut state = self.state.write().await;
                    state.set_open(true);
                    state.update_form_field(FormField::Amount, amount);
                }
                let tx_hash = self.submitter.send_deposit().await?;
                println!("deposit: {tx_hash}");
            }
            Command::Counter => {
                let count = self.submitter.refresh_counter().await?;
                println!("transactionCount: {count}");
            }
        }
        Ok(())
    }

    async fn watch(&self) -> Result<()> {
        let (mut reports, handle) = poll::start(self.controller.clone(), self.poll_interval);
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        let result = loop {
            tokio::select! {
                signal = &mut shutdown => {
                    info!("shutting down");
                    break signal;
                }
                report = reports.recv() => match report {
                    Some(_) => view::print_state(&*self.state.read().await),
                    None => break Ok(()),
                },
            }
        };

        handle.stop().await;
        Ok(result?)
    }
}
