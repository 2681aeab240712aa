//! Configuration for the order vault CLI.
//!
//! Configuration comes from two sources:
//! - Environment variables (via .env file or shell): chain, node and keys
//! - CLI arguments: the command to run and its inputs

use std::{path::PathBuf, time::Duration};

use alloy::{primitives::Address, signers::local::PrivateKeySigner};
use clap::{Parser, Subcommand};
use ma_orders::{Chain, poll::DEFAULT_POLL_INTERVAL};
use url::Url;

use crate::error::Result;

/// Storage file used when `STORAGE_PATH` is not set.
const DEFAULT_STORAGE_PATH: &str = "ma_orders_storage.json";

/// Environment configuration (connection details, credentials).
#[derive(Debug, serde::Deserialize)]
pub struct EnvConfig {
    /// Chain ID of the network the vault is deployed on
    pub chain_id: u64,

    /// Order vault contract address
    pub vault_address: String,

    /// RPC URL of the node; without it there is no wallet
    pub node_rpc_url: Option<String>,

    /// Private key for signing transactions; node-managed accounts otherwise
    pub private_key: Option<String>,

    /// Path of the local storage file
    pub storage_path: Option<PathBuf>,

    /// Poll interval in milliseconds (default: 5000)
    pub poll_interval_ms: Option<u64>,
}

impl EnvConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> std::result::Result<Self, envy::Error> {
        envy::from_env()
    }

    pub fn chain(&self) -> Result<Chain> {
        let vault: Address = self.vault_address.parse()?;
        Ok(Chain::custom(self.chain_id, vault))
    }

    pub fn node_url(&self) -> Result<Option<Url>> {
        Ok(self.node_rpc_url.as_deref().map(Url::parse).transpose()?)
    }

    pub fn signer(&self) -> Result<Option<PrivateKeySigner>> {
        Ok(self.private_key.as_deref().map(str::parse).transpose()?)
    }

    pub fn storage_path(&self) -> PathBuf {
        self.storage_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_PATH))
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval_ms
            .map_or(DEFAULT_POLL_INTERVAL, Duration::from_millis)
    }
}

/// CLI arguments.
#[derive(Debug, Parser)]
#[command(name = "ma_orders")]
#[command(about = "Moving-average order vault client")]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll the wallet and both order lists, printing them after each refresh
    Watch,

    /// Refresh once and print both order lists
    Orders,

    /// Ask the wallet to link an account
    Connect,

    /// Send ether to an address and record it on the vault counter
    Transfer {
        /// Recipient address
        #[arg(long)]
        to: String,

        /// Amount in ether (e.g., 0.05)
        #[arg(long)]
        amount: String,

        #[arg(long, default_value = "")]
        keyword: String,

        #[arg(long, default_value = "")]
        message: String,
    },

    /// Deposit ether into the vault
    Deposit {
        /// Amount in ether (e.g., 0.05)
        #[arg(long)]
        amount: String,
    },

    /// Read and store the vault transaction counter
    Counter,
}
