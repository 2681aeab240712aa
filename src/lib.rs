//! Moving-average order vault client.
//!
//! # Overview
//!
//! Reads the per-user and price-feed order lists of the order vault contract,
//! decodes their ABI-encoded entries into typed records, keeps them refreshed
//! in an explicitly owned application state, and submits deposit/transfer
//! transactions through a wallet-backed provider.
//!
//! Use [`wallet::ProviderWallet`] and [`client::VaultClient`] to talk to the
//! chain, [`poll::PollController`] to keep [`state::AppState`] up to date,
//! and [`submit::Submitter`] for user-initiated transactions.
//!
//! # Refresh model
//!
//! Every poll tick carries a generation number. Results of a tick are applied
//! to the state only if no newer tick has been applied or invalidated the
//! lists in the meantime, so a slow fetch can never overwrite fresher data.
//!
//! # Limitations/follow-ups
//!
//! * `indexOfPriceFeedOrder` of user orders is not checked against the feed
//!   order list.
//!
//! * Order lists are fetched with a single page per refresh.
//!
//! # Testing
//!
//! [`testing`] module provides in-memory wallet and vault doubles and
//! helpers to build encoded order entries.

pub mod abi;
pub mod client;
pub mod decode;
pub mod error;
pub mod num;
pub mod poll;
pub mod state;
pub mod storage;
pub mod submit;
pub mod testing;
pub mod types;
pub mod wallet;

use alloy::primitives::Address;

#[derive(Clone, Debug)]
/// Chain the order vault is deployed on.
pub struct Chain {
    chain_id: u64,
    vault: Address,
}

impl Chain {
    pub fn custom(chain_id: u64, vault: Address) -> Self {
        Self { chain_id, vault }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn vault(&self) -> Address {
        self.vault
    }
}
