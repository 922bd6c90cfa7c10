#![forbid(unsafe_code)]
#![deny(missing_docs)]
//! vigia: follows a chain head and delivers transactions for watched addresses.
//!
//! ## What you plug in
//! - [`ChainClient`]: current head height and blocks by height
//!   ([`EthRpcClient`] speaks Ethereum JSON-RPC).
//! - [`Store`]: append/list matched transactions per address
//!   ([`MemoryStore`], or [`SqliteStore`] with the `store-sqlite` feature).
//! - [`Notifier`]: told about every batch of matches ([`LogNotifier`], or any closure).
//!
//! ## What the engine does
//! - Refreshes the head height on a timer.
//! - On a slower timer, scans each new block once, in height order.
//! - Groups transactions by subscribed sender/recipient, notifies, then stores.
//!
//! ## Minimal usage
//! ```rust,ignore
//! use vigia::prelude::*;
//! use tokio_util::sync::CancellationToken;
//!
//! async fn run() -> anyhow::Result<()> {
//!     let lifecycle = CancellationToken::new();
//!     let engine = Vigia::start(
//!         &lifecycle,
//!         MemoryStore::new(),
//!         EngineConfig::new(10)?,
//!         EthRpcClient::http("https://cloudflare-eth.com")?,
//!         LogNotifier,
//!     )
//!     .await;
//!
//!     engine.subscribe("0xde0b295669a9fd93d5f28d9ec85e40f4cb697bae");
//!     println!("head: {}", engine.current_height());
//!
//!     engine.shutdown().await;
//!     Ok(())
//! }
//! ```

/// Engine that tracks the head, scans blocks, and dispatches matches.
pub mod engine;

/// Chain node abstraction (height, block by height).
pub mod chain_client;

/// Notification sink for matched transactions.
pub mod hooks;

/// Ethereum JSON-RPC chain client.
pub mod rpc;

/// Engine timing and environment configuration.
pub mod config;

/// Addresses, transactions, blocks.
pub mod types;

// Internal helpers:
mod matcher;

/// Persistence layer (trait, in-memory and SQLite implementations).
pub mod store;

// Public re-exports
pub use chain_client::ChainClient;
pub use config::{Config, ConfigError, EngineConfig};
pub use engine::{ScanReport, Vigia};
pub use hooks::{LogNotifier, Notifier};
pub use rpc::{EthRpcClient, RpcError};
#[cfg(feature = "store-sqlite")]
pub use store::SqliteStore;
pub use store::{MemoryStore, Store};
pub use types::{Address, Block, Transaction, U256};

/// Convenience prelude for end users.
pub mod prelude {
    #[cfg(feature = "store-sqlite")]
    pub use crate::SqliteStore;
    pub use crate::{
        Address, Block, ChainClient, EngineConfig, EthRpcClient, LogNotifier, MemoryStore,
        Notifier, Store, Transaction, Vigia, U256,
    };
}
