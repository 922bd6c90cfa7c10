//! Persistence interfaces and implementations for matched transactions.
use async_trait::async_trait;

use crate::types::{Address, Transaction};

/// Append-only per-address transaction log. Must tolerate concurrent callers.
#[async_trait]
pub trait Store: Send + Sync {
    /// Append `txs` (in order) to the log of `address`.
    async fn append(&self, address: &Address, txs: &[Transaction]) -> anyhow::Result<()>;

    /// Everything stored for `address`, in insertion order. Unknown addresses
    /// yield an empty list.
    async fn list(&self, address: &Address) -> anyhow::Result<Vec<Transaction>>;
}

#[async_trait]
impl<S: Store + ?Sized> Store for std::sync::Arc<S> {
    async fn append(&self, address: &Address, txs: &[Transaction]) -> anyhow::Result<()> {
        (**self).append(address, txs).await
    }

    async fn list(&self, address: &Address) -> anyhow::Result<Vec<Transaction>> {
        (**self).list(address).await
    }
}

// submodules / concrete stores live here
pub mod memory_store;
#[cfg(feature = "store-sqlite")]
pub mod sqlite_store;

pub use memory_store::MemoryStore;
#[cfg(feature = "store-sqlite")]
pub use sqlite_store::SqliteStore;
