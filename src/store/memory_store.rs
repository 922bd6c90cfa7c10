//! Process-local store: a map of address to transaction list.
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::store::Store;
use crate::types::{Address, Transaction};

/// In-memory [`Store`]. Lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<Address, Vec<Transaction>>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn data(&self) -> std::sync::MutexGuard<'_, HashMap<Address, Vec<Transaction>>> {
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn append(&self, address: &Address, txs: &[Transaction]) -> anyhow::Result<()> {
        self.data()
            .entry(address.clone())
            .or_default()
            .extend_from_slice(txs);
        Ok(())
    }

    async fn list(&self, address: &Address) -> anyhow::Result<Vec<Transaction>> {
        Ok(self.data().get(address).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn appends_accumulate_in_order() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let addr: Address = "0xa".into();
        let t1 = Transaction::new("t1", "0xa", None, 1u64).at_height(5);
        let t2 = Transaction::new("t2", "0xb", Some("0xa".into()), 2u64).at_height(6);

        store.append(&addr, &[t1.clone()]).await?;
        store.append(&addr, &[t2.clone()]).await?;

        assert_eq!(store.list(&addr).await?, vec![t1, t2]);
        assert!(store.list(&"0xb".to_string()).await?.is_empty());
        Ok(())
    }
}
