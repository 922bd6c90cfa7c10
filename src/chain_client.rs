//! Abstraction over the node that serves chain height and blocks.
use async_trait::async_trait;

use crate::types::Block;

/// Read access to a chain node. Implementations do no caching; every call may
/// hit the network and may fail.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Current head height.
    async fn block_height(&self) -> anyhow::Result<u64>;

    /// Block at an exact height, with its transactions in block order.
    async fn block_by_height(&self, height: u64) -> anyhow::Result<Block>;
}

#[async_trait]
impl<C: ChainClient + ?Sized> ChainClient for std::sync::Arc<C> {
    async fn block_height(&self) -> anyhow::Result<u64> {
        (**self).block_height().await
    }

    async fn block_by_height(&self, height: u64) -> anyhow::Result<Block> {
        (**self).block_by_height(height).await
    }
}
