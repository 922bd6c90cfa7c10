//! Notification sink: told about every (address, block) batch of matches.
use async_trait::async_trait;

use crate::types::{Address, Transaction};

/// Receives matched transactions for a subscribed address, one call per
/// address per block. Fire-and-forget: the engine never looks at an outcome.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// `txs` are the matches for `address` in a single block, in block order.
    async fn notify(&self, address: &Address, txs: &[Transaction]);
}

/// Plain closures work as notifiers.
#[async_trait]
impl<F> Notifier for F
where
    F: Fn(&Address, &[Transaction]) + Send + Sync,
{
    async fn notify(&self, address: &Address, txs: &[Transaction]) {
        (self)(address, txs)
    }
}

/// Writes one `info` line per transaction through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, address: &Address, txs: &[Transaction]) {
        for tx in txs {
            log::info!(
                "notification: address={} tx={} from={} to={} value={} block={}",
                address,
                tx.hash,
                tx.from,
                tx.to.as_deref().unwrap_or("-"),
                tx.value,
                tx.block_height
            );
        }
    }
}
