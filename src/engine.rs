//! Tracking engine:
//! 1) keep a view of the chain head fresh,
//! 2) scan every block between the last processed height and that head once,
//! 3) hand matches for subscribed addresses to the notifier, then the store.
use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::Context;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::{
    chain_client::ChainClient,
    config::EngineConfig,
    hooks::Notifier,
    matcher::match_block,
    store::Store,
    types::{Address, Transaction},
};

/// Heights and subscriptions. Always read and written together, under one lock
/// that is never held across a call into the client, store or notifier.
#[derive(Debug, Default)]
struct Tracked {
    current_height: u64,
    last_processed: u64,
    // Set by the first successful head fetch, which also places
    // `last_processed` at the lookback below that head.
    anchored: bool,
    subscriptions: HashSet<Address>,
}

struct Inner<S, C, N> {
    state: Mutex<Tracked>,
    // Serializes scan passes between the background loop and `scan_once`.
    scan_gate: AsyncMutex<()>,
    cancel: CancellationToken,
    lookback: u64,
    store: S,
    client: C,
    notifier: N,
}

/// What one scan pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Inclusive height range covered, `None` when there was nothing new.
    pub range: Option<(u64, u64)>,
    /// Heights whose block could not be fetched or decoded. They count as
    /// processed and are not retried.
    pub skipped: Vec<u64>,
    /// Number of (address, block) batches handed to the notifier and store.
    pub batches: usize,
    /// The pass stopped early because the engine is shutting down; progress
    /// was not recorded.
    pub interrupted: bool,
}

/// Core engine. `S` = transaction store, `C` = chain client, `N` = notifier.
///
/// Two background tasks run from [`Vigia::start`] until [`Vigia::shutdown`]
/// (or until the lifecycle token passed to `start` is cancelled). Query and
/// subscribe calls can come from any number of tasks or threads meanwhile.
pub struct Vigia<S, C, N> {
    inner: Arc<Inner<S, C, N>>,
    tasks: TaskTracker,
}

impl<S, C, N> Vigia<S, C, N>
where
    S: Store + 'static,
    C: ChainClient + 'static,
    N: Notifier + 'static,
{
    /// Bootstrap against the chain head and start the refresh and scan loops.
    ///
    /// The head is fetched once before returning and the first scan pass will
    /// cover the `config.lookback()` blocks below it. If that fetch fails the
    /// engine reports height 0 and the lookback is applied to whichever head
    /// the refresh loop fetches first.
    ///
    /// Cancelling `lifecycle` stops the loops; [`Vigia::shutdown`] stops them
    /// and waits. Must be called from within a Tokio runtime.
    pub async fn start(
        lifecycle: &CancellationToken,
        store: S,
        config: EngineConfig,
        client: C,
        notifier: N,
    ) -> Self {
        let inner = Arc::new(Inner {
            state: Mutex::new(Tracked::default()),
            scan_gate: AsyncMutex::new(()),
            cancel: lifecycle.child_token(),
            lookback: config.lookback(),
            store,
            client,
            notifier,
        });

        if let Err(e) = inner.refresh_height().await {
            log::warn!("initial height fetch failed, waiting for the refresh loop: {e:#}");
        }

        let refresh = {
            let inner = inner.clone();
            every("height refresh", config.poll_period(), inner.cancel.clone(), move || {
                let inner = inner.clone();
                async move {
                    if let Err(e) = inner.refresh_height().await {
                        log::warn!("height refresh failed: {e:#}");
                    }
                }
            })
        };
        let scan = {
            let inner = inner.clone();
            every("transaction scan", config.scan_period(), inner.cancel.clone(), move || {
                let inner = inner.clone();
                async move {
                    inner.scan().await;
                }
            })
        };

        let tasks = TaskTracker::new();
        tasks.spawn(refresh);
        tasks.spawn(scan);
        tasks.close();
        Self { inner, tasks }
    }

    /// Start watching `address`. `false` if it was already watched (or empty).
    pub fn subscribe(&self, address: impl Into<Address>) -> bool {
        let address = address.into();
        if address.is_empty() {
            return false;
        }
        let added = self.inner.state().subscriptions.insert(address.clone());
        if added {
            log::info!("subscribed {address}");
        }
        added
    }

    /// Whether `address` is watched.
    pub fn is_subscribed(&self, address: &str) -> bool {
        self.inner.state().subscriptions.contains(address)
    }

    /// Number of watched addresses.
    pub fn subscription_count(&self) -> usize {
        self.inner.state().subscriptions.len()
    }

    /// Latest chain head seen.
    pub fn current_height(&self) -> u64 {
        self.inner.state().current_height
    }

    /// Highest height already scanned.
    pub fn last_processed_height(&self) -> u64 {
        self.inner.state().last_processed
    }

    /// Stored matches for `address`, oldest first. Empty if never matched.
    pub async fn transactions(&self, address: &str) -> anyhow::Result<Vec<Transaction>> {
        self.inner
            .store
            .list(&address.to_owned())
            .await
            .with_context(|| format!("list transactions for {address}"))
    }

    /// Run one height refresh now, exactly like a tick of the refresh loop.
    pub async fn refresh_height(&self) -> anyhow::Result<u64> {
        self.inner.refresh_height().await
    }

    /// Run one scan pass now, exactly like a tick of the scan loop. Waits for
    /// a pass already in progress.
    pub async fn scan_once(&self) -> ScanReport {
        self.inner.scan().await
    }

    /// Stop both loops and wait until they have exited. Every caller waits,
    /// including concurrent ones; once the loops are gone calls return at
    /// once. Queries keep working on the last known state.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        if self.tasks.is_empty() {
            return;
        }
        log::info!("waiting for {} background tasks to stop", self.tasks.len());
        self.tasks.wait().await;
        log::info!("background tasks stopped");
    }
}

impl<S, C, N> Drop for Vigia<S, C, N> {
    fn drop(&mut self) {
        self.inner.cancel.cancel();
    }
}

impl<S, C, N> Inner<S, C, N>
where
    S: Store,
    C: ChainClient,
    N: Notifier,
{
    fn state(&self) -> MutexGuard<'_, Tracked> {
        lock(&self.state)
    }

    async fn refresh_height(&self) -> anyhow::Result<u64> {
        let fetched = self.client.block_height().await.context("fetch block height")?;
        let (kept, previous, anchored_at) = {
            let mut st = self.state();
            let previous = st.current_height;
            st.current_height = previous.max(fetched);
            let anchored_at = if st.anchored {
                None
            } else {
                st.anchored = true;
                st.last_processed = fetched.saturating_sub(self.lookback);
                Some(st.last_processed)
            };
            (st.current_height, previous, anchored_at)
        };
        if let Some(from) = anchored_at {
            log::info!("tracking from block {from} (head {fetched})");
        }
        if fetched < previous {
            log::warn!("node reported head {fetched} below known head {previous}; keeping {previous}");
        } else if fetched > previous {
            log::debug!("head is now {fetched}");
        }
        Ok(kept)
    }

    async fn scan(&self) -> ScanReport {
        let _pass = self.scan_gate.lock().await;
        let mut report = ScanReport::default();

        let (watched, start, end) = {
            let st = self.state();
            (st.subscriptions.clone(), st.last_processed + 1, st.current_height)
        };
        if start > end {
            log::debug!("no new blocks (next {start}, head {end})");
            return report;
        }
        log::info!("scanning blocks {start}..={end} for {} addresses", watched.len());

        for height in start..=end {
            if self.cancel.is_cancelled() {
                log::info!("scan interrupted at block {height}");
                report.interrupted = true;
                return report;
            }

            let block = match self.client.block_by_height(height).await {
                Ok(block) if block.height == height => block,
                Ok(block) => {
                    log::warn!("skipping block {height}: node returned block {}", block.height);
                    report.skipped.push(height);
                    continue;
                }
                Err(e) => {
                    log::warn!("skipping block {height}: {e:#}");
                    report.skipped.push(height);
                    continue;
                }
            };

            for (address, txs) in match_block(&block, &watched) {
                log::info!("found {} transactions for {address} in block {height}", txs.len());
                self.notifier.notify(&address, &txs).await;
                if let Err(e) = self.store.append(&address, &txs).await {
                    log::error!("failed to store block {height} matches for {address}: {e:#}");
                }
                report.batches += 1;
            }
        }

        self.state().last_processed = end;
        report.range = Some((start, end));
        log::info!(
            "scanned blocks {start}..={end}: {} batches, {} skipped",
            report.batches,
            report.skipped.len()
        );
        report
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Run `tick` every `period` (first run one period from now) until `cancel`.
async fn every<F, Fut>(name: &'static str, period: Duration, cancel: CancellationToken, mut tick: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => tick().await,
        }
    }
    log::info!("{name} loop stopped");
}
