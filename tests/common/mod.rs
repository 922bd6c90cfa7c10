#![allow(dead_code)]
//! Test doubles shared by the integration tests.
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use vigia::prelude::*;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn tx(hash: &str, from: &str, to: &str, value: u128) -> Transaction {
    Transaction::new(hash, from, Some(to.to_string()), value)
}

/// ------- In-memory chain: a head height and sparse blocks -------
#[derive(Default)]
pub struct MockChain {
    head: Mutex<u64>,
    blocks: Mutex<BTreeMap<u64, Vec<Transaction>>>,
    broken: Mutex<HashSet<u64>>,
    height_down: AtomicBool,
    block_delay: Mutex<Duration>,
    pub block_fetches: Mutex<Vec<u64>>,
    pub height_fetches: AtomicUsize,
}

impl MockChain {
    pub fn with_head(head: u64) -> Arc<Self> {
        let chain = Self::default();
        *chain.head.lock().unwrap() = head;
        Arc::new(chain)
    }

    pub fn set_head(&self, head: u64) {
        *self.head.lock().unwrap() = head;
    }

    /// Heights at or below the head without explicit transactions are empty blocks.
    pub fn add_block(&self, height: u64, txs: Vec<Transaction>) {
        self.blocks.lock().unwrap().insert(height, txs);
    }

    pub fn break_block(&self, height: u64) {
        self.broken.lock().unwrap().insert(height);
    }

    pub fn set_height_down(&self, down: bool) {
        self.height_down.store(down, Ordering::SeqCst);
    }

    /// Every block fetch takes `delay` (tokio time) before answering.
    pub fn set_block_delay(&self, delay: Duration) {
        *self.block_delay.lock().unwrap() = delay;
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn block_height(&self) -> anyhow::Result<u64> {
        self.height_fetches.fetch_add(1, Ordering::SeqCst);
        if self.height_down.load(Ordering::SeqCst) {
            anyhow::bail!("node unreachable");
        }
        Ok(*self.head.lock().unwrap())
    }

    async fn block_by_height(&self, height: u64) -> anyhow::Result<Block> {
        self.block_fetches.lock().unwrap().push(height);
        let delay = *self.block_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.broken.lock().unwrap().contains(&height) {
            anyhow::bail!("block {height}: malformed response");
        }
        if height > *self.head.lock().unwrap() {
            anyhow::bail!("block {height} not found");
        }
        let transactions = self
            .blocks
            .lock()
            .unwrap()
            .get(&height)
            .cloned()
            .unwrap_or_default();
        Ok(Block {
            height,
            transactions,
        })
    }
}

/// ------- Notifier that records batches and a shared event trail -------
#[derive(Clone, Default)]
pub struct Recorder {
    pub batches: Arc<Mutex<Vec<(Address, Vec<Transaction>)>>>,
    pub events: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn batches(&self) -> Vec<(Address, Vec<Transaction>)> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for Recorder {
    async fn notify(&self, address: &Address, txs: &[Transaction]) {
        self.events.lock().unwrap().push(format!("notify {address}"));
        self.batches
            .lock()
            .unwrap()
            .push((address.clone(), txs.to_vec()));
    }
}

/// ------- Store wrapper that counts appends and can be told to fail -------
pub struct RecordingStore {
    pub inner: MemoryStore,
    pub appends: AtomicUsize,
    pub events: Arc<Mutex<Vec<String>>>,
    pub fail: AtomicBool,
}

impl RecordingStore {
    pub fn new(events: Arc<Mutex<Vec<String>>>) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStore::new(),
            appends: AtomicUsize::new(0),
            events,
            fail: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl Store for RecordingStore {
    async fn append(&self, address: &Address, txs: &[Transaction]) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(format!("store {address}"));
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("disk full");
        }
        self.appends.fetch_add(1, Ordering::SeqCst);
        self.inner.append(address, txs).await
    }

    async fn list(&self, address: &Address) -> anyhow::Result<Vec<Transaction>> {
        self.inner.list(address).await
    }
}
