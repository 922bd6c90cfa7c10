//! Embedded SQLite store for matched transactions.
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use tokio::task;

use crate::store::Store;
use crate::types::{Address, Transaction, U256};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS transactions (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        address      TEXT    NOT NULL,
        hash         TEXT    NOT NULL,
        from_addr    TEXT    NOT NULL,
        to_addr      TEXT,
        value        TEXT    NOT NULL,
        block_height INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS transactions_by_address ON transactions(address, id);
"#;

/// One row per (address, transaction):
///   transactions(id, address, hash, from_addr, to_addr, value, block_height)
///
/// `id` is the insertion sequence, so listing by `id` gives append order.
/// `value` is a decimal string because SQLite integers stop at 64 bits and values are 256-bit.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Creates/initializes the SQLite file at `path`.
    pub fn new(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("open sqlite at {}", path.display()))?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            "#,
        )?;
        Self::with_connection(conn)
    }

    /// Private in-memory database, gone when the store is dropped.
    pub fn new_in_memory() -> anyhow::Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> anyhow::Result<Self> {
        conn.execute_batch(SCHEMA).context("create transactions schema")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn insert_all(conn: &mut Connection, address: &str, txs: &[Transaction]) -> anyhow::Result<()> {
        let db_tx = conn.transaction()?;
        {
            let mut stmt = db_tx.prepare_cached(
                "INSERT INTO transactions(address, hash, from_addr, to_addr, value, block_height)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for tx in txs {
                let height = i64::try_from(tx.block_height)
                    .with_context(|| format!("block height {} overflows sqlite", tx.block_height))?;
                stmt.execute(params![
                    address,
                    tx.hash,
                    tx.from,
                    tx.to,
                    tx.value.to_string(),
                    height
                ])?;
            }
        }
        db_tx.commit()?;
        Ok(())
    }

    fn select_all(conn: &Connection, address: &str) -> anyhow::Result<Vec<Transaction>> {
        let mut stmt = conn.prepare_cached(
            "SELECT hash, from_addr, to_addr, value, block_height
             FROM transactions WHERE address = ?1 ORDER BY id",
        )?;
        let mut rows = stmt.query(params![address])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(3)?;
            let height: i64 = row.get(4)?;
            out.push(Transaction {
                hash: row.get(0)?,
                from: row.get(1)?,
                to: row.get(2)?,
                value: U256::from_dec_str(&value)
                    .map_err(|e| anyhow::anyhow!("parse stored value {value:?}: {e:?}"))?,
                block_height: u64::try_from(height).context("negative stored block height")?,
            });
        }
        Ok(out)
    }
}

fn lock(conn: &Mutex<Connection>) -> std::sync::MutexGuard<'_, Connection> {
    conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl Store for SqliteStore {
    async fn append(&self, address: &Address, txs: &[Transaction]) -> anyhow::Result<()> {
        if txs.is_empty() {
            return Ok(());
        }
        let conn = self.conn.clone();
        let owned = (address.clone(), txs.to_vec());
        task::spawn_blocking(move || Self::insert_all(&mut lock(&conn), &owned.0, &owned.1))
            .await?
            .with_context(|| format!("append {} transactions for {address}", txs.len()))
    }

    async fn list(&self, address: &Address) -> anyhow::Result<Vec<Transaction>> {
        let conn = self.conn.clone();
        let address = address.clone();
        task::spawn_blocking(move || Self::select_all(&lock(&conn), &address)).await?
    }
}
