//! Plain data carried between the chain client, the engine and the store.
pub use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Chain account identifier. Opaque and case-sensitive: `"0xAb"` and `"0xab"`
/// are different subscriptions.
pub type Address = String;

/// A transaction as seen by subscribers.
///
/// `block_height` is not part of the per-transaction wire form; the engine
/// stamps it from the containing [`Block`] when a transaction matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction hash as reported by the node.
    pub hash: String,
    /// Sender.
    pub from: Address,
    /// Recipient, `None` for contract creation.
    pub to: Option<Address>,
    /// Transferred amount in the chain's base unit (full 256-bit range).
    pub value: U256,
    /// Height of the block that included this transaction.
    pub block_height: u64,
}

impl Transaction {
    /// Build a transaction that is not yet tied to a block (height 0).
    pub fn new(
        hash: impl Into<String>,
        from: impl Into<Address>,
        to: Option<Address>,
        value: impl Into<U256>,
    ) -> Self {
        Self {
            hash: hash.into(),
            from: from.into(),
            to,
            value: value.into(),
            block_height: 0,
        }
    }

    /// Same transaction, stamped with the height of its block.
    pub fn at_height(mut self, height: u64) -> Self {
        self.block_height = height;
        self
    }
}

/// A block: height plus its transactions in block order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    /// Block height.
    pub height: u64,
    /// Transactions in the order the block lists them.
    pub transactions: Vec<Transaction>,
}
