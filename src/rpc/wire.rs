//! Request/response envelopes and the block shape returned by the node.
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{error::RpcError, quantity};
use crate::types::{Block, Transaction};

/// JSON-RPC 2.0 request envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Always `"2.0"`.
    pub jsonrpc: String,
    /// Method name, e.g. `eth_blockNumber`.
    pub method: String,
    /// Positional parameters.
    pub params: Vec<Value>,
    /// Caller-chosen id echoed by the node.
    pub id: u64,
}

impl RpcRequest {
    /// Version-2.0 request.
    pub fn new(id: u64, method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            method: method.into(),
            params,
            id,
        }
    }
}

/// JSON-RPC 2.0 response envelope. Exactly one of `result` / `error` is
/// expected, but nodes are not always strict about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct RpcResponse {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

impl RpcResponse {
    /// Successful response carrying `result`.
    pub fn ok(id: u64, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id: id.into(),
            result: Some(result),
            error: None,
        }
    }

    /// `result`, or the node's error object turned into an [`RpcError`].
    /// A missing `result` comes back as `Value::Null`.
    pub fn into_result(self) -> Result<Value, RpcError> {
        match self.error {
            Some(e) => Err(RpcError::Node {
                code: e.code,
                message: e.message,
            }),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

/// The `error` member of a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

/// Block as returned by `eth_getBlockByNumber(_, true)`; only the fields we use.
#[derive(Debug, Clone, Deserialize)]
#[allow(missing_docs)]
pub struct WireBlock {
    pub number: String,
    #[serde(default)]
    pub transactions: Vec<WireTransaction>,
}

/// Full transaction object inside a [`WireBlock`].
#[derive(Debug, Clone, Deserialize)]
#[allow(missing_docs)]
pub struct WireTransaction {
    pub hash: String,
    pub from: String,
    pub to: Option<String>,
    pub value: String,
}

impl TryFrom<WireBlock> for Block {
    type Error = RpcError;

    fn try_from(wire: WireBlock) -> Result<Self, RpcError> {
        let height = quantity::parse_height(&wire.number)?;
        let transactions = wire
            .transactions
            .into_iter()
            .map(|tx| {
                let value = quantity::parse_quantity(&tx.value)?;
                Ok(Transaction::new(tx.hash, tx.from, tx.to, value))
            })
            .collect::<Result<_, RpcError>>()?;
        Ok(Block {
            height,
            transactions,
        })
    }
}
