use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::{
    error::RpcError,
    quantity,
    wire::{RpcRequest, RpcResponse, WireBlock},
};
use crate::{chain_client::ChainClient, types::Block};

/// Moves one JSON-RPC request to a node and brings back its response.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Send `req`; an `Err` means no response was obtained at all.
    async fn send(&self, req: RpcRequest) -> anyhow::Result<RpcResponse>;
}

/// [`ChainClient`] over the Ethereum JSON-RPC methods
/// `eth_blockNumber` and `eth_getBlockByNumber`.
pub struct EthRpcClient<T> {
    transport: T,
    next_id: AtomicU64,
}

impl<T: RpcTransport> EthRpcClient<T> {
    /// Client sending its requests through `transport`.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            next_id: AtomicU64::new(1),
        }
    }

    /// Issue `method(params)` and return the raw `result` (possibly `null`).
    pub async fn call(&self, method: &'static str, params: Vec<Value>) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let req = RpcRequest::new(id, method, params);
        log::debug!("rpc -> {method} id={id}");
        let resp = self
            .transport
            .send(req)
            .await
            .with_context(|| format!("{method} id={id}"))
            .map_err(|e| RpcError::Transport(e.into()))?;
        resp.into_result()
    }

    async fn call_as<R: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Vec<Value>,
    ) -> Result<R, RpcError> {
        let value = self.call(method, params).await?;
        serde_json::from_value(value).map_err(|source| RpcError::Decode { method, source })
    }
}

#[async_trait]
impl<T: RpcTransport> ChainClient for EthRpcClient<T> {
    async fn block_height(&self) -> anyhow::Result<u64> {
        let hex: String = self.call_as("eth_blockNumber", vec![]).await?;
        Ok(quantity::parse_height(&hex)?)
    }

    async fn block_by_height(&self, height: u64) -> anyhow::Result<Block> {
        let params = vec![json!(quantity::format_quantity(height)), json!(true)];
        let wire: Option<WireBlock> = self.call_as("eth_getBlockByNumber", params).await?;
        let wire = wire.ok_or(RpcError::BlockNotFound(height))?;
        Ok(Block::try_from(wire)?)
    }
}

#[cfg(feature = "rpc-http")]
impl EthRpcClient<super::http::HttpTransport> {
    /// Client POSTing to the JSON-RPC endpoint at `url`.
    pub fn http(url: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self::new(super::http::HttpTransport::new(url)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Replays canned results and records every request.
    struct Canned {
        replies: Mutex<Vec<anyhow::Result<RpcResponse>>>,
        seen: Mutex<Vec<RpcRequest>>,
    }

    impl Canned {
        fn new(replies: Vec<anyhow::Result<RpcResponse>>) -> Self {
            Self {
                replies: Mutex::new(replies),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RpcTransport for Canned {
        async fn send(&self, req: RpcRequest) -> anyhow::Result<RpcResponse> {
            self.seen.lock().unwrap().push(req);
            self.replies.lock().unwrap().remove(0)
        }
    }

    #[tokio::test]
    async fn block_height_decodes_hex_result_and_bumps_ids() {
        let client = EthRpcClient::new(Canned::new(vec![
            Ok(RpcResponse::ok(1, json!("0x4b7"))),
            Ok(RpcResponse::ok(2, json!("0x4b8"))),
        ]));

        assert_eq!(client.block_height().await.unwrap(), 1207);
        assert_eq!(client.block_height().await.unwrap(), 1208);

        let seen = client.transport.seen.lock().unwrap();
        assert_eq!(seen[0].method, "eth_blockNumber");
        assert!(seen[0].params.is_empty());
        assert_eq!((seen[0].id, seen[1].id), (1, 2));
    }

    #[tokio::test]
    async fn block_by_height_requests_full_transactions() {
        let block = json!({
            "number": "0x10",
            "hash": "0xblock",
            "transactions": [
                { "hash": "0xt1", "from": "0xa", "to": "0xb", "value": "0x64", "gas": "0x5208" },
                { "hash": "0xt2", "from": "0xb", "to": null, "value": "0x0" }
            ]
        });
        let client = EthRpcClient::new(Canned::new(vec![Ok(RpcResponse::ok(1, block))]));

        let got = client.block_by_height(16).await.unwrap();

        assert_eq!(got.height, 16);
        assert_eq!(got.transactions.len(), 2);
        assert_eq!(got.transactions[0].value, crate::types::U256::from(100u64));
        assert_eq!(got.transactions[0].to.as_deref(), Some("0xb"));
        assert_eq!(got.transactions[1].to, None);

        let seen = client.transport.seen.lock().unwrap();
        assert_eq!(seen[0].method, "eth_getBlockByNumber");
        assert_eq!(seen[0].params, vec![json!("0x10"), json!(true)]);
    }

    #[tokio::test]
    async fn values_beyond_u128_do_not_break_the_block() {
        let huge = format!("0x{}", "f".repeat(64));
        let block = json!({
            "number": "0x7",
            "transactions": [
                { "hash": "0xbig", "from": "0xa", "to": "0xb", "value": huge },
                { "hash": "0xsmall", "from": "0xa", "to": "0xc", "value": "0x1" }
            ]
        });
        let client = EthRpcClient::new(Canned::new(vec![Ok(RpcResponse::ok(1, block))]));

        let got = client.block_by_height(7).await.unwrap();

        assert_eq!(got.transactions.len(), 2);
        assert_eq!(got.transactions[0].value, crate::types::U256::MAX);
        assert_eq!(got.transactions[1].value, crate::types::U256::one());
    }

    #[tokio::test]
    async fn null_block_is_not_found() {
        let client = EthRpcClient::new(Canned::new(vec![Ok(RpcResponse::ok(1, Value::Null))]));
        let err = client.block_by_height(99).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RpcError>(),
            Some(RpcError::BlockNotFound(99))
        ));
    }

    #[tokio::test]
    async fn node_error_object_surfaces_code_and_message() {
        let resp: RpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32005, "message": "rate limited" }
        }))
        .unwrap();
        let client = EthRpcClient::new(Canned::new(vec![Ok(resp)]));

        let err = client.block_height().await.unwrap_err();
        assert_eq!(err.to_string(), "node error -32005: rate limited");
    }

    #[tokio::test]
    async fn unexpected_shapes_are_decode_errors() {
        let client = EthRpcClient::new(Canned::new(vec![
            Ok(RpcResponse::ok(1, json!(1207))),
            Ok(RpcResponse::ok(2, json!({ "number": "0x1", "transactions": [{ "hash": "0xt" }] }))),
            Ok(RpcResponse::ok(3, json!({ "number": "12", "transactions": [] }))),
        ]));

        let height = client.block_height().await.unwrap_err();
        assert!(matches!(height.downcast_ref::<RpcError>(), Some(RpcError::Decode { .. })));

        let missing_fields = client.block_by_height(1).await.unwrap_err();
        assert!(matches!(missing_fields.downcast_ref::<RpcError>(), Some(RpcError::Decode { .. })));

        let bad_number = client.block_by_height(12).await.unwrap_err();
        assert!(matches!(bad_number.downcast_ref::<RpcError>(), Some(RpcError::InvalidQuantity(_))));
    }

    #[tokio::test]
    async fn transport_failure_is_wrapped() {
        let client = EthRpcClient::new(Canned::new(vec![Err(anyhow::anyhow!("connection refused"))]));
        let err = client.block_height().await.unwrap_err();
        assert!(matches!(err.downcast_ref::<RpcError>(), Some(RpcError::Transport(_))));
    }
}
