use thiserror::Error;

/// Failures talking to a JSON-RPC node.
#[derive(Debug, Error)]
pub enum RpcError {
    /// The request never produced a response body.
    #[error("transport: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The node answered with an `error` object.
    #[error("node error {code}: {message}")]
    Node {
        /// JSON-RPC error code.
        code: i64,
        /// Human-readable reason from the node.
        message: String,
    },

    /// The response was not shaped the way the method promises.
    #[error("decode {method}: {source}")]
    Decode {
        /// Method whose result failed to decode.
        method: &'static str,
        /// Underlying serde failure.
        #[source]
        source: serde_json::Error,
    },

    /// A hex quantity that is not `0x` followed by hex digits.
    #[error("invalid hex quantity {0:?}")]
    InvalidQuantity(String),

    /// `result` was `null`: the node does not know this block (yet).
    #[error("block {0} not found")]
    BlockNotFound(u64),
}
