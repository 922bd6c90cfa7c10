//! Ethereum-style JSON-RPC implementation of [`ChainClient`](crate::ChainClient).
//!
//! [`EthRpcClient`] speaks the protocol; an [`RpcTransport`] moves the bytes.
//! With the `rpc-http` feature, [`HttpTransport`] does that over HTTP POST.

mod client;
mod error;
#[cfg(feature = "rpc-http")]
mod http;
pub mod quantity;
pub mod wire;

pub use client::{EthRpcClient, RpcTransport};
pub use error::RpcError;
#[cfg(feature = "rpc-http")]
pub use http::HttpTransport;
pub use wire::{RpcRequest, RpcResponse};
