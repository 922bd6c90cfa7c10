//! JSON-RPC "quantity" encoding: `0x` followed by hex digits.
use super::error::RpcError;
use crate::types::U256;

/// Parse a quantity such as `"0x4b7"` into an integer.
pub fn parse_quantity(s: &str) -> Result<U256, RpcError> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .filter(|d| !d.is_empty() && d.bytes().all(|b| b.is_ascii_hexdigit()))
        .ok_or_else(|| RpcError::InvalidQuantity(s.to_owned()))?;
    U256::from_str_radix(digits, 16).map_err(|_| RpcError::InvalidQuantity(s.to_owned()))
}

/// Same as [`parse_quantity`], for values that must fit a block height.
pub fn parse_height(s: &str) -> Result<u64, RpcError> {
    let n = parse_quantity(s)?;
    if n > U256::from(u64::MAX) {
        return Err(RpcError::InvalidQuantity(s.to_owned()));
    }
    Ok(n.low_u64())
}

/// Encode a height the way `eth_getBlockByNumber` expects it.
pub fn format_quantity(n: u64) -> String {
    format!("0x{n:x}")
}
