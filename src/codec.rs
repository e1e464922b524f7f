//! Calldata and return-data encoding.
//!
//! Calldata is a four-byte [`Selector`] followed by the JSON encoding of the
//! call arguments. Return data is plain JSON. Facets pick their arguments
//! back out with [`decode_args`].

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::DiamondError;
use crate::types::{Selector, SELECTOR_LEN};

/// Encode a call to `selector` with the given arguments.
///
/// # Errors
///
/// Returns [`DiamondError::MalformedCalldata`] if the arguments cannot be
/// serialized.
pub fn encode_call<A: Serialize>(selector: Selector, args: &A) -> Result<Vec<u8>, DiamondError> {
    let payload = serde_json::to_vec(args)
        .map_err(|e| DiamondError::MalformedCalldata(format!("cannot encode arguments: {e}")))?;
    let mut out = Vec::with_capacity(SELECTOR_LEN.saturating_add(payload.len()));
    out.extend_from_slice(&selector.0);
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Encode a call that takes no arguments.
pub fn encode_bare_call(selector: Selector) -> Vec<u8> {
    selector.0.to_vec()
}

/// Decode the arguments that follow the selector.
///
/// An absent payload decodes as JSON `null`, so `()` and `Option<T>`
/// arguments accept bare calls.
///
/// # Errors
///
/// Returns [`DiamondError::MalformedCalldata`] if the payload does not match
/// the expected argument type.
pub fn decode_args<A: DeserializeOwned>(calldata: &[u8]) -> Result<A, DiamondError> {
    let payload = calldata.get(SELECTOR_LEN..).unwrap_or_default();
    let parsed = if payload.is_empty() {
        serde_json::from_value(serde_json::Value::Null)
    } else {
        serde_json::from_slice(payload)
    };
    parsed.map_err(|e| DiamondError::MalformedCalldata(format!("cannot decode arguments: {e}")))
}

/// Encode a facet's return value.
///
/// # Errors
///
/// Returns [`DiamondError::MalformedCalldata`] if the value cannot be
/// serialized.
pub fn encode_return<R: Serialize>(value: &R) -> Result<Vec<u8>, DiamondError> {
    serde_json::to_vec(value)
        .map_err(|e| DiamondError::MalformedCalldata(format!("cannot encode return data: {e}")))
}

/// Decode return data produced by [`encode_return`].
///
/// # Errors
///
/// Returns [`DiamondError::MalformedCalldata`] if the bytes are not the
/// expected JSON shape.
pub fn decode_return<R: DeserializeOwned>(data: &[u8]) -> Result<R, DiamondError> {
    serde_json::from_slice(data)
        .map_err(|e| DiamondError::MalformedCalldata(format!("cannot decode return data: {e}")))
}
