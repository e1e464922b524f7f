//! Core identifiers: module addresses, function selectors and interface ids.
//!
//! Selectors are the first four bytes of the Keccak-256 digest of a canonical
//! function signature such as `transferOwnership(address)`, so they match
//! Solidity ABI selectors. Interface ids follow ERC-165: the XOR of every
//! selector in the interface. Deployment addresses are SHA-256 derived.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sha3::Keccak256;

/// Width of an [`Address`] in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Width of a [`Selector`] in bytes.
pub const SELECTOR_LEN: usize = 4;

/// Canonical signature: identifier followed by a parenthesised, comma
/// separated type list without whitespace.
static SIGNATURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*\(([A-Za-z0-9_\[\]()]+(,[A-Za-z0-9_\[\]()]+)*)?\)$")
        .expect("signature regex must compile")
});

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

/// Errors produced when parsing hex-encoded identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdParseError {
    /// Input is not valid hex.
    #[error("invalid hex in {kind}: {detail}")]
    InvalidHex {
        /// Which identifier was being parsed.
        kind: &'static str,
        /// Decoder diagnostics.
        detail: String,
    },
    /// Decoded input has the wrong width.
    #[error("{kind} must be {expected} bytes, got {actual}")]
    WrongLength {
        /// Which identifier was being parsed.
        kind: &'static str,
        /// Required width in bytes.
        expected: usize,
        /// Decoded width in bytes.
        actual: usize,
    },
}

/// A function signature that failed canonical-form validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a canonical function signature: {0:?}")]
pub struct SignatureError(pub String);

fn decode_fixed<const N: usize>(kind: &'static str, s: &str) -> Result<[u8; N], IdParseError> {
    let trimmed = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(trimmed).map_err(|e| IdParseError::InvalidHex {
        kind,
        detail: e.to_string(),
    })?;
    <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| IdParseError::WrongLength {
        kind,
        expected: N,
        actual: bytes.len(),
    })
}

/// Generates the string conversions shared by the fixed-width identifiers.
macro_rules! hex_id {
    ($ty:ident, $len:expr, $kind:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({self})", stringify!($ty))
            }
        }

        impl FromStr for $ty {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                decode_fixed::<$len>($kind, s).map(Self)
            }
        }

        impl TryFrom<String> for $ty {
            type Error = IdParseError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }

        impl From<$ty> for String {
            fn from(id: $ty) -> Self {
                id.to_string()
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 20-byte address identifying a deployed module, a proxy, or an account.
///
/// The all-zero address is the null sentinel: it never hosts code and is
/// never a valid owner.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(pub [u8; ADDRESS_LEN]);

hex_id!(Address, ADDRESS_LEN, "address");

impl Address {
    /// The null address.
    pub const ZERO: Self = Self([0; ADDRESS_LEN]);

    /// Whether this is the null address.
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Derive an address from arbitrary seed bytes (SHA-256, truncated).
    pub fn derive(seed: &[u8]) -> Self {
        let digest = Sha256::digest(seed);
        let mut out = [0u8; ADDRESS_LEN];
        out.copy_from_slice(&digest[..ADDRESS_LEN]);
        Self(out)
    }

    /// Build an address whose last byte is `n`; handy for fixtures.
    pub fn from_low_u8(n: u8) -> Self {
        let mut out = [0u8; ADDRESS_LEN];
        if let Some(last) = out.last_mut() {
            *last = n;
        }
        Self(out)
    }
}

// ---------------------------------------------------------------------------
// Selector
// ---------------------------------------------------------------------------

/// Four-byte function identifier used as the dispatch key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Selector(pub [u8; SELECTOR_LEN]);

hex_id!(Selector, SELECTOR_LEN, "selector");

impl Selector {
    /// Hash a signature into its selector without validating its form.
    pub fn of(signature: &str) -> Self {
        let digest = Keccak256::digest(signature.as_bytes());
        let mut out = [0u8; SELECTOR_LEN];
        out.copy_from_slice(&digest[..SELECTOR_LEN]);
        Self(out)
    }

    /// Validate a canonical signature and compute its selector.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] if the signature contains whitespace, lacks
    /// a parameter list, or has an invalid identifier.
    pub fn from_signature(signature: &str) -> Result<Self, SignatureError> {
        if !SIGNATURE_RE.is_match(signature) {
            return Err(SignatureError(signature.to_owned()));
        }
        Ok(Self::of(signature))
    }

    /// Extract the selector from the head of calldata.
    ///
    /// Calldata shorter than four bytes is zero-padded, so it resolves to a
    /// selector that is almost certainly unregistered.
    pub fn from_calldata(calldata: &[u8]) -> Self {
        let mut out = [0u8; SELECTOR_LEN];
        let n = calldata.len().min(SELECTOR_LEN);
        out[..n].copy_from_slice(&calldata[..n]);
        Self(out)
    }
}

// ---------------------------------------------------------------------------
// InterfaceId
// ---------------------------------------------------------------------------

/// ERC-165 interface identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InterfaceId(pub [u8; SELECTOR_LEN]);

hex_id!(InterfaceId, SELECTOR_LEN, "interface id");

impl InterfaceId {
    /// XOR all selectors of an interface together.
    pub fn from_selectors<'a>(selectors: impl IntoIterator<Item = &'a Selector>) -> Self {
        let mut acc = [0u8; SELECTOR_LEN];
        for selector in selectors {
            for (a, b) in acc.iter_mut().zip(selector.0.iter()) {
                *a ^= *b;
            }
        }
        Self(acc)
    }

    /// Compute an interface id from canonical signatures.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] for the first malformed signature.
    pub fn from_signatures<S: AsRef<str>>(signatures: &[S]) -> Result<Self, SignatureError> {
        let selectors = signatures
            .iter()
            .map(|s| Selector::from_signature(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_selectors(&selectors))
    }
}

impl From<Selector> for InterfaceId {
    fn from(selector: Selector) -> Self {
        Self(selector.0)
    }
}
