//! Error taxonomy for the proxy, its upgrade engine and its modules.
//!
//! Every variant renders a human-readable reason. A failing call aborts as
//! a whole: whatever it changed is discarded before the error reaches the
//! caller.

use crate::types::{Address, Selector};

/// Message used when a module aborts without giving a reason.
pub const LOW_LEVEL_CALL_FAILED: &str = "low-level call failed";

/// Errors produced by the proxy and propagated from forwarded calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiamondError {
    /// Caller is not the owner on a gated operation.
    #[error("unauthorized: {caller} is not the owner {owner}")]
    Unauthorized {
        /// Address that attempted the call.
        caller: Address,
        /// Current owner.
        owner: Address,
    },

    /// Owner would become the null address.
    #[error("owner cannot be the zero address")]
    ZeroAddressOwner,

    /// Ownership transfer to the current owner.
    #[error("no-op transfer: {0} is already the owner")]
    NoOpTransfer(Address),

    /// A cut batch without cuts.
    #[error("no facet cuts provided")]
    EmptyCutSet,

    /// Cut action code outside Add/Replace/Remove.
    #[error("unknown cut action {0}")]
    UnknownAction(u8),

    /// A cut naming no selectors.
    #[error("cut #{index} has no selectors")]
    NoSelectorsInCut {
        /// Position of the cut within its batch.
        index: usize,
    },

    /// Add or Replace naming the null module.
    #[error("cut #{index}: module address cannot be zero")]
    ZeroModuleAddress {
        /// Position of the cut within its batch.
        index: usize,
    },

    /// Address that should host code has none.
    #[error("{address} has no code")]
    NoCode {
        /// The empty address.
        address: Address,
    },

    /// Remove naming a non-null module.
    #[error("cut #{index}: remove module address must be zero, got {module}")]
    RemoveModuleNotZero {
        /// Position of the cut within its batch.
        index: usize,
        /// The module that was named.
        module: Address,
    },

    /// Add of an already-registered selector.
    #[error("selector {selector} already exists on {module}")]
    DuplicateSelector {
        /// The conflicting selector.
        selector: Selector,
        /// The module it currently resolves to.
        module: Address,
    },

    /// Replace or Remove of an unregistered selector.
    #[error("selector {0} does not exist")]
    UnknownSelector(Selector),

    /// Replace targeting the module that already owns the selector.
    #[error("cannot replace selector {selector} with the same module {module}")]
    NoOpReplace {
        /// The selector being replaced.
        selector: Selector,
        /// The module it already resolves to.
        module: Address,
    },

    /// Init target and init calldata disagree on whether an init call happens.
    #[error("init target {target:?} does not match calldata of {calldata_len} bytes")]
    InitMismatch {
        /// Init target, if any.
        target: Option<Address>,
        /// Length of the init calldata.
        calldata_len: usize,
    },

    /// Dispatcher miss on the dynamic path.
    #[error("function {0} does not exist")]
    UnknownFunction(Selector),

    /// A forwarded call aborted.
    #[error("{}", .0.as_deref().unwrap_or(LOW_LEVEL_CALL_FAILED))]
    Reverted(Option<String>),

    /// Calldata or return data that does not decode.
    #[error("malformed calldata: {0}")]
    MalformedCalldata(String),

    /// Proxy storage rejected a value.
    #[error("storage error: {0}")]
    Storage(String),
}

impl DiamondError {
    /// Abort a module call with a reason.
    pub fn revert(reason: impl Into<String>) -> Self {
        Self::Reverted(Some(reason.into()))
    }

    /// Abort a module call without a reason.
    pub fn revert_silently() -> Self {
        Self::Reverted(None)
    }
}
