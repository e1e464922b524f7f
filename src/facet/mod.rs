//! Module interface and the context modules execute in.
//!
//! A facet is independently deployed logic. When the proxy forwards a call,
//! the facet runs against the proxy's own [`StateArena`] through a
//! [`CallContext`], as if it were the proxy itself.

pub mod builtin;
pub mod manifest;
pub mod registry;

use crate::error::DiamondError;
use crate::events::Event;
use crate::state::ProxyState;
use crate::storage::StateArena;
use crate::types::{Address, Selector};

use self::registry::CodeRegistry;

/// Logic that can be registered behind a proxy.
pub trait Facet: Send + Sync {
    /// Human-readable name used in logs.
    fn name(&self) -> &str;

    /// Every selector this facet implements.
    fn selectors(&self) -> Vec<Selector>;

    /// Execute `calldata` in the proxy's context.
    ///
    /// The first four bytes of `calldata` select the function. Returning an
    /// error aborts the whole enclosing call.
    ///
    /// # Errors
    ///
    /// Any [`DiamondError`]; module-originated failures are usually
    /// [`DiamondError::Reverted`].
    fn call(&self, ctx: &mut CallContext<'_>, calldata: &[u8]) -> Result<Vec<u8>, DiamondError>;
}

/// Execution context handed to a facet for one forwarded call.
///
/// Mutations go to the transaction's scratch state; they become visible
/// only if the whole call succeeds.
pub struct CallContext<'a> {
    caller: Address,
    this: Address,
    state: &'a mut ProxyState,
    code: &'a CodeRegistry,
    events: Vec<Event>,
}

impl<'a> CallContext<'a> {
    pub(crate) fn new(
        caller: Address,
        this: Address,
        state: &'a mut ProxyState,
        code: &'a CodeRegistry,
    ) -> Self {
        Self {
            caller,
            this,
            state,
            code,
            events: Vec::new(),
        }
    }

    /// Original caller of the proxy.
    pub fn caller(&self) -> Address {
        self.caller
    }

    /// Address of the proxy the facet is running behind.
    pub fn this(&self) -> Address {
        self.this
    }

    /// Read-only view of the proxy's state.
    pub fn state(&self) -> &ProxyState {
        &*self.state
    }

    /// Shared storage.
    pub fn storage(&self) -> &StateArena {
        &self.state.storage
    }

    /// Shared storage, writable.
    pub fn storage_mut(&mut self) -> &mut StateArena {
        &mut self.state.storage
    }

    /// Raise an event; discarded if the call aborts.
    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Deployed code, for engine validation and init calls.
    pub(crate) fn code(&self) -> &'a CodeRegistry {
        self.code
    }

    pub(crate) fn state_mut(&mut self) -> &mut ProxyState {
        &mut *self.state
    }

    pub(crate) fn into_events(self) -> Vec<Event> {
        self.events
    }
}

impl std::fmt::Debug for CallContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallContext")
            .field("caller", &self.caller)
            .field("this", &self.this)
            .field("pending_events", &self.events.len())
            .finish()
    }
}

/// Forward `calldata` to the code at `target` within `ctx`.
///
/// # Errors
///
/// Returns [`DiamondError::NoCode`] if nothing is deployed at `target`, or
/// whatever the facet returns.
pub(crate) fn forward(
    ctx: &mut CallContext<'_>,
    target: Address,
    calldata: &[u8],
) -> Result<Vec<u8>, DiamondError> {
    let facet = ctx
        .code()
        .get(target)
        .ok_or(DiamondError::NoCode { address: target })?;
    facet.call(ctx, calldata)
}
