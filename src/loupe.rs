//! Read-only introspection over a proxy's routing table.
//!
//! Everything here reads the committed state directly; there is no cache
//! to go stale.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::state::ProxyState;
use crate::storage::StateArena;
use crate::types::{Address, InterfaceId, Selector};

/// Storage namespace holding ERC-165 registrations.
pub const ERC165_NAMESPACE: &str = "diamond.erc165";

/// A module and the selectors it serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetInfo {
    /// Module address.
    pub module: Address,
    /// Selectors routed to the module.
    pub selectors: Vec<Selector>,
}

/// Every module with its selectors, in module order.
pub fn facets(state: &ProxyState) -> Vec<FacetInfo> {
    state
        .table
        .all_modules()
        .iter()
        .map(|&module| FacetInfo {
            module,
            selectors: state.table.selectors_of(module).to_vec(),
        })
        .collect()
}

/// Module addresses in module order.
pub fn facet_addresses(state: &ProxyState) -> Vec<Address> {
    state.table.all_modules().to_vec()
}

/// Selectors of `module`; empty when it serves none.
pub fn facet_function_selectors(state: &ProxyState, module: Address) -> Vec<Selector> {
    state.table.selectors_of(module).to_vec()
}

/// Module serving `selector`, if any.
pub fn facet_address(state: &ProxyState, selector: Selector) -> Option<Address> {
    state.table.resolve(selector)
}

/// Whether an initializer registered `interface` as supported.
pub fn supports_interface(state: &ProxyState, interface: InterfaceId) -> bool {
    match state.storage.get::<bool>(ERC165_NAMESPACE, &interface.to_string()) {
        Ok(supported) => supported.unwrap_or(false),
        Err(e) => {
            warn!(%interface, error = %e, "unreadable ERC-165 registration");
            false
        }
    }
}

/// Record support for `interface`, or drop the registration when
/// `supported` is false.
///
/// # Errors
///
/// Propagates storage encoding failures.
pub fn set_supported_interface(
    storage: &mut StateArena,
    interface: InterfaceId,
    supported: bool,
) -> Result<(), crate::error::DiamondError> {
    let key = interface.to_string();
    if supported {
        storage.set(ERC165_NAMESPACE, &key, &true)
    } else {
        storage.remove(ERC165_NAMESPACE, &key);
        Ok(())
    }
}
