//! Single-owner access gate.

use tracing::info;

use crate::error::DiamondError;
use crate::events::Event;
use crate::facet::CallContext;
use crate::state::ProxyState;
use crate::types::Address;

/// Fail unless `caller` owns the proxy.
///
/// # Errors
///
/// Returns [`DiamondError::Unauthorized`] for anyone but the owner.
pub fn enforce_owner(state: &ProxyState, caller: Address) -> Result<(), DiamondError> {
    if caller != state.owner {
        return Err(DiamondError::Unauthorized {
            caller,
            owner: state.owner,
        });
    }
    Ok(())
}

/// Reject the null address as an owner.
///
/// # Errors
///
/// Returns [`DiamondError::ZeroAddressOwner`] for the null address.
pub fn require_owner_address(owner: Address) -> Result<(), DiamondError> {
    if owner.is_zero() {
        return Err(DiamondError::ZeroAddressOwner);
    }
    Ok(())
}

/// Hand ownership to `new_owner`.
///
/// # Errors
///
/// [`DiamondError::Unauthorized`] if the caller is not the owner,
/// [`DiamondError::NoOpTransfer`] when `new_owner` already owns the proxy,
/// [`DiamondError::ZeroAddressOwner`] for the null address.
pub fn transfer_ownership(ctx: &mut CallContext<'_>, new_owner: Address) -> Result<(), DiamondError> {
    enforce_owner(ctx.state(), ctx.caller())?;
    let previous_owner = ctx.state().owner;
    if new_owner == previous_owner {
        return Err(DiamondError::NoOpTransfer(new_owner));
    }
    require_owner_address(new_owner)?;

    ctx.state_mut().owner = new_owner;
    ctx.emit(Event::OwnershipTransferred {
        previous_owner,
        new_owner,
    });
    info!(%previous_owner, %new_owner, "ownership transferred");
    Ok(())
}
