//! Standard management facets.
//!
//! These expose the upgrade engine, introspection and the access gate over
//! the dynamic path, so a freshly bootstrapped proxy routes its own
//! management surface like any other module. The typed entry points on
//! [`crate::diamond::Diamond`] stay available regardless of what the table
//! says.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CallContext, Facet};
use crate::access;
use crate::codec::{decode_args, encode_return};
use crate::engine::{self, FacetCut, RawFacetCut};
use crate::error::DiamondError;
use crate::loupe;
use crate::types::{Address, InterfaceId, Selector};

/// `diamondCut` canonical signature.
pub const DIAMOND_CUT_SIG: &str = "diamondCut((address,uint8,bytes4[])[],address,bytes)";
/// `facets` canonical signature.
pub const FACETS_SIG: &str = "facets()";
/// `facetFunctionSelectors` canonical signature.
pub const FACET_FUNCTION_SELECTORS_SIG: &str = "facetFunctionSelectors(address)";
/// `facetAddresses` canonical signature.
pub const FACET_ADDRESSES_SIG: &str = "facetAddresses()";
/// `facetAddress` canonical signature.
pub const FACET_ADDRESS_SIG: &str = "facetAddress(bytes4)";
/// `supportsInterface` canonical signature.
pub const SUPPORTS_INTERFACE_SIG: &str = "supportsInterface(bytes4)";
/// `owner` canonical signature.
pub const OWNER_SIG: &str = "owner()";
/// `transferOwnership` canonical signature.
pub const TRANSFER_OWNERSHIP_SIG: &str = "transferOwnership(address)";
/// Standard initializer signature.
pub const INIT_SIG: &str = "init()";

static DIAMOND_CUT: LazyLock<Selector> = LazyLock::new(|| Selector::of(DIAMOND_CUT_SIG));
static FACETS: LazyLock<Selector> = LazyLock::new(|| Selector::of(FACETS_SIG));
static FACET_FUNCTION_SELECTORS: LazyLock<Selector> =
    LazyLock::new(|| Selector::of(FACET_FUNCTION_SELECTORS_SIG));
static FACET_ADDRESSES: LazyLock<Selector> = LazyLock::new(|| Selector::of(FACET_ADDRESSES_SIG));
static FACET_ADDRESS: LazyLock<Selector> = LazyLock::new(|| Selector::of(FACET_ADDRESS_SIG));
static SUPPORTS_INTERFACE: LazyLock<Selector> =
    LazyLock::new(|| Selector::of(SUPPORTS_INTERFACE_SIG));
static OWNER: LazyLock<Selector> = LazyLock::new(|| Selector::of(OWNER_SIG));
static TRANSFER_OWNERSHIP: LazyLock<Selector> =
    LazyLock::new(|| Selector::of(TRANSFER_OWNERSHIP_SIG));
static INIT: LazyLock<Selector> = LazyLock::new(|| Selector::of(INIT_SIG));

/// Selector of the standard initializer's `init()`.
pub fn init_selector() -> Selector {
    *INIT
}

/// ERC-165 id of the cut interface.
pub fn diamond_cut_interface() -> InterfaceId {
    InterfaceId::from_selectors(&[*DIAMOND_CUT])
}

/// ERC-165 id of the loupe interface.
pub fn diamond_loupe_interface() -> InterfaceId {
    InterfaceId::from_selectors(&[*FACETS, *FACET_FUNCTION_SELECTORS, *FACET_ADDRESSES, *FACET_ADDRESS])
}

/// ERC-165 id of the ownership interface (ERC-173).
pub fn ownership_interface() -> InterfaceId {
    InterfaceId::from_selectors(&[*OWNER, *TRANSFER_OWNERSHIP])
}

/// ERC-165 id of ERC-165 itself.
pub fn erc165_interface() -> InterfaceId {
    InterfaceId::from_selectors(&[*SUPPORTS_INTERFACE])
}

fn not_implemented(facet: &str, selector: Selector) -> DiamondError {
    DiamondError::revert(format!("{facet}: function {selector} not implemented"))
}

// ---------------------------------------------------------------------------
// DiamondCutFacet
// ---------------------------------------------------------------------------

/// Arguments of `diamondCut`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiamondCutArgs {
    /// Cuts with raw action codes.
    pub cuts: Vec<RawFacetCut>,
    /// Init target; the null address for none.
    pub init: Address,
    /// Hex-encoded init calldata.
    pub calldata: String,
}

impl DiamondCutArgs {
    /// Build wire arguments from typed cuts.
    pub fn new(cuts: &[FacetCut], init: Option<Address>, calldata: &[u8]) -> Self {
        Self {
            cuts: cuts.iter().map(RawFacetCut::from).collect(),
            init: init.unwrap_or(Address::ZERO),
            calldata: hex::encode(calldata),
        }
    }
}

/// Exposes the upgrade engine.
#[derive(Debug, Default)]
pub struct DiamondCutFacet;

impl Facet for DiamondCutFacet {
    fn name(&self) -> &str {
        "DiamondCutFacet"
    }

    fn selectors(&self) -> Vec<Selector> {
        vec![*DIAMOND_CUT]
    }

    fn call(&self, ctx: &mut CallContext<'_>, calldata: &[u8]) -> Result<Vec<u8>, DiamondError> {
        let selector = Selector::from_calldata(calldata);
        if selector != *DIAMOND_CUT {
            return Err(not_implemented(self.name(), selector));
        }
        let args: DiamondCutArgs = decode_args(calldata)?;
        let cuts = args
            .cuts
            .into_iter()
            .map(FacetCut::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let init_calldata = hex::decode(&args.calldata)
            .map_err(|e| DiamondError::MalformedCalldata(format!("init calldata: {e}")))?;
        let init = Some(args.init).filter(|a| !a.is_zero());
        engine::diamond_cut(ctx, &cuts, init, &init_calldata)?;
        encode_return(&())
    }
}

// ---------------------------------------------------------------------------
// DiamondLoupeFacet
// ---------------------------------------------------------------------------

/// Exposes introspection and ERC-165 queries.
#[derive(Debug, Default)]
pub struct DiamondLoupeFacet;

impl Facet for DiamondLoupeFacet {
    fn name(&self) -> &str {
        "DiamondLoupeFacet"
    }

    fn selectors(&self) -> Vec<Selector> {
        vec![
            *FACETS,
            *FACET_FUNCTION_SELECTORS,
            *FACET_ADDRESSES,
            *FACET_ADDRESS,
            *SUPPORTS_INTERFACE,
        ]
    }

    fn call(&self, ctx: &mut CallContext<'_>, calldata: &[u8]) -> Result<Vec<u8>, DiamondError> {
        let selector = Selector::from_calldata(calldata);
        let state = ctx.state();
        if selector == *FACETS {
            encode_return(&loupe::facets(state))
        } else if selector == *FACET_FUNCTION_SELECTORS {
            let module: Address = decode_args(calldata)?;
            encode_return(&loupe::facet_function_selectors(state, module))
        } else if selector == *FACET_ADDRESSES {
            encode_return(&loupe::facet_addresses(state))
        } else if selector == *FACET_ADDRESS {
            let target: Selector = decode_args(calldata)?;
            encode_return(&loupe::facet_address(state, target))
        } else if selector == *SUPPORTS_INTERFACE {
            let interface: InterfaceId = decode_args(calldata)?;
            encode_return(&loupe::supports_interface(state, interface))
        } else {
            Err(not_implemented(self.name(), selector))
        }
    }
}

// ---------------------------------------------------------------------------
// OwnershipFacet
// ---------------------------------------------------------------------------

/// Exposes the access gate.
#[derive(Debug, Default)]
pub struct OwnershipFacet;

impl Facet for OwnershipFacet {
    fn name(&self) -> &str {
        "OwnershipFacet"
    }

    fn selectors(&self) -> Vec<Selector> {
        vec![*OWNER, *TRANSFER_OWNERSHIP]
    }

    fn call(&self, ctx: &mut CallContext<'_>, calldata: &[u8]) -> Result<Vec<u8>, DiamondError> {
        let selector = Selector::from_calldata(calldata);
        if selector == *OWNER {
            encode_return(&ctx.state().owner())
        } else if selector == *TRANSFER_OWNERSHIP {
            let new_owner: Address = decode_args(calldata)?;
            access::transfer_ownership(ctx, new_owner)?;
            encode_return(&())
        } else {
            Err(not_implemented(self.name(), selector))
        }
    }
}

// ---------------------------------------------------------------------------
// DiamondInit
// ---------------------------------------------------------------------------

/// One-shot initializer registering the standard ERC-165 interfaces.
///
/// Meant to be the init target of a cut, never routed itself.
#[derive(Debug, Default)]
pub struct DiamondInit;

impl Facet for DiamondInit {
    fn name(&self) -> &str {
        "DiamondInit"
    }

    fn selectors(&self) -> Vec<Selector> {
        vec![*INIT]
    }

    fn call(&self, ctx: &mut CallContext<'_>, calldata: &[u8]) -> Result<Vec<u8>, DiamondError> {
        let selector = Selector::from_calldata(calldata);
        if selector != *INIT {
            return Err(not_implemented(self.name(), selector));
        }
        for interface in [
            erc165_interface(),
            diamond_cut_interface(),
            diamond_loupe_interface(),
            ownership_interface(),
        ] {
            loupe::set_supported_interface(ctx.storage_mut(), interface, true)?;
        }
        debug!(proxy = %ctx.this(), "standard interfaces registered");
        encode_return(&())
    }
}
