//! The proxy: one persistent address, many modules.
//!
//! Static entry points (cut, introspection, ownership) are typed methods that
//! work whatever the routing table contains. Everything else enters through
//! [`Diamond::call`], which resolves the selector and forwards the call to the
//! owning module with the proxy's state as working context.
//!
//! Every mutating call is a transaction: it runs against a scratch copy of
//! [`ProxyState`] and is published, together with its events, only if it
//! succeeds.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::access;
use crate::engine::{self, FacetCut};
use crate::error::DiamondError;
use crate::events::EventRecord;
use crate::facet::builtin::{
    init_selector, DiamondCutFacet, DiamondInit, DiamondLoupeFacet, OwnershipFacet,
};
use crate::facet::registry::CodeRegistry;
use crate::facet::{self, CallContext};
use crate::loupe::{self, FacetInfo};
use crate::state::ProxyState;
use crate::storage::StateArena;
use crate::types::{Address, InterfaceId, Selector};

/// A module and its selectors, registered at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapFacet {
    /// Module address; must host code.
    pub module: Address,
    /// Selectors to add.
    pub selectors: Vec<Selector>,
}

impl BootstrapFacet {
    /// Register every selector the deployed module declares.
    ///
    /// # Errors
    ///
    /// Returns [`DiamondError::NoCode`] if nothing is deployed at `module`.
    pub fn from_deployed(code: &CodeRegistry, module: Address) -> Result<Self, DiamondError> {
        let facet = code.get(module).ok_or(DiamondError::NoCode { address: module })?;
        Ok(Self {
            module,
            selectors: facet.selectors(),
        })
    }
}

/// Construction parameters.
#[derive(Debug, Clone, Default)]
pub struct DiamondArgs {
    /// Initial owner; must not be null.
    pub owner: Address,
    /// Bootstrap modules, applied as Add cuts in order.
    pub facets: Vec<BootstrapFacet>,
    /// Optional construction-time init call target.
    pub init: Option<Address>,
    /// Calldata for the init call.
    pub init_calldata: Vec<u8>,
}

/// Addresses of the standard management modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardFacets {
    /// [`DiamondCutFacet`].
    pub cut: Address,
    /// [`DiamondLoupeFacet`].
    pub loupe: Address,
    /// [`OwnershipFacet`].
    pub ownership: Address,
    /// [`DiamondInit`].
    pub init: Address,
}

impl StandardFacets {
    /// Deploy the standard modules into `code`.
    pub fn deploy(code: &CodeRegistry) -> Self {
        Self {
            cut: code.deploy(Arc::new(DiamondCutFacet)),
            loupe: code.deploy(Arc::new(DiamondLoupeFacet)),
            ownership: code.deploy(Arc::new(OwnershipFacet)),
            init: code.deploy(Arc::new(DiamondInit)),
        }
    }

    /// Construction arguments bootstrapping `[Cut, Loupe, Ownership]` and
    /// running the standard initializer.
    ///
    /// # Errors
    ///
    /// Returns [`DiamondError::NoCode`] if the modules are not deployed in
    /// `code`.
    pub fn bootstrap_args(&self, code: &CodeRegistry, owner: Address) -> Result<DiamondArgs, DiamondError> {
        Ok(DiamondArgs {
            owner,
            facets: vec![
                BootstrapFacet::from_deployed(code, self.cut)?,
                BootstrapFacet::from_deployed(code, self.loupe)?,
                BootstrapFacet::from_deployed(code, self.ownership)?,
            ],
            init: Some(self.init),
            init_calldata: init_selector().0.to_vec(),
        })
    }
}

/// A selector-routing proxy.
#[derive(Debug)]
pub struct Diamond {
    address: Address,
    code: Arc<CodeRegistry>,
    state: ProxyState,
    log: Vec<EventRecord>,
}

impl Diamond {
    /// Construct a proxy: validate the owner, add the bootstrap modules, run
    /// the optional init call.
    ///
    /// An empty bootstrap list is allowed and yields an empty table.
    ///
    /// # Errors
    ///
    /// [`DiamondError::ZeroAddressOwner`] for a null owner, or any engine
    /// validation / init failure.
    pub fn new(code: Arc<CodeRegistry>, args: DiamondArgs) -> Result<Self, DiamondError> {
        access::require_owner_address(args.owner)?;
        let address = code.allocate_address();
        let mut diamond = Self {
            address,
            code,
            state: ProxyState::new(args.owner),
            log: Vec::new(),
        };

        let cuts: Vec<FacetCut> = args
            .facets
            .into_iter()
            .map(|f| FacetCut::add(f.module, f.selectors))
            .collect();
        if !cuts.is_empty() || args.init.is_some() || !args.init_calldata.is_empty() {
            let owner = args.owner;
            let init = args.init;
            let calldata = args.init_calldata;
            diamond.transact(owner, |ctx| {
                if cuts.is_empty() {
                    run_bare_init(ctx, init, &calldata)
                } else {
                    engine::apply_cuts(ctx, &cuts, init, &calldata)
                }
            })?;
        }

        info!(
            proxy = %address,
            owner = %diamond.state.owner,
            modules = diamond.state.table.all_modules().len(),
            selectors = diamond.state.table.len(),
            "diamond constructed"
        );
        Ok(diamond)
    }

    /// Deploy the standard modules into `code` and construct a proxy with
    /// them, returning both.
    ///
    /// # Errors
    ///
    /// As [`Diamond::new`].
    pub fn with_standard_facets(
        code: Arc<CodeRegistry>,
        owner: Address,
    ) -> Result<(Self, StandardFacets), DiamondError> {
        let standard = StandardFacets::deploy(&code);
        let args = standard.bootstrap_args(&code, owner)?;
        Ok((Self::new(code, args)?, standard))
    }

    /// This proxy's address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Code registry this proxy resolves modules in.
    pub fn code(&self) -> &Arc<CodeRegistry> {
        &self.code
    }

    /// Committed state.
    pub fn state(&self) -> &ProxyState {
        &self.state
    }

    /// Committed shared storage.
    pub fn storage(&self) -> &StateArena {
        &self.state.storage
    }

    /// Events of every committed transaction, oldest first.
    pub fn events(&self) -> &[EventRecord] {
        &self.log
    }

    // -- Upgrade engine ------------------------------------------------------

    /// Apply a cut batch atomically. Owner only.
    ///
    /// # Errors
    ///
    /// Any engine error; on error nothing changes.
    pub fn diamond_cut(
        &mut self,
        caller: Address,
        cuts: &[FacetCut],
        init: Option<Address>,
        calldata: &[u8],
    ) -> Result<(), DiamondError> {
        self.transact(caller, |ctx| engine::diamond_cut(ctx, cuts, init, calldata))
    }

    // -- Access gate ---------------------------------------------------------

    /// Current owner.
    pub fn owner(&self) -> Address {
        self.state.owner
    }

    /// Transfer ownership. Owner only.
    ///
    /// # Errors
    ///
    /// See [`access::transfer_ownership`].
    pub fn transfer_ownership(&mut self, caller: Address, new_owner: Address) -> Result<(), DiamondError> {
        self.transact(caller, |ctx| access::transfer_ownership(ctx, new_owner))
    }

    // -- Introspection -------------------------------------------------------

    /// Every module with its selectors.
    pub fn facets(&self) -> Vec<FacetInfo> {
        loupe::facets(&self.state)
    }

    /// Module addresses in order.
    pub fn facet_addresses(&self) -> Vec<Address> {
        loupe::facet_addresses(&self.state)
    }

    /// Selectors served by `module`.
    pub fn facet_function_selectors(&self, module: Address) -> Vec<Selector> {
        loupe::facet_function_selectors(&self.state, module)
    }

    /// Module serving `selector`.
    pub fn facet_address(&self, selector: Selector) -> Option<Address> {
        loupe::facet_address(&self.state, selector)
    }

    /// ERC-165 query.
    pub fn supports_interface(&self, interface: InterfaceId) -> bool {
        loupe::supports_interface(&self.state, interface)
    }

    // -- Dispatcher ----------------------------------------------------------

    /// Dynamic path: route `calldata` by its selector and forward it.
    ///
    /// # Errors
    ///
    /// [`DiamondError::UnknownFunction`] when the selector is unrouted (no
    /// state is touched), otherwise whatever the module returns.
    pub fn call(&mut self, caller: Address, calldata: &[u8]) -> Result<Vec<u8>, DiamondError> {
        let selector = Selector::from_calldata(calldata);
        let Some(module) = self.state.table.resolve(selector) else {
            debug!(proxy = %self.address, %selector, "no module for selector");
            return Err(DiamondError::UnknownFunction(selector));
        };
        debug!(proxy = %self.address, %selector, %module, %caller, "forwarding call");
        self.transact(caller, |ctx| facet::forward(ctx, module, calldata))
    }

    /// Run `op` as one transaction: stage on a copy, publish on success.
    fn transact<T>(
        &mut self,
        caller: Address,
        op: impl FnOnce(&mut CallContext<'_>) -> Result<T, DiamondError>,
    ) -> Result<T, DiamondError> {
        let tx_id = Uuid::new_v4();
        let mut scratch = self.state.clone();
        let mut ctx = CallContext::new(caller, self.address, &mut scratch, &self.code);

        match op(&mut ctx) {
            Ok(value) => {
                let events = ctx.into_events();
                self.state = scratch;
                let timestamp = Utc::now();
                let emitter = self.address;
                self.log.extend(events.into_iter().map(|event| EventRecord {
                    tx_id,
                    timestamp,
                    emitter,
                    event,
                }));
                debug!(%tx_id, proxy = %self.address, "transaction committed");
                Ok(value)
            }
            Err(e) => {
                warn!(%tx_id, proxy = %self.address, %caller, error = %e, "transaction reverted");
                Err(e)
            }
        }
    }
}

/// Construction-time init call without bootstrap cuts.
fn run_bare_init(
    ctx: &mut CallContext<'_>,
    init: Option<Address>,
    calldata: &[u8],
) -> Result<(), DiamondError> {
    let init = init.filter(|a| !a.is_zero());
    match init {
        Some(target) if !calldata.is_empty() => engine::run_init(ctx, target, calldata),
        None if calldata.is_empty() => Ok(()),
        _ => Err(DiamondError::InitMismatch {
            target: init,
            calldata_len: calldata.len(),
        }),
    }
}
