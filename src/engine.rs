//! Upgrade engine: validates and applies batched add/replace/remove cuts.
//!
//! Cuts are applied strictly in order against the transaction's scratch
//! state, so later cuts observe earlier ones (a batch may add a selector and
//! remove it again). Any failure, including a failing init call, aborts the
//! batch; the proxy then discards the scratch state wholesale.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::access;
use crate::error::DiamondError;
use crate::events::Event;
use crate::facet::{self, CallContext};
use crate::types::{Address, Selector};

/// What a cut does to its selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutAction {
    /// Register new selectors.
    Add,
    /// Point registered selectors at another module.
    Replace,
    /// Unregister selectors.
    Remove,
}

impl CutAction {
    /// Wire code of this action.
    pub fn code(self) -> u8 {
        match self {
            Self::Add => 0,
            Self::Replace => 1,
            Self::Remove => 2,
        }
    }
}

impl TryFrom<u8> for CutAction {
    type Error = DiamondError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Add),
            1 => Ok(Self::Replace),
            2 => Ok(Self::Remove),
            other => Err(DiamondError::UnknownAction(other)),
        }
    }
}

/// One requested mutation of the routing table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetCut {
    /// Target module; the null address for [`CutAction::Remove`].
    pub module: Address,
    /// What to do.
    pub action: CutAction,
    /// Selectors affected.
    pub selectors: Vec<Selector>,
}

impl FacetCut {
    /// Cut registering `selectors` on `module`.
    pub fn add(module: Address, selectors: Vec<Selector>) -> Self {
        Self {
            module,
            action: CutAction::Add,
            selectors,
        }
    }

    /// Cut moving `selectors` to `module`.
    pub fn replace(module: Address, selectors: Vec<Selector>) -> Self {
        Self {
            module,
            action: CutAction::Replace,
            selectors,
        }
    }

    /// Cut unregistering `selectors`.
    pub fn remove(selectors: Vec<Selector>) -> Self {
        Self {
            module: Address::ZERO,
            action: CutAction::Remove,
            selectors,
        }
    }
}

/// Cut as carried in calldata, with the action as a raw code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFacetCut {
    /// Target module.
    pub module: Address,
    /// Action code: 0 add, 1 replace, 2 remove.
    pub action: u8,
    /// Selectors affected.
    pub selectors: Vec<Selector>,
}

impl From<&FacetCut> for RawFacetCut {
    fn from(cut: &FacetCut) -> Self {
        Self {
            module: cut.module,
            action: cut.action.code(),
            selectors: cut.selectors.clone(),
        }
    }
}

impl TryFrom<RawFacetCut> for FacetCut {
    type Error = DiamondError;

    fn try_from(raw: RawFacetCut) -> Result<Self, Self::Error> {
        Ok(Self {
            module: raw.module,
            action: CutAction::try_from(raw.action)?,
            selectors: raw.selectors,
        })
    }
}

/// Owner-gated entry point: check the caller, then apply the batch.
///
/// # Errors
///
/// [`DiamondError::Unauthorized`] for non-owners, otherwise anything
/// [`apply_cuts`] returns.
#[instrument(skip_all, fields(caller = %ctx.caller(), cuts = cuts.len()))]
pub fn diamond_cut(
    ctx: &mut CallContext<'_>,
    cuts: &[FacetCut],
    init: Option<Address>,
    calldata: &[u8],
) -> Result<(), DiamondError> {
    access::enforce_owner(ctx.state(), ctx.caller())?;
    apply_cuts(ctx, cuts, init, calldata)
}

/// Apply a batch without the ownership check (construction time).
///
/// # Errors
///
/// The first validation failure, or the init call's failure.
pub(crate) fn apply_cuts(
    ctx: &mut CallContext<'_>,
    cuts: &[FacetCut],
    init: Option<Address>,
    calldata: &[u8],
) -> Result<(), DiamondError> {
    if cuts.is_empty() {
        return Err(DiamondError::EmptyCutSet);
    }
    let init = init.filter(|addr| !addr.is_zero());
    if init.is_some() == calldata.is_empty() {
        return Err(DiamondError::InitMismatch {
            target: init,
            calldata_len: calldata.len(),
        });
    }

    for (index, cut) in cuts.iter().enumerate() {
        if cut.selectors.is_empty() {
            return Err(DiamondError::NoSelectorsInCut { index });
        }
        match cut.action {
            CutAction::Add => add_selectors(ctx, index, cut)?,
            CutAction::Replace => replace_selectors(ctx, index, cut)?,
            CutAction::Remove => remove_selectors(ctx, index, cut)?,
        }
        debug!(index, action = ?cut.action, module = %cut.module, selectors = cut.selectors.len(), "cut applied");
    }

    if let Some(target) = init {
        run_init(ctx, target, calldata)?;
    }

    ctx.emit(Event::DiamondCut {
        cuts: cuts.to_vec(),
        init,
        calldata: hex::encode(calldata),
    });
    info!(cuts = cuts.len(), init = ?init, "diamond cut applied");
    Ok(())
}

/// Run an init call. A target equal to the proxy itself is resolved through
/// the routing table, including selectors the current batch just added.
///
/// # Errors
///
/// [`DiamondError::UnknownFunction`] for an unrouted self-call,
/// [`DiamondError::NoCode`] for a codeless target, or the init's own failure.
pub(crate) fn run_init(
    ctx: &mut CallContext<'_>,
    target: Address,
    calldata: &[u8],
) -> Result<(), DiamondError> {
    debug!(%target, calldata_len = calldata.len(), "running init call");
    let module = if target == ctx.this() {
        let selector = Selector::from_calldata(calldata);
        ctx.state()
            .table
            .resolve(selector)
            .ok_or(DiamondError::UnknownFunction(selector))?
    } else {
        target
    };
    facet::forward(ctx, module, calldata).map(|_| ())
}

fn require_code(ctx: &CallContext<'_>, index: usize, module: Address) -> Result<(), DiamondError> {
    if module.is_zero() {
        return Err(DiamondError::ZeroModuleAddress { index });
    }
    if !ctx.code().has_code(module) {
        return Err(DiamondError::NoCode { address: module });
    }
    Ok(())
}

fn add_selectors(ctx: &mut CallContext<'_>, index: usize, cut: &FacetCut) -> Result<(), DiamondError> {
    require_code(ctx, index, cut.module)?;
    let table = &mut ctx.state_mut().table;
    for &selector in &cut.selectors {
        if let Some(existing) = table.resolve(selector) {
            return Err(DiamondError::DuplicateSelector {
                selector,
                module: existing,
            });
        }
        table.insert(selector, cut.module);
    }
    Ok(())
}

fn replace_selectors(
    ctx: &mut CallContext<'_>,
    index: usize,
    cut: &FacetCut,
) -> Result<(), DiamondError> {
    require_code(ctx, index, cut.module)?;
    let table = &mut ctx.state_mut().table;
    for &selector in &cut.selectors {
        match table.resolve(selector) {
            None => return Err(DiamondError::UnknownSelector(selector)),
            Some(current) if current == cut.module => {
                return Err(DiamondError::NoOpReplace {
                    selector,
                    module: current,
                });
            }
            Some(_) => {
                table.retarget(selector, cut.module);
            }
        }
    }
    Ok(())
}

fn remove_selectors(
    ctx: &mut CallContext<'_>,
    index: usize,
    cut: &FacetCut,
) -> Result<(), DiamondError> {
    if !cut.module.is_zero() {
        return Err(DiamondError::RemoveModuleNotZero {
            index,
            module: cut.module,
        });
    }
    let table = &mut ctx.state_mut().table;
    for &selector in &cut.selectors {
        if table.remove(selector).is_none() {
            return Err(DiamondError::UnknownSelector(selector));
        }
    }
    Ok(())
}
