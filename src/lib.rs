//! Diamond: a selector-routing proxy runtime.
//!
//! Many independently deployed modules ("facets") sit behind one proxy
//! address. Each call is routed by its four-byte selector to the module that
//! implements it, and runs against the proxy's shared storage. Routing can be
//! changed live through atomic add/replace/remove batches guarded by a single
//! owner.
//!
//! See `DESIGN.md` for the architecture.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod logging;
pub mod types;

pub mod codec;
pub mod error;
pub mod events;
pub mod state;
pub mod storage;
pub mod table;

pub mod access;
pub mod diamond;
pub mod engine;
pub mod facet;
pub mod loupe;

pub mod simulate;

pub use crate::diamond::{BootstrapFacet, Diamond, DiamondArgs, StandardFacets};
pub use crate::engine::{CutAction, FacetCut};
pub use crate::error::DiamondError;
pub use crate::facet::registry::CodeRegistry;
pub use crate::facet::{CallContext, Facet};
pub use crate::types::{Address, InterfaceId, Selector};
