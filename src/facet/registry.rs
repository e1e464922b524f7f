//! Deployed code, keyed by address.
//!
//! Deployment hands out deterministic addresses derived from a running
//! nonce, so a fresh registry always produces the same address sequence.
//! The registry is append-only: code never disappears from an address, which
//! is what lets the upgrade engine check "hosts code" once at cut time.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use super::Facet;
use crate::types::Address;

/// Domain separator mixed into derived addresses.
const DEPLOY_DOMAIN: &[u8] = b"diamond.deploy";

/// Registry of deployed facets.
pub struct CodeRegistry {
    /// Map from address to deployed facet.
    code: RwLock<HashMap<Address, Arc<dyn Facet>>>,
    /// Next deployment nonce.
    nonce: AtomicU64,
}

impl std::fmt::Debug for CodeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeRegistry")
            .field("deployed", &self.count())
            .field("nonce", &self.nonce.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for CodeRegistry {
    fn default() -> Self {
        Self {
            code: RwLock::new(HashMap::new()),
            nonce: AtomicU64::new(0),
        }
    }
}

impl CodeRegistry {
    /// Create an empty registry, shareable between proxies.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Reserve the next deterministic address without deploying code.
    pub fn allocate_address(&self) -> Address {
        let nonce = self.nonce.fetch_add(1, Ordering::Relaxed);
        let mut seed = DEPLOY_DOMAIN.to_vec();
        seed.extend_from_slice(&nonce.to_be_bytes());
        Address::derive(&seed)
    }

    /// Deploy a facet at a fresh address.
    pub fn deploy(&self, facet: Arc<dyn Facet>) -> Address {
        let address = self.allocate_address();
        let name = facet.name().to_owned();
        let selectors = facet.selectors().len();
        match self.code.write() {
            Ok(mut map) => {
                map.insert(address, facet);
            }
            Err(e) => {
                warn!(error = %e, "code registry lock poisoned in deploy");
                e.into_inner().insert(address, facet);
            }
        }
        info!(facet = %name, %address, selectors, "facet deployed");
        address
    }

    /// Facet deployed at `address`, if any.
    pub fn get(&self, address: Address) -> Option<Arc<dyn Facet>> {
        if address.is_zero() {
            return None;
        }
        match self.code.read() {
            Ok(map) => map.get(&address).cloned(),
            Err(e) => {
                warn!(error = %e, "code registry lock poisoned in get");
                None
            }
        }
    }

    /// Whether `address` hosts code.
    pub fn has_code(&self, address: Address) -> bool {
        let found = self.get(address).is_some();
        if !found {
            debug!(%address, "no code at address");
        }
        found
    }

    /// Number of deployed facets.
    pub fn count(&self) -> usize {
        match self.code.read() {
            Ok(map) => map.len(),
            Err(e) => {
                warn!(error = %e, "code registry lock poisoned in count");
                0
            }
        }
    }
}
