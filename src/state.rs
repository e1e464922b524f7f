//! Persistent state of one proxy.

use crate::storage::StateArena;
use crate::table::SelectorTable;
use crate::types::Address;

/// Everything a proxy persists between calls.
///
/// Transactions run against a clone and replace the original only on
/// success, which is what makes batches and forwarded calls atomic.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyState {
    /// Selector routing.
    pub(crate) table: SelectorTable,
    /// Address allowed to upgrade the proxy.
    pub(crate) owner: Address,
    /// Storage shared by every module.
    pub(crate) storage: StateArena,
}

impl ProxyState {
    /// Fresh state with an empty table and empty storage.
    pub(crate) fn new(owner: Address) -> Self {
        Self {
            table: SelectorTable::new(),
            owner,
            storage: StateArena::new(),
        }
    }

    /// Routing table.
    pub fn table(&self) -> &SelectorTable {
        &self.table
    }

    /// Current owner.
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Shared module storage.
    pub fn storage(&self) -> &StateArena {
        &self.storage
    }
}
