//! Selector routing table.
//!
//! Forward index: selector → (module, position in that module's selector
//! list). Reverse indices: module → selectors, and the ordered list of
//! modules that own at least one selector. Removal swaps the last selector
//! of a module into the vacated slot so every list stays dense.

use std::collections::HashMap;

use serde::Serialize;

use crate::types::{Address, Selector};

/// A live routing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SelectorEntry {
    /// Module currently serving the selector. Never the null address.
    pub module: Address,
    /// Index of the selector within the module's selector list.
    pub position: usize,
}

/// Selectors owned by one module plus its slot in the module list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ModuleSlot {
    selectors: Vec<Selector>,
    position: usize,
}

/// The persistent selector → module mapping.
///
/// Mutation is crate-private: only the upgrade engine changes routing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectorTable {
    entries: HashMap<Selector, SelectorEntry>,
    modules: HashMap<Address, ModuleSlot>,
    order: Vec<Address>,
}

impl SelectorTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Module serving `selector`, if any.
    pub fn resolve(&self, selector: Selector) -> Option<Address> {
        self.entries.get(&selector).map(|e| e.module)
    }

    /// Full entry for `selector`, if registered.
    pub fn entry(&self, selector: Selector) -> Option<SelectorEntry> {
        self.entries.get(&selector).copied()
    }

    /// Modules owning at least one selector, in registration order.
    pub fn all_modules(&self) -> &[Address] {
        &self.order
    }

    /// Selectors served by `module`; empty for unknown modules.
    pub fn selectors_of(&self, module: Address) -> &[Selector] {
        self.modules
            .get(&module)
            .map(|slot| slot.selectors.as_slice())
            .unwrap_or_default()
    }

    /// Number of registered selectors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no selector is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Register `selector` for `module`.
    ///
    /// Callers check that the selector is unregistered and `module` non-null.
    pub(crate) fn insert(&mut self, selector: Selector, module: Address) {
        debug_assert!(!self.entries.contains_key(&selector));
        let next_position = self.order.len();
        let slot = self.modules.entry(module).or_insert_with(|| ModuleSlot {
            selectors: Vec::new(),
            position: next_position,
        });
        if slot.selectors.is_empty() {
            self.order.push(module);
        }
        self.entries.insert(
            selector,
            SelectorEntry {
                module,
                position: slot.selectors.len(),
            },
        );
        slot.selectors.push(selector);
    }

    /// Drop `selector`, returning the module that served it.
    pub(crate) fn remove(&mut self, selector: Selector) -> Option<Address> {
        let entry = self.entries.remove(&selector)?;
        let slot = self.modules.get_mut(&entry.module)?;

        slot.selectors.swap_remove(entry.position);
        if let Some(moved) = slot.selectors.get(entry.position).copied() {
            if let Some(moved_entry) = self.entries.get_mut(&moved) {
                moved_entry.position = entry.position;
            }
        }

        if slot.selectors.is_empty() {
            let module_position = slot.position;
            self.modules.remove(&entry.module);
            self.order.swap_remove(module_position);
            if let Some(moved) = self.order.get(module_position).copied() {
                if let Some(moved_slot) = self.modules.get_mut(&moved) {
                    moved_slot.position = module_position;
                }
            }
        }
        Some(entry.module)
    }

    /// Point `selector` at a different module, returning the previous one.
    pub(crate) fn retarget(&mut self, selector: Selector, module: Address) -> Option<Address> {
        let previous = self.remove(selector)?;
        self.insert(selector, module);
        Some(previous)
    }

    /// Check that forward and reverse indices agree.
    ///
    /// Returns a description of the first inconsistency found.
    pub fn check_consistency(&self) -> Result<(), String> {
        if self.order.len() != self.modules.len() {
            return Err(format!(
                "{} ordered modules but {} module slots",
                self.order.len(),
                self.modules.len()
            ));
        }
        let mut counted = 0usize;
        for (index, module) in self.order.iter().enumerate() {
            let slot = self
                .modules
                .get(module)
                .ok_or_else(|| format!("module {module} listed but has no slot"))?;
            if slot.position != index {
                return Err(format!("module {module} at {index} records position {}", slot.position));
            }
            if slot.selectors.is_empty() {
                return Err(format!("module {module} listed with no selectors"));
            }
            for (position, selector) in slot.selectors.iter().enumerate() {
                let entry = self
                    .entries
                    .get(selector)
                    .ok_or_else(|| format!("selector {selector} listed under {module} but unrouted"))?;
                if entry.module != *module || entry.position != position {
                    return Err(format!(
                        "selector {selector} routes to {} at {} but is listed under {module} at {position}",
                        entry.module, entry.position
                    ));
                }
            }
            counted = counted.saturating_add(slot.selectors.len());
        }
        if counted != self.entries.len() {
            return Err(format!("{} routed selectors but {counted} listed", self.entries.len()));
        }
        if self.entries.values().any(|e| e.module.is_zero()) {
            return Err("a selector routes to the zero address".to_owned());
        }
        Ok(())
    }
}
