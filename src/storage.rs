//! Shared persistent state arena.
//!
//! Every module forwarded through the proxy works against the same arena.
//! Modules are compiled and registered independently, so they cannot share a
//! struct layout; instead each claims a namespace (for example
//! `"diamond.erc165"` or `"rentals.v1"`) and stores JSON values under string
//! keys inside it.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::DiamondError;

/// Namespaced key/value storage owned by a proxy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateArena {
    namespaces: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
}

impl StateArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and decode a value.
    ///
    /// # Errors
    ///
    /// Returns [`DiamondError::Storage`] if the stored value does not decode
    /// as `T`.
    pub fn get<T: DeserializeOwned>(&self, namespace: &str, key: &str) -> Result<Option<T>, DiamondError> {
        let Some(value) = self.namespaces.get(namespace).and_then(|ns| ns.get(key)) else {
            return Ok(None);
        };
        serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| DiamondError::Storage(format!("{namespace}/{key}: {e}")))
    }

    /// Encode and write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`DiamondError::Storage`] if the value cannot be serialized.
    pub fn set<T: Serialize>(&mut self, namespace: &str, key: &str, value: &T) -> Result<(), DiamondError> {
        let encoded = serde_json::to_value(value)
            .map_err(|e| DiamondError::Storage(format!("{namespace}/{key}: {e}")))?;
        self.namespaces
            .entry(namespace.to_owned())
            .or_default()
            .insert(key.to_owned(), encoded);
        Ok(())
    }

    /// Delete a value. Returns whether it existed.
    pub fn remove(&mut self, namespace: &str, key: &str) -> bool {
        let Some(ns) = self.namespaces.get_mut(namespace) else {
            return false;
        };
        let existed = ns.remove(key).is_some();
        if ns.is_empty() {
            self.namespaces.remove(namespace);
        }
        existed
    }

    /// Keys stored under a namespace, in sorted order.
    pub fn keys(&self, namespace: &str) -> Vec<String> {
        self.namespaces
            .get(namespace)
            .map(|ns| ns.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Namespaces holding at least one value, in sorted order.
    pub fn namespaces(&self) -> Vec<String> {
        self.namespaces.keys().cloned().collect()
    }
}
