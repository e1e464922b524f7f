//! Facets described only by a name and a list of signatures.
//!
//! Each function answers with `{"module": .., "function": ..}` and counts its
//! invocations in proxy storage, which makes manifest facets a stand-in for
//! business modules when dry-running upgrade plans.

use serde::{Deserialize, Serialize};

use super::{CallContext, Facet};
use crate::codec::encode_return;
use crate::error::DiamondError;
use crate::events::Event;
use crate::types::{Selector, SignatureError};

/// Storage namespace for invocation counters.
pub const MANIFEST_NAMESPACE: &str = "manifest.calls";

/// Return value of every manifest function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestReply {
    /// Name of the facet that served the call.
    pub module: String,
    /// Signature of the function that ran.
    pub function: String,
    /// How many times this function has run behind this proxy, this call included.
    pub calls: u64,
}

/// Facet built from a declared list of functions.
#[derive(Debug, Clone)]
pub struct ManifestFacet {
    name: String,
    functions: Vec<(Selector, String)>,
}

impl ManifestFacet {
    /// Build a facet from signatures without validating them.
    pub fn new(name: impl Into<String>, signatures: Vec<String>) -> Self {
        Self {
            name: name.into(),
            functions: signatures.into_iter().map(|s| (Selector::of(&s), s)).collect(),
        }
    }

    /// Build a facet from canonical signatures.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] for the first malformed signature.
    pub fn parse<S: AsRef<str>>(name: impl Into<String>, signatures: &[S]) -> Result<Self, SignatureError> {
        let functions = signatures
            .iter()
            .map(|s| Selector::from_signature(s.as_ref()).map(|sel| (sel, s.as_ref().to_owned())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: name.into(),
            functions,
        })
    }

    /// Signature served for `selector`, if declared.
    pub fn signature_of(&self, selector: Selector) -> Option<&str> {
        self.functions
            .iter()
            .find(|(sel, _)| *sel == selector)
            .map(|(_, sig)| sig.as_str())
    }
}

impl Facet for ManifestFacet {
    fn name(&self) -> &str {
        &self.name
    }

    fn selectors(&self) -> Vec<Selector> {
        self.functions.iter().map(|(sel, _)| *sel).collect()
    }

    fn call(&self, ctx: &mut CallContext<'_>, calldata: &[u8]) -> Result<Vec<u8>, DiamondError> {
        let selector = Selector::from_calldata(calldata);
        let Some(function) = self.signature_of(selector) else {
            return Err(DiamondError::revert(format!(
                "{}: function {selector} not implemented",
                self.name
            )));
        };

        let key = format!("{}/{function}", self.name);
        let calls = ctx
            .storage()
            .get::<u64>(MANIFEST_NAMESPACE, &key)?
            .unwrap_or(0)
            .saturating_add(1);
        ctx.storage_mut().set(MANIFEST_NAMESPACE, &key, &calls)?;
        ctx.emit(Event::Log {
            topic: "manifest.call".to_owned(),
            data: serde_json::json!({ "module": self.name, "function": function }),
        });

        encode_return(&ManifestReply {
            module: self.name.clone(),
            function: function.to_owned(),
            calls,
        })
    }
}
