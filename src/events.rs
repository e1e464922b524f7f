//! Notifications emitted by committed transactions.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::engine::FacetCut;
use crate::types::Address;

/// A notification raised during a call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// A cut batch was applied.
    DiamondCut {
        /// The cuts, in application order.
        cuts: Vec<FacetCut>,
        /// Init call target, if any.
        init: Option<Address>,
        /// Hex-encoded init calldata.
        calldata: String,
    },
    /// Ownership changed hands.
    OwnershipTransferred {
        /// Owner before the transfer.
        previous_owner: Address,
        /// Owner after the transfer.
        new_owner: Address,
    },
    /// Free-form event raised by a module.
    Log {
        /// Module-defined topic.
        topic: String,
        /// Module-defined payload.
        data: serde_json::Value,
    },
}

/// An event as stored in a proxy's log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    /// Transaction that emitted the event.
    pub tx_id: Uuid,
    /// Commit time.
    pub timestamp: DateTime<Utc>,
    /// Proxy that committed the transaction.
    pub emitter: Address,
    /// The event itself.
    pub event: Event,
}
