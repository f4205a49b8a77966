//! Observed transaction lifecycle: submitted → pending → confirmed | failed.

use crate::chain::EventView;
use crate::types::Address;
use serde::{Deserialize, Serialize};

/// Returned by submission. Meaningless until awaited.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionHandle {
    pub hash: String,
    pub sender: Address,
    pub sequence_number: u64,
    pub expiration_timestamp_secs: u64,
}

impl TransactionHandle {
    /// Handle for a hash obtained elsewhere (e.g. a wallet). Expiry is unknown.
    pub fn from_hash(hash: &str, sender: Address) -> Self {
        Self {
            hash: hash.to_string(),
            sender,
            sequence_number: 0,
            expiration_timestamp_secs: u64::MAX,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TerminalStatus {
    Succeeded,
    Failed { vm_status: String },
    /// Never committed before its expiration passed on the ledger clock.
    Expired,
}

impl TerminalStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, TerminalStatus::Succeeded)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfirmedResult {
    pub handle: TransactionHandle,
    pub status: TerminalStatus,
    pub version: Option<u64>,
    pub gas_used: u64,
    pub events: Vec<EventView>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Confirmation {
    Confirmed(ConfirmedResult),
    TimedOut { handle: TransactionHandle },
}

impl Confirmation {
    pub fn handle(&self) -> &TransactionHandle {
        match self {
            Confirmation::Confirmed(r) => &r.handle,
            Confirmation::TimedOut { handle } => handle,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Confirmation::Confirmed(r) if r.status.is_success())
    }
}

/// One-shot observation of a transaction.
#[derive(Clone, Debug, PartialEq)]
pub enum TransactionStatus {
    /// The node has not seen the hash (yet, or ever).
    Unknown,
    Pending,
    Committed(ConfirmedResult),
}
