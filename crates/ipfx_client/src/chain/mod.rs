//! Node transport, wire format, and the local transaction journal.

mod journal;
mod node;
mod wire;

pub use journal::{Journal, JournalEntry, JournalError};
pub use node::{HttpNode, NodeApi, NodeConfig, NodeError, DEFAULT_NODE_URL};
pub use wire::{
    AccountData, CommittedTransaction, EventView, LedgerInfo, MoveFunction, MoveModuleAbi,
    PendingTransaction, SignedTransaction, SimulationOutcome, TransactionSignature,
    TransactionView, UnsignedTransaction,
};
