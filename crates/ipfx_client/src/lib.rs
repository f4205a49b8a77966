//! Ledger client for IP Fractionizer.
//!
//! Reads account resources, runs view functions, submits signed entry-function transactions
//! and observes their confirmation on an Aptos-style REST node. Contract rules live on chain;
//! this crate only describes requests and decodes what the node returns.

pub mod chain;
pub mod client;
pub mod config;
pub mod fractionizer;
pub mod signer;
pub mod types;

pub use chain::{HttpNode, Journal, NodeApi, NodeError};
pub use client::{
    ClientError, Confirmation, ConfirmedResult, DecodedResource, LedgerClient, Quote,
    TerminalStatus, TransactionHandle, TransactionStatus,
};
pub use config::{ClientConfig, Deployment};
pub use signer::{Ed25519Signer, Signer};
pub use types::{
    Address, Argument, FunctionId, PoolId, ResourcePath, StructTag, TransactionPayload, TypeTag,
    ViewCall,
};
