//! LedgerClient: resource reads, view calls, submission and confirmation against one node.
//!
//! The client holds no domain state. Everything it reports is observed on the ledger; a write
//! followed by a dependent read needs `await_confirmation` in between.

mod decode;
mod error;
mod lifecycle;

pub use decode::{value_as_str, value_as_u64, DecodedResource, Quote};
pub use error::ClientError;
pub use lifecycle::{
    Confirmation, ConfirmedResult, TerminalStatus, TransactionHandle, TransactionStatus,
};

use crate::chain::{
    AccountData, HttpNode, LedgerInfo, MoveFunction, NodeApi, NodeError, SignedTransaction,
    TransactionSignature, TransactionView, UnsignedTransaction,
};
use crate::config::ClientConfig;
use crate::signer::Signer;
use crate::types::{Address, Invocation, PoolId, ResourcePath, TransactionPayload, TypeTag, ViewCall};
use serde_json::Value;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FunctionKind {
    View,
    Entry,
}

pub struct LedgerClient<N = HttpNode> {
    node: N,
    config: ClientConfig,
}

impl LedgerClient<HttpNode> {
    /// Client over HTTP to `config.node_url`.
    pub fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        config
            .validate()
            .map_err(|e| ClientError::Config(e.to_string()))?;
        let node = HttpNode::new(&config.node_config())?;
        Ok(Self { node, config })
    }
}

impl<N: NodeApi> LedgerClient<N> {
    pub fn with_node(node: N, config: ClientConfig) -> Self {
        Self { node, config }
    }

    pub fn node(&self) -> &N {
        &self.node
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn ledger_info(&self) -> Result<LedgerInfo, ClientError> {
        Ok(self.node.ledger_info().await?)
    }

    pub async fn account(&self, address: Address) -> Result<AccountData, ClientError> {
        self.node.account(address).await.map_err(|e| {
            if e.is_not_found() {
                ClientError::NotFound(format!("account {}", address))
            } else {
                e.into()
            }
        })
    }

    /// Fetch and decode the resource at `path`. `address` is the account to read from;
    /// it normally equals `path.owner()`.
    pub async fn read_resource(
        &self,
        address: Address,
        path: &ResourcePath,
    ) -> Result<DecodedResource, ClientError> {
        let path = if path.owner() == address {
            path.clone()
        } else {
            ResourcePath::new(address, path.resource_type().clone())
        };
        let raw = self.node.resource(&path).await.map_err(|e| {
            if e.is_not_found() {
                ClientError::NotFound(format!("{} under {}", path.resource_type(), address))
            } else {
                e.into()
            }
        })?;
        let decoded = DecodedResource::from_json(path.resource_type(), raw)?;
        debug!(resource = %decoded.resource_type, fields = decoded.fields.len(), "read resource");
        Ok(decoded)
    }

    /// Read-only invocation. Arguments are checked against the module ABI first (when enabled);
    /// a mismatch fails without issuing the view request.
    pub async fn call_view(&self, view: &ViewCall) -> Result<Vec<Value>, ClientError> {
        if self.config.validate_abi {
            self.check_signature(view.invocation(), FunctionKind::View)
                .await?;
        }
        let values = self.node.view(view).await.map_err(|e| {
            if e.is_bad_request() {
                ClientError::InvalidArgument(node_message(&e))
            } else if e.is_not_found() {
                ClientError::NotFound(format!("function {}", view.invocation().function()))
            } else {
                e.into()
            }
        })?;
        debug!(function = %view.invocation().function(), returned = values.len(), "view");
        Ok(values)
    }

    /// Build, simulate, sign and submit. Ledger atomicity means a failure here leaves no
    /// partial state; the returned handle is not confirmed.
    pub async fn submit_transaction(
        &self,
        payload: &TransactionPayload,
        signer: Option<&dyn Signer>,
    ) -> Result<TransactionHandle, ClientError> {
        let signer = signer.ok_or(ClientError::SignerUnavailable)?;
        let function = payload.invocation().function();
        if self.config.validate_abi {
            self.check_signature(payload.invocation(), FunctionKind::Entry)
                .await?;
        }

        let sender = signer.address();
        let expiration_timestamp_secs = (OffsetDateTime::now_utc().unix_timestamp().max(0) as u64)
            .checked_add(self.config.expiration_secs)
            .filter(|t| *t != u64::MAX)
            .ok_or_else(|| {
                ClientError::Config(format!(
                    "expiration_secs {} overflows the expiration timestamp",
                    self.config.expiration_secs
                ))
            })?;
        let account = self.account(sender).await?;
        let raw = UnsignedTransaction {
            sender,
            sequence_number: account.sequence_number,
            max_gas_amount: self.config.max_gas_amount,
            gas_unit_price: self.config.gas_unit_price,
            expiration_timestamp_secs,
            payload: payload.to_json(),
        };
        let public_key = signer.public_key();

        if self.config.simulate_before_submit {
            let probe = SignedTransaction {
                raw: raw.clone(),
                signature: TransactionSignature::for_simulation(&public_key),
            };
            let outcome = self
                .node
                .simulate(&probe)
                .await
                .map_err(|e| submission_error(e, function))?;
            if !outcome.success {
                warn!(%function, vm_status = %outcome.vm_status, "simulation failed");
                return Err(ClientError::RejectedBySimulation {
                    vm_status: outcome.vm_status,
                });
            }
            debug!(%function, gas_used = outcome.gas_used, "simulation ok");
        }

        let message = self
            .node
            .encode_submission(&raw)
            .await
            .map_err(|e| submission_error(e, function))?;
        let signature = signer
            .sign(&message)
            .await
            .map_err(|e| ClientError::Signing(e.to_string()))?;
        let signed = SignedTransaction {
            raw,
            signature: TransactionSignature::ed25519(&public_key, &signature),
        };
        let pending = self
            .node
            .submit(&signed)
            .await
            .map_err(|e| submission_error(e, function))?;
        info!(%function, hash = %pending.hash, sequence = account.sequence_number, "submitted");
        Ok(TransactionHandle {
            hash: pending.hash,
            sender,
            sequence_number: account.sequence_number,
            expiration_timestamp_secs,
        })
    }

    /// Single observation of the transaction behind `handle`.
    pub async fn transaction_status(
        &self,
        handle: &TransactionHandle,
    ) -> Result<TransactionStatus, ClientError> {
        match self.node.transaction_by_hash(&handle.hash).await {
            Ok(TransactionView::Pending { .. }) => Ok(TransactionStatus::Pending),
            Ok(TransactionView::Committed(txn)) => {
                let status = if txn.success {
                    TerminalStatus::Succeeded
                } else {
                    TerminalStatus::Failed {
                        vm_status: txn.vm_status,
                    }
                };
                Ok(TransactionStatus::Committed(ConfirmedResult {
                    handle: handle.clone(),
                    status,
                    version: Some(txn.version),
                    gas_used: txn.gas_used,
                    events: txn.events,
                }))
            }
            Err(e) if e.is_not_found() => Ok(TransactionStatus::Unknown),
            Err(e) => Err(e.into()),
        }
    }

    /// Poll until the transaction is terminal or `timeout` elapses. A timeout is an outcome,
    /// not an error. Dropping the future stops polling.
    pub async fn await_confirmation(
        &self,
        handle: &TransactionHandle,
        timeout: Duration,
    ) -> Result<Confirmation, ClientError> {
        match tokio::time::timeout(timeout, self.poll_until_terminal(handle)).await {
            Ok(result) => {
                let result = result?;
                info!(hash = %handle.hash, status = ?result.status, "confirmed");
                Ok(Confirmation::Confirmed(result))
            }
            Err(_) => {
                info!(hash = %handle.hash, ?timeout, "confirmation timed out");
                Ok(Confirmation::TimedOut {
                    handle: handle.clone(),
                })
            }
        }
    }

    async fn poll_until_terminal(
        &self,
        handle: &TransactionHandle,
    ) -> Result<ConfirmedResult, ClientError> {
        let interval = self.config.poll_interval();
        loop {
            match self.transaction_status(handle).await? {
                TransactionStatus::Committed(result) => return Ok(result),
                TransactionStatus::Pending => {}
                TransactionStatus::Unknown => {
                    if handle.expiration_timestamp_secs != u64::MAX {
                        let ledger = self.node.ledger_info().await?;
                        if ledger.timestamp_secs() > handle.expiration_timestamp_secs {
                            // The lookup and the clock are separate requests; the transaction
                            // may have committed in between. Expired only if it is still unknown.
                            match self.transaction_status(handle).await? {
                                TransactionStatus::Committed(result) => return Ok(result),
                                TransactionStatus::Pending => {}
                                TransactionStatus::Unknown => {
                                    return Ok(ConfirmedResult {
                                        handle: handle.clone(),
                                        status: TerminalStatus::Expired,
                                        version: None,
                                        gas_used: 0,
                                        events: vec![],
                                    })
                                }
                            }
                        }
                    }
                }
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// Reserve pair of a pool. Read-only.
    pub async fn quote_pool(&self, pool: &PoolId) -> Result<Quote, ClientError> {
        let resource = self
            .read_resource(pool.exchange(), &pool.resource_path())
            .await?;
        Quote::from_pool(&resource)
    }

    async fn check_signature(
        &self,
        invocation: &Invocation,
        kind: FunctionKind,
    ) -> Result<(), ClientError> {
        let function = invocation.function();
        let abi = self.node.module_abi(&function.module).await.map_err(|e| {
            if e.is_not_found() {
                ClientError::NotFound(format!("module {}", function.module))
            } else {
                e.into()
            }
        })?;
        let f = abi.function(&function.name).ok_or_else(|| {
            ClientError::InvalidArgument(format!("{} is not exposed by its module", function))
        })?;
        validate_invocation(invocation, f, kind)
    }
}

/// Match an invocation against the function's ABI entry.
fn validate_invocation(
    invocation: &Invocation,
    f: &MoveFunction,
    kind: FunctionKind,
) -> Result<(), ClientError> {
    let function = invocation.function();
    match kind {
        FunctionKind::View if !f.is_view => {
            return Err(ClientError::InvalidArgument(format!(
                "{} is not a view function",
                function
            )))
        }
        FunctionKind::Entry if !f.is_entry => {
            return Err(ClientError::InvalidArgument(format!(
                "{} is not an entry function",
                function
            )))
        }
        _ => {}
    }
    if invocation.type_arguments().len() != f.generic_type_params.len() {
        return Err(ClientError::InvalidArgument(format!(
            "{} takes {} type arguments, got {}",
            function,
            f.generic_type_params.len(),
            invocation.type_arguments().len()
        )));
    }
    let params = f
        .params
        .iter()
        .map(|p| p.parse::<TypeTag>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ClientError::Decode(format!("abi of {}: {}", function, e)))?;
    let params: Vec<TypeTag> = params
        .iter()
        .filter(|p| !p.is_signer())
        .map(|p| p.instantiate(invocation.type_arguments()))
        .collect();
    if invocation.arguments().len() != params.len() {
        return Err(ClientError::InvalidArgument(format!(
            "{} takes {} arguments, got {}",
            function,
            params.len(),
            invocation.arguments().len()
        )));
    }
    for (i, (arg, param)) in invocation.arguments().iter().zip(&params).enumerate() {
        if !arg.matches(param) {
            return Err(ClientError::InvalidArgument(format!(
                "{} argument {}: expected {}, got {:?}",
                function, i, param, arg
            )));
        }
    }
    Ok(())
}

fn node_message(e: &NodeError) -> String {
    match e {
        NodeError::Api { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

fn submission_error(e: NodeError, function: &crate::types::FunctionId) -> ClientError {
    if e.is_bad_request() {
        ClientError::InvalidArgument(format!("{}: {}", function, node_message(&e)))
    } else if e.is_not_found() {
        ClientError::NotFound(format!("{}: {}", function, node_message(&e)))
    } else {
        e.into()
    }
}
