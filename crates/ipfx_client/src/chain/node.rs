//! Node REST transport: the `NodeApi` seam and its HTTP implementation.

use crate::chain::wire::{
    AccountData, ErrorBody, LedgerInfo, MoveModule, MoveModuleAbi, PendingTransaction,
    SignedTransaction, SimulationOutcome, TransactionView, UnsignedTransaction,
};
use crate::types::{Address, ModuleId, ResourcePath, ViewCall};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_NODE_URL: &str = "https://fullnode.testnet.aptoslabs.com/v1";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    #[error("transport: {0}")]
    Transport(String),
    #[error("request timed out")]
    Timeout,
    #[error("api error: status {status} ({}): {message}", .error_code.as_deref().unwrap_or("-"))]
    Api {
        status: u16,
        error_code: Option<String>,
        vm_error_code: Option<u64>,
        message: String,
    },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("invalid node url: {0}")]
    InvalidUrl(String),
}

impl NodeError {
    pub fn status(&self) -> Option<u16> {
        match self {
            NodeError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_bad_request(&self) -> bool {
        self.status() == Some(400)
    }
}

/// One method per node endpoint the client uses.
#[async_trait]
pub trait NodeApi: Send + Sync {
    /// `GET /`
    async fn ledger_info(&self) -> Result<LedgerInfo, NodeError>;
    /// `GET /accounts/{address}`
    async fn account(&self, address: Address) -> Result<AccountData, NodeError>;
    /// `GET /accounts/{owner}/resource/{type}`; the raw JSON body.
    async fn resource(&self, path: &ResourcePath) -> Result<Value, NodeError>;
    /// `GET /accounts/{address}/module/{name}`
    async fn module_abi(&self, module: &ModuleId) -> Result<MoveModuleAbi, NodeError>;
    /// `POST /view`
    async fn view(&self, call: &ViewCall) -> Result<Vec<Value>, NodeError>;
    /// `POST /transactions/simulate`
    async fn simulate(&self, txn: &SignedTransaction) -> Result<SimulationOutcome, NodeError>;
    /// `POST /transactions/encode_submission`; the bytes to sign.
    async fn encode_submission(&self, txn: &UnsignedTransaction) -> Result<Vec<u8>, NodeError>;
    /// `POST /transactions`
    async fn submit(&self, txn: &SignedTransaction) -> Result<PendingTransaction, NodeError>;
    /// `GET /transactions/by_hash/{hash}`
    async fn transaction_by_hash(&self, hash: &str) -> Result<TransactionView, NodeError>;
}

#[async_trait]
impl<T: NodeApi + ?Sized> NodeApi for Arc<T> {
    async fn ledger_info(&self) -> Result<LedgerInfo, NodeError> {
        (**self).ledger_info().await
    }
    async fn account(&self, address: Address) -> Result<AccountData, NodeError> {
        (**self).account(address).await
    }
    async fn resource(&self, path: &ResourcePath) -> Result<Value, NodeError> {
        (**self).resource(path).await
    }
    async fn module_abi(&self, module: &ModuleId) -> Result<MoveModuleAbi, NodeError> {
        (**self).module_abi(module).await
    }
    async fn view(&self, call: &ViewCall) -> Result<Vec<Value>, NodeError> {
        (**self).view(call).await
    }
    async fn simulate(&self, txn: &SignedTransaction) -> Result<SimulationOutcome, NodeError> {
        (**self).simulate(txn).await
    }
    async fn encode_submission(&self, txn: &UnsignedTransaction) -> Result<Vec<u8>, NodeError> {
        (**self).encode_submission(txn).await
    }
    async fn submit(&self, txn: &SignedTransaction) -> Result<PendingTransaction, NodeError> {
        (**self).submit(txn).await
    }
    async fn transaction_by_hash(&self, hash: &str) -> Result<TransactionView, NodeError> {
        (**self).transaction_by_hash(hash).await
    }
}

#[derive(Clone, Debug)]
pub struct NodeConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_NODE_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

/// HTTP node client. Cheap to share: the underlying `reqwest::Client` pools connections.
pub struct HttpNode {
    base_url: String,
    client: reqwest::Client,
    request_count: AtomicU64,
}

impl HttpNode {
    pub fn new(config: &NodeConfig) -> Result<Self, NodeError> {
        let parsed = url::Url::parse(&config.base_url)
            .map_err(|e| NodeError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(NodeError::InvalidUrl(format!(
                "{}: unsupported scheme {}",
                config.base_url,
                parsed.scheme()
            )));
        }
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| NodeError::Transport(e.to_string()))?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            request_count: AtomicU64::new(0),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, NodeError> {
        let url = self.url(path);
        debug!(%url, "GET");
        let res = self.client.get(&url).send().await;
        self.finish(res).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, NodeError> {
        let url = self.url(path);
        debug!(%url, "POST");
        let res = self.client.post(&url).json(body).send().await;
        self.finish(res).await
    }

    async fn finish<T: DeserializeOwned>(
        &self,
        res: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<T, NodeError> {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        let response = res.map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        if !status.is_success() {
            let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or_else(|_| ErrorBody {
                message: body.clone(),
                ..Default::default()
            });
            debug!(status = status.as_u16(), code = ?parsed.error_code, "node error");
            return Err(NodeError::Api {
                status: status.as_u16(),
                error_code: parsed.error_code,
                vm_error_code: parsed.vm_error_code,
                message: parsed.message,
            });
        }
        serde_json::from_str(&body).map_err(|e| NodeError::Malformed(e.to_string()))
    }
}

fn transport_error(e: reqwest::Error) -> NodeError {
    if e.is_timeout() {
        NodeError::Timeout
    } else {
        NodeError::Transport(e.to_string())
    }
}

#[async_trait]
impl NodeApi for HttpNode {
    async fn ledger_info(&self) -> Result<LedgerInfo, NodeError> {
        self.get_json("/").await
    }

    async fn account(&self, address: Address) -> Result<AccountData, NodeError> {
        self.get_json(&format!("/accounts/{}", address)).await
    }

    async fn resource(&self, path: &ResourcePath) -> Result<Value, NodeError> {
        let resource_type = path.resource_type().to_string();
        self.get_json(&format!(
            "/accounts/{}/resource/{}",
            path.owner(),
            urlencoding::encode(&resource_type)
        ))
        .await
    }

    async fn module_abi(&self, module: &ModuleId) -> Result<MoveModuleAbi, NodeError> {
        let m: MoveModule = self
            .get_json(&format!(
                "/accounts/{}/module/{}",
                module.address,
                urlencoding::encode(&module.name)
            ))
            .await?;
        m.abi
            .ok_or_else(|| NodeError::Malformed(format!("module {} has no abi", module)))
    }

    async fn view(&self, call: &ViewCall) -> Result<Vec<Value>, NodeError> {
        self.post_json("/view", &call.to_request_json()).await
    }

    async fn simulate(&self, txn: &SignedTransaction) -> Result<SimulationOutcome, NodeError> {
        let mut results: Vec<SimulationOutcome> =
            self.post_json("/transactions/simulate", txn).await?;
        results
            .pop()
            .ok_or_else(|| NodeError::Malformed("empty simulation result".to_string()))
    }

    async fn encode_submission(&self, txn: &UnsignedTransaction) -> Result<Vec<u8>, NodeError> {
        let encoded: String = self
            .post_json("/transactions/encode_submission", txn)
            .await?;
        let digits = encoded.strip_prefix("0x").unwrap_or(&encoded);
        hex::decode(digits).map_err(|e| NodeError::Malformed(format!("signing message: {}", e)))
    }

    async fn submit(&self, txn: &SignedTransaction) -> Result<PendingTransaction, NodeError> {
        self.post_json("/transactions", txn).await
    }

    async fn transaction_by_hash(&self, hash: &str) -> Result<TransactionView, NodeError> {
        let raw: Value = self
            .get_json(&format!(
                "/transactions/by_hash/{}",
                urlencoding::encode(hash)
            ))
            .await?;
        TransactionView::from_json(raw).map_err(|e| NodeError::Malformed(e.to_string()))
    }
}
