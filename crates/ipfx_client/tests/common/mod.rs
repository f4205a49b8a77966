//! In-memory ledger standing in for a node in integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use ipfx_client::chain::{
    AccountData, CommittedTransaction, EventView, LedgerInfo, MoveModuleAbi, NodeApi, NodeError,
    PendingTransaction, SignedTransaction, SimulationOutcome, TransactionView, UnsignedTransaction,
};
use ipfx_client::types::{Address, ModuleId, ResourcePath, StructTag, ViewCall};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

pub fn load_fixture<T: serde::de::DeserializeOwned>(path: &str) -> T {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../testdata");
    let full = root.join(path);
    let s =
        std::fs::read_to_string(&full).unwrap_or_else(|e| panic!("read {}: {}", full.display(), e));
    serde_json::from_str(&s).unwrap_or_else(|e| panic!("parse {}: {}", path, e))
}

pub fn module_fixture(path: &str) -> MoveModuleAbi {
    let raw: Value = load_fixture(path);
    serde_json::from_value(raw["abi"].clone()).expect("abi")
}

pub fn addr(s: &str) -> Address {
    s.parse().unwrap()
}

pub fn api_error(status: u16, message: &str) -> NodeError {
    NodeError::Api {
        status,
        error_code: None,
        vm_error_code: None,
        message: message.to_string(),
    }
}

fn not_found(what: &str) -> NodeError {
    NodeError::Api {
        status: 404,
        error_code: Some("not_found".to_string()),
        vm_error_code: None,
        message: format!("{} not found", what),
    }
}

struct Submission {
    hash: String,
    at: Instant,
}

pub struct MockNode {
    resources: HashMap<(Address, String), Value>,
    modules: HashMap<String, MoveModuleAbi>,
    views: HashMap<String, Vec<Value>>,
    accounts: HashMap<Address, u64>,
    simulation: SimulationOutcome,
    confirm_after: Duration,
    commit_success: bool,
    ledger_timestamp_secs: u64,
    /// Accept submissions but never let them show up on the ledger.
    drop_submissions: bool,
    latency: Duration,
    failures: HashMap<&'static str, NodeError>,
    /// Number of `by_hash` lookups answered 404 regardless of what was submitted.
    lagging_lookups: Mutex<usize>,
    submissions: Mutex<Vec<Submission>>,
    calls: Mutex<Vec<&'static str>>,
}

impl Default for MockNode {
    fn default() -> Self {
        Self {
            resources: HashMap::new(),
            modules: HashMap::new(),
            views: HashMap::new(),
            accounts: HashMap::new(),
            simulation: SimulationOutcome {
                success: true,
                vm_status: "Executed successfully".to_string(),
                gas_used: 7,
            },
            confirm_after: Duration::ZERO,
            commit_success: true,
            ledger_timestamp_secs: 1_700_000_000,
            drop_submissions: false,
            latency: Duration::ZERO,
            failures: HashMap::new(),
            lagging_lookups: Mutex::new(0),
            submissions: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `raw` (a `{type, data}` body) under `owner` at the type named in the body.
    pub fn with_resource(mut self, owner: Address, raw: Value) -> Self {
        let tag: StructTag = raw["type"].as_str().unwrap().parse().unwrap();
        self.resources.insert((owner, tag.to_string()), raw);
        self
    }

    /// Store `raw` at `tag` regardless of what the body says.
    pub fn with_resource_at(mut self, owner: Address, tag: &StructTag, raw: Value) -> Self {
        self.resources.insert((owner, tag.to_string()), raw);
        self
    }

    pub fn with_module(mut self, abi: MoveModuleAbi) -> Self {
        let id = ModuleId::new(abi.address, &abi.name);
        self.modules.insert(id.to_string(), abi);
        self
    }

    pub fn with_view(mut self, function: &str, returns: Vec<Value>) -> Self {
        let f: ipfx_client::FunctionId = function.parse().unwrap();
        self.views.insert(f.to_string(), returns);
        self
    }

    pub fn with_account(mut self, address: Address, sequence_number: u64) -> Self {
        self.accounts.insert(address, sequence_number);
        self
    }

    pub fn rejecting_simulation(mut self, vm_status: &str) -> Self {
        self.simulation = SimulationOutcome {
            success: false,
            vm_status: vm_status.to_string(),
            gas_used: 3,
        };
        self
    }

    pub fn confirming_after(mut self, delay: Duration) -> Self {
        self.confirm_after = delay;
        self
    }

    pub fn failing_execution(mut self) -> Self {
        self.commit_success = false;
        self
    }

    pub fn dropping_submissions(mut self) -> Self {
        self.drop_submissions = true;
        self
    }

    pub fn with_ledger_time(mut self, secs: u64) -> Self {
        self.ledger_timestamp_secs = secs;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Answer every request to `endpoint` with `error`. The call is still recorded.
    pub fn failing(mut self, endpoint: &'static str, error: NodeError) -> Self {
        self.failures.insert(endpoint, error);
        self
    }

    /// Report the first `n` hash lookups as unknown, as a node behind the chain head would.
    pub fn lagging_lookups(self, n: usize) -> Self {
        *self.lagging_lookups.lock().unwrap() = n;
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, endpoint: &str) -> bool {
        self.calls().iter().any(|c| *c == endpoint)
    }

    async fn hit(&self, endpoint: &'static str) -> Result<(), NodeError> {
        self.calls.lock().unwrap().push(endpoint);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match self.failures.get(endpoint) {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl NodeApi for MockNode {
    async fn ledger_info(&self) -> Result<LedgerInfo, NodeError> {
        self.hit("ledger_info").await?;
        Ok(LedgerInfo {
            chain_id: 4,
            ledger_version: 1000,
            ledger_timestamp: self.ledger_timestamp_secs * 1_000_000,
        })
    }

    async fn account(&self, address: Address) -> Result<AccountData, NodeError> {
        self.hit("account").await?;
        let seq = self
            .accounts
            .get(&address)
            .ok_or_else(|| not_found("account"))?;
        Ok(AccountData {
            sequence_number: *seq,
            authentication_key: address.to_long_string(),
        })
    }

    async fn resource(&self, path: &ResourcePath) -> Result<Value, NodeError> {
        self.hit("resource").await?;
        self.resources
            .get(&(path.owner(), path.resource_type().to_string()))
            .cloned()
            .ok_or_else(|| not_found("resource"))
    }

    async fn module_abi(&self, module: &ModuleId) -> Result<MoveModuleAbi, NodeError> {
        self.hit("module_abi").await?;
        self.modules
            .get(&module.to_string())
            .cloned()
            .ok_or_else(|| not_found("module"))
    }

    async fn view(&self, call: &ViewCall) -> Result<Vec<Value>, NodeError> {
        self.hit("view").await?;
        self.views
            .get(&call.invocation().function().to_string())
            .cloned()
            .ok_or_else(|| not_found("function"))
    }

    async fn simulate(&self, _txn: &SignedTransaction) -> Result<SimulationOutcome, NodeError> {
        self.hit("simulate").await?;
        Ok(self.simulation.clone())
    }

    async fn encode_submission(&self, txn: &UnsignedTransaction) -> Result<Vec<u8>, NodeError> {
        self.hit("encode_submission").await?;
        serde_json::to_vec(txn).map_err(|e| NodeError::Malformed(e.to_string()))
    }

    async fn submit(&self, txn: &SignedTransaction) -> Result<PendingTransaction, NodeError> {
        self.hit("submit").await?;
        let mut subs = self.submissions.lock().unwrap();
        let hash = format!("0x{:064x}", (subs.len() as u64 + 1) * 0x1000 + txn.raw.sequence_number);
        if !self.drop_submissions {
            subs.push(Submission {
                hash: hash.clone(),
                at: Instant::now(),
            });
        }
        Ok(PendingTransaction { hash })
    }

    async fn transaction_by_hash(&self, hash: &str) -> Result<TransactionView, NodeError> {
        self.hit("transaction_by_hash").await?;
        {
            let mut lagging = self.lagging_lookups.lock().unwrap();
            if *lagging > 0 {
                *lagging -= 1;
                return Err(not_found("transaction"));
            }
        }
        let subs = self.submissions.lock().unwrap();
        let sub = subs
            .iter()
            .find(|s| s.hash == hash)
            .ok_or_else(|| not_found("transaction"))?;
        if sub.at.elapsed() < self.confirm_after {
            return Ok(TransactionView::Pending {
                hash: hash.to_string(),
            });
        }
        Ok(TransactionView::Committed(CommittedTransaction {
            hash: hash.to_string(),
            version: 42,
            success: self.commit_success,
            vm_status: if self.commit_success {
                "Executed successfully".to_string()
            } else {
                "Move abort in 0xcafe::governance: E_VOTING_CLOSED(0x3)".to_string()
            },
            gas_used: 11,
            events: vec![EventView {
                event_type: "0x1::transaction_fee::FeeStatement".to_string(),
                data: serde_json::json!({"total_charge_gas_units": "11"}),
            }],
        }))
    }
}
