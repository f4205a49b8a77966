//! JSON shapes exchanged with the node's REST API.

use crate::types::Address;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// u64 carried as a decimal string (the node also tolerates plain numbers on input).
pub(crate) mod u64_string {
    use super::*;

    pub fn serialize<S: Serializer>(v: &u64, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(v)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        match Value::deserialize(d)? {
            Value::String(s) => s.parse().map_err(serde::de::Error::custom),
            Value::Number(n) => n
                .as_u64()
                .ok_or_else(|| serde::de::Error::custom("expected unsigned integer")),
            other => Err(serde::de::Error::custom(format!(
                "expected u64 string, got {}",
                other
            ))),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerInfo {
    pub chain_id: u8,
    #[serde(with = "u64_string")]
    pub ledger_version: u64,
    /// Microseconds since the unix epoch.
    #[serde(with = "u64_string")]
    pub ledger_timestamp: u64,
}

impl LedgerInfo {
    pub fn timestamp_secs(&self) -> u64 {
        self.ledger_timestamp / 1_000_000
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccountData {
    #[serde(with = "u64_string")]
    pub sequence_number: u64,
    pub authentication_key: String,
}

/// Error body returned with non-2xx statuses.
#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
    pub error_code: Option<String>,
    pub vm_error_code: Option<u64>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MoveModule {
    pub abi: Option<MoveModuleAbi>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MoveModuleAbi {
    pub address: Address,
    pub name: String,
    #[serde(default)]
    pub exposed_functions: Vec<MoveFunction>,
}

impl MoveModuleAbi {
    pub fn function(&self, name: &str) -> Option<&MoveFunction> {
        self.exposed_functions.iter().find(|f| f.name == name)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MoveFunction {
    pub name: String,
    #[serde(default)]
    pub visibility: String,
    #[serde(default)]
    pub is_entry: bool,
    #[serde(default)]
    pub is_view: bool,
    /// Ability constraints per generic parameter; only the count matters here.
    #[serde(default)]
    pub generic_type_params: Vec<Value>,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default, rename = "return")]
    pub return_types: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct UnsignedTransaction {
    pub sender: Address,
    #[serde(with = "u64_string")]
    pub sequence_number: u64,
    #[serde(with = "u64_string")]
    pub max_gas_amount: u64,
    #[serde(with = "u64_string")]
    pub gas_unit_price: u64,
    #[serde(with = "u64_string")]
    pub expiration_timestamp_secs: u64,
    pub payload: Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransactionSignature {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub public_key: String,
    pub signature: String,
}

impl TransactionSignature {
    pub fn ed25519(public_key: &[u8; 32], signature: &[u8; 64]) -> Self {
        Self {
            kind: "ed25519_signature",
            public_key: format!("0x{}", hex::encode(public_key)),
            signature: format!("0x{}", hex::encode(signature)),
        }
    }

    /// Zeroed signature; the node refuses to simulate validly signed transactions.
    pub fn for_simulation(public_key: &[u8; 32]) -> Self {
        Self::ed25519(public_key, &[0u8; 64])
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SignedTransaction {
    #[serde(flatten)]
    pub raw: UnsignedTransaction,
    pub signature: TransactionSignature,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PendingTransaction {
    pub hash: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub success: bool,
    pub vm_status: String,
    #[serde(with = "u64_string")]
    pub gas_used: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventView {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommittedTransaction {
    pub hash: String,
    #[serde(with = "u64_string")]
    pub version: u64,
    pub success: bool,
    pub vm_status: String,
    #[serde(with = "u64_string")]
    pub gas_used: u64,
    #[serde(default)]
    pub events: Vec<EventView>,
}

/// What `GET /transactions/by_hash/{hash}` reports.
#[derive(Clone, Debug, PartialEq)]
pub enum TransactionView {
    Pending { hash: String },
    Committed(CommittedTransaction),
}

impl TransactionView {
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        if value.get("type").and_then(Value::as_str) == Some("pending_transaction") {
            #[derive(Deserialize)]
            struct Pending {
                hash: String,
            }
            let p: Pending = serde_json::from_value(value)?;
            return Ok(TransactionView::Pending { hash: p.hash });
        }
        Ok(TransactionView::Committed(serde_json::from_value(value)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unsigned_txn_encodes_u64_as_strings() {
        let txn = UnsignedTransaction {
            sender: Address::ONE,
            sequence_number: 3,
            max_gas_amount: 200_000,
            gas_unit_price: 100,
            expiration_timestamp_secs: 1_700_000_600,
            payload: json!({"type": "entry_function_payload"}),
        };
        let signed = SignedTransaction {
            raw: txn,
            signature: TransactionSignature::for_simulation(&[7u8; 32]),
        };
        let v = serde_json::to_value(&signed).unwrap();
        assert_eq!(v["sequence_number"], "3");
        assert_eq!(v["max_gas_amount"], "200000");
        assert_eq!(v["sender"], "0x1");
        assert_eq!(v["signature"]["type"], "ed25519_signature");
        assert_eq!(v["signature"]["signature"].as_str().unwrap().len(), 130);
    }

    #[test]
    fn transaction_view_classifies() {
        let pending = TransactionView::from_json(json!({
            "type": "pending_transaction", "hash": "0xaa"
        }))
        .unwrap();
        assert_eq!(pending, TransactionView::Pending { hash: "0xaa".into() });

        let committed = TransactionView::from_json(json!({
            "type": "user_transaction",
            "hash": "0xaa",
            "version": "12",
            "success": false,
            "vm_status": "Move abort",
            "gas_used": 9,
            "events": [{"type": "0x1::coin::WithdrawEvent", "data": {"amount": "5"}}]
        }))
        .unwrap();
        match committed {
            TransactionView::Committed(c) => {
                assert_eq!(c.version, 12);
                assert_eq!(c.gas_used, 9);
                assert!(!c.success);
                assert_eq!(c.events.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn ledger_info_timestamp() {
        let info: LedgerInfo = serde_json::from_value(json!({
            "chain_id": 2, "ledger_version": "100", "ledger_timestamp": "1700000000123456",
            "epoch": "5"
        }))
        .unwrap();
        assert_eq!(info.timestamp_secs(), 1_700_000_000);
    }
}
