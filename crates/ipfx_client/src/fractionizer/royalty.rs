//! `royalty_distributor` module.

use super::{check_patent_id, check_positive, Returns, ValidationError};
use crate::chain::NodeApi;
use crate::client::{ClientError, LedgerClient};
use crate::types::{Address, Argument, FunctionId, TransactionPayload, ViewCall};
use serde::{Deserialize, Serialize};

const MODULE: &str = "royalty_distributor";

/// `royalty_distributor::distribute_royalties(patent_id, amount)`
pub fn distribute_royalties(
    modules: Address,
    patent_id: &str,
    amount: u64,
) -> Result<TransactionPayload, ValidationError> {
    check_patent_id(patent_id)?;
    check_positive(amount, "distribution amount")?;
    Ok(TransactionPayload::entry_function(
        FunctionId::new(modules, MODULE, "distribute_royalties"),
        vec![],
        vec![Argument::String(patent_id.trim().to_string()), Argument::U64(amount)],
    ))
}

/// Result of `get_payment_history`: running total, time of the last payment, and every amount
/// paid in order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentHistory {
    pub total_distributed: u64,
    pub last_payment_time: u64,
    pub payments: Vec<u64>,
}

impl PaymentHistory {
    pub fn from_view(values: &[serde_json::Value]) -> Result<Self, ClientError> {
        let r = Returns::new("royalty_distributor::get_payment_history", values, 3)?;
        Ok(Self {
            total_distributed: r.u64(0)?,
            last_payment_time: r.u64(1)?,
            payments: r.u64_vec(2)?,
        })
    }
}

pub fn payment_history_view(modules: Address, owner: Address) -> ViewCall {
    ViewCall::new(
        FunctionId::new(modules, MODULE, "get_payment_history"),
        vec![],
        vec![owner.into()],
    )
}

pub async fn fetch_payment_history<N: NodeApi>(
    client: &LedgerClient<N>,
    modules: Address,
    owner: Address,
) -> Result<PaymentHistory, ClientError> {
    let values = client.call_view(&payment_history_view(modules, owner)).await?;
    PaymentHistory::from_view(&values)
}
