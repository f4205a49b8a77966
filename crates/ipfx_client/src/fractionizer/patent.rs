//! `patent_token` module: registration and details.

use super::{check_patent_id, Returns, ValidationError};
use crate::chain::NodeApi;
use crate::client::{ClientError, LedgerClient};
use crate::types::{Address, Argument, FunctionId, StructTag, TransactionPayload, ViewCall};
use serde::{Deserialize, Serialize};

const MODULE: &str = "patent_token";

/// Input of the patent registration form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatentRegistration {
    pub patent_id: String,
    pub total_supply: u64,
    /// Percent of revenue distributed to holders.
    pub royalty_rate: u64,
}

impl PatentRegistration {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_patent_id(&self.patent_id)?;
        if self.total_supply == 0 {
            return Err(ValidationError::ZeroSupply);
        }
        if self.royalty_rate > 100 {
            return Err(ValidationError::RoyaltyRateOutOfRange(self.royalty_rate));
        }
        Ok(())
    }

    /// `patent_token::initialize(patent_id, total_supply, royalty_rate)`
    pub fn payload(&self, modules: Address) -> Result<TransactionPayload, ValidationError> {
        self.validate()?;
        Ok(TransactionPayload::entry_function(
            FunctionId::new(modules, MODULE, "initialize"),
            vec![],
            vec![
                Argument::String(self.patent_id.trim().to_string()),
                Argument::U64(self.total_supply),
                Argument::U64(self.royalty_rate),
            ],
        ))
    }
}

/// `modules::patent_token::PatentToken`, the coin type paired in pools.
pub fn patent_token_type(modules: Address) -> StructTag {
    StructTag::new(modules, MODULE, "PatentToken", vec![])
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatentDetails {
    pub patent_id: String,
    pub total_supply: u64,
    pub royalty_rate: u64,
}

impl PatentDetails {
    pub fn from_view(values: &[serde_json::Value]) -> Result<Self, ClientError> {
        let r = Returns::new("patent_token::get_patent_details", values, 3)?;
        Ok(Self {
            patent_id: r.string(0)?,
            total_supply: r.u64(1)?,
            royalty_rate: r.u64(2)?,
        })
    }
}

/// `patent_token::get_patent_details(owner)`
pub fn patent_details_view(modules: Address, owner: Address) -> ViewCall {
    ViewCall::new(
        FunctionId::new(modules, MODULE, "get_patent_details"),
        vec![],
        vec![owner.into()],
    )
}

pub async fn fetch_patent_details<N: NodeApi>(
    client: &LedgerClient<N>,
    modules: Address,
    owner: Address,
) -> Result<PatentDetails, ClientError> {
    let values = client.call_view(&patent_details_view(modules, owner)).await?;
    PatentDetails::from_view(&values)
}
