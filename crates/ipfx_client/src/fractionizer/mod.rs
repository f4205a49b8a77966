//! IP Fractionizer contract bindings: typed payloads and decoders for the
//! `patent_token`, `royalty_distributor` and `governance` modules, plus the Liquidswap router.
//!
//! Payload builders apply the same input checks the registration and governance forms did;
//! everything else (minting, royalty accounting, vote tallying) is decided on chain.

mod governance;
mod liquidswap;
mod patent;
mod royalty;

pub use governance::{
    create_proposal, fetch_proposals, governance_state_path, proposals_from_state, vote, Proposal,
    ProposalKind, ProposalStatus,
};
pub use liquidswap::{
    add_liquidity, patent_pool, swap_exact_apt_for_token, swap_exact_token_for_apt,
};
pub use patent::{
    fetch_patent_details, patent_details_view, patent_token_type, PatentDetails,
    PatentRegistration,
};
pub use royalty::{distribute_royalties, fetch_payment_history, payment_history_view, PaymentHistory};

use crate::client::{value_as_str, value_as_u64, ClientError};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("patent id is required")]
    EmptyPatentId,
    #[error("total supply must be at least 1")]
    ZeroSupply,
    #[error("royalty rate {0} is outside 0..=100")]
    RoyaltyRateOutOfRange(u64),
    #[error("{0} must be greater than zero")]
    ZeroAmount(&'static str),
    #[error("proposal description is required")]
    EmptyDescription,
}

impl From<ValidationError> for ClientError {
    fn from(e: ValidationError) -> Self {
        ClientError::InvalidArgument(e.to_string())
    }
}

fn check_patent_id(patent_id: &str) -> Result<(), ValidationError> {
    if patent_id.trim().is_empty() {
        Err(ValidationError::EmptyPatentId)
    } else {
        Ok(())
    }
}

fn check_positive(amount: u64, what: &'static str) -> Result<(), ValidationError> {
    if amount == 0 {
        Err(ValidationError::ZeroAmount(what))
    } else {
        Ok(())
    }
}

/// Positional view return value accessors with decode errors naming the function.
struct Returns<'a> {
    function: &'a str,
    values: &'a [Value],
}

impl<'a> Returns<'a> {
    fn new(function: &'a str, values: &'a [Value], expected: usize) -> Result<Self, ClientError> {
        if values.len() < expected {
            return Err(ClientError::Decode(format!(
                "{} returned {} values, expected {}",
                function,
                values.len(),
                expected
            )));
        }
        Ok(Self { function, values })
    }

    fn err(&self, i: usize, e: String) -> ClientError {
        ClientError::Decode(format!("{} return {}: {}", self.function, i, e))
    }

    fn u64(&self, i: usize) -> Result<u64, ClientError> {
        value_as_u64(&self.values[i]).map_err(|e| self.err(i, e))
    }

    fn string(&self, i: usize) -> Result<String, ClientError> {
        value_as_str(&self.values[i])
            .map(str::to_string)
            .map_err(|e| self.err(i, e))
    }

    fn u64_vec(&self, i: usize) -> Result<Vec<u64>, ClientError> {
        let items = self.values[i]
            .as_array()
            .ok_or_else(|| self.err(i, format!("not an array: {}", self.values[i])))?;
        items
            .iter()
            .map(|v| value_as_u64(v).map_err(|e| self.err(i, e)))
            .collect()
    }
}
