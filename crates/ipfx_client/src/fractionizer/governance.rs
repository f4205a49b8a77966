//! `governance` module: proposals and votes.
//!
//! Every action names the patent it concerns. Proposals are always tied to the patent the caller
//! is acting on, never inferred from other records.

use super::{check_patent_id, ValidationError};
use crate::chain::NodeApi;
use crate::client::{value_as_str, value_as_u64, ClientError, DecodedResource, LedgerClient};
use crate::types::{Address, Argument, FunctionId, ResourcePath, StructTag, TransactionPayload};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const MODULE: &str = "governance";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalKind {
    License,
    Royalty,
    Transfer,
}

impl ProposalKind {
    pub fn code(self) -> u8 {
        match self {
            ProposalKind::License => 1,
            ProposalKind::Royalty => 2,
            ProposalKind::Transfer => 3,
        }
    }

    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            1 => Some(ProposalKind::License),
            2 => Some(ProposalKind::Royalty),
            3 => Some(ProposalKind::Transfer),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Active,
    Passed,
    Rejected,
    Unknown,
}

impl ProposalStatus {
    pub fn from_code(code: u64) -> Self {
        match code {
            1 => ProposalStatus::Active,
            2 => ProposalStatus::Passed,
            3 => ProposalStatus::Rejected,
            _ => ProposalStatus::Unknown,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: u64,
    pub creator: Address,
    pub patent_id: String,
    /// `None` for codes this client does not know.
    pub kind: Option<ProposalKind>,
    pub description: String,
    pub start_time: u64,
    pub end_time: u64,
    pub status: ProposalStatus,
    pub yes_votes: u64,
    pub no_votes: u64,
}

impl Proposal {
    fn from_json(v: &Value) -> Result<Self, String> {
        let field = |name: &str| v.get(name).ok_or_else(|| format!("missing field {}", name));
        let u64_field = |name: &str| field(name).and_then(value_as_u64);
        let str_field = |name: &str| field(name).and_then(|f| value_as_str(f).map(str::to_string));
        Ok(Self {
            id: u64_field("id")?,
            creator: str_field("creator")?
                .parse()
                .map_err(|e| format!("creator: {}", e))?,
            patent_id: str_field("patent_id")?,
            kind: ProposalKind::from_code(u64_field("proposal_type")?),
            description: str_field("description")?,
            start_time: u64_field("start_time")?,
            end_time: u64_field("end_time")?,
            status: ProposalStatus::from_code(u64_field("status")?),
            yes_votes: u64_field("yes_votes")?,
            no_votes: u64_field("no_votes")?,
        })
    }

    /// Share of yes votes in [0, 1]; `None` before any vote is cast.
    pub fn yes_share(&self) -> Option<f64> {
        let total = self.yes_votes as f64 + self.no_votes as f64;
        if total == 0.0 {
            None
        } else {
            Some(self.yes_votes as f64 / total)
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == ProposalStatus::Active
    }
}

pub fn governance_state_path(modules: Address, owner: Address) -> ResourcePath {
    ResourcePath::new(owner, StructTag::new(modules, MODULE, "GovernanceState", vec![]))
}

pub fn proposals_from_state(state: &DecodedResource) -> Result<Vec<Proposal>, ClientError> {
    let items = state
        .field("proposals")?
        .as_array()
        .ok_or_else(|| ClientError::Decode("GovernanceState.proposals is not an array".into()))?;
    items
        .iter()
        .enumerate()
        .map(|(i, p)| {
            Proposal::from_json(p).map_err(|e| ClientError::Decode(format!("proposal {}: {}", i, e)))
        })
        .collect()
}

pub async fn fetch_proposals<N: NodeApi>(
    client: &LedgerClient<N>,
    modules: Address,
    owner: Address,
) -> Result<Vec<Proposal>, ClientError> {
    let path = governance_state_path(modules, owner);
    let state = client.read_resource(owner, &path).await?;
    proposals_from_state(&state)
}

/// `governance::create_proposal(patent_id, proposal_type, description)`
pub fn create_proposal(
    modules: Address,
    patent_id: &str,
    kind: ProposalKind,
    description: &str,
) -> Result<TransactionPayload, ValidationError> {
    check_patent_id(patent_id)?;
    if description.trim().is_empty() {
        return Err(ValidationError::EmptyDescription);
    }
    Ok(TransactionPayload::entry_function(
        FunctionId::new(modules, MODULE, "create_proposal"),
        vec![],
        vec![
            Argument::String(patent_id.trim().to_string()),
            Argument::U8(kind.code()),
            Argument::String(description.to_string()),
        ],
    ))
}

/// `governance::vote(patent_id, proposal_id, approve)`
pub fn vote(
    modules: Address,
    patent_id: &str,
    proposal_id: u64,
    approve: bool,
) -> Result<TransactionPayload, ValidationError> {
    check_patent_id(patent_id)?;
    Ok(TransactionPayload::entry_function(
        FunctionId::new(modules, MODULE, "vote"),
        vec![],
        vec![
            Argument::String(patent_id.trim().to_string()),
            Argument::U64(proposal_id),
            Argument::Bool(approve),
        ],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn proposal_json(id: u64, patent: &str, yes: u64, no: u64) -> Value {
        json!({
            "id": id.to_string(),
            "creator": "0xcafe",
            "patent_id": patent,
            "proposal_type": 2,
            "description": "raise royalty",
            "start_time": "1700000000",
            "end_time": "1700600000",
            "status": 1,
            "yes_votes": yes.to_string(),
            "no_votes": no.to_string(),
        })
    }

    #[test]
    fn decode_proposals() {
        let state = DecodedResource::from_json(
            &"0xcafe::governance::GovernanceState".parse().unwrap(),
            json!({
                "type": "0xcafe::governance::GovernanceState",
                "data": {"proposals": [proposal_json(0, "US1", 3, 1), proposal_json(1, "US2", 0, 0)]}
            }),
        )
        .unwrap();
        let proposals = proposals_from_state(&state).unwrap();
        assert_eq!(proposals.len(), 2);
        assert_eq!(proposals[0].kind, Some(ProposalKind::Royalty));
        assert_eq!(proposals[0].yes_share(), Some(0.75));
        assert_eq!(proposals[1].patent_id, "US2");
        assert_eq!(proposals[1].yes_share(), None);
        assert!(proposals[1].is_open());
    }

    #[test]
    fn bad_proposal_is_decode_error() {
        let mut p = proposal_json(0, "US1", 1, 1);
        p["yes_votes"] = json!("many");
        let state = DecodedResource::from_json(
            &"0xcafe::governance::GovernanceState".parse().unwrap(),
            json!({"type": "0xcafe::governance::GovernanceState", "data": {"proposals": [p]}}),
        )
        .unwrap();
        assert!(matches!(proposals_from_state(&state), Err(ClientError::Decode(_))));
    }

    #[test]
    fn vote_carries_its_own_patent() {
        let p = vote(Address::ONE, "US7", 4, false).unwrap();
        assert_eq!(p.to_json()["arguments"], json!(["US7", "4", false]));
        assert_eq!(vote(Address::ONE, "", 4, true), Err(ValidationError::EmptyPatentId));
    }

    #[test]
    fn proposal_requires_description() {
        assert_eq!(
            create_proposal(Address::ONE, "US7", ProposalKind::License, "  "),
            Err(ValidationError::EmptyDescription)
        );
        let p = create_proposal(Address::ONE, "US7", ProposalKind::Transfer, "sell").unwrap();
        assert_eq!(p.to_json()["arguments"], json!(["US7", 3, "sell"]));
    }

    #[test]
    fn status_codes() {
        assert_eq!(ProposalStatus::from_code(2), ProposalStatus::Passed);
        assert_eq!(ProposalStatus::from_code(9), ProposalStatus::Unknown);
        assert_eq!(ProposalKind::from_code(0), None);
    }
}
