//! Request descriptors handed to the ledger client.
//!
//! All descriptors are immutable once built: fields are private and exposed through accessors.

use crate::types::address::Address;
use crate::types::argument::Argument;
use crate::types::move_type::{FunctionId, StructTag, TypeTag};
use serde_json::{json, Value};

/// Location of a resource: owner address + struct type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourcePath {
    owner: Address,
    resource_type: StructTag,
}

impl ResourcePath {
    pub fn new(owner: Address, resource_type: StructTag) -> Self {
        Self {
            owner,
            resource_type,
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn resource_type(&self) -> &StructTag {
        &self.resource_type
    }
}

/// Function id + type arguments + arguments. Shared by view calls and payloads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    function: FunctionId,
    type_arguments: Vec<TypeTag>,
    arguments: Vec<Argument>,
}

impl Invocation {
    pub fn new(function: FunctionId, type_arguments: Vec<TypeTag>, arguments: Vec<Argument>) -> Self {
        Self {
            function,
            type_arguments,
            arguments,
        }
    }

    pub fn function(&self) -> &FunctionId {
        &self.function
    }

    pub fn type_arguments(&self) -> &[TypeTag] {
        &self.type_arguments
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    fn body(&self) -> Value {
        json!({
            "function": self.function.to_string(),
            "type_arguments": self.type_arguments.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "arguments": self.arguments.iter().map(Argument::to_json).collect::<Vec<_>>(),
        })
    }
}

/// Read-only function invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewCall(Invocation);

impl ViewCall {
    pub fn new(function: FunctionId, type_arguments: Vec<TypeTag>, arguments: Vec<Argument>) -> Self {
        Self(Invocation::new(function, type_arguments, arguments))
    }

    pub fn invocation(&self) -> &Invocation {
        &self.0
    }

    /// Body for `POST /view`.
    pub fn to_request_json(&self) -> Value {
        self.0.body()
    }
}

/// State-changing entry function invocation; the sender comes from the signer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionPayload(Invocation);

impl TransactionPayload {
    pub fn entry_function(
        function: FunctionId,
        type_arguments: Vec<TypeTag>,
        arguments: Vec<Argument>,
    ) -> Self {
        Self(Invocation::new(function, type_arguments, arguments))
    }

    pub fn invocation(&self) -> &Invocation {
        &self.0
    }

    /// `entry_function_payload` JSON.
    pub fn to_json(&self) -> Value {
        let mut body = self.0.body();
        if let Value::Object(map) = &mut body {
            map.insert("type".to_string(), json!("entry_function_payload"));
        }
        body
    }
}

/// A Liquidswap-style pool: `exchange::pool::Pool<X, Y>` stored at `exchange`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PoolId {
    exchange: Address,
    coin_x: TypeTag,
    coin_y: TypeTag,
}

impl PoolId {
    pub fn new(exchange: Address, coin_x: TypeTag, coin_y: TypeTag) -> Self {
        Self {
            exchange,
            coin_x,
            coin_y,
        }
    }

    /// APT paired with `token`.
    pub fn apt_pair(exchange: Address, token: TypeTag) -> Self {
        Self::new(exchange, StructTag::aptos_coin().into(), token)
    }

    pub fn exchange(&self) -> Address {
        self.exchange
    }

    pub fn resource_path(&self) -> ResourcePath {
        ResourcePath::new(
            self.exchange,
            StructTag::new(
                self.exchange,
                "pool",
                "Pool",
                vec![self.coin_x.clone(), self.coin_y.clone()],
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_json_shape() {
        let p = TransactionPayload::entry_function(
            "0xcafe::governance::vote".parse().unwrap(),
            vec![],
            vec!["US123".into(), Argument::U64(4), true.into()],
        );
        assert_eq!(
            p.to_json(),
            json!({
                "type": "entry_function_payload",
                "function": format!("{}::governance::vote", "0xcafe".parse::<Address>().unwrap()),
                "type_arguments": [],
                "arguments": ["US123", "4", true],
            })
        );
    }

    #[test]
    fn view_json_has_no_type_field() {
        let v = ViewCall::new(
            "0x1::coin::balance".parse().unwrap(),
            vec!["0x1::aptos_coin::AptosCoin".parse().unwrap()],
            vec![Address::ONE.into()],
        );
        let body = v.to_request_json();
        assert!(body.get("type").is_none());
        assert_eq!(body["type_arguments"][0], "0x1::aptos_coin::AptosCoin");
    }

    #[test]
    fn pool_resource_path() {
        let exchange: Address = "0xbeef".parse().unwrap();
        let token: TypeTag = format!("{}::patent_token::PatentToken", exchange).parse().unwrap();
        let pool = PoolId::apt_pair(exchange, token);
        let path = pool.resource_path();
        assert_eq!(path.owner(), exchange);
        assert_eq!(path.resource_type().name, "Pool");
        assert_eq!(path.resource_type().type_args[0].to_string(), "0x1::aptos_coin::AptosCoin");
    }
}
