//! Decoding raw node JSON into caller-facing values.

use crate::client::error::ClientError;
use crate::types::StructTag;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A resource as field name → value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecodedResource {
    pub resource_type: StructTag,
    pub fields: Map<String, Value>,
}

impl DecodedResource {
    /// Decode `{"type": "...", "data": {...}}`, checking the type matches what was asked for.
    pub fn from_json(expected: &StructTag, raw: Value) -> Result<Self, ClientError> {
        let Value::Object(mut obj) = raw else {
            return Err(ClientError::Decode("resource is not an object".to_string()));
        };
        let type_str = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| ClientError::Decode("resource has no type".to_string()))?;
        let resource_type: StructTag = type_str
            .parse()
            .map_err(|e| ClientError::Decode(format!("resource type: {}", e)))?;
        if &resource_type != expected {
            return Err(ClientError::Decode(format!(
                "expected {}, node returned {}",
                expected, resource_type
            )));
        }
        let fields = match obj.remove("data") {
            Some(Value::Object(fields)) => fields,
            Some(_) => return Err(ClientError::Decode("resource data is not an object".into())),
            None => return Err(ClientError::Decode("resource has no data".into())),
        };
        Ok(Self {
            resource_type,
            fields,
        })
    }

    pub fn field(&self, name: &str) -> Result<&Value, ClientError> {
        self.fields
            .get(name)
            .ok_or_else(|| ClientError::Decode(format!("{}: missing field {}", self.resource_type, name)))
    }

    /// Follow a dotted path such as `coin_x_reserve.value`.
    pub fn path(&self, dotted: &str) -> Result<&Value, ClientError> {
        let mut parts = dotted.split('.');
        let first = parts.next().unwrap_or_default();
        let mut cur = self.field(first)?;
        for part in parts {
            cur = cur
                .get(part)
                .ok_or_else(|| ClientError::Decode(format!("{}: missing field {}", self.resource_type, dotted)))?;
        }
        Ok(cur)
    }

    pub fn u64_at(&self, dotted: &str) -> Result<u64, ClientError> {
        value_as_u64(self.path(dotted)?)
            .map_err(|e| ClientError::Decode(format!("{}.{}: {}", self.resource_type, dotted, e)))
    }
}

/// Numbers arrive as decimal strings (u64 and wider) or JSON numbers (narrower types).
pub fn value_as_u64(v: &Value) -> Result<u64, String> {
    match v {
        Value::String(s) => s.parse::<u64>().map_err(|_| format!("not a u64: {:?}", s)),
        Value::Number(n) => n.as_u64().ok_or_else(|| format!("not a u64: {}", n)),
        other => Err(format!("not a u64: {}", other)),
    }
}

pub fn value_as_str(v: &Value) -> Result<&str, String> {
    v.as_str().ok_or_else(|| format!("not a string: {}", v))
}

/// Pool reserve pair. Derived from a read; never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub apt_reserve: u64,
    pub token_reserve: u64,
}

impl Quote {
    pub fn from_pool(pool: &DecodedResource) -> Result<Self, ClientError> {
        Ok(Self {
            apt_reserve: pool.u64_at("coin_x_reserve.value")?,
            token_reserve: pool.u64_at("coin_y_reserve.value")?,
        })
    }
}
