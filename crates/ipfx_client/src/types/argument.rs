//! Typed call arguments and their JSON encoding.

use crate::types::address::Address;
use crate::types::move_type::TypeTag;
use serde_json::Value;
use thiserror::Error;

/// 2^256 - 1
const U256_MAX: &str =
    "115792089237316195423570985008687907853269984665640564039457584007913129639935";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("cannot read `{text}` as {expected}")]
    Unparseable { text: String, expected: String },
    #[error("type {0} cannot be passed as an argument")]
    UnsupportedType(String),
}

/// A single argument value for a view call or transaction payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Argument {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    U128(u128),
    /// Decimal text, checked on construction.
    U256(String),
    Address(Address),
    String(String),
    /// `vector<u8>`, sent as `0x`-prefixed hex.
    Bytes(Vec<u8>),
    Vector(Vec<Argument>),
}

impl Argument {
    pub fn u256(decimal: &str) -> Result<Self, ArgumentError> {
        let d = decimal.trim();
        let ok = !d.is_empty()
            && d.bytes().all(|b| b.is_ascii_digit())
            && (d.len() < U256_MAX.len() || (d.len() == U256_MAX.len() && d <= U256_MAX));
        if !ok {
            return Err(ArgumentError::Unparseable {
                text: decimal.to_string(),
                expected: "u256".to_string(),
            });
        }
        let stripped = d.trim_start_matches('0');
        Ok(Argument::U256(if stripped.is_empty() {
            "0".to_string()
        } else {
            stripped.to_string()
        }))
    }

    /// JSON form the node expects: 64-bit and wider integers as decimal strings.
    pub fn to_json(&self) -> Value {
        match self {
            Argument::Bool(b) => Value::Bool(*b),
            Argument::U8(v) => Value::from(*v),
            Argument::U16(v) => Value::from(*v),
            Argument::U32(v) => Value::from(*v),
            Argument::U64(v) => Value::String(v.to_string()),
            Argument::U128(v) => Value::String(v.to_string()),
            Argument::U256(v) => Value::String(v.clone()),
            Argument::Address(a) => Value::String(a.to_string()),
            Argument::String(s) => Value::String(s.clone()),
            Argument::Bytes(b) => Value::String(format!("0x{}", hex::encode(b))),
            Argument::Vector(items) => Value::Array(items.iter().map(Argument::to_json).collect()),
        }
    }

    /// Whether this value can be passed for a parameter of type `ty`.
    pub fn matches(&self, ty: &TypeTag) -> bool {
        match (ty, self) {
            // Callers instantiate generics first; one still open here is unconstrained.
            (TypeTag::Generic(_), _) => true,
            (TypeTag::Reference { inner, .. }, _) => self.matches(inner),
            (TypeTag::Bool, Argument::Bool(_))
            | (TypeTag::U8, Argument::U8(_))
            | (TypeTag::U16, Argument::U16(_))
            | (TypeTag::U32, Argument::U32(_))
            | (TypeTag::U64, Argument::U64(_))
            | (TypeTag::U128, Argument::U128(_))
            | (TypeTag::U256, Argument::U256(_))
            | (TypeTag::Address, Argument::Address(_)) => true,
            (TypeTag::Vector(inner), Argument::Bytes(_)) => **inner == TypeTag::U8,
            (TypeTag::Vector(inner), Argument::Vector(items)) => {
                items.iter().all(|item| item.matches(inner))
            }
            (TypeTag::Struct(s), arg) => match (s.module.as_str(), s.name.as_str(), arg) {
                ("string", "String", Argument::String(_)) => s.address == Address::ONE,
                ("object", "Object", Argument::Address(_)) => s.address == Address::ONE,
                ("option", "Option", Argument::Vector(items)) => {
                    s.address == Address::ONE
                        && items.len() <= 1
                        && s.type_args
                            .first()
                            .is_some_and(|t| items.iter().all(|item| item.matches(t)))
                }
                _ => false,
            },
            _ => false,
        }
    }

    /// Read a command-line style value as the given parameter type.
    pub fn parse_typed(text: &str, ty: &TypeTag) -> Result<Self, ArgumentError> {
        let unparseable = || ArgumentError::Unparseable {
            text: text.to_string(),
            expected: ty.to_string(),
        };
        let t = text.trim();
        let arg = match ty {
            TypeTag::Bool => match t {
                "true" => Argument::Bool(true),
                "false" => Argument::Bool(false),
                _ => return Err(unparseable()),
            },
            TypeTag::U8 => Argument::U8(t.parse().map_err(|_| unparseable())?),
            TypeTag::U16 => Argument::U16(t.parse().map_err(|_| unparseable())?),
            TypeTag::U32 => Argument::U32(t.parse().map_err(|_| unparseable())?),
            TypeTag::U64 => Argument::U64(t.parse().map_err(|_| unparseable())?),
            TypeTag::U128 => Argument::U128(t.parse().map_err(|_| unparseable())?),
            TypeTag::U256 => Argument::u256(t)?,
            TypeTag::Address => Argument::Address(t.parse().map_err(|_| unparseable())?),
            TypeTag::Vector(inner) if **inner == TypeTag::U8 => {
                let digits = t.strip_prefix("0x").ok_or_else(unparseable)?;
                Argument::Bytes(hex::decode(digits).map_err(|_| unparseable())?)
            }
            TypeTag::Vector(inner) => {
                if matches!(**inner, TypeTag::Vector(_)) {
                    return Err(ArgumentError::UnsupportedType(ty.to_string()));
                }
                let body = t.trim_start_matches('[').trim_end_matches(']').trim();
                if body.is_empty() {
                    Argument::Vector(vec![])
                } else {
                    Argument::Vector(
                        body.split(',')
                            .map(|item| Argument::parse_typed(item, inner))
                            .collect::<Result<_, _>>()?,
                    )
                }
            }
            TypeTag::Struct(s) if s.address == Address::ONE => {
                match (s.module.as_str(), s.name.as_str()) {
                    // Strings are taken verbatim, surrounding whitespace included.
                    ("string", "String") => Argument::String(text.to_string()),
                    ("object", "Object") => {
                        Argument::Address(t.parse().map_err(|_| unparseable())?)
                    }
                    _ => return Err(ArgumentError::UnsupportedType(ty.to_string())),
                }
            }
            TypeTag::Reference { inner, .. } => return Argument::parse_typed(text, inner),
            _ => return Err(ArgumentError::UnsupportedType(ty.to_string())),
        };
        Ok(arg)
    }
}

impl From<bool> for Argument {
    fn from(v: bool) -> Self {
        Argument::Bool(v)
    }
}

impl From<u8> for Argument {
    fn from(v: u8) -> Self {
        Argument::U8(v)
    }
}

impl From<u64> for Argument {
    fn from(v: u64) -> Self {
        Argument::U64(v)
    }
}

impl From<Address> for Argument {
    fn from(v: Address) -> Self {
        Argument::Address(v)
    }
}

impl From<&str> for Argument {
    fn from(v: &str) -> Self {
        Argument::String(v.to_string())
    }
}

impl From<String> for Argument {
    fn from(v: String) -> Self {
        Argument::String(v)
    }
}
