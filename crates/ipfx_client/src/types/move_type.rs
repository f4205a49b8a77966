//! Move type names: type tags, struct tags, module and function ids.
//!
//! The node speaks these as strings (`0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin>`),
//! so every type here parses from and displays to that canonical text form.

use crate::types::address::Address;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid type `{input}`: {reason}")]
pub struct TypeParseError {
    pub input: String,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Bool,
    U8,
    U16,
    U32,
    U64,
    U128,
    U256,
    Address,
    Signer,
    Vector(Box<TypeTag>),
    Struct(Box<StructTag>),
    /// Generic parameter `T<n>` as it appears in module ABIs.
    Generic(u16),
    /// `&T` / `&mut T`, only seen in ABI parameter lists.
    Reference { mutable: bool, inner: Box<TypeTag> },
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StructTag {
    pub address: Address,
    pub module: String,
    pub name: String,
    pub type_args: Vec<TypeTag>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModuleId {
    pub address: Address,
    pub name: String,
}

/// Fully-qualified function name, `address::module::function`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionId {
    pub module: ModuleId,
    pub name: String,
}

impl TypeTag {
    pub fn vector(inner: TypeTag) -> Self {
        TypeTag::Vector(Box::new(inner))
    }

    /// True for `signer`, `&signer` and `&mut signer`.
    pub fn is_signer(&self) -> bool {
        match self {
            TypeTag::Signer => true,
            TypeTag::Reference { inner, .. } => inner.is_signer(),
            _ => false,
        }
    }

    pub fn as_struct(&self) -> Option<&StructTag> {
        match self {
            TypeTag::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Replace each `T<n>` with `type_args[n]`. Parameters without a matching argument stay generic.
    pub fn instantiate(&self, type_args: &[TypeTag]) -> TypeTag {
        match self {
            TypeTag::Generic(i) => type_args
                .get(usize::from(*i))
                .cloned()
                .unwrap_or(TypeTag::Generic(*i)),
            TypeTag::Vector(inner) => TypeTag::vector(inner.instantiate(type_args)),
            TypeTag::Reference { mutable, inner } => TypeTag::Reference {
                mutable: *mutable,
                inner: Box::new(inner.instantiate(type_args)),
            },
            TypeTag::Struct(s) => TypeTag::Struct(Box::new(StructTag {
                type_args: s.type_args.iter().map(|t| t.instantiate(type_args)).collect(),
                ..(**s).clone()
            })),
            other => other.clone(),
        }
    }
}

impl StructTag {
    pub fn new(address: Address, module: &str, name: &str, type_args: Vec<TypeTag>) -> Self {
        Self {
            address,
            module: module.to_string(),
            name: name.to_string(),
            type_args,
        }
    }

    /// `0x1::aptos_coin::AptosCoin`
    pub fn aptos_coin() -> Self {
        Self::new(Address::ONE, "aptos_coin", "AptosCoin", vec![])
    }

    /// `0x1::string::String`
    pub fn string() -> Self {
        Self::new(Address::ONE, "string", "String", vec![])
    }

    /// Same struct ignoring type arguments.
    pub fn same_struct(&self, other: &StructTag) -> bool {
        self.address == other.address && self.module == other.module && self.name == other.name
    }
}

impl ModuleId {
    pub fn new(address: Address, name: &str) -> Self {
        Self {
            address,
            name: name.to_string(),
        }
    }
}

impl FunctionId {
    pub fn new(address: Address, module: &str, name: &str) -> Self {
        Self {
            module: ModuleId::new(address, module),
            name: name.to_string(),
        }
    }
}

impl From<StructTag> for TypeTag {
    fn from(s: StructTag) -> Self {
        TypeTag::Struct(Box::new(s))
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn err(&self, reason: impl Into<String>) -> TypeParseError {
        TypeParseError {
            input: self.input.to_string(),
            reason: reason.into(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.input.len() - trimmed.len();
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &str) -> Result<(), TypeParseError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.err(format!("expected `{}` at offset {}", token, self.pos)))
        }
    }

    fn ident(&mut self) -> Result<&'a str, TypeParseError> {
        self.skip_ws();
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|(i, c)| {
                !(c.is_ascii_alphabetic() || *c == '_' || (*i > 0 && c.is_ascii_digit()))
            })
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.err(format!("expected identifier at offset {}", self.pos)));
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    fn address(&mut self) -> Result<Address, TypeParseError> {
        self.skip_ws();
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|(i, c)| *i > 1 && !c.is_ascii_hexdigit())
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let addr = rest[..len]
            .parse::<Address>()
            .map_err(|e| self.err(e.to_string()))?;
        self.pos += len;
        Ok(addr)
    }

    fn at_end(&mut self) -> bool {
        self.skip_ws();
        self.pos == self.input.len()
    }

    fn type_tag(&mut self) -> Result<TypeTag, TypeParseError> {
        self.skip_ws();
        if self.eat("&") {
            let mutable = self.rest().starts_with("mut ") && self.eat("mut");
            let inner = self.type_tag()?;
            return Ok(TypeTag::Reference {
                mutable,
                inner: Box::new(inner),
            });
        }
        if self.rest().starts_with("0x") || self.rest().starts_with("0X") {
            return Ok(self.struct_tag()?.into());
        }
        let word = self.ident()?;
        let tag = match word {
            "bool" => TypeTag::Bool,
            "u8" => TypeTag::U8,
            "u16" => TypeTag::U16,
            "u32" => TypeTag::U32,
            "u64" => TypeTag::U64,
            "u128" => TypeTag::U128,
            "u256" => TypeTag::U256,
            "address" => TypeTag::Address,
            "signer" => TypeTag::Signer,
            "vector" => {
                self.expect("<")?;
                let inner = self.type_tag()?;
                self.expect(">")?;
                TypeTag::vector(inner)
            }
            w if w.starts_with('T') && w.len() > 1 && w[1..].bytes().all(|b| b.is_ascii_digit()) => {
                let idx = w[1..]
                    .parse::<u16>()
                    .map_err(|_| self.err(format!("generic index out of range: {}", w)))?;
                TypeTag::Generic(idx)
            }
            other => return Err(self.err(format!("unknown type `{}`", other))),
        };
        Ok(tag)
    }

    fn struct_tag(&mut self) -> Result<StructTag, TypeParseError> {
        let address = self.address()?;
        self.expect("::")?;
        let module = self.ident()?.to_string();
        self.expect("::")?;
        let name = self.ident()?.to_string();
        let mut type_args = Vec::new();
        if self.eat("<") {
            loop {
                type_args.push(self.type_tag()?);
                if self.eat(">") {
                    break;
                }
                self.expect(",")?;
            }
        }
        Ok(StructTag {
            address,
            module,
            name,
            type_args,
        })
    }

    fn finish<T>(mut self, value: T) -> Result<T, TypeParseError> {
        if self.at_end() {
            Ok(value)
        } else {
            Err(self.err(format!("trailing input at offset {}", self.pos)))
        }
    }
}

impl FromStr for TypeTag {
    type Err = TypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut p = Parser::new(s);
        let tag = p.type_tag()?;
        p.finish(tag)
    }
}

impl FromStr for StructTag {
    type Err = TypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut p = Parser::new(s);
        let tag = p.struct_tag()?;
        p.finish(tag)
    }
}

impl FromStr for ModuleId {
    type Err = TypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut p = Parser::new(s);
        let address = p.address()?;
        p.expect("::")?;
        let name = p.ident()?.to_string();
        p.finish(ModuleId { address, name })
    }
}

impl FromStr for FunctionId {
    type Err = TypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut p = Parser::new(s);
        let address = p.address()?;
        p.expect("::")?;
        let module = p.ident()?.to_string();
        p.expect("::")?;
        let name = p.ident()?.to_string();
        p.finish(FunctionId {
            module: ModuleId { address, name: module },
            name,
        })
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Bool => f.write_str("bool"),
            TypeTag::U8 => f.write_str("u8"),
            TypeTag::U16 => f.write_str("u16"),
            TypeTag::U32 => f.write_str("u32"),
            TypeTag::U64 => f.write_str("u64"),
            TypeTag::U128 => f.write_str("u128"),
            TypeTag::U256 => f.write_str("u256"),
            TypeTag::Address => f.write_str("address"),
            TypeTag::Signer => f.write_str("signer"),
            TypeTag::Vector(inner) => write!(f, "vector<{}>", inner),
            TypeTag::Struct(s) => write!(f, "{}", s),
            TypeTag::Generic(i) => write!(f, "T{}", i),
            TypeTag::Reference { mutable, inner } => {
                if *mutable {
                    write!(f, "&mut {}", inner)
                } else {
                    write!(f, "&{}", inner)
                }
            }
        }
    }
}

impl fmt::Display for StructTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}::{}", self.address, self.module, self.name)?;
        if !self.type_args.is_empty() {
            f.write_str("<")?;
            for (i, arg) in self.type_args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", arg)?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.address, self.name)
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.module, self.name)
    }
}

macro_rules! string_serde {
    ($($t:ty),*) => {$(
        impl Serialize for $t {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $t {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    )*};
}

string_serde!(TypeTag, StructTag, ModuleId, FunctionId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_nested_struct() {
        let t: StructTag = "0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin>"
            .parse()
            .unwrap();
        assert_eq!(t.module, "coin");
        assert_eq!(t.name, "CoinStore");
        assert_eq!(t.type_args.len(), 1);
        assert_eq!(
            t.to_string(),
            "0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin>"
        );
    }

    #[test]
    fn parse_multiple_args_normalizes_spacing() {
        let t: StructTag = "0xbeef::pool::Pool<0x1::aptos_coin::AptosCoin,0xbeef::patent_token::PatentToken>"
            .parse()
            .unwrap();
        assert_eq!(t.type_args.len(), 2);
        assert!(t.to_string().contains("AptosCoin, 0x"));
        let again: StructTag = t.to_string().parse().unwrap();
        assert_eq!(again, t);
    }

    #[test]
    fn parse_abi_params() {
        assert_eq!("&signer".parse::<TypeTag>().unwrap().to_string(), "&signer");
        assert!("&mut signer".parse::<TypeTag>().unwrap().is_signer());
        assert_eq!(
            "vector<vector<u8>>".parse::<TypeTag>().unwrap(),
            TypeTag::vector(TypeTag::vector(TypeTag::U8))
        );
        assert_eq!("T1".parse::<TypeTag>().unwrap(), TypeTag::Generic(1));
        let obj: TypeTag = "0x1::object::Object<T0>".parse().unwrap();
        assert_eq!(obj.as_struct().unwrap().type_args, vec![TypeTag::Generic(0)]);
    }

    #[test]
    fn instantiate_substitutes_nested_generics() {
        let args = vec![TypeTag::U64, "0x1::aptos_coin::AptosCoin".parse().unwrap()];
        let t: TypeTag = "vector<T0>".parse().unwrap();
        assert_eq!(t.instantiate(&args), TypeTag::vector(TypeTag::U64));
        let s: TypeTag = "&0x1::coin::Coin<T1>".parse().unwrap();
        assert_eq!(
            s.instantiate(&args).to_string(),
            "&0x1::coin::Coin<0x1::aptos_coin::AptosCoin>"
        );
        assert_eq!(TypeTag::Generic(5).instantiate(&args), TypeTag::Generic(5));
    }

    #[test]
    fn parse_function_id() {
        let f: FunctionId = "0x1::coin::balance".parse().unwrap();
        assert_eq!(f.module.name, "coin");
        assert_eq!(f.name, "balance");
        assert_eq!(f.to_string(), "0x1::coin::balance");
    }

    #[test]
    fn rejects_garbage() {
        assert!("0x1::coin".parse::<StructTag>().is_err());
        assert!("u63".parse::<TypeTag>().is_err());
        assert!("vector<u8".parse::<TypeTag>().is_err());
        assert!("0x1::coin::balance extra".parse::<FunctionId>().is_err());
        assert!("Tx".parse::<TypeTag>().is_err());
    }
}
