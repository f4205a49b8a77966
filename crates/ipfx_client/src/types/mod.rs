//! Ledger value types: addresses, Move type names, arguments, request descriptors.

mod address;
mod argument;
mod move_type;
mod payload;

pub use address::{Address, AddressError, ADDRESS_LENGTH};
pub use argument::{Argument, ArgumentError};
pub use move_type::{FunctionId, ModuleId, StructTag, TypeParseError, TypeTag};
pub use payload::{Invocation, PoolId, ResourcePath, TransactionPayload, ViewCall};
