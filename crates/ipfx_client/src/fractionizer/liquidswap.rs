//! Liquidswap router payloads and the APT/patent-token pool.

use super::{check_positive, ValidationError};
use crate::types::{Address, Argument, FunctionId, PoolId, StructTag, TransactionPayload, TypeTag};

fn router(exchange: Address, name: &str) -> FunctionId {
    FunctionId::new(exchange, "router", name)
}

/// Pool pairing APT with `token`.
pub fn patent_pool(exchange: Address, token: &StructTag) -> PoolId {
    PoolId::apt_pair(exchange, token.clone().into())
}

/// `router::add_liquidity<AptosCoin, Token>(apt, token, min_apt, min_token)`
pub fn add_liquidity(
    exchange: Address,
    token: &StructTag,
    apt_amount: u64,
    token_amount: u64,
    min_apt_amount: u64,
    min_token_amount: u64,
) -> Result<TransactionPayload, ValidationError> {
    check_positive(apt_amount, "APT amount")?;
    check_positive(token_amount, "token amount")?;
    Ok(TransactionPayload::entry_function(
        router(exchange, "add_liquidity"),
        vec![StructTag::aptos_coin().into(), TypeTag::from(token.clone())],
        vec![
            Argument::U64(apt_amount),
            Argument::U64(token_amount),
            Argument::U64(min_apt_amount),
            Argument::U64(min_token_amount),
        ],
    ))
}

/// `router::swap_exact_apt_for_token<Token>(apt_in, min_token_out)`
pub fn swap_exact_apt_for_token(
    exchange: Address,
    token: &StructTag,
    apt_amount: u64,
    min_token_amount: u64,
) -> Result<TransactionPayload, ValidationError> {
    check_positive(apt_amount, "APT amount")?;
    Ok(TransactionPayload::entry_function(
        router(exchange, "swap_exact_apt_for_token"),
        vec![TypeTag::from(token.clone())],
        vec![Argument::U64(apt_amount), Argument::U64(min_token_amount)],
    ))
}

/// `router::swap_exact_token_for_apt<Token>(token_in, min_apt_out)`
pub fn swap_exact_token_for_apt(
    exchange: Address,
    token: &StructTag,
    token_amount: u64,
    min_apt_amount: u64,
) -> Result<TransactionPayload, ValidationError> {
    check_positive(token_amount, "token amount")?;
    Ok(TransactionPayload::entry_function(
        router(exchange, "swap_exact_token_for_apt"),
        vec![TypeTag::from(token.clone())],
        vec![Argument::U64(token_amount), Argument::U64(min_apt_amount)],
    ))
}
