//! Decode routines for the EVM kinds.
//!
//! `candidate.topics` excludes the signature word, so topic index `i` here is
//! topics[i + 1] on the wire. Errors report the wire index.

use alloy_primitives::{Address, B256, U256};
use chainactions_core::{
    BurnAction, DecodeError, DispatchContext, EventKind, LogCandidate, MintAction, TransferAction,
};

const WORD: usize = 32;

/// `Transfer(address indexed from, address indexed to, uint256 value)`
pub fn transfer(log: &LogCandidate, ctx: &DispatchContext) -> Result<TransferAction, DecodeError> {
    let sender = topic_address(log, EventKind::Transfer, 0)?;
    let recipient = topic_address(log, EventKind::Transfer, 1)?;
    let amount = single_uint(&log.data)?;

    Ok(TransferAction {
        network: ctx.network,
        transaction_hash: log.transaction_hash,
        log_index: log.log_index,
        block_number: log.block_number,
        sender,
        recipient,
        amount,
        token: ctx.token.clone(),
        observed_at: ctx.observed_at,
    })
}

/// `MintFluid(address indexed addr, uint256 amount)`
pub fn mint(log: &LogCandidate, ctx: &DispatchContext) -> Result<MintAction, DecodeError> {
    let account = topic_address(log, EventKind::MintFluid, 0)?;
    let amount = single_uint(&log.data)?;

    Ok(MintAction {
        network: ctx.network,
        transaction_hash: log.transaction_hash,
        log_index: log.log_index,
        block_number: log.block_number,
        account,
        amount,
        token: ctx.token.clone(),
        observed_at: ctx.observed_at,
    })
}

/// `BurnFluid(address indexed addr, uint256 amount)`
pub fn burn(log: &LogCandidate, ctx: &DispatchContext) -> Result<BurnAction, DecodeError> {
    let account = topic_address(log, EventKind::BurnFluid, 0)?;
    let amount = single_uint(&log.data)?;

    Ok(BurnAction {
        network: ctx.network,
        transaction_hash: log.transaction_hash,
        log_index: log.log_index,
        block_number: log.block_number,
        account,
        amount,
        token: ctx.token.clone(),
        observed_at: ctx.observed_at,
    })
}

fn topic_address(log: &LogCandidate, kind: EventKind, index: usize) -> Result<Address, DecodeError> {
    let word = log
        .topics
        .get(index)
        .ok_or(DecodeError::MissingTopic { kind, index: index + 1 })?;
    word_to_address(word)
}

/// ABI addresses are left-padded with 12 zero bytes.
fn word_to_address(word: &B256) -> Result<Address, DecodeError> {
    if word[..WORD - 20].iter().any(|b| *b != 0) {
        return Err(DecodeError::InvalidEncoding {
            field: "address topic",
            reason: format!("{word} has non-zero padding"),
        });
    }
    Ok(Address::from_word(*word))
}

fn single_uint(data: &[u8]) -> Result<U256, DecodeError> {
    if data.len() != WORD {
        return Err(DecodeError::InvalidLength {
            field: "amount",
            expected: WORD,
            got: data.len(),
        });
    }
    Ok(U256::from_be_slice(data))
}
