//! Signature words of the tracked events.
//!
//! The signature word of an EVM event is the keccak256 hash of its canonical
//! signature string, e.g.
//!   keccak256("Transfer(address,address,uint256)")
//!   → 0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef

use alloy_primitives::B256;
use chainactions_core::{EventKind, SignatureTable};
use tiny_keccak::{Hasher, Keccak};

pub const TRANSFER: &str = "Transfer(address,address,uint256)";
pub const MINT_FLUID: &str = "MintFluid(address,uint256)";
pub const BURN_FLUID: &str = "BurnFluid(address,uint256)";

/// Canonical signatures of every EVM kind the pipeline tracks.
pub const KNOWN_EVENTS: [(&str, EventKind); 3] = [
    (TRANSFER, EventKind::Transfer),
    (MINT_FLUID, EventKind::MintFluid),
    (BURN_FLUID, EventKind::BurnFluid),
];

/// keccak256 of a canonical event signature.
pub fn keccak256_signature(signature: &str) -> B256 {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(signature.as_bytes());
    hasher.finalize(&mut output);
    B256::from(output)
}

/// The fixed table used to classify EVM candidates.
pub fn user_action_table() -> SignatureTable {
    SignatureTable::new(
        KNOWN_EVENTS
            .iter()
            .map(|(signature, kind)| (keccak256_signature(signature), *kind)),
    )
}
