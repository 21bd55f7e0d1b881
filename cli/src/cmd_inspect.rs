//! `chainactions classify` / `chainactions signatures`: offline table lookups.

use alloy_primitives::B256;
use anyhow::{Context, Result};
use chainactions_core::Classification;
use chainactions_evm::signatures::{keccak256_signature, KNOWN_EVENTS};
use chainactions_evm::user_action_table;

/// Classify one signature word. Prints the kind or `not applicable`.
pub fn classify(topic0: &str) -> Result<()> {
    println!("{}", classify_line(topic0)?);
    Ok(())
}

fn classify_line(topic0: &str) -> Result<String> {
    let signature: B256 = topic0
        .trim()
        .parse()
        .with_context(|| format!("'{topic0}' is not a 32-byte hex word"))?;
    Ok(match user_action_table().classify(&signature) {
        Classification::Kind(kind) => kind.to_string(),
        Classification::NotApplicable => "not applicable".to_string(),
    })
}

pub fn signatures(json: bool) -> Result<()> {
    if json {
        let entries: Vec<_> = KNOWN_EVENTS
            .iter()
            .map(|(signature, kind)| {
                serde_json::json!({
                    "kind": kind,
                    "signature": signature,
                    "topic0": keccak256_signature(signature),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for (signature, kind) in KNOWN_EVENTS {
        println!("{}  {:<14} {}", keccak256_signature(signature), kind.as_str(), signature);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_and_unknown_words() {
        assert_eq!(
            classify_line("0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef").unwrap(),
            "transfer"
        );
        assert_eq!(classify_line(&format!("0x{}", "00".repeat(32))).unwrap(), "not applicable");
        assert!(classify_line("0x1234").is_err());
    }
}
