//! Decode routine for Solana account updates.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chainactions_core::{AccountCandidate, AccountState, AccountUpdateAction, DecodeError, DispatchContext};

pub fn account_update(
    candidate: &AccountCandidate,
    ctx: &DispatchContext,
) -> Result<AccountUpdateAction, DecodeError> {
    let data = account_data(&candidate.account)?;

    Ok(AccountUpdateAction {
        network: ctx.network,
        slot: candidate.slot,
        pubkey: candidate.pubkey.clone(),
        owner: candidate.account.owner.clone(),
        lamports: candidate.account.lamports,
        executable: candidate.account.executable,
        rent_epoch: candidate.account.rent_epoch,
        data: data.into(),
        observed_at: ctx.observed_at,
    })
}

/// Only base64 payloads are decoded; subscriptions request base64 by default.
fn account_data(account: &AccountState) -> Result<Vec<u8>, DecodeError> {
    match account.encoding.as_str() {
        "base64" => STANDARD
            .decode(account.data.as_bytes())
            .map_err(|e| DecodeError::InvalidEncoding {
                field: "account data",
                reason: e.to_string(),
            }),
        other => Err(DecodeError::UnsupportedEncoding(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainactions_core::{Network, TokenConfig};
    use chrono::Utc;

    fn candidate(data: &str, encoding: &str) -> AccountCandidate {
        AccountCandidate {
            slot: 5208469,
            pubkey: "H4vnBqifaSACnKa7acsxstsY1iV1bvJNxsCY7enrd1hq".into(),
            subscription: 1,
            account: AccountState {
                lamports: 33594,
                data: data.into(),
                encoding: encoding.into(),
                owner: "11111111111111111111111111111111".into(),
                executable: false,
                rent_epoch: 636,
            },
        }
    }

    fn ctx() -> DispatchContext {
        DispatchContext {
            network: Network::Solana,
            token: TokenConfig::default(),
            observed_at: Utc::now(),
        }
    }

    #[test]
    fn decodes_base64_account_data() {
        let action = account_update(&candidate("AQID", "base64"), &ctx()).unwrap();
        assert_eq!(action.data.as_ref(), &[1u8, 2, 3]);
        assert_eq!(action.slot, 5208469);
        assert_eq!(action.lamports, 33594);
        assert_eq!(action.network, Network::Solana);
    }

    #[test]
    fn empty_account_data_is_valid() {
        let action = account_update(&candidate("", "base64"), &ctx()).unwrap();
        assert!(action.data.is_empty());
    }

    #[test]
    fn invalid_base64_is_a_decode_error() {
        assert!(matches!(
            account_update(&candidate("not base64!", "base64"), &ctx()),
            Err(DecodeError::InvalidEncoding { .. })
        ));
    }

    #[test]
    fn parsed_account_data_is_unsupported() {
        assert!(matches!(
            account_update(&candidate(r#"{"program":"spl-token"}"#, "jsonParsed"), &ctx()),
            Err(DecodeError::UnsupportedEncoding(e)) if e == "jsonParsed"
        ));
    }

    #[test]
    fn other_encodings_are_unsupported() {
        assert!(matches!(
            account_update(&candidate("3Bxs", "base58"), &ctx()),
            Err(DecodeError::UnsupportedEncoding(e)) if e == "base58"
        ));
    }
}
