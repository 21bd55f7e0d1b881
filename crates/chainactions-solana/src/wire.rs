//! JSON-RPC 2.0 wire types for `programSubscribe`.

use crate::error::SubscriptionError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub const JSONRPC_VERSION: &str = "2.0";
pub const PROGRAM_SUBSCRIBE: &str = "programSubscribe";
pub const PROGRAM_NOTIFICATION: &str = "programNotification";
pub const JSON_PARSED: &str = "jsonParsed";

/// JSON-RPC request ID — string, number, or null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcId {
    Number(u64),
    String(String),
    Null,
}

impl fmt::Display for RpcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Null => write!(f, "null"),
        }
    }
}

/// Account data encoding requested from the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AccountEncoding {
    #[serde(rename = "base58")]
    Base58,
    #[default]
    #[serde(rename = "base64")]
    Base64,
    #[serde(rename = "base64+zstd")]
    Base64Zstd,
    #[serde(rename = "jsonParsed")]
    JsonParsed,
}

/// Confirmation level the node waits for before notifying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    Confirmed,
    #[default]
    Finalized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubscribeOptions {
    pub encoding: AccountEncoding,
    pub commitment: Commitment,
}

/// `{"jsonrpc":"2.0","method":"programSubscribe","params":[programId,{..}],"id":..}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramSubscribeRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: (String, SubscribeOptions),
    pub id: RpcId,
}

impl ProgramSubscribeRequest {
    pub fn new(id: u64, program_id: impl Into<String>, options: SubscribeOptions) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            method: PROGRAM_SUBSCRIBE.into(),
            params: (program_id.into(), options),
            id: RpcId::Number(id),
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// The single response to a subscribe request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeAck {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RpcId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl SubscribeAck {
    /// Extract the subscription id, checking the ack belongs to `expected`.
    pub fn into_subscription_id(self, expected: &RpcId) -> Result<u64, SubscriptionError> {
        if let Some(err) = self.error.filter(|e| !e.message.is_empty()) {
            return Err(SubscriptionError::Handshake {
                code: err.code,
                message: err.message,
            });
        }

        if let Some(id) = self.id {
            if &id != expected {
                return Err(SubscriptionError::Uncorrelated {
                    expected: expected.to_string(),
                    got: id.to_string(),
                });
            }
        }

        self.result
            .ok_or_else(|| SubscriptionError::MalformedAck("missing result".into()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContext {
    pub slot: u64,
}

/// Account `data` as the node sends it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AccountData {
    /// `[payload, encoding]`
    Encoded(String, String),
    /// `jsonParsed` output for programs the node has a parser for.
    Parsed(Value),
}

impl AccountData {
    /// Encoding name as it appears on the wire.
    pub fn encoding(&self) -> &str {
        match self {
            Self::Encoded(_, encoding) => encoding,
            Self::Parsed(_) => JSON_PARSED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiAccount {
    pub lamports: u64,
    pub data: AccountData,
    pub owner: String,
    pub executable: bool,
    pub rent_epoch: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyedAccount {
    pub pubkey: String,
    pub account: UiAccount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramNotification {
    pub context: NotificationContext,
    pub value: KeyedAccount,
}

/// `params` of a notification: the payload plus the subscription it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountNotification {
    pub result: ProgramNotification,
    pub subscription: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEnvelope {
    pub jsonrpc: String,
    pub method: String,
    pub params: AccountNotification,
}

impl NotificationEnvelope {
    pub fn new(subscription: u64, result: ProgramNotification) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            method: PROGRAM_NOTIFICATION.into(),
            params: AccountNotification {
                result,
                subscription,
            },
        }
    }
}

pub fn encode_subscribe(request: &ProgramSubscribeRequest) -> Result<String, serde_json::Error> {
    serde_json::to_string(request)
}

pub fn decode_ack(text: &str) -> Result<SubscribeAck, serde_json::Error> {
    serde_json::from_str(text)
}

pub fn encode_notification(envelope: &NotificationEnvelope) -> Result<String, serde_json::Error> {
    serde_json::to_string(envelope)
}

pub fn decode_notification(text: &str) -> Result<NotificationEnvelope, serde_json::Error> {
    serde_json::from_str(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NOTIFICATION: &str = r#"{
        "jsonrpc": "2.0",
        "method": "programNotification",
        "params": {
            "result": {
                "context": { "slot": 5208469 },
                "value": {
                    "pubkey": "H4vnBqifaSACnKa7acsxstsY1iV1bvJNxsCY7enrd1hq",
                    "account": {
                        "data": ["11116bv5nS2h3y12kD1yUKeMZvGcKLSjQgX6BeV7u1FrjeJcKfsHPXHRDEHrBesJhZyqnnq9qJeUuF7WHxiuLuL5twc38w2TXNLxnDbjmuR", "base64"],
                        "executable": false,
                        "lamports": 33594,
                        "owner": "11111111111111111111111111111111",
                        "rentEpoch": 636
                    }
                }
            },
            "subscription": 24040
        }
    }"#;

    #[test]
    fn subscribe_request_matches_reference_decoding() {
        let request = ProgramSubscribeRequest::new(
            1,
            "11111111111111111111111111111111",
            SubscribeOptions::default(),
        );
        let encoded = encode_subscribe(&request).unwrap();

        let reference: Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(
            reference,
            json!({
                "jsonrpc": "2.0",
                "method": "programSubscribe",
                "params": [
                    "11111111111111111111111111111111",
                    { "encoding": "base64", "commitment": "finalized" }
                ],
                "id": 1
            })
        );

        let decoded: ProgramSubscribeRequest = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn notification_round_trip_is_lossless() {
        let envelope = decode_notification(NOTIFICATION).unwrap();
        assert_eq!(envelope.params.subscription, 24040);
        assert_eq!(envelope.params.result.context.slot, 5208469);
        assert_eq!(envelope.params.result.value.account.rent_epoch, 636);
        assert_eq!(envelope.params.result.value.account.data.encoding(), "base64");

        let encoded = encode_notification(&envelope).unwrap();
        assert_eq!(decode_notification(&encoded).unwrap(), envelope);

        let original: Value = serde_json::from_str(NOTIFICATION).unwrap();
        let reencoded: Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(original, reencoded);
    }

    #[test]
    fn ack_with_error_message_fails_handshake() {
        let ack = decode_ack(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32602,"message":"Invalid param: not a program"}}"#,
        )
        .unwrap();
        let err = ack.into_subscription_id(&RpcId::Number(1)).unwrap_err();
        assert!(matches!(
            err,
            SubscriptionError::Handshake { code: -32602, ref message } if message == "Invalid param: not a program"
        ));
    }

    #[test]
    fn ack_yields_subscription_id() {
        let ack = decode_ack(r#"{"jsonrpc":"2.0","result":24040,"id":1}"#).unwrap();
        assert_eq!(ack.into_subscription_id(&RpcId::Number(1)).unwrap(), 24040);
    }

    #[test]
    fn ack_for_another_request_is_uncorrelated() {
        let ack = decode_ack(r#"{"jsonrpc":"2.0","result":3,"id":"7"}"#).unwrap();
        assert!(matches!(
            ack.into_subscription_id(&RpcId::Number(1)),
            Err(SubscriptionError::Uncorrelated { .. })
        ));
    }

    #[test]
    fn ack_without_result_is_malformed() {
        let ack = decode_ack(r#"{"jsonrpc":"2.0","id":1}"#).unwrap();
        assert!(matches!(
            ack.into_subscription_id(&RpcId::Number(1)),
            Err(SubscriptionError::MalformedAck(_))
        ));
    }

    #[test]
    fn parsed_account_data_decodes() {
        let text = NOTIFICATION.replace(
            r#"["11116bv5nS2h3y12kD1yUKeMZvGcKLSjQgX6BeV7u1FrjeJcKfsHPXHRDEHrBesJhZyqnnq9qJeUuF7WHxiuLuL5twc38w2TXNLxnDbjmuR", "base64"]"#,
            r#"{"program": "spl-token", "parsed": {"type": "account", "info": {"mint": "So11111111111111111111111111111111111111112"}}, "space": 165}"#,
        );
        let envelope = decode_notification(&text).unwrap();
        let data = &envelope.params.result.value.account.data;
        assert_eq!(data.encoding(), "jsonParsed");
        assert!(matches!(data, AccountData::Parsed(v) if v["program"] == "spl-token"));
    }

    #[test]
    fn encodings_use_rpc_names() {
        assert_eq!(serde_json::to_value(AccountEncoding::Base64Zstd).unwrap(), "base64+zstd");
        assert_eq!(serde_json::to_value(AccountEncoding::JsonParsed).unwrap(), "jsonParsed");
        assert_eq!(serde_json::to_value(Commitment::Confirmed).unwrap(), "confirmed");
    }
}
