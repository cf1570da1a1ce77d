use crate::bridge::TransactConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Caller-facing options for `sign_transaction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignTransactionConfig {
    pub broadcast: bool,
    pub blocks_behind: u32,
    pub expire_seconds: u32,
}

impl Default for SignTransactionConfig {
    fn default() -> Self {
        Self {
            broadcast: true,
            blocks_behind: 3,
            expire_seconds: 30,
        }
    }
}

impl From<SignTransactionConfig> for TransactConfig {
    fn from(config: SignTransactionConfig) -> Self {
        Self {
            broadcast: config.broadcast,
            blocks_behind: config.blocks_behind,
            expire_seconds: config.expire_seconds,
        }
    }
}

/// Error payload a node returns in place of a receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionError {
    pub code: Value,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignTransactionResponse {
    pub was_broadcast: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<TransactionError>,
    pub transaction: Value,
}

impl SignTransactionResponse {
    /// Shape a raw `transact` result.
    pub fn from_receipt(was_broadcast: bool, transaction: Value) -> Self {
        let mut response = Self {
            was_broadcast,
            transaction_id: None,
            status: None,
            error: None,
            transaction: Value::Null,
        };

        if was_broadcast {
            if let Some(id) = transaction.get("transaction_id") {
                response.transaction_id = Some(json_text(id));
                response.status = transaction
                    .pointer("/processed/receipt/status")
                    .map(json_text);
            } else if let Some(code) = transaction.get("code") {
                response.error = Some(TransactionError {
                    code: code.clone(),
                    message: transaction
                        .get("message")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    name: transaction
                        .get("error")
                        .and_then(|error| error.get("name"))
                        .and_then(Value::as_str)
                        .map(str::to_string),
                });
            }
        }

        response.transaction = transaction;
        response
    }
}

fn json_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Button metadata the host UI uses to render the login option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonStyle {
    pub icon: String,
    pub text: String,
    pub text_color: String,
    pub background: String,
}
