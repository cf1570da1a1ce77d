use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::crypto::KeyFormat;
use crate::errors::AuthResult;

pub const DEFAULT_BLOCKCHAIN: &str = "eos";
pub const DEFAULT_VERIFY_TIMEOUT_MS: u64 = 1000;

fn default_blockchain() -> String {
    DEFAULT_BLOCKCHAIN.to_string()
}

fn default_verify_timeout_ms() -> u64 {
    DEFAULT_VERIFY_TIMEOUT_MS
}

fn default_beta3() -> bool {
    true
}

/// Options the application hands to the authenticator.
///
/// Only `app_name` is mandatory; the session refuses to construct without it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorOptions {
    #[serde(default)]
    pub app_name: Option<String>,
    /// Browser user agent, used to decide whether to render on mobile.
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default = "default_verify_timeout_ms")]
    pub verify_timeout_ms: u64,
    #[serde(default = "default_blockchain")]
    pub blockchain: String,
    #[serde(default)]
    pub key_format: KeyFormat,
    #[serde(default = "default_beta3")]
    pub beta3: bool,
}

impl Default for AuthenticatorOptions {
    fn default() -> Self {
        Self {
            app_name: None,
            user_agent: None,
            verify_timeout_ms: DEFAULT_VERIFY_TIMEOUT_MS,
            blockchain: default_blockchain(),
            key_format: KeyFormat::default(),
            beta3: true,
        }
    }
}

impl AuthenticatorOptions {
    pub fn with_app_name(app_name: impl Into<String>) -> Self {
        Self {
            app_name: Some(app_name.into()),
            ..Self::default()
        }
    }

    /// Parse options handed over as JSON, filling unset fields with defaults.
    pub fn from_json(json: &str) -> AuthResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn verify_timeout(&self) -> Duration {
        Duration::from_millis(self.verify_timeout_ms)
    }
}
