// lib.rs - Core library structure for the Scatter authenticator

pub mod api;
pub mod bridge;
pub mod chain;
pub mod crypto;
pub mod errors;
pub mod identity;
pub mod options;
pub mod session;
pub mod settings;
pub mod validation;

#[cfg(test)]
mod test_support;

// Re-export common types
pub use api::types::*;
pub use bridge::{
    ApiOptions, BridgePlugin, Identity, IdentityAccount, IdentityRequest, Network,
    TransactConfig, TransactionApi, WalletBridge,
};
pub use chain::{Chain, RpcEndpoint};
pub use crypto::KeyFormat;
pub use errors::{AuthError, AuthResult, ErrorKind};
pub use identity::{AccountIdentity, IdentitySettings, ScatterIdentity};
pub use options::AuthenticatorOptions;
pub use session::{is_mobile, ScatterSession, SessionManager};
pub use settings::{Environment, Settings};
pub use validation::InputValidator;
