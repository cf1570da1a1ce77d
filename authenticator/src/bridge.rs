//! Capability interface of the wallet-extension bridge.
//!
//! The authenticator only ever talks to the wallet through these traits. A
//! concrete adapter (browser extension, desktop socket, test double) provides
//! the implementation and is shared as `Arc<dyn WalletBridge>`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::chain::{Chain, RpcEndpoint};

/// Sub-protocol plugin the bridge must load before connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BridgePlugin {
    Eosjs2,
}

/// Network descriptor handed to the bridge when building a transaction API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub blockchain: String,
    pub chain_id: String,
    pub protocol: String,
    pub host: String,
    pub port: u16,
}

impl Network {
    pub fn new(blockchain: &str, chain: &Chain, endpoint: &RpcEndpoint) -> Self {
        Self {
            blockchain: blockchain.to_string(),
            chain_id: chain.chain_id.clone(),
            protocol: endpoint.protocol.clone(),
            host: endpoint.host.clone(),
            port: endpoint.port,
        }
    }
}

/// Construction hints for the transaction API handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOptions {
    pub rpc_url: String,
    pub beta3: bool,
}

/// One account selector inside an identity request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRequirement {
    pub blockchain: String,
    pub host: String,
    pub port: u16,
    pub chain_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRequest {
    pub accounts: Vec<AccountRequirement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityAccount {
    pub name: String,
    pub public_key: String,
}

/// What the wallet reports for an identity request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default)]
    pub accounts: Vec<IdentityAccount>,
}

/// Options forwarded verbatim to `transact`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactConfig {
    pub broadcast: bool,
    pub blocks_behind: u32,
    pub expire_seconds: u32,
}

/// Transaction submission handle returned by [`WalletBridge::eos`].
#[async_trait]
pub trait TransactionApi: Send + Sync {
    /// Sign (and optionally broadcast) a transaction, returning the raw receipt.
    async fn transact(
        &self,
        transaction: serde_json::Value,
        config: TransactConfig,
    ) -> anyhow::Result<serde_json::Value>;
}

#[async_trait]
pub trait WalletBridge: Send + Sync {
    fn plugins(&self, plugin: BridgePlugin);

    async fn connect(&self, app_name: &str) -> anyhow::Result<bool>;

    async fn logout(&self) -> anyhow::Result<()>;

    fn eos(&self, network: &Network, options: &ApiOptions) -> Arc<dyn TransactionApi>;

    async fn get_identity(&self, request: &IdentityRequest) -> anyhow::Result<Identity>;

    /// Ask the wallet to sign `challenge`; resolves to a `SIG_K1_` string.
    async fn authenticate(&self, challenge: &str) -> anyhow::Result<String>;

    async fn get_arbitrary_signature(&self, public_key: &str, data: &str)
        -> anyhow::Result<String>;
}
