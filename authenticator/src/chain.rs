use serde::{Deserialize, Serialize};

/// One RPC node of a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcEndpoint {
    pub protocol: String,
    pub host: String,
    pub port: u16,
}

impl RpcEndpoint {
    pub fn new(protocol: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            protocol: protocol.into(),
            host: host.into(),
            port,
        }
    }

    /// `protocol://host:port`, the form the transaction API expects.
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}

/// A chain the application wants to authenticate against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chain {
    pub chain_id: String,
    pub rpc_endpoints: Vec<RpcEndpoint>,
}

impl Chain {
    pub fn new(chain_id: impl Into<String>, rpc_endpoints: Vec<RpcEndpoint>) -> Self {
        Self {
            chain_id: chain_id.into(),
            rpc_endpoints,
        }
    }

    /// The endpoint identities are bound to. Only the first one is ever used.
    pub fn primary_endpoint(&self) -> Option<&RpcEndpoint> {
        self.rpc_endpoints.first()
    }
}
