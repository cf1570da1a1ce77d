//! In-memory wallet bridge for unit tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use secp256k1::SecretKey;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::bridge::{
    ApiOptions, BridgePlugin, Identity, IdentityAccount, IdentityRequest, Network,
    TransactConfig, TransactionApi, WalletBridge,
};
use crate::chain::{Chain, RpcEndpoint};
use crate::crypto::{self, KeyFormat};

pub const ACCOUNT_NAME: &str = "test.account";

pub fn test_chain() -> Chain {
    Chain::new(
        "1234567890",
        vec![RpcEndpoint::new("https", "example.com", 443)],
    )
}

pub fn wallet_key() -> SecretKey {
    SecretKey::from_slice(&[0x42; 32]).unwrap()
}

pub fn wallet_public_key(format: KeyFormat) -> String {
    let secp = secp256k1::Secp256k1::signing_only();
    crypto::public_key_to_string(&wallet_key().public_key(&secp), format)
}

pub fn identity_for(public_key: &str) -> Identity {
    identity_named(ACCOUNT_NAME, public_key)
}

pub fn identity_named(name: &str, public_key: &str) -> Identity {
    Identity {
        accounts: vec![IdentityAccount {
            name: name.to_string(),
            public_key: public_key.to_string(),
        }],
    }
}

pub enum ConnectBehavior {
    Resolve(bool),
    Fail(String),
    Pending,
}

pub enum AuthBehavior {
    Sign(SecretKey),
    Respond(String),
    Fail(String),
    Pending,
}

#[derive(Default)]
pub struct TransactState {
    pub result: Mutex<Option<Result<Value, String>>>,
    pub configs: Mutex<Vec<TransactConfig>>,
}

pub struct MockApi {
    state: Arc<TransactState>,
}

#[async_trait]
impl TransactionApi for MockApi {
    async fn transact(
        &self,
        transaction: Value,
        config: TransactConfig,
    ) -> anyhow::Result<Value> {
        self.state.configs.lock().push(config);
        match self.state.result.lock().clone() {
            Some(Ok(receipt)) => Ok(receipt),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            // echo the transaction back as its own receipt
            None => Ok(transaction),
        }
    }
}

pub struct MockBridge {
    pub connect: Mutex<ConnectBehavior>,
    pub identity: Mutex<Result<Identity, String>>,
    pub identity_delay: Mutex<Option<Duration>>,
    pub auth: Mutex<AuthBehavior>,
    pub logout_error: Mutex<Option<String>>,
    pub transact: Arc<TransactState>,
    pub plugins: Mutex<Vec<BridgePlugin>>,
    pub networks: Mutex<Vec<(Network, ApiOptions)>>,
    pub identity_requests: Mutex<Vec<IdentityRequest>>,
    pub connect_calls: AtomicUsize,
    pub identity_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
}

impl MockBridge {
    pub fn new() -> Self {
        Self {
            connect: Mutex::new(ConnectBehavior::Resolve(true)),
            identity: Mutex::new(Ok(identity_for(&wallet_public_key(KeyFormat::K1)))),
            identity_delay: Mutex::new(None),
            auth: Mutex::new(AuthBehavior::Sign(wallet_key())),
            logout_error: Mutex::new(None),
            transact: Arc::new(TransactState::default()),
            plugins: Mutex::new(Vec::new()),
            networks: Mutex::new(Vec::new()),
            identity_requests: Mutex::new(Vec::new()),
            connect_calls: AtomicUsize::new(0),
            identity_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
        }
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn identity_calls(&self) -> usize {
        self.identity_calls.load(Ordering::SeqCst)
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub fn fail_identity(&self, message: &str) {
        *self.identity.lock() = Err(message.to_string());
    }
}

#[async_trait]
impl WalletBridge for MockBridge {
    fn plugins(&self, plugin: BridgePlugin) {
        self.plugins.lock().push(plugin);
    }

    async fn connect(&self, _app_name: &str) -> anyhow::Result<bool> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        let outcome = match &*self.connect.lock() {
            ConnectBehavior::Resolve(value) => Some(Ok(*value)),
            ConnectBehavior::Fail(message) => Some(Err(anyhow::anyhow!(message.clone()))),
            ConnectBehavior::Pending => None,
        };
        match outcome {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }

    async fn logout(&self) -> anyhow::Result<()> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        match self.logout_error.lock().clone() {
            Some(message) => Err(anyhow::anyhow!(message)),
            None => Ok(()),
        }
    }

    fn eos(&self, network: &Network, options: &ApiOptions) -> Arc<dyn TransactionApi> {
        self.networks.lock().push((network.clone(), options.clone()));
        Arc::new(MockApi {
            state: self.transact.clone(),
        })
    }

    async fn get_identity(&self, request: &IdentityRequest) -> anyhow::Result<Identity> {
        self.identity_calls.fetch_add(1, Ordering::SeqCst);
        self.identity_requests.lock().push(request.clone());
        let delay = *self.identity_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let result = self.identity.lock().clone();
        result.map_err(|message| anyhow::anyhow!(message))
    }

    async fn authenticate(&self, challenge: &str) -> anyhow::Result<String> {
        let outcome = match &*self.auth.lock() {
            AuthBehavior::Sign(key) => Some(Ok(crypto::sign_challenge(key, challenge))),
            AuthBehavior::Respond(signature) => Some(Ok(signature.clone())),
            AuthBehavior::Fail(message) => Some(Err(anyhow::anyhow!(message.clone()))),
            AuthBehavior::Pending => None,
        };
        match outcome {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }

    async fn get_arbitrary_signature(
        &self,
        public_key: &str,
        data: &str,
    ) -> anyhow::Result<String> {
        Ok(format!("signed:{}:{}", public_key, data))
    }
}
