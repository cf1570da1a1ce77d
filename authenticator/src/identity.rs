use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::api::types::{SignTransactionConfig, SignTransactionResponse};
use crate::bridge::{
    AccountRequirement, ApiOptions, IdentityRequest, Network, TransactionApi, WalletBridge,
};
use crate::chain::{Chain, RpcEndpoint};
use crate::crypto::{self, KeyFormat};
use crate::errors::{AuthError, AuthResult, ErrorKind};
use crate::options::AuthenticatorOptions;

const IDENTITY_LOAD_FAILED: &str = "Unable load user's identity";
const VERIFY_FAILED: &str = "verifyKeyOwnership failed";

/// A logged-in account on one chain.
#[async_trait]
pub trait AccountIdentity: fmt::Debug + Send + Sync {
    async fn sign_transaction(
        &self,
        transaction: Value,
        config: SignTransactionConfig,
    ) -> AuthResult<SignTransactionResponse>;

    async fn sign_arbitrary(&self, public_key: &str, data: &str) -> AuthResult<String>;

    /// Prove the wallet holds one of this account's keys by signing `challenge`.
    async fn verify_key_ownership(&self, challenge: &str) -> AuthResult<bool>;

    async fn get_account_name(&self) -> AuthResult<String>;

    fn get_chain_id(&self) -> &str;

    async fn get_keys(&self) -> AuthResult<Vec<String>>;
}

/// Per-identity knobs derived from the authenticator options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentitySettings {
    pub blockchain: String,
    pub key_format: KeyFormat,
    pub verify_timeout: Duration,
    pub beta3: bool,
}

impl From<&AuthenticatorOptions> for IdentitySettings {
    fn from(options: &AuthenticatorOptions) -> Self {
        Self {
            blockchain: options.blockchain.clone(),
            key_format: options.key_format,
            verify_timeout: options.verify_timeout(),
            beta3: options.beta3,
        }
    }
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self::from(&AuthenticatorOptions::default())
    }
}

#[derive(Debug, Default)]
struct CachedIdentity {
    account_name: String,
    keys: Vec<String>,
}

/// Account identity backed by the Scatter wallet bridge.
///
/// Name and keys are fetched lazily and cached for the lifetime of the value.
/// The cache lock is held across the bridge call, so concurrent callers share
/// one in-flight refresh instead of racing.
pub struct ScatterIdentity {
    chain: Chain,
    endpoint: RpcEndpoint,
    bridge: Arc<dyn WalletBridge>,
    api: Arc<dyn TransactionApi>,
    settings: IdentitySettings,
    cache: Mutex<CachedIdentity>,
}

impl fmt::Debug for ScatterIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScatterIdentity")
            .field("chain_id", &self.chain.chain_id)
            .field("endpoint", &self.endpoint)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl ScatterIdentity {
    pub fn new(
        chain: Chain,
        bridge: Arc<dyn WalletBridge>,
        settings: IdentitySettings,
    ) -> AuthResult<Self> {
        let endpoint = chain.primary_endpoint().cloned().ok_or_else(|| {
            AuthError::new(
                ErrorKind::DataRequest,
                format!("Chain '{}' has no RPC endpoints", chain.chain_id),
            )
        })?;

        let network = Network::new(&settings.blockchain, &chain, &endpoint);
        let api_options = ApiOptions {
            rpc_url: endpoint.url(),
            beta3: settings.beta3,
        };
        let api = bridge.eos(&network, &api_options);

        Ok(Self {
            chain,
            endpoint,
            bridge,
            api,
            settings,
            cache: Mutex::new(CachedIdentity::default()),
        })
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    async fn refresh_identity(&self, cache: &mut CachedIdentity) -> AuthResult<()> {
        let request = IdentityRequest {
            accounts: vec![AccountRequirement {
                blockchain: self.settings.blockchain.clone(),
                host: self.endpoint.host.clone(),
                port: self.endpoint.port,
                chain_id: self.chain.chain_id.clone(),
            }],
        };

        log::debug!("Requesting identity for chain {}", self.chain.chain_id);
        let identity = self
            .bridge
            .get_identity(&request)
            .await
            .map_err(|e| AuthError::with_cause(ErrorKind::DataRequest, IDENTITY_LOAD_FAILED, e))?;

        if identity.accounts.len() > 1 {
            log::debug!(
                "Wallet returned {} accounts for chain {}; using the first",
                identity.accounts.len(),
                self.chain.chain_id
            );
        }

        let account = identity.accounts.into_iter().next().ok_or_else(|| {
            AuthError::with_cause(
                ErrorKind::DataRequest,
                IDENTITY_LOAD_FAILED,
                anyhow::anyhow!("identity response contained no accounts"),
            )
        })?;

        cache.keys = vec![account.public_key];
        cache.account_name = account.name;
        Ok(())
    }

    async fn authenticate(&self, challenge: &str) -> AuthResult<bool> {
        log::debug!(
            "Requesting signature over challenge digest {} on chain {}",
            hex::encode(crypto::challenge_digest(challenge)),
            self.chain.chain_id
        );
        let signature = self.bridge.authenticate(challenge).await.map_err(|e| {
            AuthError::with_cause(ErrorKind::Signing, "Unable to authenticate challenge", e)
        })?;
        let recovered = crypto::recover_public_key(challenge, &signature, self.settings.key_format)?;
        let keys = self.get_keys().await?;
        Ok(key_set_contains(&keys, &recovered))
    }
}

fn key_set_contains(keys: &[String], recovered: &str) -> bool {
    keys.iter().any(|key| key == recovered)
}

#[async_trait]
impl AccountIdentity for ScatterIdentity {
    async fn sign_transaction(
        &self,
        transaction: Value,
        config: SignTransactionConfig,
    ) -> AuthResult<SignTransactionResponse> {
        let completed = self
            .api
            .transact(transaction, config.into())
            .await
            .map_err(|e| {
                AuthError::with_cause(
                    ErrorKind::Signing,
                    "Unable to sign the given transaction",
                    e,
                )
            })?;

        Ok(SignTransactionResponse::from_receipt(
            config.broadcast,
            completed,
        ))
    }

    async fn sign_arbitrary(&self, public_key: &str, data: &str) -> AuthResult<String> {
        self.bridge
            .get_arbitrary_signature(public_key, data)
            .await
            .map_err(|e| AuthError::with_cause(ErrorKind::Signing, "Unable to sign arbitrary data", e))
    }

    async fn verify_key_ownership(&self, challenge: &str) -> AuthResult<bool> {
        match tokio::time::timeout(self.settings.verify_timeout, self.authenticate(challenge)).await
        {
            Ok(result) => result,
            Err(_) => {
                log::warn!(
                    "Key ownership verification timed out after {:?} on chain {}",
                    self.settings.verify_timeout,
                    self.chain.chain_id
                );
                Err(AuthError::new(ErrorKind::Timeout, VERIFY_FAILED))
            }
        }
    }

    async fn get_account_name(&self) -> AuthResult<String> {
        let mut cache = self.cache.lock().await;
        if cache.account_name.is_empty() {
            self.refresh_identity(&mut cache).await?;
        }
        Ok(cache.account_name.clone())
    }

    fn get_chain_id(&self) -> &str {
        &self.chain.chain_id
    }

    async fn get_keys(&self) -> AuthResult<Vec<String>> {
        let mut cache = self.cache.lock().await;
        if cache.keys.is_empty() {
            self.refresh_identity(&mut cache).await?;
        }
        Ok(cache.keys.clone())
    }
}
