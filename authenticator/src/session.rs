use async_trait::async_trait;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::api::types::ButtonStyle;
use crate::bridge::{BridgePlugin, WalletBridge};
use crate::chain::Chain;
use crate::errors::{AuthError, AuthResult, ErrorKind};
use crate::identity::{AccountIdentity, IdentitySettings, ScatterIdentity};
use crate::options::AuthenticatorOptions;
use crate::validation::InputValidator;

/// Name the authenticator reports to host applications.
pub const AUTHENTICATOR_NAME: &str = "Scatter";
pub const ONBOARDING_LINK: &str = "https://get-scatter.com/";

const BUTTON_BACKGROUND: &str = "#078CE9";
const BUTTON_TEXT_COLOR: &str = "white";
const SCATTER_ICON: &str = "data:image/svg+xml;utf8,<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 32 32'><circle cx='16' cy='16' r='14' fill='white'/><path d='M11 20c2 2 8 2 10-1s-3-5-5-5-6-2-4-5 7-2 9 0' stroke='%23078CE9' stroke-width='2.5' fill='none' stroke-linecap='round'/></svg>";

const MISSING_APP_NAME: &str =
    "Scatter requires the app_name option to be set on the options argument.";
const CONNECT_FAILED: &str = "Error occurred while connecting";
const LOGIN_FAILED: &str = "Unable to login";
const LOGOUT_FAILED: &str = "Error occurred during logout";

/// True when the user agent looks like a phone, tablet or embedded wallet browser.
pub fn is_mobile(user_agent: &str) -> bool {
    let is_ios = user_agent.contains("iPhone") || user_agent.contains("iPad");
    let is_mobile = user_agent.contains("Mobile");
    let is_android = user_agent.contains("Android");
    let is_custom = user_agent.to_lowercase().contains("eoslynx");

    is_ios || is_mobile || is_android || is_custom
}

/// Connection and login lifecycle of one wallet.
#[async_trait]
pub trait SessionManager: Send + Sync {
    /// Connect to the wallet. Outcome is observable through the state readers.
    async fn connect(&self);

    /// Clear any error and reconnect in the background.
    fn reset(&self) -> JoinHandle<()>;

    fn is_connecting(&self) -> bool;

    fn is_errored(&self) -> bool;

    fn get_error(&self) -> Option<AuthError>;

    async fn login(&self) -> AuthResult<Vec<Arc<dyn AccountIdentity>>>;

    async fn logout(&self) -> AuthResult<()>;

    fn should_render(&self) -> bool;

    fn should_auto_login(&self) -> bool;

    /// The wallet supplies account names itself.
    fn should_request_account_name(&self) -> bool;

    fn requires_get_key_confirmation(&self) -> bool;

    fn name(&self) -> &str;

    fn style(&self) -> ButtonStyle;

    fn onboarding_link(&self) -> &str;
}

#[derive(Default)]
struct SessionState {
    connecting: bool,
    init_error: Option<AuthError>,
    connected: Option<Arc<dyn WalletBridge>>,
    users: Vec<Arc<ScatterIdentity>>,
    login_generation: u64,
}

/// Session manager for the Scatter wallet.
///
/// Cloning is cheap and every clone shares the same state, which is how
/// `reset` hands the session to its background connect task.
#[derive(Clone)]
pub struct ScatterSession {
    chains: Arc<Vec<Chain>>,
    app_name: Arc<str>,
    user_agent: Option<Arc<str>>,
    identity_settings: IdentitySettings,
    bridge: Arc<dyn WalletBridge>,
    validator: Arc<InputValidator>,
    state: Arc<RwLock<SessionState>>,
}

impl fmt::Debug for ScatterSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("ScatterSession")
            .field("app_name", &self.app_name)
            .field("chains", &self.chains.len())
            .field("connecting", &state.connecting)
            .field("connected", &state.connected.is_some())
            .field("users", &state.users.len())
            .finish_non_exhaustive()
    }
}

impl ScatterSession {
    /// Build a session. Fails before touching the bridge when `app_name` is
    /// missing or a chain has no RPC endpoint. Other odd inputs only warn.
    pub fn new(
        chains: Vec<Chain>,
        options: AuthenticatorOptions,
        bridge: Arc<dyn WalletBridge>,
    ) -> AuthResult<Self> {
        let app_name = options
            .app_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| crate::auth_error!(Initialization, MISSING_APP_NAME))?;

        let validator = InputValidator::new()?;
        if let Err(e) = validator.validate_app_name(app_name) {
            log::warn!("Unusual app name '{}': {}", app_name, e.message());
        }
        for chain in &chains {
            if chain.primary_endpoint().is_none() {
                return Err(crate::auth_error!(
                    Initialization,
                    format!("Chain '{}' has no RPC endpoints", chain.chain_id)
                ));
            }
            if let Err(e) = validator.validate_chain(chain) {
                log::warn!("Unusual chain '{}': {}", chain.chain_id, e.message());
            }
        }

        Ok(Self {
            chains: Arc::new(chains),
            app_name: Arc::from(app_name),
            user_agent: options.user_agent.as_deref().map(Arc::from),
            identity_settings: IdentitySettings::from(&options),
            bridge,
            validator: Arc::new(validator),
            state: Arc::new(RwLock::new(SessionState::default())),
        })
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    /// Whether the configured user agent is a mobile one.
    pub fn is_mobile(&self) -> bool {
        self.user_agent.as_deref().map(is_mobile).unwrap_or(false)
    }

    /// Identities produced by the most recent completed login.
    pub fn users(&self) -> Vec<Arc<dyn AccountIdentity>> {
        self.state
            .read()
            .users
            .iter()
            .map(|user| user.clone() as Arc<dyn AccountIdentity>)
            .collect()
    }

    async fn build_identities(
        &self,
        bridge: Arc<dyn WalletBridge>,
    ) -> AuthResult<Vec<Arc<ScatterIdentity>>> {
        let mut users = Vec::with_capacity(self.chains.len());
        for chain in self.chains.iter() {
            let user = ScatterIdentity::new(
                chain.clone(),
                bridge.clone(),
                self.identity_settings.clone(),
            )?;
            user.get_keys().await?;

            let account_name = user.get_account_name().await?;
            if !self.validator.is_valid_account_name(&account_name) {
                log::warn!(
                    "Wallet reported unusual account name '{}' on chain {}",
                    account_name,
                    chain.chain_id
                );
            }
            users.push(Arc::new(user));
        }
        Ok(users)
    }
}

#[async_trait]
impl SessionManager for ScatterSession {
    async fn connect(&self) {
        self.state.write().connecting = true;
        self.bridge.plugins(BridgePlugin::Eosjs2);

        let outcome = self.bridge.connect(&self.app_name).await;

        let mut state = self.state.write();
        state.connecting = false;
        match outcome {
            Ok(true) => {
                log::info!("Connected to Scatter as '{}'", self.app_name);
                state.connected = Some(self.bridge.clone());
                state.init_error = None;
            }
            Ok(false) => {
                log::warn!("Scatter refused the connection for '{}'", self.app_name);
                state.init_error = Some(crate::auth_error!(Initialization, CONNECT_FAILED));
            }
            Err(e) => {
                log::warn!("Scatter connection failed: {}", e);
                state.init_error = Some(AuthError::with_cause(
                    ErrorKind::Initialization,
                    CONNECT_FAILED,
                    e,
                ));
            }
        }
    }

    fn reset(&self) -> JoinHandle<()> {
        self.state.write().init_error = None;
        let session = self.clone();
        tokio::spawn(async move { session.connect().await })
    }

    fn is_connecting(&self) -> bool {
        self.state.read().connecting
    }

    fn is_errored(&self) -> bool {
        self.state.read().init_error.is_some()
    }

    fn get_error(&self) -> Option<AuthError> {
        self.state.read().init_error.clone()
    }

    async fn login(&self) -> AuthResult<Vec<Arc<dyn AccountIdentity>>> {
        let (connected, generation) = {
            let mut state = self.state.write();
            state.users.clear();
            state.login_generation += 1;
            (state.connected.clone(), state.login_generation)
        };

        let bridge = connected.ok_or_else(|| {
            AuthError::with_cause(
                ErrorKind::Login,
                LOGIN_FAILED,
                anyhow::anyhow!("Scatter is not connected"),
            )
        })?;

        let users = self
            .build_identities(bridge)
            .await
            .map_err(|e| {
                log::warn!("Login failed: {}", e);
                AuthError::with_cause(ErrorKind::Login, LOGIN_FAILED, e)
            })?;

        {
            let mut state = self.state.write();
            if state.login_generation == generation {
                state.users = users.clone();
            } else {
                log::debug!("Discarding identities from superseded login {}", generation);
            }
        }

        log::info!("Logged in on {} chain(s)", users.len());
        Ok(users
            .into_iter()
            .map(|user| user as Arc<dyn AccountIdentity>)
            .collect())
    }

    async fn logout(&self) -> AuthResult<()> {
        let connected = self.state.read().connected.clone();
        let Some(bridge) = connected else {
            log::debug!("Logout requested before connecting; nothing to do");
            return Ok(());
        };

        bridge
            .logout()
            .await
            .map_err(|e| crate::auth_error!(Logout, LOGOUT_FAILED, e))?;

        {
            // in-flight logins must not repopulate users after this point
            let mut state = self.state.write();
            state.users.clear();
            state.login_generation += 1;
        }
        log::info!("Logged out of Scatter");
        Ok(())
    }

    fn should_render(&self) -> bool {
        !self.is_mobile()
    }

    fn should_auto_login(&self) -> bool {
        false
    }

    fn should_request_account_name(&self) -> bool {
        false
    }

    fn requires_get_key_confirmation(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        AUTHENTICATOR_NAME
    }

    fn style(&self) -> ButtonStyle {
        ButtonStyle {
            icon: SCATTER_ICON.to_string(),
            text: AUTHENTICATOR_NAME.to_string(),
            text_color: BUTTON_TEXT_COLOR.to_string(),
            background: BUTTON_BACKGROUND.to_string(),
        }
    }

    fn onboarding_link(&self) -> &str {
        ONBOARDING_LINK
    }
}
