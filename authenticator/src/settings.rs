use crate::crypto::KeyFormat;
use crate::errors::{AuthError, AuthResult, ErrorKind};
use crate::options::{AuthenticatorOptions, DEFAULT_BLOCKCHAIN, DEFAULT_VERIFY_TIMEOUT_MS};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const KEY_ENVIRONMENT: &str = "SCATTER_ENVIRONMENT";
const KEY_APP_NAME: &str = "SCATTER_APP_NAME";
const KEY_USER_AGENT: &str = "SCATTER_USER_AGENT";
const KEY_VERIFY_TIMEOUT_MS: &str = "SCATTER_VERIFY_TIMEOUT_MS";
const KEY_KEY_FORMAT: &str = "SCATTER_KEY_FORMAT";
const KEY_BLOCKCHAIN: &str = "SCATTER_BLOCKCHAIN";

const OVERRIDABLE_KEYS: [&str; 5] = [
    KEY_APP_NAME,
    KEY_USER_AGENT,
    KEY_VERIFY_TIMEOUT_MS,
    KEY_KEY_FORMAT,
    KEY_BLOCKCHAIN,
];

/// Deployment profile, selects the defaults before overrides apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "test" | "testing" => Environment::Test,
            _ => Environment::Development,
        }
    }
}

/// Layered settings: profile defaults, then environment-variable overrides.
#[derive(Debug, Clone)]
pub struct Settings {
    environment: Environment,
    config_map: HashMap<String, String>,
}

impl Settings {
    pub fn new(environment: Environment) -> Self {
        let mut settings = Settings {
            environment,
            config_map: HashMap::new(),
        };
        settings.load_defaults();
        settings
    }

    /// Build settings from `SCATTER_*` environment variables.
    pub fn from_env() -> AuthResult<Self> {
        let environment = std::env::var(KEY_ENVIRONMENT)
            .map(|value| Environment::parse(&value))
            .unwrap_or(Environment::Development);
        let overrides = OVERRIDABLE_KEYS
            .iter()
            .filter_map(|key| std::env::var(key).ok().map(|value| (key.to_string(), value)));
        Self::from_overrides(environment, overrides)
    }

    /// Build settings from an explicit set of overrides, as `from_env` does.
    pub fn from_overrides<I>(environment: Environment, overrides: I) -> AuthResult<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut settings = Self::new(environment);
        for (key, value) in overrides {
            if !OVERRIDABLE_KEYS.contains(&key.as_str()) {
                return Err(AuthError::new(
                    ErrorKind::Configuration,
                    format!("Unknown setting '{}'", key),
                ));
            }
            let value = value.trim().to_string();
            if value.is_empty() {
                continue;
            }
            settings.config_map.insert(key, value);
        }
        Ok(settings)
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.config_map.get(key)
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Resolve the settings into authenticator options.
    pub fn to_options(&self) -> AuthResult<AuthenticatorOptions> {
        let verify_timeout_ms = match self.get(KEY_VERIFY_TIMEOUT_MS) {
            Some(value) => parse_timeout(value)?,
            None => DEFAULT_VERIFY_TIMEOUT_MS,
        };
        let key_format = match self.get(KEY_KEY_FORMAT) {
            Some(value) => value.parse::<KeyFormat>()?,
            None => KeyFormat::default(),
        };

        Ok(AuthenticatorOptions {
            app_name: self.get(KEY_APP_NAME).cloned(),
            user_agent: self.get(KEY_USER_AGENT).cloned(),
            verify_timeout_ms,
            blockchain: self
                .get(KEY_BLOCKCHAIN)
                .cloned()
                .unwrap_or_else(|| DEFAULT_BLOCKCHAIN.to_string()),
            key_format,
            beta3: true,
        })
    }

    fn load_defaults(&mut self) {
        self.config_map
            .insert(KEY_BLOCKCHAIN.to_string(), DEFAULT_BLOCKCHAIN.to_string());
        self.config_map
            .insert(KEY_KEY_FORMAT.to_string(), KeyFormat::K1.to_string());

        let timeout_ms = match self.environment {
            Environment::Production | Environment::Development => DEFAULT_VERIFY_TIMEOUT_MS,
            // slower CI machines
            Environment::Test => 5 * DEFAULT_VERIFY_TIMEOUT_MS,
        };
        self.config_map
            .insert(KEY_VERIFY_TIMEOUT_MS.to_string(), timeout_ms.to_string());
    }
}

fn parse_timeout(value: &str) -> AuthResult<u64> {
    let parsed = value.parse::<u64>().map_err(|e| {
        AuthError::with_cause(
            ErrorKind::Configuration,
            format!("Invalid value for {}: '{}'", KEY_VERIFY_TIMEOUT_MS, value),
            e,
        )
    })?;
    if parsed == 0 {
        return Err(AuthError::new(
            ErrorKind::Configuration,
            format!("{} must be greater than zero", KEY_VERIFY_TIMEOUT_MS),
        ));
    }
    Ok(parsed)
}
