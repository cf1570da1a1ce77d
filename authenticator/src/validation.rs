use crate::chain::{Chain, RpcEndpoint};
use crate::errors::{AuthError, AuthResult, ErrorKind};
use regex::Regex;

const MAX_APP_NAME_LEN: usize = 128;
const MAX_INPUT_LEN: usize = 1000;

/// Input checks applied before a session is allowed to exist.
pub struct InputValidator {
    chain_id_pattern: Regex,
    host_pattern: Regex,
    account_name_pattern: Regex,

    // Blacklisted patterns for security
    malicious_patterns: Vec<Regex>,
}

fn compile(pattern: &str) -> AuthResult<Regex> {
    Regex::new(pattern).map_err(|e| {
        AuthError::with_cause(
            ErrorKind::Initialization,
            format!("Invalid validation regex {}", pattern),
            e,
        )
    })
}

fn invalid(message: impl Into<String>) -> AuthError {
    AuthError::new(ErrorKind::Initialization, message)
}

impl InputValidator {
    pub fn new() -> AuthResult<Self> {
        let malicious_patterns = [
            r"<script",
            r"javascript:",
            r"data:text/html",
            r"vbscript:",
            r"onload=",
            r"onerror=",
        ]
        .iter()
        .map(|pattern| compile(pattern))
        .collect::<AuthResult<Vec<_>>>()?;

        Ok(InputValidator {
            chain_id_pattern: compile(r"^[a-fA-F0-9]+$")?,
            host_pattern: compile(r"^[A-Za-z0-9]([A-Za-z0-9\-\.]*[A-Za-z0-9])?$")?,
            account_name_pattern: compile(r"^[a-z1-5\.]{1,12}$")?,
            malicious_patterns,
        })
    }

    /// The application name shown to the wallet user when connecting.
    pub fn validate_app_name(&self, app_name: &str) -> AuthResult<()> {
        self.check_basic_security(app_name)?;

        if app_name.trim().is_empty() {
            return Err(invalid(
                "Scatter requires the app_name option to be set",
            ));
        }

        if app_name.len() > MAX_APP_NAME_LEN {
            return Err(invalid("App name too long"));
        }

        Ok(())
    }

    pub fn validate_chain(&self, chain: &Chain) -> AuthResult<()> {
        if chain.chain_id.is_empty() || !self.chain_id_pattern.is_match(&chain.chain_id) {
            return Err(invalid(format!(
                "Chain id '{}' must be a non-empty hex string",
                chain.chain_id
            )));
        }

        let endpoint = chain.primary_endpoint().ok_or_else(|| {
            invalid(format!(
                "Chain '{}' has no RPC endpoints",
                chain.chain_id
            ))
        })?;
        self.validate_endpoint(endpoint)
    }

    pub fn validate_endpoint(&self, endpoint: &RpcEndpoint) -> AuthResult<()> {
        if !matches!(endpoint.protocol.as_str(), "http" | "https") {
            return Err(invalid(format!(
                "Unsupported RPC protocol '{}'",
                endpoint.protocol
            )));
        }

        if !self.host_pattern.is_match(&endpoint.host) {
            return Err(invalid(format!("Invalid RPC host '{}'", endpoint.host)));
        }

        Ok(())
    }

    /// Whether `name` follows the on-chain account name rules.
    pub fn is_valid_account_name(&self, name: &str) -> bool {
        self.account_name_pattern.is_match(name)
    }

    fn check_basic_security(&self, input: &str) -> AuthResult<()> {
        if input.len() > MAX_INPUT_LEN {
            return Err(invalid("Input too long"));
        }

        let lowered = input.to_lowercase();
        if self
            .malicious_patterns
            .iter()
            .any(|pattern| pattern.is_match(&lowered))
        {
            return Err(invalid("Input contains potentially malicious content"));
        }

        Ok(())
    }
}
