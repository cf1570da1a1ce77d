use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identifier stamped on every failure raised by this authenticator.
pub const ERROR_SOURCE: &str = "Scatter";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    // Session lifecycle
    Initialization,
    Login,
    Logout,

    // Account operations
    Signing,
    DataRequest,
    Timeout,

    // Options loading and persistence
    Configuration,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            ErrorKind::Initialization => "Initialization",
            ErrorKind::Login => "Login",
            ErrorKind::Logout => "Logout",
            ErrorKind::Signing => "Signing",
            ErrorKind::DataRequest => "DataRequest",
            ErrorKind::Timeout => "Timeout",
            ErrorKind::Configuration => "Configuration",
        };
        f.write_str(label)
    }
}

/// Typed failure surfaced across the session and identity boundaries.
///
/// The cause is shared so the error stays `Clone`; the session keeps its
/// initialization error around for later reads.
#[derive(Debug, Clone)]
pub struct AuthError {
    source: &'static str,
    kind: ErrorKind,
    message: String,
    cause: Option<Arc<anyhow::Error>>,
}

impl AuthError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            source: ERROR_SOURCE,
            kind,
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(
        kind: ErrorKind,
        message: impl Into<String>,
        cause: impl Into<anyhow::Error>,
    ) -> Self {
        Self {
            source: ERROR_SOURCE,
            kind,
            message: message.into(),
            cause: Some(Arc::new(cause.into())),
        }
    }

    pub fn source_name(&self) -> &'static str {
        self.source
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&anyhow::Error> {
        self.cause.as_deref()
    }

    /// Message of the wrapped cause, if there is one.
    pub fn cause_message(&self) -> Option<String> {
        self.cause.as_ref().map(|cause| cause.to_string())
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}] {} error: {}", self.source, self.kind, self.message)?;
        if let Some(cause) = &self.cause {
            write!(f, " ({})", cause)?;
        }
        Ok(())
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.cause {
            Some(cause) => {
                let inner: &(dyn std::error::Error + Send + Sync + 'static) = &***cause;
                Some(inner)
            }
            None => None,
        }
    }
}

pub type AuthResult<T> = Result<T, AuthError>;

// Helper macro for easy error creation
#[macro_export]
macro_rules! auth_error {
    ($kind:ident, $msg:expr) => {
        $crate::errors::AuthError::new($crate::errors::ErrorKind::$kind, $msg)
    };
    ($kind:ident, $msg:expr, $cause:expr) => {
        $crate::errors::AuthError::with_cause($crate::errors::ErrorKind::$kind, $msg, $cause)
    };
}

// Conversion helper for the options layer
impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        AuthError::with_cause(ErrorKind::Configuration, "Invalid options JSON", error)
    }
}
