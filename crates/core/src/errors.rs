//! Error types for the orgsync core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them for callers that want a single
//! error type.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    WeCom(#[from] WeComError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// WeCom API errors
// ---------------------------------------------------------------------------

/// Errors from WeCom REST API interactions.
#[derive(Debug, Error)]
pub enum WeComError {
    /// HTTP-level transport error (network, TLS, timeout).
    #[error("WeCom HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The API answered with a non-success HTTP status.
    #[error("WeCom API returned HTTP {status}: {body}")]
    ApiStatus {
        status: u16,
        body: String,
    },

    /// The API answered 200 but reported a non-zero `errcode`.
    #[error("WeCom API error {errcode}: {errmsg}")]
    ApiError {
        errcode: i64,
        errmsg: String,
    },

    /// No access token could be obtained for the configured corp.
    #[error("WeCom authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The response body could not be decoded.
    #[error("WeCom response parse error: {0}")]
    ParseError(String),
}

impl WeComError {
    /// Whether this error came from the credential exchange rather than a
    /// directory call.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthenticationFailed(_))
    }
}

// ---------------------------------------------------------------------------
// Assembly errors
// ---------------------------------------------------------------------------

/// Errors from building the flattened record set.
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// Listing the departments failed.
    #[error("failed to list departments: {0}")]
    Departments(#[source] WeComError),

    /// Listing the users of one department failed.
    #[error("failed to list users of department {department_id}: {source}")]
    Users {
        department_id: i64,
        #[source]
        source: WeComError,
    },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A required environment variable is not set.
    #[error("required environment variable '{var}' is not set (referenced by config field '{field}')")]
    EnvVarMissing {
        var: String,
        field: String,
    },

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue {
        field: String,
        detail: String,
    },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
