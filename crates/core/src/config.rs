//! TOML-based configuration system for orgsync.
//!
//! The corp secret is stored as an `_env` field that references an
//! environment variable name. The actual secret is resolved at runtime via
//! [`AppConfig::resolve_env_vars`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::assembler::AssemblySettings;
use crate::derive::validate_email;
use crate::errors::ConfigError;

/// Fallback domain for malformed personal email addresses.
pub const DEFAULT_PERSONAL_FALLBACK_DOMAIN: &str = "example.com";

/// Fallback domain for malformed business email addresses.
pub const DEFAULT_BIZ_FALLBACK_DOMAIN: &str = "biz.example.com";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level application configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// WeCom API connection and namespace settings.
    pub wecom: WeComConfig,

    /// Email fallback settings.
    #[serde(default)]
    pub email: EmailConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// WeCom
// ---------------------------------------------------------------------------

/// WeCom API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeComConfig {
    /// API base URL (default `https://qyapi.weixin.qq.com`).
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Corp ID of the WeCom tenant.
    pub corp_id: String,

    /// Environment variable holding the corp (application) secret.
    pub corp_secret_env: String,

    /// Prefix used to namespace department IDs, e.g. `wecom` yields
    /// `wecom_12`.
    #[serde(default = "default_flag")]
    pub flag: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Resolved secret (populated by `resolve_env_vars`).
    #[serde(skip)]
    pub corp_secret: Option<String>,
}

fn default_api_url() -> String {
    "https://qyapi.weixin.qq.com".into()
}
fn default_flag() -> String {
    "wecom".into()
}
fn default_timeout() -> u64 {
    30
}

impl WeComConfig {
    /// Return the resolved corp secret, or an error naming the variable that
    /// should have provided it.
    pub fn secret(&self) -> Result<&str, ConfigError> {
        self.corp_secret
            .as_deref()
            .ok_or_else(|| ConfigError::EnvVarMissing {
                var: self.corp_secret_env.clone(),
                field: "wecom.corp_secret_env".into(),
            })
    }
}

// ---------------------------------------------------------------------------
// Email
// ---------------------------------------------------------------------------

/// Domains used to synthesize an address when the source value is malformed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Fallback domain for the personal `email` field.
    #[serde(default = "default_personal_domain")]
    pub personal_fallback_domain: String,

    /// Fallback domain for the `biz_mail` field.
    #[serde(default = "default_biz_domain")]
    pub biz_fallback_domain: String,
}

fn default_personal_domain() -> String {
    DEFAULT_PERSONAL_FALLBACK_DOMAIN.into()
}
fn default_biz_domain() -> String {
    DEFAULT_BIZ_FALLBACK_DOMAIN.into()
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            personal_fallback_domain: default_personal_domain(),
            biz_fallback_domain: default_biz_domain(),
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Log output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum tracing level or `EnvFilter` directive.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & resolving
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Load an [`AppConfig`] from a TOML file at the given path.
    ///
    /// This does **not** resolve environment variables -- call
    /// [`resolve_env_vars`](Self::resolve_env_vars) afterwards.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Resolve `*_env` fields from environment variables.
    ///
    /// A missing variable logs a warning but does not fail; commands that
    /// talk to the API call [`WeComConfig::secret`] to enforce it.
    pub fn resolve_env_vars(&mut self) -> Result<(), ConfigError> {
        info!("resolving environment variable references in config");
        self.wecom.corp_secret =
            resolve_optional_env(&self.wecom.corp_secret_env, "wecom.corp_secret_env");
        Ok(())
    }

    /// Validate that all required fields are present and sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wecom.corp_id.trim().is_empty() {
            return Err(invalid("wecom.corp_id", "corp ID must not be empty"));
        }
        if self.wecom.corp_secret_env.trim().is_empty() {
            return Err(invalid(
                "wecom.corp_secret_env",
                "secret environment variable name must not be empty",
            ));
        }
        if !self.wecom.api_url.starts_with("http://") && !self.wecom.api_url.starts_with("https://")
        {
            return Err(invalid("wecom.api_url", "API URL must be http(s)"));
        }
        let flag = &self.wecom.flag;
        if flag.is_empty()
            || flag.chars().any(char::is_whitespace)
            || flag.chars().all(|c| c == '_')
        {
            return Err(invalid(
                "wecom.flag",
                "flag needs a non-underscore character and no whitespace",
            ));
        }
        if self.wecom.timeout_secs == 0 {
            return Err(invalid("wecom.timeout_secs", "timeout must be > 0"));
        }
        check_domain(
            "email.personal_fallback_domain",
            &self.email.personal_fallback_domain,
        )?;
        check_domain("email.biz_fallback_domain", &self.email.biz_fallback_domain)?;

        Ok(())
    }

    /// Convenience: load, resolve, and validate in one call.
    pub fn load_and_resolve<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.resolve_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    /// The static values the record assembler needs.
    pub fn assembly_settings(&self) -> AssemblySettings {
        AssemblySettings {
            flag: self.wecom.flag.clone(),
            personal_fallback_domain: self.email.personal_fallback_domain.clone(),
            biz_fallback_domain: self.email.biz_fallback_domain.clone(),
        }
    }
}

fn invalid(field: &str, detail: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        detail: detail.into(),
    }
}

/// A fallback domain is only usable if the addresses it produces pass the
/// same validation applied to source emails.
fn check_domain(field: &str, domain: &str) -> Result<(), ConfigError> {
    if validate_email(&format!("probe@{domain}")) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field: field.into(),
            detail: format!("'{domain}' does not produce valid email addresses"),
        })
    }
}

/// Try to read an environment variable by name. Returns `Some(value)` on
/// success; logs a warning and returns `None` if the variable is unset.
fn resolve_optional_env(env_name: &str, field: &str) -> Option<String> {
    match std::env::var(env_name) {
        Ok(val) if !val.is_empty() => {
            debug!(field, env_name, "resolved env var");
            Some(val)
        }
        Ok(_) => {
            warn!(field, env_name, "env var is set but empty");
            None
        }
        Err(_) => {
            warn!(field, env_name, "env var not set");
            None
        }
    }
}
