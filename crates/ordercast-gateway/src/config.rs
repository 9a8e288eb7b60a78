//! Configuration for the Ordercast gateway.

use std::{net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::replay::{ReplayPolicy, DEFAULT_TOLERANCE_SECS};

const CONFIG_FILE: &str = "config.toml";

/// Canonical name of the signature header.
pub const DEFAULT_SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// Deprecated header name still sent by one legacy integration path.
///
/// Consulted only when the canonical header is absent; every use is
/// logged so the sender can be migrated and this constant removed.
pub const FALLBACK_SIGNATURE_HEADER: &str = "X-Commerce-Signature";

/// Complete service configuration with defaults, file, and environment
/// overrides.
///
/// Configuration is loaded in priority order:
/// 1. Environment variables (highest priority)
/// 2. Configuration file (`config.toml`)
/// 3. Built-in defaults (lowest priority)
///
/// The gateway boots without a signing secret but rejects every delivery
/// with a 500 until one is configured; the storefront and mailer settings
/// are required only when the shipped handler set is wired in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Webhook verification
    /// Shared secret for HMAC signature verification.
    ///
    /// Environment variable: `WEBHOOK_SECRET`
    #[serde(default, alias = "WEBHOOK_SECRET")]
    pub webhook_secret: Option<String>,
    /// Name of the header carrying the signature.
    ///
    /// Environment variable: `SIGNATURE_HEADER`
    #[serde(default = "default_signature_header", alias = "SIGNATURE_HEADER")]
    pub signature_header: String,
    /// Freshness tolerance for embedded timestamps, in seconds.
    ///
    /// Environment variable: `REPLAY_TOLERANCE_SECONDS`
    #[serde(default = "default_replay_tolerance", alias = "REPLAY_TOLERANCE_SECONDS")]
    pub replay_tolerance_seconds: u64,
    /// Reject (instead of pass) deliveries with an unparseable `t=` value.
    ///
    /// Environment variable: `REPLAY_FAIL_CLOSED`
    #[serde(default, alias = "REPLAY_FAIL_CLOSED")]
    pub replay_fail_closed: bool,

    // Storefront API (handlers only)
    /// GraphQL endpoint of the commerce backend.
    ///
    /// Environment variable: `STOREFRONT_API_URL`
    #[serde(default, alias = "STOREFRONT_API_URL")]
    pub storefront_api_url: Option<String>,
    /// Bearer token for the commerce backend.
    ///
    /// Environment variable: `STOREFRONT_API_TOKEN`
    #[serde(default, alias = "STOREFRONT_API_TOKEN")]
    pub storefront_api_token: Option<String>,

    // Mailer (handlers only)
    /// Endpoint of the transactional email service.
    ///
    /// Environment variable: `MAILER_API_URL`
    #[serde(default, alias = "MAILER_API_URL")]
    pub mailer_api_url: Option<String>,
    /// API token for the email service.
    ///
    /// Environment variable: `MAILER_API_TOKEN`
    #[serde(default, alias = "MAILER_API_TOKEN")]
    pub mailer_api_token: Option<String>,
    /// Sender address for outgoing notifications.
    ///
    /// Environment variable: `MAILER_FROM`
    #[serde(default = "default_mailer_from", alias = "MAILER_FROM")]
    pub mailer_from: String,

    // Server
    /// Server bind address.
    ///
    /// Environment variable: `HOST`
    #[serde(default = "default_host", alias = "HOST")]
    pub host: String,
    /// Server bind port.
    ///
    /// Environment variable: `PORT`
    #[serde(default = "default_port", alias = "PORT")]
    pub port: u16,
    /// HTTP request timeout in seconds.
    ///
    /// Environment variable: `REQUEST_TIMEOUT`
    #[serde(default = "default_request_timeout", alias = "REQUEST_TIMEOUT")]
    pub request_timeout: u64,

    // Logging
    /// Log level configuration.
    ///
    /// Environment variable: `RUST_LOG`
    #[serde(default = "default_log_level", alias = "RUST_LOG")]
    pub rust_log: String,
}

impl Config {
    /// Loads configuration from defaults, config file, and environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns an error when extraction or validation fails.
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(""));

        let config: Self = figment.extract().context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// The replay tolerance as a [`Duration`].
    pub const fn replay_tolerance(&self) -> Duration {
        Duration::from_secs(self.replay_tolerance_seconds)
    }

    /// The malformed-timestamp policy selected by configuration.
    pub const fn replay_policy(&self) -> ReplayPolicy {
        if self.replay_fail_closed {
            ReplayPolicy::FailClosed
        } else {
            ReplayPolicy::FailOpen
        }
    }

    /// Parses the server socket address from host and port.
    ///
    /// # Errors
    ///
    /// Returns an error when host and port do not form a valid address.
    pub fn parse_server_addr(&self) -> Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.host, self.port);
        SocketAddr::from_str(&addr_str).context("Invalid server address")
    }

    /// Validates configuration values.
    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("port must be greater than 0");
        }

        if self.signature_header.trim().is_empty() {
            anyhow::bail!("signature_header must not be blank");
        }

        if self.replay_tolerance_seconds == 0 {
            anyhow::bail!("replay_tolerance_seconds must be greater than 0");
        }

        if let Some(secret) = &self.webhook_secret {
            if secret.is_empty() {
                anyhow::bail!("webhook_secret must not be empty when set");
            }
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            webhook_secret: None,
            signature_header: default_signature_header(),
            replay_tolerance_seconds: default_replay_tolerance(),
            replay_fail_closed: false,
            storefront_api_url: None,
            storefront_api_token: None,
            mailer_api_url: None,
            mailer_api_token: None,
            mailer_from: default_mailer_from(),
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
            rust_log: default_log_level(),
        }
    }
}

fn default_signature_header() -> String {
    DEFAULT_SIGNATURE_HEADER.to_string()
}

fn default_replay_tolerance() -> u64 {
    DEFAULT_TOLERANCE_SECS
}

fn default_mailer_from() -> String {
    "orders@example.com".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, env, sync::Mutex};

    use super::*;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    struct TestEnvGuard {
        _lock: std::sync::MutexGuard<'static, ()>,
        vars: Vec<String>,
        originals: HashMap<String, Option<String>>,
    }

    impl TestEnvGuard {
        fn new() -> Self {
            let lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            Self { _lock: lock, vars: Vec::new(), originals: HashMap::new() }
        }

        fn set_var(&mut self, key: &str, value: &str) {
            if !self.vars.contains(&key.to_string()) {
                self.originals.insert(key.to_string(), env::var(key).ok());
                self.vars.push(key.to_string());
            }
            env::set_var(key, value);
        }
    }

    impl Drop for TestEnvGuard {
        fn drop(&mut self) {
            for var in &self.vars {
                match self.originals.get(var) {
                    Some(Some(value)) => env::set_var(var, value),
                    Some(None) => env::remove_var(var),
                    None => {},
                }
            }
        }
    }

    #[test]
    fn defaults_are_valid_and_secretless() {
        let config = Config::default();

        assert!(config.validate().is_ok());
        assert!(config.webhook_secret.is_none());
        assert_eq!(config.signature_header, "X-Webhook-Signature");
        assert_eq!(config.replay_tolerance_seconds, 300);
        assert_eq!(config.replay_policy(), ReplayPolicy::FailOpen);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn env_overrides_take_priority() {
        let mut guard = TestEnvGuard::new();
        guard.set_var("WEBHOOK_SECRET", "whsec_env");
        guard.set_var("SIGNATURE_HEADER", "X-Custom-Signature");
        guard.set_var("REPLAY_TOLERANCE_SECONDS", "60");
        guard.set_var("REPLAY_FAIL_CLOSED", "true");
        guard.set_var("PORT", "9090");

        let config = Config::load().expect("Config should load with env overrides");

        assert_eq!(config.webhook_secret.as_deref(), Some("whsec_env"));
        assert_eq!(config.signature_header, "X-Custom-Signature");
        assert_eq!(config.replay_tolerance(), Duration::from_secs(60));
        assert_eq!(config.replay_policy(), ReplayPolicy::FailClosed);
        assert_eq!(config.port, 9090);
    }

    #[test]
    fn invalid_values_fail_validation() {
        let mut config = Config::default();
        config.port = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.signature_header = "  ".to_string();
        assert!(config.validate().is_err());

        config = Config::default();
        config.replay_tolerance_seconds = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.webhook_secret = Some(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn socket_address_parsing() {
        let mut config = Config::default();
        config.host = "0.0.0.0".to_string();
        config.port = 9000;

        let addr = config.parse_server_addr().expect("Should parse socket address");

        assert_eq!(addr.ip().to_string(), "0.0.0.0");
        assert_eq!(addr.port(), 9000);
    }
}
