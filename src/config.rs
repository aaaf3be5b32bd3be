use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Environment variable prefix for every configuration key.
pub const ENV_PREFIX: &str = "REGISTRY_";

/// Runtime configuration, layered as: built-in defaults, then `REGISTRY_*`
/// environment variables (a `.env` file is loaded into the environment by
/// `main` before extraction).
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    pub listen_addr: String,
    pub database_url: String,
    pub database_max_connections: u32,
    pub loglevel: String,
    /// Base URL of the identity provider (Supabase/GoTrue compatible).
    pub auth_url: String,
    /// Public API key sent as the `apikey` header on every provider call.
    pub auth_api_key: String,
    /// Service-role key for the provider's admin API. Without it the
    /// sign-up compensation step is skipped.
    pub auth_service_key: Option<String>,
    pub proxy: Option<Url>,
    pub auth_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            database_url: "sqlite:registry.db".to_string(),
            database_max_connections: 5,
            loglevel: "info".to_string(),
            auth_url: "http://127.0.0.1:54321".to_string(),
            auth_api_key: String::new(),
            auth_service_key: None,
            proxy: None,
            auth_timeout_secs: 15,
        }
    }
}

impl Config {
    /// Build the layered figment without extracting it.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default())).merge(Env::prefixed(ENV_PREFIX))
    }

    /// Extract the configuration from defaults and the process environment.
    pub fn from_env() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    pub fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth_timeout_secs.max(1))
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("listen_addr", &self.listen_addr)
            .field("database_url", &self.database_url)
            .field("database_max_connections", &self.database_max_connections)
            .field("loglevel", &self.loglevel)
            .field("auth_url", &self.auth_url)
            .field("auth_api_key", &"[REDACTED]")
            .field(
                "auth_service_key",
                &self.auth_service_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("proxy", &self.proxy.as_ref().map(Url::as_str))
            .field("auth_timeout_secs", &self.auth_timeout_secs)
            .finish()
    }
}
