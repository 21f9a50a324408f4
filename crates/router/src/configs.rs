//! Process configuration (§6's "Configuration" list), loaded from
//! `config/*.toml` with environment overrides, the way the teacher's
//! `router/src/configs` builds its `Settings` via the `config` crate.

use masking::Secret;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: Server,
    pub database: Database,
    pub redis: Redis,
    pub routing: Routing,
    pub rate_limit: RateLimit,
    pub idempotency: Idempotency,
    pub secrets: Secrets,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Database {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Redis {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// §4.7's environment-level routing fallback.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Routing {
    pub default_adapter: String,
}

impl Default for Routing {
    fn default() -> Self {
        Self {
            default_adapter: "mock".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimit {
    pub max_requests: u32,
    pub window_ms: u64,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window_ms: 60_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Idempotency {
    pub ttl_seconds: u64,
}

impl Default for Idempotency {
    fn default() -> Self {
        Self { ttl_seconds: 86_400 }
    }
}

/// The symmetric key used to seal short-lived card tokens in the KV store.
/// Falls back to a fixed development value so `cargo test`/local runs never
/// need a `.env`; production deployments MUST override it.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Secrets {
    pub encryption_key: Secret<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets").field("encryption_key", &self.encryption_key).finish()
    }
}

impl Default for Secrets {
    fn default() -> Self {
        Self {
            encryption_key: Secret::new("development-only-encryption-key".to_string()),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: Server::default(),
            database: Database::default(),
            redis: Redis::default(),
            routing: Routing::default(),
            rate_limit: RateLimit::default(),
            idempotency: Idempotency::default(),
            secrets: Secrets::default(),
        }
    }
}

impl Settings {
    /// Loads `config/development.toml` (or `config/$RUN_ENV.toml`), then
    /// applies `ROUTER__`-prefixed environment overrides, mirroring the
    /// teacher's layered `config::Config` setup.
    pub fn new() -> Result<Self, config::ConfigError> {
        let env = router_env::config::current_env();
        let env_file = format!("config/{env}.toml");

        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/development").required(false))
            .add_source(config::File::with_name(&env_file).required(false))
            .add_source(config::Environment::with_prefix("ROUTER").separator("__"));

        builder.build()?.try_deserialize()
    }
}
