//! Configuration management for Shelfguard.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use tracing::info;

use crate::error::{Result, ShelfError};
use crate::ratelimit::{LimitPolicy, LimiterScope, DEFAULT_CAPACITY, DEFAULT_LEAK_RATE};

/// Prefix of environment variables that override file settings.
pub const ENV_PREFIX: &str = "SHELFGUARD";

/// Main configuration for the Shelfguard service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShelfConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limiting: RateLimitingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen address
    #[serde(default = "default_http_addr")]
    pub http_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
        }
    }
}

fn default_http_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitingConfig {
    /// Bucket capacity applied to every route without an override
    #[serde(default = "default_capacity")]
    pub capacity: u32,

    /// Leak rate (requests per second) applied to every route without an override
    #[serde(default = "default_leak_rate")]
    pub leak_rate: u32,

    /// Which requests share a limiter
    #[serde(default)]
    pub scope: LimiterScope,

    /// How often idle per-client limiters are swept, in seconds
    #[serde(default = "default_client_idle_secs")]
    pub client_idle_secs: u64,

    /// Policy overrides keyed by route name
    #[serde(default)]
    pub routes: HashMap<String, LimitPolicy>,
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            leak_rate: default_leak_rate(),
            scope: LimiterScope::default(),
            client_idle_secs: default_client_idle_secs(),
            routes: HashMap::new(),
        }
    }
}

fn default_capacity() -> u32 {
    DEFAULT_CAPACITY
}

fn default_leak_rate() -> u32 {
    DEFAULT_LEAK_RATE
}

fn default_client_idle_secs() -> u64 {
    60
}

impl RateLimitingConfig {
    /// The validated policy for routes without an override.
    pub fn default_policy(&self) -> Result<LimitPolicy> {
        LimitPolicy::new(self.capacity, self.leak_rate)
    }

    /// The validated policy for `route`.
    pub fn policy_for(&self, route: &str) -> Result<LimitPolicy> {
        match self.routes.get(route) {
            Some(policy) => {
                policy.validate().map_err(|e| match e {
                    ShelfError::Config(msg) => {
                        ShelfError::Config(format!("route '{}': {}", route, msg))
                    }
                    other => other,
                })?;
                Ok(*policy)
            }
            None => self.default_policy(),
        }
    }

    /// Validate the default policy and every override.
    pub fn validate(&self) -> Result<()> {
        self.default_policy()?;
        for route in self.routes.keys() {
            self.policy_for(route)?;
        }
        if self.scope == LimiterScope::PerClient && self.client_idle_secs == 0 {
            return Err(ShelfError::Config(
                "client_idle_secs must be positive with per_client scope".to_string(),
            ));
        }
        Ok(())
    }
}

impl ShelfConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading configuration file");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| ShelfError::Config(format!("Failed to parse configuration: {}", e)))
    }

    /// Load configuration from an optional YAML file layered under
    /// `SHELFGUARD__*` environment variables, e.g.
    /// `SHELFGUARD__RATE_LIMITING__CAPACITY=10`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Same as [`load`](Self::load), but reads overrides from `env` instead
    /// of the process environment when it is given.
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<::config::Map<String, String>>,
    ) -> Result<Self> {
        let mut builder = ::config::Config::builder();

        if let Some(path) = path {
            info!(path = %path.display(), "Loading configuration file");
            builder = builder.add_source(
                ::config::File::from(path)
                    .format(::config::FileFormat::Yaml)
                    .required(true),
            );
        }

        let settings = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?;

        let config: ShelfConfig = settings.try_deserialize()?;
        Ok(config)
    }

    /// Validate the configuration before anything is started.
    pub fn validate(&self) -> Result<()> {
        self.rate_limiting.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ShelfConfig::default();
        assert_eq!(config.server.http_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.rate_limiting.capacity, 3);
        assert_eq!(config.rate_limiting.leak_rate, 1);
        assert_eq!(config.rate_limiting.scope, LimiterScope::PerRoute);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
server:
  http_addr: 0.0.0.0:9000
rate_limiting:
  capacity: 10
  leak_rate: 2
  scope: per_client
  client_idle_secs: 30
  routes:
    create_book:
      capacity: 1
      leak_rate: 1
"#;
        let config = ShelfConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.server.http_addr, "0.0.0.0:9000".parse().unwrap());

        let limits = &config.rate_limiting;
        assert_eq!(limits.scope, LimiterScope::PerClient);
        assert_eq!(limits.client_idle_secs, 30);
        assert_eq!(limits.policy_for("list_books").unwrap(), LimitPolicy::new(10, 2).unwrap());
        assert_eq!(limits.policy_for("create_book").unwrap(), LimitPolicy::new(1, 1).unwrap());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = ShelfConfig::from_yaml("rate_limiting:\n  capacity: 7\n").unwrap();
        assert_eq!(config.rate_limiting.capacity, 7);
        assert_eq!(config.rate_limiting.leak_rate, 1);
        assert_eq!(config.server.http_addr, "127.0.0.1:8080".parse().unwrap());
    }

    #[test]
    fn test_invalid_default_policy_rejected() {
        let config = ShelfConfig::from_yaml("rate_limiting:\n  leak_rate: 0\n").unwrap();
        assert!(matches!(config.validate(), Err(ShelfError::Config(_))));
    }

    #[test]
    fn test_invalid_route_override_rejected() {
        let yaml = r#"
rate_limiting:
  routes:
    delete_book:
      capacity: 0
      leak_rate: 1
"#;
        let config = ShelfConfig::from_yaml(yaml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("delete_book"));
    }

    #[test]
    fn test_per_client_requires_sweep_interval() {
        let yaml = "rate_limiting:\n  scope: per_client\n  client_idle_secs: 0\n";
        let config = ShelfConfig::from_yaml(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_yaml_is_config_error() {
        let err = ShelfConfig::from_yaml("rate_limiting: [").unwrap_err();
        assert!(matches!(err, ShelfError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("shelfguard-{}.yaml", std::process::id()));
        std::fs::write(&path, "rate_limiting:\n  capacity: 4\n  scope: global\n").unwrap();

        let config = ShelfConfig::load(Some(&path)).unwrap();
        let plain = ShelfConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(plain.rate_limiting.capacity, 4);

        assert_eq!(config.rate_limiting.capacity, 4);
        assert_eq!(config.rate_limiting.scope, LimiterScope::Global);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let path = Path::new("/nonexistent/shelfguard.yaml");
        assert!(ShelfConfig::load(Some(path)).is_err());
    }

    #[test]
    fn test_env_overrides_file_and_defaults() {
        let path = std::env::temp_dir().join(format!("shelfguard-env-{}.yaml", std::process::id()));
        std::fs::write(&path, "rate_limiting:\n  capacity: 4\n  leak_rate: 2\n").unwrap();

        let mut env = ::config::Map::new();
        env.insert("SHELFGUARD__RATE_LIMITING__CAPACITY".to_string(), "10".to_string());
        env.insert("SHELFGUARD__RATE_LIMITING__SCOPE".to_string(), "global".to_string());
        env.insert("SHELFGUARD__SERVER__HTTP_ADDR".to_string(), "0.0.0.0:9000".to_string());
        env.insert("UNRELATED__CAPACITY".to_string(), "99".to_string());

        let config = ShelfConfig::load_with_env(Some(&path), Some(env)).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.rate_limiting.capacity, 10);
        assert_eq!(config.rate_limiting.scope, LimiterScope::Global);
        assert_eq!(config.rate_limiting.leak_rate, 2);
        assert_eq!(config.server.http_addr, "0.0.0.0:9000".parse().unwrap());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_override_read_from_process() {
        // No other test reads the listen address from `load`
        std::env::set_var("SHELFGUARD__SERVER__HTTP_ADDR", "127.0.0.1:9123");
        let config = ShelfConfig::load(None);
        std::env::remove_var("SHELFGUARD__SERVER__HTTP_ADDR");

        assert_eq!(config.unwrap().server.http_addr, "127.0.0.1:9123".parse().unwrap());
    }

    #[test]
    fn test_invalid_env_value_rejected() {
        let mut env = ::config::Map::new();
        env.insert("SHELFGUARD__RATE_LIMITING__SCOPE".to_string(), "per_planet".to_string());

        let err = ShelfConfig::load_with_env(None, Some(env)).unwrap_err();
        assert!(matches!(err, ShelfError::Config(_)));
    }
}
