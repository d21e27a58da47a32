use std::env;
use std::fmt;

use auth::HashingCost;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;

type ConfigBuilderState = config::builder::ConfigBuilder<config::builder::DefaultState>;
use serde::Deserialize;

/// Minimum HS256 signing key length in bytes.
pub const MIN_JWT_SECRET_BYTES: usize = 32;

/// Profile used when `RUN_MODE` is unset. Never seeds demo actors.
pub const DEFAULT_RUN_MODE: &str = "production";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub password: PasswordConfig,
    #[serde(default)]
    pub provisioning: ProvisioningConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig").field("secret", &"***").finish()
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    /// Answer unknown ids with 401 instead of 404
    #[serde(default)]
    pub conceal_unknown_actor: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        let cost = HashingCost::default();
        Self {
            memory_kib: cost.memory_kib,
            iterations: cost.iterations,
            parallelism: cost.parallelism,
        }
    }
}

impl PasswordConfig {
    pub fn cost(&self) -> HashingCost {
        HashingCost {
            memory_kib: self.memory_kib,
            iterations: self.iterations,
            parallelism: self.parallelism,
        }
    }
}

#[derive(Deserialize, Clone, Default)]
pub struct ProvisioningConfig {
    #[serde(default)]
    pub seed_demo_data: bool,
    /// Password given to every seeded demo actor
    #[serde(default)]
    pub demo_password: Option<String>,
}

impl fmt::Debug for ProvisioningConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisioningConfig")
            .field("seed_demo_data", &self.seed_demo_data)
            .field("demo_password", &self.demo_password.as_ref().map(|_| "***"))
            .finish()
    }
}

fn default_max_connections() -> u32 {
    5
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, JWT__SECRET, etc.)
    /// 2. Environment-specific config file (config/{RUN_MODE}.toml, `production` when unset)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| DEFAULT_RUN_MODE.to_string());

        let configuration = file_sources(&run_mode)
            // Layer on environment variables (with __ as separator)
            // Example: JWT__SECRET=... overrides jwt.secret
            .add_source(Environment::default().separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Reject settings the service must not start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.len() < MIN_JWT_SECRET_BYTES {
            return Err(ConfigError::Message(format!(
                "jwt.secret must be at least {} bytes",
                MIN_JWT_SECRET_BYTES
            )));
        }

        let has_demo_password = self
            .provisioning
            .demo_password
            .as_deref()
            .is_some_and(|p| !p.is_empty());
        if self.provisioning.seed_demo_data && !has_demo_password {
            return Err(ConfigError::Message(
                "provisioning.demo_password is required when seed_demo_data is enabled"
                    .to_string(),
            ));
        }

        Ok(())
    }
}

fn file_sources(run_mode: &str) -> ConfigBuilderState {
    ConfigBuilder::builder()
        // Start with default configuration
        .add_source(File::with_name("config/default").required(false))
        // Layer on environment-specific configuration
        .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
}
