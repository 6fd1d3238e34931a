//! Configuration for the storefront service.
//!
//! Values are layered: built-in defaults, then the YAML file named by `--config`, then
//! `STOREFRONT_*` environment variables (nested keys separated by `__`, e.g.
//! `STOREFRONT_AUTH__SESSION__TIMEOUT=12h`). `DATABASE_URL` is honoured as well.

use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;
use url::Url;

#[derive(Parser, Debug, Clone)]
#[command(name = "storefront", about = "Digital goods storefront backend")]
pub struct Args {
    /// Path to the YAML configuration file
    #[arg(short = 'f', long, env = "STOREFRONT_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate the configuration and exit
    #[arg(long)]
    pub validate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Email of the admin account ensured at startup (only when `admin_password` is set)
    pub admin_email: String,
    pub admin_password: Option<String>,
    /// Key used to sign session tokens. A random per-process key is used when unset.
    pub secret_key: Option<String>,
    pub enable_metrics: bool,
    pub auth: AuthConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Whether `is_admin: true` in a registration request is honoured
    pub allow_admin_registration: bool,
    pub password: PasswordConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordConfig {
    pub min_length: usize,
    pub max_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<CorsOrigin>,
    pub allow_credentials: bool,
    /// Preflight cache time in seconds
    pub max_age: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CorsOrigin {
    Wildcard,
    Url(Url),
}

impl TryFrom<String> for CorsOrigin {
    type Error = url::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim() == "*" {
            Ok(CorsOrigin::Wildcard)
        } else {
            Url::parse(value.trim()).map(CorsOrigin::Url)
        }
    }
}

impl From<CorsOrigin> for String {
    fn from(origin: CorsOrigin) -> Self {
        match origin {
            CorsOrigin::Wildcard => "*".to_string(),
            // Url always renders a trailing slash for bare origins, browsers send none
            CorsOrigin::Url(url) => url.as_str().trim_end_matches('/').to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8001,
            database_url: "postgres://localhost/storefront".to_string(),
            admin_email: "admin@example.com".to_string(),
            admin_password: None,
            secret_key: None,
            enable_metrics: false,
            auth: AuthConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            allow_admin_registration: false,
            password: PasswordConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 64,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![CorsOrigin::Wildcard],
            allow_credentials: false,
            max_age: Some(3600),
        }
    }
}

impl Config {
    pub fn load(args: &Args) -> anyhow::Result<Self> {
        let mut config: Config = Self::figment(args).extract()?;

        if config.secret_key.is_none() {
            warn!("No secret_key configured, generating an ephemeral one. Sessions will not survive a restart.");
            let key: String = rand::thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect();
            config.secret_key = Some(key);
        }

        config.validate()?;
        Ok(config)
    }

    fn figment(args: &Args) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("STOREFRONT_").split("__"))
            .merge(Env::raw().filter(|key| key.as_str().eq_ignore_ascii_case("database_url")))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database_url.trim().is_empty() {
            anyhow::bail!("database_url must not be empty");
        }
        if self.auth.password.min_length == 0 || self.auth.password.min_length > self.auth.password.max_length {
            anyhow::bail!(
                "invalid password bounds: min_length={} max_length={}",
                self.auth.password.min_length,
                self.auth.password.max_length
            );
        }
        if self.auth.session.timeout.is_zero() {
            anyhow::bail!("auth.session.timeout must be greater than zero");
        }
        if self.security.cors.allow_credentials && self.security.cors.allowed_origins.contains(&CorsOrigin::Wildcard) {
            anyhow::bail!("security.cors.allow_credentials cannot be combined with a wildcard origin");
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
