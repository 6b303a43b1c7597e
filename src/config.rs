//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `REMITD_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `REMITD_` override YAML values
//! 3. **DATABASE_URL** - Special case: overrides `database.url` if set
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `REMITD_AUTH__NATIVE__ENABLED=false` sets the `auth.native.enabled` field.
//!
//! ## Configuration Structure
//!
//! - **Server**: `host`, `port` - HTTP server binding configuration
//! - **Database**: `database.url` - PostgreSQL connection settings
//! - **Admin User**: `admin_email`, `admin_password` - Initial admin user created on first startup
//! - **Authentication**: `auth.native`, `auth.security` - Session and password configuration
//! - **Fees**: `fees.transfer_fee_percent`, `fees.minimum_transfer_fee` - Transfer fee schedule
//! - **Currency**: `default_currency` - Currency assumed for catalog prices

use clap::Parser;
use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "REMITD_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines to catch config errors before deployment.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// This is the root configuration structure loaded from YAML and environment variables.
/// All fields have sensible defaults defined in the `Default` implementation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Email address for the initial admin user (created on first startup)
    pub admin_email: String,
    /// Password for the initial admin user (optional, can be set via environment)
    pub admin_password: Option<String>,
    /// Secret key for JWT signing (required for production)
    pub secret_key: Option<String>,
    /// Authentication configuration
    pub auth: AuthConfig,
    /// Transfer fee schedule
    pub fees: FeeConfig,
    /// Currency assumed for catalog prices and order totals
    pub default_currency: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            database: DatabaseConfig::default(),
            admin_email: "admin@localhost".to_string(),
            admin_password: None,
            secret_key: None,
            auth: AuthConfig::default(),
            fees: FeeConfig::default(),
            default_currency: "USD".to_string(),
        }
    }
}

/// PostgreSQL connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/remitd".to_string(),
            max_connections: 10,
        }
    }
}

/// Authentication configuration for the native (password) auth method
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Native (email + password) authentication settings
    pub native: NativeAuthConfig,
    /// Security settings shared by all auth methods
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct NativeAuthConfig {
    /// Whether native authentication is enabled
    pub enabled: bool,
    /// Whether self-service registration is allowed
    pub allow_registration: bool,
    /// Password requirements
    pub password: PasswordConfig,
    /// Session cookie settings
    pub session: SessionConfig,
}

impl Default for NativeAuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allow_registration: true,
            password: PasswordConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PasswordConfig {
    /// Minimum password length
    pub min_length: usize,
    /// Maximum password length (argon2 input cap)
    pub max_length: usize,
    /// Argon2 memory parameter in KiB
    pub argon2_memory_kib: u32,
    /// Argon2 iteration count
    pub argon2_iterations: u32,
    /// Argon2 parallelism
    pub argon2_parallelism: u32,
}

impl Default for PasswordConfig {
    /// Argon2id RFC recommendations
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 128,
            argon2_memory_kib: 19456, // 19 MB
            argon2_iterations: 2,
            argon2_parallelism: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Name of the session cookie
    pub cookie_name: String,
    /// Whether the cookie is marked Secure
    pub cookie_secure: bool,
    /// SameSite attribute for the cookie
    pub cookie_same_site: String,
    /// Session lifetime
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "remitd_session".to_string(),
            cookie_secure: true,
            cookie_same_site: "Strict".to_string(),
            timeout: Duration::from_secs(24 * 3600),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityConfig {
    /// JWT expiry for session tokens
    #[serde(with = "humantime_serde")]
    pub jwt_expiry: Duration,
    /// CORS settings
    pub cors: CorsConfig,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_expiry: Duration::from_secs(24 * 3600),
            cors: CorsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Origins allowed to call the API
    pub allowed_origins: Vec<CorsOrigin>,
    /// Whether credentialed requests are allowed
    pub allow_credentials: bool,
    /// Max-age for preflight caching, in seconds
    pub max_age: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![],
            allow_credentials: true,
            max_age: Some(3600),
        }
    }
}

/// A CORS origin: either the wildcard `*` or a concrete URL.
#[derive(Debug, Clone, PartialEq)]
pub enum CorsOrigin {
    Wildcard,
    Url(Url),
}

impl Serialize for CorsOrigin {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CorsOrigin::Wildcard => serializer.serialize_str("*"),
            CorsOrigin::Url(url) => serializer.serialize_str(url.as_str()),
        }
    }
}

impl<'de> Deserialize<'de> for CorsOrigin {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s == "*" {
            Ok(CorsOrigin::Wildcard)
        } else {
            Url::parse(&s).map(CorsOrigin::Url).map_err(serde::de::Error::custom)
        }
    }
}

/// Transfer fee schedule.
///
/// The fee is a flat percentage of the send amount, subject to a minimum.
/// Both values are configurable; the defaults match the product copy
/// (2.5% with a 1.50 minimum in the source currency).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeeConfig {
    /// Fee as a fraction of the send amount (0.025 = 2.5%)
    pub transfer_fee_percent: Decimal,
    /// Minimum fee charged on any transfer, in the source currency
    pub minimum_transfer_fee: Decimal,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            transfer_fee_percent: Decimal::new(25, 3), // 0.025
            minimum_transfer_fee: Decimal::new(150, 2), // 1.50
        }
    }
}

impl Config {
    /// Load configuration from YAML file and environment variables.
    ///
    /// Missing config files are not an error - defaults and environment
    /// variables are enough to run the service.
    pub fn load(args: &Args) -> Result<Self, Error> {
        let mut figment = Figment::new().merge(Yaml::file(&args.config)).merge(Env::prefixed("REMITD_").split("__"));

        // DATABASE_URL is the conventional deployment variable, so it wins over YAML
        if let Ok(database_url) = std::env::var("DATABASE_URL") {
            figment = figment.merge(("database.url", database_url));
        }

        let config: Config = figment.extract().map_err(|e| Error::Internal {
            operation: format!("load configuration: {e}"),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), Error> {
        if self.auth.native.enabled && self.secret_key.is_none() {
            return Err(Error::Internal {
                operation: "validate configuration: secret_key is required when native auth is enabled".to_string(),
            });
        }

        if self.fees.transfer_fee_percent < Decimal::ZERO || self.fees.transfer_fee_percent >= Decimal::ONE {
            return Err(Error::Internal {
                operation: format!(
                    "validate configuration: fees.transfer_fee_percent must be in [0, 1), got {}",
                    self.fees.transfer_fee_percent
                ),
            });
        }

        if self.fees.minimum_transfer_fee < Decimal::ZERO {
            return Err(Error::Internal {
                operation: "validate configuration: fees.minimum_transfer_fee must be non-negative".to_string(),
            });
        }

        Ok(())
    }
}
