//! Configuration module
//!
//! Environment-driven configuration for the API service: server, database,
//! storage strategy, cloud credentials, and link-signing settings. MIME
//! allowlists and size ceilings are fixed policy (see `policy`), not
//! configuration.

use std::env;
use std::str::FromStr;

use crate::storage_types::StorageStrategy;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_SECURE_LINK_TTL_SECS: u64 = 3600;
const DEFAULT_LOCAL_STORAGE_PATH: &str = "./uploads";

/// Credentials for the cloud storage provider. All three parts are required
/// for the cloud strategy to be usable.
#[derive(Clone, Debug)]
pub struct CloudCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

/// Application configuration, loaded once at startup and immutable after.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    /// External base URL used to build local storage links.
    pub base_url: String,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub database_url: String,
    pub db_max_connections: u32,
    pub storage_strategy: StorageStrategy,
    pub local_storage_path: String,
    pub cloud_credentials: Option<CloudCredentials>,
    /// Secret for application-level capability tokens (secure links).
    pub secure_link_secret: String,
    pub secure_link_ttl_secs: u64,
    /// Secret for bearer authentication tokens.
    pub jwt_secret: String,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        // Best-effort .env loading for local development.
        dotenvy::dotenv().ok();

        let storage_strategy = env::var("STORAGE_STRATEGY")
            .ok()
            .map(|s| s.parse())
            .transpose()?
            .unwrap_or(StorageStrategy::Local);

        let cloud_credentials = match (
            env::var("CLOUDINARY_CLOUD_NAME").ok(),
            env::var("CLOUDINARY_API_KEY").ok(),
            env::var("CLOUDINARY_API_SECRET").ok(),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(CloudCredentials {
                cloud_name,
                api_key,
                api_secret,
            }),
            _ => None,
        };

        let server_port = env_parse("SERVER_PORT", DEFAULT_PORT);

        Ok(Config {
            server_port,
            base_url: env_or("BASE_URL", &format!("http://localhost:{}", server_port)),
            environment: env_or("ENVIRONMENT", "development"),
            cors_origins: env::var("CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL not configured"))?,
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
            storage_strategy,
            local_storage_path: env_or("LOCAL_STORAGE_PATH", DEFAULT_LOCAL_STORAGE_PATH),
            cloud_credentials,
            secure_link_secret: env_or("SECURE_LINK_SECRET", "dev-secure-link-secret"),
            secure_link_ttl_secs: env_parse("SECURE_LINK_TTL_SECS", DEFAULT_SECURE_LINK_TTL_SECS),
            jwt_secret: env_or("JWT_SECRET", "dev-jwt-secret"),
        })
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Reject configurations that must never reach production.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.is_production() {
            if self.secure_link_secret == "dev-secure-link-secret" {
                anyhow::bail!("SECURE_LINK_SECRET must be set in production");
            }
            if self.jwt_secret == "dev-jwt-secret" {
                anyhow::bail!("JWT_SECRET must be set in production");
            }
        }
        if self.secure_link_ttl_secs == 0 {
            anyhow::bail!("SECURE_LINK_TTL_SECS must be greater than zero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            server_port: 3000,
            base_url: "http://localhost:3000".to_string(),
            environment: "test".to_string(),
            cors_origins: vec![],
            database_url: "postgres://localhost/brix_test".to_string(),
            db_max_connections: 5,
            storage_strategy: StorageStrategy::Local,
            local_storage_path: "./uploads".to_string(),
            cloud_credentials: None,
            secure_link_secret: "test-secret".to_string(),
            secure_link_ttl_secs: 3600,
            jwt_secret: "test-jwt".to_string(),
        }
    }

    #[test]
    fn test_validate_accepts_dev_defaults_outside_production() {
        let mut config = test_config();
        config.secure_link_secret = "dev-secure-link-secret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_dev_secrets_in_production() {
        let mut config = test_config();
        config.environment = "production".to_string();
        config.secure_link_secret = "dev-secure-link-secret".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let mut config = test_config();
        config.secure_link_ttl_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_is_production() {
        let mut config = test_config();
        assert!(!config.is_production());
        config.environment = "PROD".to_string();
        assert!(config.is_production());
    }
}
