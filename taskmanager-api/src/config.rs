/// Configuration management for the API server
///
/// Configuration is read from environment variables, after loading `.env`
/// if one is present.
///
/// # Environment Variables
///
/// - `API_HOST` / `API_PORT`: bind address (default: 0.0.0.0:8080)
/// - `CORS_ORIGINS`: comma-separated origins, `*` for any (default: `*`)
/// - `PRODUCTION`: enables HSTS (default: false)
/// - `SLOW_REQUEST_THRESHOLD_MS`: slow-request warning threshold (default: 1000)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
/// - `JWT_SECRET`: HS256 signing key, at least 32 characters (required)
/// - `JWT_ISSUER` / `JWT_AUDIENCE`: token issuer and audience
/// - `JWT_ACCESS_TOKEN_EXPIRY_MINUTES`: access-token lifetime (default: 60)
/// - `JWT_REFRESH_TOKEN_EXPIRY_DAYS`: refresh-token lifetime (default: 7)
/// - `FILE_STORAGE_BASE_PATH`: attachment directory (default: ./storage/attachments)
/// - `SEED_ADMIN` / `ADMIN_PASSWORD`: create the default admin on startup
///
/// # Example
///
/// ```no_run
/// use taskmanager_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use taskmanager_shared::auth::jwt::{
    JwtSettings, DEFAULT_ACCESS_TOKEN_MINUTES, DEFAULT_AUDIENCE, DEFAULT_ISSUER,
    DEFAULT_REFRESH_TOKEN_DAYS,
};

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
    pub seed: SeedConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `["*"]` allows any origin
    pub cors_origins: Vec<String>,

    /// Adds `Strict-Transport-Security` to responses
    pub production: bool,

    /// Requests slower than this are logged at WARN
    pub slow_request_threshold_ms: u64,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Must be kept secret and be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_token_expiry_minutes: i64,
    pub refresh_token_expiry_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for attachment files
    pub base_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    pub admin_enabled: bool,
    pub admin_password: String,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing, a number or flag
    /// cannot be parsed, or `JWT_SECRET` is too short.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        Ok(Self {
            api: ApiConfig {
                host: env_or("API_HOST", "0.0.0.0"),
                port: parse_env("API_PORT", 8080)?,
                cors_origins: parse_origins(&env_or("CORS_ORIGINS", "*")),
                production: parse_flag("PRODUCTION", false)?,
                slow_request_threshold_ms: parse_env("SLOW_REQUEST_THRESHOLD_MS", 1000)?,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 10)?,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                issuer: env_or("JWT_ISSUER", DEFAULT_ISSUER),
                audience: env_or("JWT_AUDIENCE", DEFAULT_AUDIENCE),
                access_token_expiry_minutes: parse_env(
                    "JWT_ACCESS_TOKEN_EXPIRY_MINUTES",
                    DEFAULT_ACCESS_TOKEN_MINUTES,
                )?,
                refresh_token_expiry_days: parse_env(
                    "JWT_REFRESH_TOKEN_EXPIRY_DAYS",
                    DEFAULT_REFRESH_TOKEN_DAYS,
                )?,
            },
            storage: StorageConfig {
                base_path: env_or("FILE_STORAGE_BASE_PATH", "./storage/attachments"),
            },
            seed: SeedConfig {
                admin_enabled: parse_flag("SEED_ADMIN", true)?,
                admin_password: env_or("ADMIN_PASSWORD", "admin123"),
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Token settings for the auth service and middleware
    pub fn jwt_settings(&self) -> JwtSettings {
        JwtSettings {
            secret: self.jwt.secret.clone(),
            issuer: self.jwt.issuer.clone(),
            audience: self.jwt.audience.clone(),
            access_token_expiry_minutes: self.jwt.access_token_expiry_minutes,
            refresh_token_expiry_days: self.jwt.refresh_token_expiry_days,
        }
    }

    /// Whether any origin may call the API
    pub fn cors_allows_any(&self) -> bool {
        self.api.cors_origins.iter().any(|o| o == "*")
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value {:?}: {}", key, raw, e)),
        Err(_) => Ok(default),
    }
}

fn parse_flag(key: &str, default: bool) -> anyhow::Result<bool> {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => anyhow::bail!("{} must be true or false, got {:?}", key, raw),
        },
        Err(_) => Ok(default),
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();

    if origins.is_empty() {
        vec!["*".to_string()]
    } else {
        origins
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_origins: vec!["*".to_string()],
            production: false,
            slow_request_threshold_ms: 1000,
        },
        database: DatabaseConfig {
            url: "postgresql://localhost/test".to_string(),
            max_connections: 10,
        },
        jwt: JwtConfig {
            secret: "test-secret-key-at-least-32-bytes-long".to_string(),
            issuer: DEFAULT_ISSUER.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
            access_token_expiry_minutes: 60,
            refresh_token_expiry_days: 7,
        },
        storage: StorageConfig {
            base_path: "./storage/attachments".to_string(),
        },
        seed: SeedConfig {
            admin_enabled: false,
            admin_password: "admin123".to_string(),
        },
    }
}
