/// Configuration management for the API server
///
/// This module loads configuration from environment variables once at
/// start-up into an immutable [`Config`], which is then shared through
/// `AppState`.
///
/// # Environment Variables
///
/// - `API_HOST` / `API_PORT`: Bind address (default: 0.0.0.0:3000)
/// - `DEBUG`: Include `details` in error responses (default: false)
/// - `CORS_ORIGINS`: Comma-separated allowed origins, or `*` (default: *)
/// - `BASE_URL`: Public base URL used in verification links
/// - `PUBLIC_DIR` / `TEMP_DIR`: Static files root and upload staging dir
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Secret key for JWT signing (required, >= 32 chars)
/// - `JWT_EXPIRES_IN_SECS`: Session lifetime (default: 82800, 23 hours)
/// - `SMTP_HOST`, `SMTP_PORT`, `SMTP_TLS`, `SMTP_USERNAME`, `SMTP_PASSWORD`,
///   `MAIL_FROM_NAME`, `MAIL_FROM_ADDRESS`: Mail transport
/// - `AVATAR_FALLBACK_URL`: Second avatar candidate probed at registration
/// - `RUST_LOG`: Log filter
///
/// # Example
///
/// ```no_run
/// use contacts_api::config::Config;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}:{}", config.api.host, config.api.port);
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use contacts_shared::mail::MailConfig;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Mail transport configuration
    pub mail: MailConfig,

    /// Avatar configuration
    pub avatar: AvatarConfig,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Include diagnostic `details` in error bodies
    pub debug: bool,

    /// Allowed CORS origins; `["*"]` allows any
    pub cors_origins: Vec<String>,

    /// Public base URL, without trailing slash
    pub base_url: String,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// IMPORTANT: This must be kept secret and should be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Token lifetime in seconds
    pub expires_in_secs: i64,
}

/// Avatar storage configuration
#[derive(Debug, Clone)]
pub struct AvatarConfig {
    /// Root of statically served files; avatars live in `<public_dir>/avatars`
    pub public_dir: PathBuf,

    /// Upload staging directory
    pub temp_dir: PathBuf,

    /// Probed after Gravatar when a user registers
    pub fallback_url: Option<String>,
}

/// Default session lifetime: 23 hours
pub const DEFAULT_JWT_EXPIRES_IN_SECS: i64 = 23 * 60 * 60;

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = var("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = parse_or(&var, "API_PORT", 3000)?;
        let debug = parse_flag(&var, "DEBUG", false)?;

        let cors_origins = var("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let base_url = var("BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{}", port))
            .trim_end_matches('/')
            .to_string();

        let database_url =
            var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;
        let max_connections: u32 = parse_or(&var, "DATABASE_MAX_CONNECTIONS", 10)?;

        let jwt_secret = var("JWT_SECRET").context("JWT_SECRET environment variable is required")?;
        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }
        let expires_in_secs: i64 = parse_or(&var, "JWT_EXPIRES_IN_SECS", DEFAULT_JWT_EXPIRES_IN_SECS)?;
        if expires_in_secs <= 0 {
            anyhow::bail!("JWT_EXPIRES_IN_SECS must be positive");
        }

        let defaults = MailConfig::default();
        let mail = MailConfig {
            smtp_host: var("SMTP_HOST"),
            smtp_port: parse_or(&var, "SMTP_PORT", defaults.smtp_port)?,
            smtp_tls: parse_flag(&var, "SMTP_TLS", defaults.smtp_tls)?,
            smtp_username: var("SMTP_USERNAME"),
            smtp_password: var("SMTP_PASSWORD"),
            from_name: var("MAIL_FROM_NAME").unwrap_or(defaults.from_name),
            from_address: var("MAIL_FROM_ADDRESS"),
        };

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                debug,
                cors_origins,
                base_url,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                expires_in_secs,
            },
            mail,
            avatar: AvatarConfig {
                public_dir: var("PUBLIC_DIR").unwrap_or_else(|| "public".to_string()).into(),
                temp_dir: var("TEMP_DIR").unwrap_or_else(|| "tmp".to_string()).into(),
                fallback_url: var("AVATAR_FALLBACK_URL"),
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("{} has an invalid value '{}'", key, value)),
        None => Ok(default),
    }
}

fn parse_flag<F>(var: &F, key: &str, default: bool) -> anyhow::Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match var(key).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
        Some(v) => anyhow::bail!("{} has an invalid boolean value '{}'", key, v),
    }
}
