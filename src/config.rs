use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Gula";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GOOGLE_REDIRECT_URI: &str = "http://localhost:8000/auth/google/callback";
pub const DEFAULT_JWT_EXPIRATION_SECS: i64 = 86_400;
pub const DEFAULT_PDF_MAX_SIZE_MB: u64 = 10;
/// One year.
pub const MAX_JWT_EXPIRATION_SECS: i64 = 366 * 86_400;
pub const MAX_PDF_SIZE_MB: u64 = 1024;

const DEVELOPMENT_JWT_SECRET: &str = "gula-development-secret-change-me";
const DEVELOPMENT_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://127.0.0.1:3000",
    "http://localhost:8000",
];

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be set in production")]
    Missing(&'static str),

    #[error("Cannot determine home directory")]
    NoHomeDir,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

/// Default `tracing` filter when `RUST_LOG` is not set.
pub fn default_log_filter(environment: Environment) -> &'static str {
    match environment {
        Environment::Development => "info,gula=debug",
        Environment::Production => "info",
    }
}

/// Get the application data directory (~/Gula/)
pub fn app_data_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(APP_NAME))
}

/// Gemini extraction settings. Present only when an API key is configured.
#[derive(Debug, Clone, PartialEq)]
pub struct GeminiSettings {
    pub api_key: String,
    pub base_url: String,
    /// Fixed model; `None` selects from the models the API lists.
    pub model: Option<String>,
    pub timeout_secs: u64,
}

/// Google OAuth settings. Present only when client id and secret are set.
#[derive(Debug, Clone, PartialEq)]
pub struct GoogleSettings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
    pub jwt_secret: String,
    pub jwt_expiration_secs: i64,
    pub allowed_origins: Vec<String>,
    pub frontend_url: String,
    pub pdf_max_size_mb: u64,
    pub password_hash_iterations: u32,
    pub gemini: Option<GeminiSettings>,
    pub google: Option<GoogleSettings>,
}

impl AppConfig {
    pub fn uses_development_jwt_secret(&self) -> bool {
        self.jwt_secret == DEVELOPMENT_JWT_SECRET
    }

    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source. Empty values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let environment = match get("GULA_ENV").as_deref() {
            None | Some("development") => Environment::Development,
            Some("production") => Environment::Production,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "GULA_ENV",
                    value: other.to_string(),
                    reason: "expected development or production".into(),
                })
            }
        };

        let bind_addr = parse_var("GULA_BIND_ADDR", get("GULA_BIND_ADDR"), DEFAULT_BIND_ADDR)?;

        let database_path = match get("GULA_DATABASE_PATH") {
            Some(path) => PathBuf::from(path),
            None => app_data_dir()?.join("gula.db"),
        };

        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret,
            None if environment.is_production() => return Err(ConfigError::Missing("JWT_SECRET")),
            None => DEVELOPMENT_JWT_SECRET.to_string(),
        };

        let jwt_expiration_secs: i64 = parse_var(
            "JWT_EXPIRATION",
            get("JWT_EXPIRATION"),
            &DEFAULT_JWT_EXPIRATION_SECS.to_string(),
        )?;
        check_range("JWT_EXPIRATION", jwt_expiration_secs, 1, MAX_JWT_EXPIRATION_SECS)?;

        let allowed_origins = match get("ALLOWED_ORIGINS") {
            Some(list) => list
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            None if environment.is_production() => Vec::new(),
            None => DEVELOPMENT_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        let frontend_url = get("FRONTEND_URL")
            .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let pdf_max_size_mb = parse_var(
            "PDF_MAX_SIZE_MB",
            get("PDF_MAX_SIZE_MB"),
            &DEFAULT_PDF_MAX_SIZE_MB.to_string(),
        )?;
        check_range("PDF_MAX_SIZE_MB", pdf_max_size_mb, 1, MAX_PDF_SIZE_MB)?;

        let password_hash_iterations = parse_var(
            "PASSWORD_HASH_ITERATIONS",
            get("PASSWORD_HASH_ITERATIONS"),
            &crate::auth::PBKDF2_ITERATIONS.to_string(),
        )?;

        let gemini = get("GEMINI_API_KEY").map(|api_key| GeminiSettings {
            api_key,
            base_url: get("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            model: get("GEMINI_MODEL"),
            timeout_secs: 120,
        });

        let google = match (get("GOOGLE_CLIENT_ID"), get("GOOGLE_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(GoogleSettings {
                client_id,
                client_secret,
                redirect_uri: get("GOOGLE_REDIRECT_URI")
                    .unwrap_or_else(|| DEFAULT_GOOGLE_REDIRECT_URI.to_string()),
            }),
            _ => None,
        };

        Ok(Self {
            environment,
            bind_addr,
            database_path,
            jwt_secret,
            jwt_expiration_secs,
            allowed_origins,
            frontend_url,
            pdf_max_size_mb,
            password_hash_iterations,
            gemini,
            google,
        })
    }
}

fn parse_var<T>(var: &'static str, value: Option<String>, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = value.unwrap_or_else(|| default.to_string());
    raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        value: raw.clone(),
        reason: e.to_string(),
    })
}

fn check_range<T>(var: &'static str, value: T, min: T, max: T) -> Result<(), ConfigError>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min || value > max {
        return Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: format!("must be between {min} and {max}"),
        });
    }
    Ok(())
}
