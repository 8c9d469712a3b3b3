/// Configuration management for VidTube
use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub authentication: AuthConfig,
    pub cors: CorsConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    /// Base URL media links are built from
    pub public_url: String,
    pub upload_limit: usize,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub database: PathBuf,
    pub media_directory: PathBuf,
    /// Staging area for multipart uploads
    pub temp_directory: PathBuf,
}

/// Session token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub access_token_secret: String,
    pub access_token_expiry: Duration,
    pub refresh_token_secret: String,
    pub refresh_token_expiry: Duration,
    /// Mark session cookies `Secure`; only disable for local plain-HTTP development
    pub secure_cookies: bool,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed origin, `*` for any
    pub origin: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> ApiResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("VIDTUBE_HOSTNAME").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("VIDTUBE_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .map_err(|_| ApiError::InvalidInput("Invalid port number".to_string()))?;
        let public_url = env::var("VIDTUBE_PUBLIC_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", port));
        let upload_limit = env::var("VIDTUBE_UPLOAD_LIMIT")
            .unwrap_or_else(|_| "104857600".to_string())
            .parse()
            .unwrap_or(104_857_600);

        let data_directory: PathBuf = env::var("VIDTUBE_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let database = env::var("VIDTUBE_DATABASE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("vidtube.sqlite"));
        let media_directory = env::var("VIDTUBE_MEDIA_DIRECTORY")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("media"));
        let temp_directory = env::var("VIDTUBE_TEMP_DIRECTORY")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("temp"));

        let access_token_secret = env::var("ACCESS_TOKEN_SECRET")
            .map_err(|_| ApiError::InvalidInput("ACCESS_TOKEN_SECRET required".to_string()))?;
        let access_token_expiry =
            parse_expiry(&env::var("ACCESS_TOKEN_EXPIRY").unwrap_or_else(|_| "1d".to_string()))?;
        let refresh_token_secret = env::var("REFRESH_TOKEN_SECRET")
            .map_err(|_| ApiError::InvalidInput("REFRESH_TOKEN_SECRET required".to_string()))?;
        let refresh_token_expiry =
            parse_expiry(&env::var("REFRESH_TOKEN_EXPIRY").unwrap_or_else(|_| "10d".to_string()))?;
        let secure_cookies = env::var("VIDTUBE_SECURE_COOKIES")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        let origin = env::var("CORS_ORIGIN").unwrap_or_else(|_| "*".to_string());
        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                public_url,
                upload_limit,
            },
            storage: StorageConfig {
                data_directory,
                database,
                media_directory,
                temp_directory,
            },
            authentication: AuthConfig {
                access_token_secret,
                access_token_expiry,
                refresh_token_secret,
                refresh_token_expiry,
                secure_cookies,
            },
            cors: CorsConfig { origin },
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> ApiResult<()> {
        if self.service.hostname.is_empty() {
            return Err(ApiError::InvalidInput("Hostname cannot be empty".to_string()));
        }

        let auth = &self.authentication;
        if auth.access_token_secret.len() < 32 || auth.refresh_token_secret.len() < 32 {
            return Err(ApiError::InvalidInput(
                "Token secrets must be at least 32 characters".to_string(),
            ));
        }

        if auth.access_token_secret == auth.refresh_token_secret {
            return Err(ApiError::InvalidInput(
                "Access and refresh token secrets must differ".to_string(),
            ));
        }

        if auth.access_token_expiry >= auth.refresh_token_expiry {
            return Err(ApiError::InvalidInput(
                "Access token expiry must be shorter than refresh token expiry".to_string(),
            ));
        }

        Ok(())
    }
}

/// Longest accepted token lifetime, 100 years
const MAX_EXPIRY_SECS: u64 = 100 * 365 * 86_400;

/// Parse an expiry such as `15m`, `1d` or a bare number of seconds
pub fn parse_expiry(raw: &str) -> ApiResult<Duration> {
    let raw = raw.trim();
    let invalid = || ApiError::InvalidInput(format!("Invalid token expiry: {}", raw));

    let (digits, unit) = match raw.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&raw[..idx], c),
        Some(_) => (raw, 's'),
        None => return Err(invalid()),
    };

    let amount: u64 = digits.parse().map_err(|_| invalid())?;
    let unit_seconds = match unit.to_ascii_lowercase() {
        's' => 1,
        'm' => 60,
        'h' => 3600,
        'd' => 86_400,
        _ => return Err(invalid()),
    };
    let seconds = amount.checked_mul(unit_seconds).ok_or_else(invalid)?;

    if seconds == 0 || seconds > MAX_EXPIRY_SECS {
        return Err(invalid());
    }

    Ok(Duration::from_secs(seconds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_parse_expiry() {
        assert_eq!(parse_expiry("1d").unwrap(), Duration::from_secs(86_400));
        assert_eq!(parse_expiry("15m").unwrap(), Duration::from_secs(900));
        assert_eq!(parse_expiry("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_expiry("30").unwrap(), Duration::from_secs(30));
        assert_err!(parse_expiry(""));
        assert_err!(parse_expiry("d"));
        assert_err!(parse_expiry("10w"));
        assert_err!(parse_expiry("0s"));
        assert_err!(parse_expiry("99999999999999999999d"));
        assert_err!(parse_expiry("999999999999999999d"));
        assert_err!(parse_expiry("18446744073709551615"));
        assert_ok!(parse_expiry("36500d"));
    }

    #[test]
    fn test_validate_rejects_shared_secret() {
        let mut config = crate::testing::test_config();
        assert_ok!(config.validate());

        config.authentication.refresh_token_secret =
            config.authentication.access_token_secret.clone();
        assert_err!(config.validate());
    }

    #[test]
    fn test_validate_rejects_inverted_expiries() {
        let mut config = crate::testing::test_config();
        config.authentication.access_token_expiry = Duration::from_secs(864_000);
        config.authentication.refresh_token_expiry = Duration::from_secs(86_400);
        assert_err!(config.validate());
    }
}
