use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub mail: MailConfig,
    pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Directory holding the single-page app shell (`index.html`).
    pub static_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_secs: u64,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// No host means mail is only logged.
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    #[serde(skip_serializing)]
    pub smtp_password: Option<String>,
    pub from: String,
    pub app_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set in production")]
    MissingJwtSecret,
}

const DEV_JWT_SECRET: &str = "hello";
const WEEK_SECS: u64 = 7 * 24 * 60 * 60;

/// Parses a token lifetime such as `7d`, `12h`, `30m`, `45s` or a bare
/// number of seconds.
pub fn parse_expiry(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    let (digits, multiplier) = match raw.char_indices().last()? {
        (i, 'd') => (&raw[..i], 24 * 60 * 60),
        (i, 'h') => (&raw[..i], 60 * 60),
        (i, 'm') => (&raw[..i], 60),
        (i, 's') => (&raw[..i], 1),
        _ => (raw, 1),
    };
    let value: u64 = digits.trim().parse().ok()?;
    if value == 0 {
        return None;
    }
    value.checked_mul(multiplier)
}

fn non_empty(value: String) -> Option<String> {
    let value = value.trim().to_string();
    (!value.is_empty()).then_some(value)
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Preset for the environment, then specific env vars on top
        let config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides();

        if config.security.jwt_secret.is_empty() {
            return Err(ConfigError::MissingJwtSecret);
        }
        Ok(config)
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("PORT").or_else(|_| env::var("TECHIT_PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Some(v) = env::var("STATIC_DIR").ok().and_then(non_empty) {
            self.server.static_dir = v;
        }

        // Database overrides
        if let Some(v) = env::var("DATABASE_URL").ok().and_then(non_empty) {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout =
                v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Security overrides
        if let Some(v) = env::var("JWT_SECRET").ok().and_then(non_empty) {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRE") {
            self.security.jwt_expiry_secs = parse_expiry(&v).unwrap_or(self.security.jwt_expiry_secs);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Mail overrides
        if let Some(v) = env::var("SMTP_HOST").ok().and_then(non_empty) {
            self.mail.smtp_host = Some(v);
        }
        if let Ok(v) = env::var("SMTP_PORT") {
            self.mail.smtp_port = v.parse().unwrap_or(self.mail.smtp_port);
        }
        if let Some(v) = env::var("SMTP_USERNAME").ok().and_then(non_empty) {
            self.mail.smtp_username = Some(v);
        }
        if let Some(v) = env::var("SMTP_PASSWORD").ok().and_then(non_empty) {
            self.mail.smtp_password = Some(v);
        }
        if let Some(v) = env::var("APP_EMAIL").ok().and_then(non_empty) {
            self.mail.from = v;
        }
        if let Some(v) = env::var("APP_URL").ok().and_then(non_empty) {
            self.mail.app_url = v.trim_end_matches('/').to_string();
        }

        if let Some(v) = env::var("LOG_LEVEL").ok().and_then(non_empty) {
            self.log_level = v;
        }

        self
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                static_dir: "public".to_string(),
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            security: SecurityConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                jwt_expiry_secs: WEEK_SECS,
                enable_cors: true,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
            },
            mail: MailConfig {
                smtp_host: None,
                smtp_port: 25,
                smtp_username: None,
                smtp_password: None,
                from: "techit@localhost.localdomain".to_string(),
                app_url: "http://localhost:3000".to_string(),
            },
            log_level: "debug".to_string(),
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config.security.cors_origins = vec!["https://staging.example.com".to_string()];
        config.log_level = "info".to_string();
        config
    }

    fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.database.max_connections = 50;
        config.database.connection_timeout = 5;
        // No fallback secret in production; from_env refuses to start without one.
        config.security.jwt_secret = String::new();
        config.security.cors_origins = vec![];
        config.log_level = "info".to_string();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_expiry_units() {
        assert_eq!(parse_expiry("7d"), Some(WEEK_SECS));
        assert_eq!(parse_expiry("12h"), Some(12 * 3600));
        assert_eq!(parse_expiry("30m"), Some(1800));
        assert_eq!(parse_expiry("45s"), Some(45));
        assert_eq!(parse_expiry(" 3600 "), Some(3600));
    }

    #[test]
    fn test_parse_expiry_rejects_garbage() {
        assert_eq!(parse_expiry(""), None);
        assert_eq!(parse_expiry("d"), None);
        assert_eq!(parse_expiry("0"), None);
        assert_eq!(parse_expiry("7w"), None);
        assert_eq!(parse_expiry("-5m"), None);
    }

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(config.is_development());
        assert_eq!(config.security.jwt_expiry_secs, WEEK_SECS);
        assert_eq!(config.security.jwt_secret, "hello");
        assert!(config.mail.smtp_host.is_none());
        assert_eq!(config.mail.smtp_port, 25);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(config.security.jwt_secret.is_empty());
        assert_eq!(config.database.max_connections, 50);
        assert!(!config.is_development());
    }
}
