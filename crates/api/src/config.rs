use std::env;

const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("DATABASE_URL must be set")]
    MissingDatabaseUrl,
    #[error("PORT is not a valid port number: {0}")]
    InvalidPort(String),
}

/// Deployment environment, from `APP_ENV`. Anything other than
/// "production" is treated as development.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn is_production(self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// Process configuration, read once at startup and injected through
/// `AppState` rather than consulted ambiently.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub environment: Environment,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)?;

        let port = match env::var("PORT") {
            Ok(raw) => parse_port(&raw)?,
            Err(_) => DEFAULT_PORT,
        };

        let environment = env::var("APP_ENV")
            .map(|v| Environment::parse(&v))
            .unwrap_or(Environment::Development);

        Ok(Self {
            database_url,
            port,
            environment,
        })
    }
}

fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    raw.trim()
        .parse::<u16>()
        .map_err(|_| ConfigError::InvalidPort(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parsing() {
        assert_eq!(Environment::parse("production"), Environment::Production);
        assert_eq!(Environment::parse("PRODUCTION"), Environment::Production);
        assert_eq!(Environment::parse("development"), Environment::Development);
        assert_eq!(Environment::parse(""), Environment::Development);
        assert!(Environment::Production.is_production());
        assert!(!Environment::Development.is_production());
    }

    #[test]
    fn port_parsing() {
        assert_eq!(parse_port("8080").unwrap(), 8080);
        assert_eq!(parse_port(" 3000 ").unwrap(), 3000);
        assert!(parse_port("not-a-port").is_err());
        assert!(parse_port("70000").is_err());
    }
}
