//! Server settings loaded from environment variables.

use crate::error::ConfigError;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::InvalidSetting {
                name: "LOG_FORMAT",
                value: s.to_string(),
            }),
        }
    }
}

/// | Env var              | Default                        |
/// |----------------------|--------------------------------|
/// | `DATABASE_URL`       | `postgres://localhost/lending` |
/// | `BIND_ADDR`          | `0.0.0.0:8000`                 |
/// | `DB_MAX_CONNECTIONS` | `5`                            |
/// | `MODEL_PATH`         | embedded lending model         |
/// | `BODY_LIMIT_BYTES`   | `1048576`                      |
/// | `LOG_FORMAT`         | `text` (`json` also accepted)  |
#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: String,
    pub max_connections: u32,
    pub model_path: Option<PathBuf>,
    pub body_limit_bytes: usize,
    pub log_format: LogFormat,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from any variable source (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Settings {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| "postgres://localhost/lending".into()),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8000".into()),
            max_connections: parse_or("DB_MAX_CONNECTIONS", lookup("DB_MAX_CONNECTIONS"), 5)?,
            model_path: lookup("MODEL_PATH").filter(|s| !s.is_empty()).map(PathBuf::from),
            body_limit_bytes: parse_or("BODY_LIMIT_BYTES", lookup("BODY_LIMIT_BYTES"), 1024 * 1024)?,
            log_format: lookup("LOG_FORMAT").map(|s| s.parse()).transpose()?.unwrap_or_default(),
        })
    }
}

fn parse_or<T: FromStr>(name: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidSetting { name, value: v }),
    }
}
