// Runtime configuration from the environment (optionally a .env file)

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::{MetisError, Result};

pub const ENV_BIND_ADDR: &str = "METIS_BIND_ADDR";
pub const ENV_GRADUATES_PATH: &str = "METIS_GRADUATES_PATH";
pub const ENV_CORS_ORIGINS: &str = "METIS_CORS_ORIGINS";
pub const ENV_LOG_FORMAT: &str = "METIS_LOG_FORMAT";

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_CORS_ORIGINS: [&str; 3] = [
    "http://localhost:3000",
    "http://localhost:5173",
    "http://127.0.0.1:5173",
];

/// Graduates spreadsheet shipped with the service
pub fn default_graduates_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("data")
        .join("Base_Egresados_Ficticia_1000.xlsx")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Which origins may call the API from a browser
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub graduates_path: PathBuf,
    pub cors_origins: CorsOrigins,
    pub log_format: LogFormat,
}

impl Config {
    /// Load from the process environment, reading `.env` first if present
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unset or blank values take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = get(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr.parse::<SocketAddr>().map_err(|e| {
            MetisError::Config(format!("{} '{}' is not a socket address: {}", ENV_BIND_ADDR, bind_addr, e))
        })?;

        let graduates_path = get(ENV_GRADUATES_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(default_graduates_path);

        let cors_origins = match get(ENV_CORS_ORIGINS) {
            None => CorsOrigins::List(DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect()),
            Some(raw) => parse_origins(&raw)?,
        };

        let log_format = match get(ENV_LOG_FORMAT).as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("pretty") | Some("text") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(MetisError::Config(format!(
                    "{} must be 'pretty' or 'json', got '{}'",
                    ENV_LOG_FORMAT, other
                )))
            }
        };

        Ok(Config {
            bind_addr,
            graduates_path,
            cors_origins,
            log_format,
        })
    }
}

fn parse_origins(raw: &str) -> Result<CorsOrigins> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();

    if origins.iter().any(|o| o == "*") {
        return Ok(CorsOrigins::Any);
    }

    if let Some(bad) = origins
        .iter()
        .find(|o| !(o.starts_with("http://") || o.starts_with("https://")))
    {
        return Err(MetisError::Config(format!(
            "{} entry '{}' must start with http:// or https://",
            ENV_CORS_ORIGINS, bad
        )));
    }

    Ok(CorsOrigins::List(origins))
}
