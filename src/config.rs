use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::models::AnonymousViewPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,

    // Voting policy
    pub anonymous_views: AnonymousViewPolicy,
    pub resurrect_on_mark_correct: bool,
    pub vote_rate_limit_per_hour: u32,

    // Repair job
    pub reconcile_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            redis_url: lookup("REDIS_URL").filter(|url| !url.trim().is_empty()),
            jwt_secret: lookup("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: lookup("PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            allowed_origins: lookup("ALLOWED_ORIGINS")
                .unwrap_or_else(|| "http://localhost:3000".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),

            anonymous_views: match lookup("ANONYMOUS_VIEW_POLICY") {
                Some(raw) => raw.parse().map_err(|reason| ConfigError::Invalid {
                    name: "ANONYMOUS_VIEW_POLICY",
                    reason,
                })?,
                None => AnonymousViewPolicy::default(),
            },
            resurrect_on_mark_correct: match lookup("RESURRECT_ON_MARK_CORRECT") {
                Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                    name: "RESURRECT_ON_MARK_CORRECT",
                    reason: format!("expected true or false, got {}", raw),
                })?,
                None => true,
            },
            vote_rate_limit_per_hour: lookup("VOTE_RATE_LIMIT_PER_HOUR")
                .unwrap_or_else(|| "100".to_string())
                .parse()
                .unwrap_or(100),

            reconcile_interval: Duration::from_secs(
                lookup("RECONCILE_INTERVAL_SECS")
                    .unwrap_or_else(|| "3600".to_string())
                    .parse()
                    .unwrap_or(3600),
            ),
        })
    }
}
