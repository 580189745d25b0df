//! Application configuration management.
//!
//! Configuration is read from environment variables with `envy`, after an
//! optional `.env` file has been loaded.

use std::time::Duration;

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `DATABASE_MAX_CONNECTIONS` (optional): pool size, defaults to 5
/// - `SUMMARY_CACHE_TTL_SECS` (optional): lifetime of cached summaries, defaults to 60
/// - `CORS_ALLOWED_ORIGIN` (optional): the only origin allowed; any origin when unset
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,

    #[serde(default = "default_summary_cache_ttl_secs")]
    pub summary_cache_ttl_secs: u64,

    #[serde(default)]
    pub cors_allowed_origin: Option<String>,
}

fn default_port() -> u16 {
    3000
}

fn default_max_connections() -> u32 {
    5
}

fn default_summary_cache_ttl_secs() -> u64 {
    60
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` is missing or a value cannot be
    /// parsed into its expected type.
    pub fn from_env() -> Result<Self, envy::Error> {
        // Missing .env is fine
        dotenvy::dotenv().ok();

        Self::from_vars(std::env::vars())
    }

    /// Build configuration from explicit key/value pairs.
    pub fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(vars)
    }

    pub fn summary_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.summary_cache_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_vars(vars(&[("DATABASE_URL", "postgres://localhost/finance")]))
            .unwrap();

        assert_eq!(config.server_port, 3000);
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.summary_cache_ttl(), Duration::from_secs(60));
        assert_eq!(config.cors_allowed_origin, None);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_vars(vars(&[
            ("DATABASE_URL", "postgres://localhost/finance"),
            ("SERVER_PORT", "8080"),
            ("SUMMARY_CACHE_TTL_SECS", "5"),
            ("CORS_ALLOWED_ORIGIN", "http://localhost:5173"),
        ]))
        .unwrap();

        assert_eq!(config.server_port, 8080);
        assert_eq!(config.summary_cache_ttl_secs, 5);
        assert_eq!(
            config.cors_allowed_origin.as_deref(),
            Some("http://localhost:5173")
        );
    }

    #[test]
    fn database_url_is_required() {
        assert!(Config::from_vars(vars(&[("SERVER_PORT", "8080")])).is_err());
    }

    #[test]
    fn bad_port_is_rejected() {
        assert!(
            Config::from_vars(vars(&[
                ("DATABASE_URL", "postgres://localhost/finance"),
                ("SERVER_PORT", "not-a-port"),
            ]))
            .is_err()
        );
    }
}
