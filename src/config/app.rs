//! Main application configuration
//!
//! Values come from defaults, optionally a TOML file, then environment
//! variables. The result is validated before use.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub balancing: BalancingSettings,
    pub rating: RatingSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Address the HTTP API binds to
    pub http_host: String,
    pub http_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// Team balancing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BalancingSettings {
    /// Number of best splits the random choice is made from
    pub top_k: usize,
}

/// Rating update and analysis settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingSettings {
    /// Elo K-factor
    pub k_factor: f64,
    /// Decisive matches counted by the recent accuracy figure
    pub recent_window: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "squad-balancer".to_string(),
            log_level: "info".to_string(),
            http_host: "0.0.0.0".to_string(),
            http_port: 8000,
            shutdown_timeout_seconds: 10,
        }
    }
}

impl Default for BalancingSettings {
    fn default() -> Self {
        Self {
            top_k: crate::balance::DEFAULT_TOP_K,
        }
    }
}

impl Default for RatingSettings {
    fn default() -> Self {
        Self {
            k_factor: crate::rating::DEFAULT_K_FACTOR,
            recent_window: 20,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load a TOML file, then apply environment overrides on top
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Ok(host) = env::var("HTTP_HOST") {
            self.service.http_host = host;
        }
        override_parsed("HTTP_PORT", &mut self.service.http_port)?;
        override_parsed(
            "SHUTDOWN_TIMEOUT_SECONDS",
            &mut self.service.shutdown_timeout_seconds,
        )?;

        // Balancing and rating settings
        override_parsed("TOP_K_CANDIDATES", &mut self.balancing.top_k)?;
        override_parsed("K_FACTOR", &mut self.rating.k_factor)?;
        override_parsed("ACCURACY_RECENT_WINDOW", &mut self.rating.recent_window)?;

        Ok(())
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// `host:port` the HTTP API binds to
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.service.http_host, self.service.http_port)
    }
}

fn override_parsed<T: FromStr>(var: &str, target: &mut T) -> Result<()> {
    if let Ok(value) = env::var(var) {
        *target = value
            .parse()
            .map_err(|_| anyhow!("Invalid {} value: {}", var, value))?;
    }
    Ok(())
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.http_port == 0 {
        return Err(anyhow!("HTTP port cannot be 0"));
    }
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }

    if config.balancing.top_k == 0 {
        return Err(anyhow!("Top-K candidate count must be greater than 0"));
    }

    if !config.rating.k_factor.is_finite() || config.rating.k_factor <= 0.0 {
        return Err(anyhow!(
            "K-factor must be a positive number, got {}",
            config.rating.k_factor
        ));
    }
    if config.rating.recent_window == 0 {
        return Err(anyhow!("Recent accuracy window must be greater than 0"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.balancing.top_k, 20);
        assert_eq!(config.rating.k_factor, 32.0);
        assert_eq!(config.http_addr(), "0.0.0.0:8000");
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = AppConfig::default();
        config.service.log_level = "loud".to_string();
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.balancing.top_k = 0;
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.rating.k_factor = f64::NAN;
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.rating.k_factor = -4.0;
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.rating.recent_window = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [balancing]
            top_k = 5

            [rating]
            k_factor = 24.0
            "#,
        )
        .unwrap();

        assert_eq!(config.balancing.top_k, 5);
        assert_eq!(config.rating.k_factor, 24.0);
        assert_eq!(config.rating.recent_window, 20);
        assert_eq!(config.service.http_port, 8000);
    }
}
