//! Health check reporting
//!
//! Probes both stores and summarizes what the service currently holds.

use crate::service::app::AppState;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::error;

/// Health check status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: HealthStatus,
    pub service: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub uptime_seconds: u64,
    pub checks: Vec<ComponentCheck>,
    pub stats: ServiceStats,
}

/// Individual component health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentCheck {
    pub name: String,
    pub status: HealthStatus,
    /// Set when the component is not healthy
    pub message: Option<String>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceStats {
    pub players: usize,
    pub matches: usize,
}

impl HealthCheck {
    /// Probe the stores and gather counts
    pub fn check(app_state: &AppState) -> Self {
        let mut stats = ServiceStats::default();

        let ratings = app_state.ratings();
        let ratings_check = component("rating_storage", || {
            stats.players = ratings.get_player_count()?;
            Ok(())
        });

        let matches = app_state.matches();
        let matches_check = component("match_store", || {
            stats.matches = matches.match_count()?;
            Ok(())
        });

        let checks = vec![ratings_check, matches_check];
        let status = overall_status(&checks);

        HealthCheck {
            status,
            service: app_state.config().service.name.clone(),
            version: crate::VERSION.to_string(),
            timestamp: chrono::Utc::now(),
            uptime_seconds: app_state.uptime().as_secs(),
            checks,
            stats,
        }
    }
}

fn component(
    name: &str,
    probe: impl FnOnce() -> crate::error::Result<()>,
) -> ComponentCheck {
    let start = Instant::now();

    let (status, message) = match probe() {
        Ok(()) => (HealthStatus::Healthy, None),
        Err(e) => {
            error!("Health probe '{}' failed: {}", name, e);
            (HealthStatus::Unhealthy, Some(e.to_string()))
        }
    };

    ComponentCheck {
        name: name.to_string(),
        status,
        message,
        duration_ms: start.elapsed().as_millis() as u64,
    }
}

fn overall_status(checks: &[ComponentCheck]) -> HealthStatus {
    if checks.iter().any(|c| c.status == HealthStatus::Unhealthy) {
        HealthStatus::Unhealthy
    } else if checks.iter().any(|c| c.status == HealthStatus::Degraded) {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn test_fresh_state_is_healthy() {
        let state = AppState::new(AppConfig::default()).unwrap();
        state
            .link_player(&"guild-1".to_string(), &"p1".to_string(), None, None, None)
            .unwrap();

        let health = HealthCheck::check(&state);
        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(health.service, "squad-balancer");
        assert_eq!(health.stats.players, 1);
        assert_eq!(health.stats.matches, 0);
        assert_eq!(health.checks.len(), 2);
    }

    #[test]
    fn test_overall_status_takes_worst() {
        let check = |status| ComponentCheck {
            name: "c".to_string(),
            status,
            message: None,
            duration_ms: 0,
        };
        assert_eq!(
            overall_status(&[check(HealthStatus::Healthy), check(HealthStatus::Degraded)]),
            HealthStatus::Degraded
        );
        assert_eq!(
            overall_status(&[check(HealthStatus::Unhealthy), check(HealthStatus::Degraded)]),
            HealthStatus::Unhealthy
        );
    }
}
