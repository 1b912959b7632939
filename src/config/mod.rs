//! Configuration management for the squad-balancer service
//!
//! Defaults, TOML file loading, environment overrides and validation.

pub mod app;

pub use app::{validate_config, AppConfig, BalancingSettings, RatingSettings, ServiceSettings};
