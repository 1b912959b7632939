//! Metrics for the squad-balancer service

pub mod collector;

pub use collector::MetricsCollector;
