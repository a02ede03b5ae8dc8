pub mod client;
pub mod config;
pub mod metrics;

pub use client::{ApiClient, DashboardApi};
pub use config::Settings;
pub use metrics::MetricsProvider;
