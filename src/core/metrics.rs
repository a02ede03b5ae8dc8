/// Host metrics sampling
///
/// `MetricsProvider` backs the three read endpoints. Every call to
/// `sample()` takes a fresh sysinfo reading; nothing is cached, so a
/// snapshot is always current. Polling frequency is the caller's problem
/// (the dashboard refreshes every few seconds at most), which keeps this
/// side stateless and trivially safe under concurrent requests.

use anyhow::{bail, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sysinfo::{Disks, System, MINIMUM_CPU_UPDATE_INTERVAL};

use crate::core::config::Settings;

/// One sampled reading of host utilization plus deployment identity.
///
/// Fields are optional on the wire: the provider always fills them, but a
/// client decoding a snapshot from an older or degraded backend tolerates
/// absent fields and renders a fallback instead of failing the whole view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemSnapshot {
    #[serde(default)]
    pub cpu_percent: Option<f64>,
    #[serde(default)]
    pub memory_percent: Option<f64>,
    #[serde(default)]
    pub disk_percent: Option<f64>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GreetingPayload {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthPayload {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
}

pub struct MetricsProvider {
    environment: String,
    hostname_override: Option<String>,
    greeting_message: String,
}

impl MetricsProvider {
    pub fn new(settings: &Settings) -> Self {
        Self {
            environment: settings.environment.clone(),
            hostname_override: settings.hostname.clone(),
            greeting_message: settings.greeting_message.clone(),
        }
    }

    /// Greeting with the crate version and a per-call RFC 3339 timestamp
    pub fn greeting(&self) -> GreetingPayload {
        GreetingPayload {
            message: Some(self.greeting_message.clone()),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
            timestamp: Some(Utc::now().to_rfc3339()),
        }
    }

    /// Liveness payload for /health
    pub fn health(&self) -> HealthPayload {
        HealthPayload {
            status: Some("healthy".to_string()),
            timestamp: Some(Utc::now().to_rfc3339()),
            service: Some("backend".to_string()),
        }
    }

    /// Take a fresh snapshot of CPU, memory and root-disk utilization.
    ///
    /// CPU usage needs two refreshes separated by sysinfo's minimum update
    /// interval (~200ms) to measure a delta. Disk occupancy can be missing
    /// inside minimal containers; that surfaces as `None` rather than an
    /// error so the rest of the snapshot stays usable.
    pub async fn sample(&self) -> Result<SystemSnapshot> {
        let mut sys = System::new();

        sys.refresh_cpu();
        tokio::time::sleep(MINIMUM_CPU_UPDATE_INTERVAL).await;
        sys.refresh_cpu();
        let cpu_percent = sys.global_cpu_info().cpu_usage() as f64;

        sys.refresh_memory();
        let total = sys.total_memory();
        if total == 0 {
            bail!("memory totals unavailable from the OS");
        }
        let memory_percent = sys.used_memory() as f64 / total as f64 * 100.0;

        let hostname = self
            .hostname_override
            .clone()
            .or_else(System::host_name)
            .unwrap_or_else(|| "unknown".to_string());

        Ok(SystemSnapshot {
            cpu_percent: Some(clamp_percent(cpu_percent)),
            memory_percent: Some(clamp_percent(memory_percent)),
            disk_percent: root_disk_percent().map(clamp_percent),
            hostname: Some(hostname),
            environment: Some(self.environment.clone()),
        })
    }
}

/// Used/total ratio of the filesystem mounted at `/`, or the largest
/// mounted filesystem when no root mount is visible
fn root_disk_percent() -> Option<f64> {
    let disks = Disks::new_with_refreshed_list();

    let disk = disks
        .iter()
        .find(|d| d.mount_point() == std::path::Path::new("/"))
        .or_else(|| disks.iter().max_by_key(|d| d.total_space()))?;

    let total = disk.total_space();
    if total == 0 {
        return None;
    }
    let used = total.saturating_sub(disk.available_space());
    Some(used as f64 / total as f64 * 100.0)
}

fn clamp_percent(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> MetricsProvider {
        MetricsProvider::new(&Settings::default())
    }

    #[tokio::test]
    async fn test_sample_percentages_within_bounds() {
        let snapshot = provider().sample().await.unwrap();

        let cpu = snapshot.cpu_percent.unwrap();
        let memory = snapshot.memory_percent.unwrap();
        assert!((0.0..=100.0).contains(&cpu));
        assert!((0.0..=100.0).contains(&memory));
        if let Some(disk) = snapshot.disk_percent {
            assert!((0.0..=100.0).contains(&disk));
        }
        assert!(!snapshot.hostname.unwrap().is_empty());
        assert_eq!(snapshot.environment.as_deref(), Some("development"));
    }

    #[tokio::test]
    async fn test_consecutive_samples_are_stable() {
        let provider = provider();
        let first = provider.sample().await.unwrap();
        let second = provider.sample().await.unwrap();

        // Memory and disk barely move between back-to-back samples; CPU is
        // excluded because it legitimately spikes under test load.
        let mem_delta =
            (first.memory_percent.unwrap() - second.memory_percent.unwrap()).abs();
        assert!(mem_delta < 15.0, "memory moved {mem_delta} points");

        if let (Some(a), Some(b)) = (first.disk_percent, second.disk_percent) {
            assert!((a - b).abs() < 1.0);
        }
    }

    #[test]
    fn test_greeting_carries_version_and_timestamp() {
        let greeting = provider().greeting();

        assert_eq!(greeting.version.as_deref(), Some(env!("CARGO_PKG_VERSION")));
        assert!(!greeting.message.unwrap().is_empty());
        let ts = greeting.timestamp.unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }

    #[test]
    fn test_greeting_respects_configured_message() {
        let settings = Settings {
            greeting_message: "Hello from the staging box".to_string(),
            ..Settings::default()
        };
        let greeting = MetricsProvider::new(&settings).greeting();
        assert_eq!(greeting.message.as_deref(), Some("Hello from the staging box"));
    }

    #[test]
    fn test_snapshot_wire_format_is_flat() {
        let snapshot = SystemSnapshot {
            cpu_percent: Some(42.0),
            memory_percent: Some(55.0),
            disk_percent: Some(10.0),
            hostname: Some("pi".to_string()),
            environment: Some("production".to_string()),
        };
        let value = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(value["cpu_percent"], 42.0);
        assert_eq!(value["memory_percent"], 55.0);
        assert_eq!(value["disk_percent"], 10.0);
        assert_eq!(value["hostname"], "pi");
        assert_eq!(value["environment"], "production");
    }

    #[test]
    fn test_decode_tolerates_missing_fields() {
        let snapshot: SystemSnapshot =
            serde_json::from_str(r#"{"cpu_percent": 12.5}"#).unwrap();
        assert_eq!(snapshot.cpu_percent, Some(12.5));
        assert_eq!(snapshot.hostname, None);
        assert_eq!(snapshot.environment, None);

        let greeting: GreetingPayload = serde_json::from_str("{}").unwrap();
        assert_eq!(greeting.message, None);
    }

    #[test]
    fn test_clamp_percent() {
        assert_eq!(clamp_percent(-1.0), 0.0);
        assert_eq!(clamp_percent(50.0), 50.0);
        assert_eq!(clamp_percent(101.3), 100.0);
    }
}
