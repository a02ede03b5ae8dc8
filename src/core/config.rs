/// Runtime configuration
///
/// Everything ambient is resolved exactly once at process start and carried
/// in an explicit `Settings` value; the metrics provider and the dashboard
/// both take it at construction time so each can be tested in isolation.
///
/// Resolution order: environment variables win over the persisted
/// preferences file (~/.config/pulse-cli/config.toml), which wins over
/// built-in defaults. A `.env` file in the working directory is loaded
/// into the environment by main() before this runs.

use std::time::Duration;

use crate::utils::AppConfig;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5001";
pub const DEFAULT_ENVIRONMENT: &str = "development";
pub const DEFAULT_GREETING: &str = "Hello from the Pulse backend";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_REFRESH: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct Settings {
    /// Deployment tag reported in every snapshot ("production", "staging", ...)
    pub environment: String,
    /// Overrides the hostname detected from the OS
    pub hostname: Option<String>,
    /// Message served by the hello endpoint
    pub greeting_message: String,
    /// Base URL the dashboard and status command poll
    pub api_base_url: String,
    /// Per-request timeout; a timed-out fetch is an ordinary fetch failure
    pub request_timeout: Duration,
    /// Dashboard auto-refresh interval
    pub refresh_interval: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: DEFAULT_ENVIRONMENT.to_string(),
            hostname: None,
            greeting_message: DEFAULT_GREETING.to_string(),
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout: DEFAULT_TIMEOUT,
            refresh_interval: DEFAULT_REFRESH,
        }
    }
}

impl Settings {
    /// Resolve settings from the process environment and the preferences file
    pub fn from_env() -> Self {
        let prefs = AppConfig::load().ok();
        Self::from_sources(|key| std::env::var(key).ok(), prefs)
    }

    /// Resolve settings from an explicit variable lookup, for testability
    pub fn from_sources<F>(env: F, prefs: Option<AppConfig>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let prefs = prefs.unwrap_or_default();

        let api_base_url = env("PULSE_API_URL")
            .or(prefs.api_url)
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base_url);

        let refresh_interval = env("PULSE_REFRESH")
            .and_then(|v| humantime::parse_duration(&v).ok())
            .or_else(|| prefs.refresh_secs.map(Duration::from_secs))
            .unwrap_or(defaults.refresh_interval);

        let request_timeout = env("PULSE_TIMEOUT")
            .and_then(|v| humantime::parse_duration(&v).ok())
            .unwrap_or(defaults.request_timeout);

        Self {
            environment: env("APP_ENV").unwrap_or(defaults.environment),
            hostname: env("HOSTNAME").filter(|h| !h.is_empty()),
            greeting_message: env("PULSE_GREETING").unwrap_or(defaults.greeting_message),
            api_base_url,
            request_timeout,
            refresh_interval,
        }
    }
}
