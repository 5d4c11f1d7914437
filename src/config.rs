use crate::limits::{LEAD_TIME_ALERT_BUSINESS_DAYS, MAX_BOOKING_ATTEMPTS, RETRY_BACKOFF_BASE_MS};

/// Engine tuning knobs. Compile-time defaults come from [`crate::limits`];
/// embedding binaries can override them from the environment.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Search-and-reserve iterations before a conflict is surfaced.
    pub max_attempts: u32,
    /// Base of the exponential backoff between retries, in ms. 0 disables it.
    pub retry_backoff_ms: u64,
    /// Business days beyond which `confirm` raises a lead-time alert.
    pub lead_time_alert_days: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_attempts: MAX_BOOKING_ATTEMPTS,
            retry_backoff_ms: RETRY_BACKOFF_BASE_MS,
            lead_time_alert_days: LEAD_TIME_ALERT_BUSINESS_DAYS,
        }
    }
}

impl EngineConfig {
    /// Read overrides from `GUICHET_*` environment variables; anything unset
    /// or unparsable keeps its default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_attempts: env_parse("GUICHET_MAX_BOOKING_ATTEMPTS", defaults.max_attempts),
            retry_backoff_ms: env_parse("GUICHET_RETRY_BACKOFF_MS", defaults.retry_backoff_ms),
            lead_time_alert_days: env_parse(
                "GUICHET_LEAD_TIME_ALERT_DAYS",
                defaults.lead_time_alert_days,
            ),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
