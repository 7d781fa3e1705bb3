use std::fmt;

use chrono::{NaiveTime, Weekday};

use crate::reservation::DEFAULT_MAX_ATTEMPTS;
use crate::schedule::{self, MAX_WEEKS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub key: &'static str,
    pub reason: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid {}: {}", self.key, self.reason)
    }
}

impl std::error::Error for ConfigError {}

/// Process-wide settings, read once at startup and handed to the engine.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub admin_email: Option<String>,
    pub cadence_day: Weekday,
    pub meeting_time: NaiveTime,
    pub week_count: u32,
    pub role_template: Vec<String>,
    pub max_attempts: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            bind_addr: "127.0.0.1:8080".to_string(),
            admin_email: None,
            cadence_day: Weekday::Sat,
            meeting_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap_or(NaiveTime::MIN),
            week_count: 4,
            role_template: schedule::standard_roles(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl AppConfig {
    /// Load `.env` if present, then read `ROLECALL_*` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            log::debug!("No .env loaded: {}", e);
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset or blank keys keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = AppConfig::default();

        if let Some(addr) = get("ROLECALL_BIND") {
            config.bind_addr = addr;
        }
        config.admin_email = get("ROLECALL_ADMIN_EMAIL");

        if let Some(day) = get("ROLECALL_CADENCE_DAY") {
            config.cadence_day = schedule::parse_weekday(&day).ok_or_else(|| ConfigError {
                key: "ROLECALL_CADENCE_DAY",
                reason: format!("'{day}' is not a weekday"),
            })?;
        }
        if let Some(time) = get("ROLECALL_MEETING_TIME") {
            config.meeting_time =
                NaiveTime::parse_from_str(&time, "%H:%M").map_err(|e| ConfigError {
                    key: "ROLECALL_MEETING_TIME",
                    reason: format!("'{time}': {e}"),
                })?;
        }
        if let Some(weeks) = get("ROLECALL_WEEK_COUNT") {
            config.week_count = weeks
                .parse::<u32>()
                .ok()
                .filter(|w| (1..=MAX_WEEKS).contains(w))
                .ok_or_else(|| ConfigError {
                    key: "ROLECALL_WEEK_COUNT",
                    reason: format!("expected 1..={MAX_WEEKS}, got '{weeks}'"),
                })?;
        }
        if let Some(roles) = get("ROLECALL_ROLE_TEMPLATE") {
            let template: Vec<String> = roles
                .split(',')
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
            if template.is_empty() {
                return Err(ConfigError {
                    key: "ROLECALL_ROLE_TEMPLATE",
                    reason: "no roles listed".to_string(),
                });
            }
            config.role_template = template;
        }
        if let Some(attempts) = get("ROLECALL_MAX_ATTEMPTS") {
            config.max_attempts = attempts
                .parse::<u32>()
                .ok()
                .filter(|a| *a >= 1)
                .ok_or_else(|| ConfigError {
                    key: "ROLECALL_MAX_ATTEMPTS",
                    reason: format!("expected a positive number, got '{attempts}'"),
                })?;
        }
        Ok(config)
    }
}
