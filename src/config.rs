use crate::core::money::Currency;
use dotenv::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

#[derive(Debug)]
pub struct Config {
    pub port: u16,
    pub log_level: String,
    pub default_currency: Currency,
    pub idempotency_ttl: Duration,
    pub request_timeout: Duration,
}

fn var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn from_hours(hours: u64) -> Duration {
    Duration::from_secs(hours.saturating_mul(3600))
}

impl Config {
    fn from_env() -> Self {
        dotenv().ok();

        Self {
            port: var("PORT").unwrap_or(3000),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            default_currency: var("DEFAULT_CURRENCY").unwrap_or_default(),
            idempotency_ttl: from_hours(var("IDEMPOTENCY_TTL_HOURS").unwrap_or(24)),
            request_timeout: Duration::from_secs(var("REQUEST_TIMEOUT_SECS").unwrap_or(30)),
        }
    }
}

// Global static accessible everywhere
pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_hours_saturate() {
        assert_eq!(from_hours(24), Duration::from_secs(86_400));
        assert_eq!(from_hours(u64::MAX), Duration::from_secs(u64::MAX));
    }
}
