//! Store configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `STORE_MAILBOX_CAPACITY` - Bounded queue size of each store actor (default: 64)
//! - `STORE_MAX_WRITE_ATTEMPTS` - Conditional stock writes before giving up (default: 3)
//! - `STORE_WRITE_BACKOFF_MS` - First retry delay, doubled per attempt (default: 5)
//! - `STORE_COURIER_FEE` - Courier shipping fee (default: 15000)
//! - `STORE_WALLET_FEE` - Digital wallet payment fee (default: 1500)
//! - `STORE_EVENT_BUFFER` - Lifecycle events kept for slow subscribers (default: 256)
//! - `STORE_LOG` - Log filter used when `RUST_LOG` is unset (default: info)

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::domain::Tariff;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Retry schedule for conditional stock writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(5),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based): `backoff * 2^(attempt-1)`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.backoff.saturating_mul(1 << shift)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub mailbox_capacity: usize,
    pub retry: RetryPolicy,
    pub tariff: Tariff,
    pub event_buffer: usize,
    pub log_filter: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 64,
            retry: RetryPolicy::default(),
            tariff: Tariff::default(),
            event_buffer: 256,
            log_filter: "info".to_string(),
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed or is out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`StoreConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let mailbox_capacity = parse_or(&lookup, "STORE_MAILBOX_CAPACITY", defaults.mailbox_capacity)?;
        let max_attempts = parse_or(&lookup, "STORE_MAX_WRITE_ATTEMPTS", defaults.retry.max_attempts)?;
        let backoff_ms = parse_or(
            &lookup,
            "STORE_WRITE_BACKOFF_MS",
            u64::try_from(defaults.retry.backoff.as_millis()).unwrap_or(u64::MAX),
        )?;
        let courier_fee = parse_or(&lookup, "STORE_COURIER_FEE", defaults.tariff.courier_fee)?;
        let wallet_fee = parse_or(&lookup, "STORE_WALLET_FEE", defaults.tariff.wallet_fee)?;
        let event_buffer = parse_or(&lookup, "STORE_EVENT_BUFFER", defaults.event_buffer)?;
        let log_filter = lookup("STORE_LOG")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.log_filter);

        if mailbox_capacity == 0 {
            return Err(invalid("STORE_MAILBOX_CAPACITY", "must be at least 1"));
        }
        if max_attempts == 0 {
            return Err(invalid("STORE_MAX_WRITE_ATTEMPTS", "must be at least 1"));
        }
        if event_buffer == 0 {
            return Err(invalid("STORE_EVENT_BUFFER", "must be at least 1"));
        }
        for (key, fee) in [("STORE_COURIER_FEE", courier_fee), ("STORE_WALLET_FEE", wallet_fee)] {
            if fee.is_sign_negative() {
                return Err(invalid(key, "fees cannot be negative"));
            }
        }

        Ok(Self {
            mailbox_capacity,
            retry: RetryPolicy {
                max_attempts,
                backoff: Duration::from_millis(backoff_ms),
            },
            tariff: Tariff {
                courier_fee,
                wallet_fee,
            },
            event_buffer,
            log_filter,
        })
    }
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidEnvVar(key.to_string(), reason.to_string())
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|e| invalid(key, &e.to_string())),
        None => Ok(default),
    }
}
