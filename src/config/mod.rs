use std::env;
use std::time::Duration;

use crate::error::{AppError, Result};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Legs in the auto-built parlay.
pub const DEFAULT_LEG_COUNT: usize = 3;

/// Example stake the payout is quoted against.
pub const DEFAULT_STAKE: f64 = 100.0;

pub const MISSING_API_KEY: &str = "Missing API key. Set GEMINI_API_KEY in your environment.";

#[derive(Debug, Clone)]
pub struct Config {
    /// GEMINI_API_KEY, falling back to API_KEY. Blank counts as missing.
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub leg_count: usize,
    pub stake: f64,
    /// REQUEST_TIMEOUT_SECS; unset leaves the reqwest default in place
    pub request_timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup, so tests don't have to touch process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = non_blank("GEMINI_API_KEY").or_else(|| non_blank("API_KEY"));

        let leg_count = match non_blank("PARLAY_LEG_COUNT") {
            Some(raw) => raw.trim().parse::<usize>().map_err(|_| {
                AppError::Config("PARLAY_LEG_COUNT must be a non-negative integer".to_string())
            })?,
            None => DEFAULT_LEG_COUNT,
        };

        let stake = match non_blank("PARLAY_STAKE") {
            Some(raw) => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|s| s.is_finite() && *s > 0.0)
                .ok_or_else(|| AppError::Config("PARLAY_STAKE must be a positive number".to_string()))?,
            None => DEFAULT_STAKE,
        };

        let request_timeout = match non_blank("REQUEST_TIMEOUT_SECS") {
            Some(raw) => Some(Duration::from_secs(raw.trim().parse::<u64>().map_err(|_| {
                AppError::Config("REQUEST_TIMEOUT_SECS must be a whole number of seconds".to_string())
            })?)),
            None => None,
        };

        Ok(Self {
            api_key,
            model: non_blank("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_base: non_blank("GEMINI_API_BASE")
                .map(|b| b.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            leg_count,
            stake,
            request_timeout,
        })
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| AppError::Config(MISSING_API_KEY.to_string()))
    }
}
