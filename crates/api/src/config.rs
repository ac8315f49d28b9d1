//! Runtime configuration from environment variables.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use smartstock_observability::LogFormat;

const DEV_JWT_SECRET: &str = "dev-secret";
const MAX_WINDOW_DAYS: u32 = 36_500;

#[derive(Debug, Error)]
#[error("invalid value for {key}: {message}")]
pub struct ConfigError {
    pub key: &'static str,
    pub message: String,
}

/// Seeded administrator holding every capability.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub bcrypt_cost: u32,
    pub forecast_url: Option<String>,
    pub forecast_timeout: Duration,
    pub forecast_window_days: u32,
    pub log_format: LogFormat,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl: chrono::Duration::minutes(600),
            bcrypt_cost: bcrypt_default_cost(),
            forecast_url: None,
            forecast_timeout: Duration::from_millis(2000),
            forecast_window_days: 30,
            log_format: LogFormat::Json,
            bootstrap_admin: None,
        }
    }
}

fn bcrypt_default_cost() -> u32 {
    12
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEV_JWT_SECRET.to_string());

        let ttl_minutes: i64 = parse_or(&lookup, "TOKEN_TTL_MINUTES", 600)?;
        let token_ttl = chrono::Duration::try_minutes(ttl_minutes)
            .filter(|_| ttl_minutes > 0)
            .ok_or_else(|| ConfigError {
                key: "TOKEN_TTL_MINUTES",
                message: format!("{ttl_minutes} is not a positive number of minutes in range"),
            })?;

        let forecast_window_days = parse_or(&lookup, "FORECAST_WINDOW_DAYS", defaults.forecast_window_days)?;
        if !(1..=MAX_WINDOW_DAYS).contains(&forecast_window_days) {
            return Err(ConfigError {
                key: "FORECAST_WINDOW_DAYS",
                message: format!("{forecast_window_days} is outside 1..={MAX_WINDOW_DAYS}"),
            });
        }

        let bootstrap_admin = match (
            lookup("BOOTSTRAP_ADMIN_USERNAME"),
            lookup("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Some(username), Some(password)) => Some(BootstrapAdmin {
                email: lookup("BOOTSTRAP_ADMIN_EMAIL").unwrap_or_else(|| format!("{}@localhost.local", username.trim())),
                username,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            bind_addr: parse_or(&lookup, "BIND_ADDR", defaults.bind_addr)?,
            jwt_secret,
            token_ttl,
            bcrypt_cost: parse_or(&lookup, "BCRYPT_COST", defaults.bcrypt_cost)?,
            forecast_url: lookup("FORECAST_URL").filter(|s| !s.trim().is_empty()),
            forecast_timeout: Duration::from_millis(parse_or(&lookup, "FORECAST_TIMEOUT_MS", 2000u64)?),
            forecast_window_days,
            log_format: match lookup("LOG_FORMAT") {
                Some(raw) => raw.parse().map_err(|message| ConfigError {
                    key: "LOG_FORMAT",
                    message,
                })?,
                None => defaults.log_format,
            },
            bootstrap_admin,
        })
    }

    /// True when no `JWT_SECRET` was supplied and tokens are signed with the dev default.
    pub fn uses_dev_jwt_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: core::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError {
            key,
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.bind_addr.port(), 8080);
        assert_eq!(cfg.token_ttl, chrono::Duration::minutes(600));
        assert_eq!(cfg.forecast_timeout, Duration::from_millis(2000));
        assert_eq!(cfg.forecast_window_days, 30);
        assert!(cfg.forecast_url.is_none());
        assert!(cfg.bootstrap_admin.is_none());
        assert_eq!(cfg.log_format, LogFormat::Json);
        assert!(cfg.uses_dev_jwt_secret());
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("FORECAST_URL", "http://forecast:5000/predict"),
            ("FORECAST_TIMEOUT_MS", "250"),
            ("LOG_FORMAT", "pretty"),
            ("JWT_SECRET", "s3cret"),
            ("BOOTSTRAP_ADMIN_USERNAME", "root"),
            ("BOOTSTRAP_ADMIN_PASSWORD", "changeme"),
        ]))
        .unwrap();
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.forecast_url.as_deref(), Some("http://forecast:5000/predict"));
        assert_eq!(cfg.forecast_timeout, Duration::from_millis(250));
        assert_eq!(cfg.log_format, LogFormat::Pretty);
        assert!(!cfg.uses_dev_jwt_secret());
        assert_eq!(cfg.bootstrap_admin.unwrap().email, "root@localhost.local");
    }

    #[test]
    fn bad_numbers_fail() {
        let err = AppConfig::from_lookup(lookup(&[("FORECAST_WINDOW_DAYS", "a month")])).unwrap_err();
        assert_eq!(err.key, "FORECAST_WINDOW_DAYS");
    }

    #[test]
    fn out_of_range_durations_fail() {
        for ttl in ["0", "-5", "9223372036854775807"] {
            let err = AppConfig::from_lookup(lookup(&[("TOKEN_TTL_MINUTES", ttl)])).unwrap_err();
            assert_eq!(err.key, "TOKEN_TTL_MINUTES", "{ttl}");
        }
        for days in ["0", "4294967295"] {
            let err = AppConfig::from_lookup(lookup(&[("FORECAST_WINDOW_DAYS", days)])).unwrap_err();
            assert_eq!(err.key, "FORECAST_WINDOW_DAYS", "{days}");
        }
        let cfg = AppConfig::from_lookup(lookup(&[("TOKEN_TTL_MINUTES", "15"), ("FORECAST_WINDOW_DAYS", "90")])).unwrap();
        assert_eq!(cfg.token_ttl, chrono::Duration::minutes(15));
        assert_eq!(cfg.forecast_window_days, 90);
    }

    #[test]
    fn unknown_log_format_fails() {
        let err = AppConfig::from_lookup(lookup(&[("LOG_FORMAT", "xml")])).unwrap_err();
        assert_eq!(err.key, "LOG_FORMAT");
    }
}
