use anyhow::{Context, Result};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::auth::{HasherConfig, SessionCookies};

/// Process-wide settings, loaded once at startup and read-only afterwards.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Comma-separated CORS allowlist; permissive CORS when unset.
    pub client_origin: Option<String>,
    pub auth: AuthSettings,
    pub hasher: HasherConfig,
    pub cookies: SessionCookies,
}

/// Token signing material and lifetimes.
///
/// Keys are base64-encoded PEM, decoded when the token service is built.
#[derive(Clone)]
pub struct AuthSettings {
    pub access_private_key: String,
    pub access_public_key: String,
    pub refresh_private_key: String,
    pub refresh_public_key: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

// Key material stays out of logs.
impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |name: &str| -> Result<String> {
            var(name)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{} must be set", name))
        };

        let duration = |name: &str, default: &str| -> Result<Duration> {
            let raw = var(name).unwrap_or_else(|| default.to_string());
            humantime::parse_duration(raw.trim())
                .with_context(|| format!("{} must be a duration such as 15m or 7d", name))
        };

        let auth = AuthSettings {
            access_private_key: required("ACCESS_TOKEN_PRIVATE_KEY")?,
            access_public_key: required("ACCESS_TOKEN_PUBLIC_KEY")?,
            refresh_private_key: required("REFRESH_TOKEN_PRIVATE_KEY")?,
            refresh_public_key: required("REFRESH_TOKEN_PUBLIC_KEY")?,
            access_ttl: duration("ACCESS_TOKEN_EXPIRED_IN", "15m")?,
            refresh_ttl: duration("REFRESH_TOKEN_EXPIRED_IN", "60m")?,
        };

        let defaults = HasherConfig::default();
        let hasher = HasherConfig {
            memory_kib: parse_or(&var, "ARGON2_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_or(&var, "ARGON2_ITERATIONS", defaults.iterations)?,
            parallelism: parse_or(&var, "ARGON2_PARALLELISM", defaults.parallelism)?,
        };

        let cookies = SessionCookies::new(
            parse_or(&var, "ACCESS_TOKEN_MAXAGE", 15)?,
            parse_or(&var, "REFRESH_TOKEN_MAXAGE", 60)?,
            parse_or(&var, "COOKIE_SECURE", false)?,
        );

        Ok(Self {
            port: parse_or(&var, "PORT", 8080)?,
            client_origin: var("CLIENT_ORIGIN").filter(|v| !v.trim().is_empty()),
            auth,
            hasher,
            cookies,
        })
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value", name)),
        None => Ok(default),
    }
}
