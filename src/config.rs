//! Server configuration parsed from environment variables.
//!
//! Parsing is a pure function over a lookup closure so tests never touch the
//! process environment.

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SESSION_KEY_PREFIX: &str = "gemini-os-session-";
pub const DEFAULT_MAX_HISTORY_LENGTH: usize = 3;
pub const DEFAULT_BUS_CAPACITY: usize = 256;
pub const DEFAULT_GENERATION_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_WEBHOOK_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    /// Postgres URL. `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub session_key_prefix: String,
    /// Initial interaction history length for every new tab.
    pub max_history_length: usize,
    pub bus_capacity: usize,
    pub generation_max_tokens: u32,
    pub webhook_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: None,
            session_key_prefix: DEFAULT_SESSION_KEY_PREFIX.into(),
            max_history_length: DEFAULT_MAX_HISTORY_LENGTH,
            bus_capacity: DEFAULT_BUS_CAPACITY,
            generation_max_tokens: DEFAULT_GENERATION_MAX_TOKENS,
            webhook_timeout_secs: DEFAULT_WEBHOOK_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    /// Build config from the process environment.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `DATABASE_URL`: Postgres store when set, in-memory otherwise
    /// - `SESSION_KEY_PREFIX`: storage key namespace
    /// - `MAX_HISTORY_LENGTH`: default 3
    /// - `BUS_CAPACITY`: default 256
    /// - `GENERATION_MAX_TOKENS`: default 4096
    /// - `WEBHOOK_TIMEOUT_SECS`: default 30
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Unparseable values fall
    /// back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parse = |key: &str| lookup(key).map(|v| v.trim().to_string());
        let database_url = parse("DATABASE_URL").filter(|v| !v.is_empty());
        let session_key_prefix = parse("SESSION_KEY_PREFIX")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_SESSION_KEY_PREFIX.into());

        Self {
            port: parse_or(parse("PORT"), DEFAULT_PORT),
            database_url,
            session_key_prefix,
            max_history_length: parse_or(parse("MAX_HISTORY_LENGTH"), DEFAULT_MAX_HISTORY_LENGTH),
            bus_capacity: parse_or(parse("BUS_CAPACITY"), DEFAULT_BUS_CAPACITY).max(1),
            generation_max_tokens: parse_or(parse("GENERATION_MAX_TOKENS"), DEFAULT_GENERATION_MAX_TOKENS),
            webhook_timeout_secs: parse_or(parse("WEBHOOK_TIMEOUT_SECS"), DEFAULT_WEBHOOK_TIMEOUT_SECS),
        }
    }
}

pub(crate) fn parse_or<T>(raw: Option<String>, default: T) -> T
where
    T: std::str::FromStr,
{
    raw.and_then(|v| v.parse::<T>().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_env_uses_defaults() {
        let cfg = AppConfig::from_lookup(lookup(&[]));
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("DATABASE_URL", "postgres://localhost/desk"),
            ("SESSION_KEY_PREFIX", "test-"),
            ("MAX_HISTORY_LENGTH", "0"),
            ("BUS_CAPACITY", "16"),
        ]));
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/desk"));
        assert_eq!(cfg.session_key_prefix, "test-");
        assert_eq!(cfg.max_history_length, 0);
        assert_eq!(cfg.bus_capacity, 16);
    }

    #[test]
    fn garbage_values_fall_back() {
        let cfg = AppConfig::from_lookup(lookup(&[("PORT", "not-a-port"), ("MAX_HISTORY_LENGTH", "-3")]));
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.max_history_length, DEFAULT_MAX_HISTORY_LENGTH);
    }

    #[test]
    fn blank_database_url_selects_memory_store() {
        let cfg = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "  ")]));
        assert!(cfg.database_url.is_none());
    }

    #[test]
    fn zero_bus_capacity_is_clamped() {
        let cfg = AppConfig::from_lookup(lookup(&[("BUS_CAPACITY", "0")]));
        assert_eq!(cfg.bus_capacity, 1);
    }
}
