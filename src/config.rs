use std::env;
use std::time::Duration;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_DATABASE: &str = "movies.db";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_WATCH_REGION: &str = "US";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub tmdb_api_key: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub database_path: String,
    pub watch_region: String,
    pub bind_addr: String,
    pub upstream_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let tmdb_api_key = non_empty("TMDB_API_KEY")
            .ok_or_else(|| "TMDB_API_KEY is required but was not set.".to_string())?;

        let upstream_timeout = match non_empty("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| format!("UPSTREAM_TIMEOUT_SECS must be a number, got {raw:?}"))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            tmdb_api_key,
            gemini_api_key: non_empty("GEMINI_API_KEY"),
            gemini_model: non_empty("GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            database_path: non_empty("POPULARITY_DB")
                .unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            watch_region: non_empty("WATCH_REGION")
                .unwrap_or_else(|| DEFAULT_WATCH_REGION.to_string()),
            bind_addr: non_empty("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            upstream_timeout: Duration::from_secs(upstream_timeout),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("TMDB_API_KEY", "abc")])).unwrap();
        assert_eq!(config.tmdb_api_key, "abc");
        assert!(config.gemini_api_key.is_none());
        assert_eq!(config.database_path, "movies.db");
        assert_eq!(config.watch_region, "US");
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.upstream_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_missing_tmdb_key() {
        let err = Config::from_lookup(lookup(&[("TMDB_API_KEY", "   ")])).unwrap_err();
        assert!(err.contains("TMDB_API_KEY"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("TMDB_API_KEY", "abc"),
            ("GEMINI_API_KEY", "g"),
            ("WATCH_REGION", "GB"),
            ("UPSTREAM_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();
        assert_eq!(config.gemini_api_key.as_deref(), Some("g"));
        assert_eq!(config.watch_region, "GB");
        assert_eq!(config.upstream_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_bad_timeout() {
        let result = Config::from_lookup(lookup(&[
            ("TMDB_API_KEY", "abc"),
            ("UPSTREAM_TIMEOUT_SECS", "soon"),
        ]));
        assert!(result.is_err());
    }
}
