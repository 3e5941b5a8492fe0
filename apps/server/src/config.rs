use std::{net::SocketAddr, str::FromStr, time::Duration};

use anyhow::Context;
use ballotwatch_core::{
    constants::{
        DEFAULT_DEBOUNCE_WINDOW, DEFAULT_FETCH_TIMEOUT, DEFAULT_PARENT_COLLECTION,
        DEFAULT_WATCHED_COLLECTIONS,
    },
    ElectionId, WatcherConfig,
};

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:5001";
const DEFAULT_PREDICTION_URL: &str = "http://localhost:8000";
const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017/digitalvoting";
const DEFAULT_EVENT_BUS_CAPACITY: usize = 256;

pub struct Config {
    pub listen_addr: SocketAddr,
    pub cors_allow: Vec<String>,
    pub event_bus_capacity: usize,
    pub mongo_uri: String,
    pub mongo_db_name: Option<String>,
    pub prediction_url: String,
    pub prediction_timeout: Duration,
    pub prediction_max_retries: u32,
    pub watcher: WatcherConfig,
}

impl Config {
    /// Reads the process environment, loading `.env` first if present.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let listen_addr: SocketAddr = var("BW_LISTEN_ADDR")
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string())
            .parse()
            .context("Invalid BW_LISTEN_ADDR")?;
        let cors_allow = split_list(&var("BW_CORS_ALLOW_ORIGINS").unwrap_or_else(|| "*".into()));
        let event_bus_capacity = parse_or(
            "BW_EVENT_BUS_CAPACITY",
            var("BW_EVENT_BUS_CAPACITY"),
            DEFAULT_EVENT_BUS_CAPACITY,
        )
        .max(1);

        let mongo_uri = var("MONGO_URI").unwrap_or_else(|| DEFAULT_MONGO_URI.to_string());
        let mongo_db_name = var("MONGO_DB_NAME");

        let prediction_url = var("AI_PREDICTION_URL")
            .unwrap_or_else(|| DEFAULT_PREDICTION_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let default_timeout_ms = DEFAULT_FETCH_TIMEOUT.as_millis() as u64;
        let timeout_ms = match parse_or(
            "PREDICTION_TIMEOUT_MS",
            var("PREDICTION_TIMEOUT_MS"),
            default_timeout_ms,
        ) {
            0 => {
                tracing::warn!(
                    "Invalid PREDICTION_TIMEOUT_MS='0', using {}",
                    default_timeout_ms
                );
                default_timeout_ms
            }
            ms => ms,
        };
        let prediction_max_retries =
            parse_or("PREDICTION_MAX_RETRIES", var("PREDICTION_MAX_RETRIES"), 0);

        let debounce_ms = parse_or(
            "PREDICTION_DEBOUNCE_MS",
            var("PREDICTION_DEBOUNCE_MS"),
            DEFAULT_DEBOUNCE_WINDOW.as_millis() as u64,
        );
        let collections = var("WATCH_COLLECTIONS")
            .map(|list| split_list(&list))
            .filter(|list| !list.is_empty())
            .unwrap_or_else(|| {
                DEFAULT_WATCHED_COLLECTIONS
                    .iter()
                    .map(|c| c.to_string())
                    .collect()
            });
        let parent_collection =
            var("PARENT_COLLECTION").unwrap_or_else(|| DEFAULT_PARENT_COLLECTION.to_string());
        let default_election = var("ELECTION_ID").map(ElectionId::new);

        Ok(Self {
            listen_addr,
            cors_allow,
            event_bus_capacity,
            mongo_uri,
            mongo_db_name,
            prediction_url,
            prediction_timeout: Duration::from_millis(timeout_ms),
            prediction_max_retries,
            watcher: WatcherConfig {
                collections,
                parent_collection,
                debounce_window: Duration::from_millis(debounce_ms),
                default_election,
            },
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match raw {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid {}='{}', using {}", key, raw, default);
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();

        assert_eq!(config.listen_addr, "0.0.0.0:5001".parse().unwrap());
        assert_eq!(config.cors_allow, vec!["*"]);
        assert_eq!(config.prediction_url, "http://localhost:8000");
        assert_eq!(config.prediction_timeout, Duration::from_secs(10));
        assert_eq!(config.prediction_max_retries, 0);
        assert_eq!(config.mongo_uri, "mongodb://localhost:27017/digitalvoting");
        assert_eq!(config.mongo_db_name, None);
        assert_eq!(config.watcher.debounce_window, Duration::from_millis(30_000));
        assert_eq!(
            config.watcher.collections,
            vec!["reactions", "comments", "posts"]
        );
        assert_eq!(config.watcher.parent_collection, "posts");
        assert_eq!(config.watcher.default_election, None);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("AI_PREDICTION_URL", "http://scoring:9000/"),
            ("ELECTION_ID", "E42"),
            ("PREDICTION_DEBOUNCE_MS", "5000"),
            ("WATCH_COLLECTIONS", "reactions, comments"),
            ("BW_CORS_ALLOW_ORIGINS", "http://a.test,http://b.test"),
            ("MONGO_DB_NAME", "audit"),
        ])
        .unwrap();

        assert_eq!(config.prediction_url, "http://scoring:9000");
        assert_eq!(config.watcher.default_election, Some(ElectionId::from("E42")));
        assert_eq!(config.watcher.debounce_window, Duration::from_secs(5));
        assert_eq!(config.watcher.collections, vec!["reactions", "comments"]);
        assert_eq!(config.cors_allow, vec!["http://a.test", "http://b.test"]);
        assert_eq!(config.mongo_db_name.as_deref(), Some("audit"));
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = config(&[
            ("PREDICTION_DEBOUNCE_MS", "soon"),
            ("PREDICTION_TIMEOUT_MS", "-1"),
            ("BW_EVENT_BUS_CAPACITY", "0"),
        ])
        .unwrap();

        assert_eq!(config.watcher.debounce_window, Duration::from_millis(30_000));
        assert_eq!(config.prediction_timeout, Duration::from_secs(10));
        assert_eq!(config.event_bus_capacity, 1);
    }

    #[test]
    fn test_zero_timeout_falls_back() {
        let zero = config(&[("PREDICTION_TIMEOUT_MS", "0")]).unwrap();
        assert_eq!(zero.prediction_timeout, Duration::from_secs(10));

        let short = config(&[("PREDICTION_TIMEOUT_MS", "250")]).unwrap();
        assert_eq!(short.prediction_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_blank_election_id_is_unset() {
        let config = config(&[("ELECTION_ID", "  ")]).unwrap();
        assert_eq!(config.watcher.default_election, None);
    }

    #[test]
    fn test_invalid_listen_addr_is_an_error() {
        assert!(config(&[("BW_LISTEN_ADDR", "nowhere")]).is_err());
    }
}
