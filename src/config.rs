use std::{env, path::PathBuf, time::Duration};
use tracing::warn;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);
pub const CSV_FILE_NAME: &str = "sales_overview.csv";

#[derive(Debug, Clone)]
pub struct Config {
    pub db_uri: Option<String>,
    pub data_dir: PathBuf,
    pub port: u16,
    pub cache_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let db_uri = lookup("DB_URI")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let data_dir = lookup("APP_DATA_DIR")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data"));

        let port = parse_or(lookup("PORT"), "PORT", DEFAULT_PORT);
        let cache_ttl = lookup("CACHE_TTL_SECS")
            .map(|raw| parse_or(Some(raw), "CACHE_TTL_SECS", DEFAULT_CACHE_TTL.as_secs()))
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CACHE_TTL);

        Self {
            db_uri,
            data_dir,
            port,
            cache_ttl,
        }
    }

    pub fn csv_path(&self) -> PathBuf {
        self.data_dir.join(CSV_FILE_NAME)
    }
}

fn parse_or<T: std::str::FromStr + Copy>(raw: Option<String>, key: &str, default: T) -> T {
    match raw {
        Some(value) => match value.trim().parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!("ignoring invalid {key}={value}");
                default
            }
        },
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = config_from(&[]);
        assert_eq!(config.db_uri, None);
        assert_eq!(config.csv_path(), PathBuf::from("data/sales_overview.csv"));
        assert_eq!(config.port, 8080);
        assert_eq!(config.cache_ttl, Duration::from_secs(3600));
    }

    #[test]
    fn blank_db_uri_counts_as_absent() {
        let config = config_from(&[("DB_URI", "   ")]);
        assert_eq!(config.db_uri, None);
    }

    #[test]
    fn reads_overrides_and_ignores_garbage() {
        let config = config_from(&[
            ("DB_URI", "postgres://dash@db/sales"),
            ("APP_DATA_DIR", "/srv/dash"),
            ("PORT", "not-a-port"),
            ("CACHE_TTL_SECS", "60"),
        ]);
        assert_eq!(config.db_uri.as_deref(), Some("postgres://dash@db/sales"));
        assert_eq!(config.csv_path(), PathBuf::from("/srv/dash/sales_overview.csv"));
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
    }
}
