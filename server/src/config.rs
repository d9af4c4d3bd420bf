//! Server configuration read from the environment.

use anyhow::{bail, Context};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_STORE_TIMEOUT_MS: u64 = 2000;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind_addr: String,
    /// Root of the on-disk document store. `None` keeps everything in memory.
    pub data_dir: Option<PathBuf>,
    pub store_timeout: Duration,
    /// Write the built-in catalog into an empty store at startup.
    pub seed_catalog: bool,
    /// Add an `X-Store-Calls` header to every response.
    pub store_calls_header: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            data_dir: None,
            store_timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
            seed_catalog: true,
            store_calls_header: false,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Config::default();

        if let Some(addr) = lookup("LARDER_BIND_ADDR").filter(|v| !v.is_empty()) {
            config.bind_addr = addr;
        }

        config.data_dir = lookup("LARDER_DATA_DIR")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        if let Some(ms) = lookup("LARDER_STORE_TIMEOUT_MS") {
            let ms: u64 = ms
                .parse()
                .with_context(|| format!("LARDER_STORE_TIMEOUT_MS must be an integer, got {ms:?}"))?;
            if ms == 0 {
                bail!("LARDER_STORE_TIMEOUT_MS must be greater than zero");
            }
            config.store_timeout = Duration::from_millis(ms);
        }

        if let Some(seed) = lookup("LARDER_SEED_CATALOG") {
            config.seed_catalog = parse_flag("LARDER_SEED_CATALOG", &seed)?;
        }
        if let Some(header) = lookup("LARDER_STORE_CALLS_HEADER") {
            config.store_calls_header = parse_flag("LARDER_STORE_CALLS_HEADER", &header)?;
        }

        Ok(config)
    }
}

fn parse_flag(key: &str, value: &str) -> anyhow::Result<bool> {
    match value {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        other => bail!("{key} must be 0 or 1, got {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.store_timeout, Duration::from_secs(2));
        assert!(config.seed_catalog);
        assert!(!config.store_calls_header);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("LARDER_BIND_ADDR", "127.0.0.1:8080"),
            ("LARDER_DATA_DIR", "/var/lib/larder"),
            ("LARDER_STORE_TIMEOUT_MS", "250"),
            ("LARDER_SEED_CATALOG", "0"),
            ("LARDER_STORE_CALLS_HEADER", "true"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.data_dir, Some(PathBuf::from("/var/lib/larder")));
        assert_eq!(config.store_timeout, Duration::from_millis(250));
        assert!(!config.seed_catalog);
        assert!(config.store_calls_header);
    }

    #[test]
    fn test_empty_data_dir_means_memory() {
        let config = config_from(&[("LARDER_DATA_DIR", "")]).unwrap();
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_invalid_values() {
        assert!(config_from(&[("LARDER_STORE_TIMEOUT_MS", "soon")]).is_err());
        assert!(config_from(&[("LARDER_STORE_TIMEOUT_MS", "0")]).is_err());
        assert!(config_from(&[("LARDER_SEED_CATALOG", "maybe")]).is_err());
        let err = config_from(&[("LARDER_STORE_CALLS_HEADER", "yes")]).unwrap_err();
        assert!(err.to_string().contains("LARDER_STORE_CALLS_HEADER"));
    }
}
