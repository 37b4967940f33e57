// ABOUTME: Server configuration read from PRICETAG_* environment variables (after .env loading).
// ABOUTME: Parsing goes through a lookup function so tests never mutate the process environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use pricetag_scout::options::DEFAULT_USER_AGENT;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Catalog file replacing the built-in selectors.
    pub catalog_path: Option<PathBuf>,
    pub fetch_timeout: Duration,
    pub user_agent: String,
}

/// Load configuration, reading `.env` first.
pub fn load_config() -> Result<ServerConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_config(|key| std::env::var(key))
}

fn build_config<F>(lookup: F) -> Result<ServerConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let bind_addr = or_default("PRICETAG_BIND_ADDR", "0.0.0.0:5000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("PRICETAG_BIND_ADDR", e.to_string()))?;

    let log_level = or_default("PRICETAG_LOG_LEVEL", "info");

    let catalog_path = lookup("PRICETAG_CATALOG_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);

    let timeout_secs = or_default("PRICETAG_FETCH_TIMEOUT_SECS", "30")
        .parse::<u64>()
        .map_err(|e| invalid("PRICETAG_FETCH_TIMEOUT_SECS", e.to_string()))?;
    if timeout_secs == 0 {
        return Err(invalid(
            "PRICETAG_FETCH_TIMEOUT_SECS",
            "must be at least 1".to_string(),
        ));
    }

    let user_agent = or_default("PRICETAG_USER_AGENT", DEFAULT_USER_AGENT);

    Ok(ServerConfig {
        bind_addr,
        log_level,
        catalog_path,
        fetch_timeout: Duration::from_secs(timeout_secs),
        user_agent,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let map = HashMap::new();
        let cfg = build_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:5000".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.log_level, "info");
        assert!(cfg.catalog_path.is_none());
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(30));
        assert_eq!(cfg.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn overrides_are_applied() {
        let mut map = HashMap::new();
        map.insert("PRICETAG_BIND_ADDR", "127.0.0.1:8080");
        map.insert("PRICETAG_LOG_LEVEL", "debug");
        map.insert("PRICETAG_CATALOG_PATH", "/etc/pricetag/catalog.json");
        map.insert("PRICETAG_FETCH_TIMEOUT_SECS", "10");
        map.insert("PRICETAG_USER_AGENT", "pricetag/0.1");
        let cfg = build_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.bind_addr.port(), 8080);
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(
            cfg.catalog_path,
            Some(PathBuf::from("/etc/pricetag/catalog.json"))
        );
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(10));
        assert_eq!(cfg.user_agent, "pricetag/0.1");
    }

    #[test]
    fn blank_catalog_path_means_builtin() {
        let mut map = HashMap::new();
        map.insert("PRICETAG_CATALOG_PATH", "  ");
        let cfg = build_config(lookup_from_map(&map)).unwrap();
        assert!(cfg.catalog_path.is_none());
    }

    #[test]
    fn invalid_bind_addr_fails() {
        let mut map = HashMap::new();
        map.insert("PRICETAG_BIND_ADDR", "not-an-addr");
        let err = build_config(lookup_from_map(&map)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "PRICETAG_BIND_ADDR"));
    }

    #[test]
    fn invalid_timeout_fails() {
        for bad in ["abc", "0", "-5"] {
            let mut map = HashMap::new();
            map.insert("PRICETAG_FETCH_TIMEOUT_SECS", bad);
            let result = build_config(lookup_from_map(&map));
            assert!(result.is_err(), "{bad} should be rejected");
        }
    }
}
