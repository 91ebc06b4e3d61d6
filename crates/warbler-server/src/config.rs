use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;

/// Runtime settings, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let db_path = lookup("WARBLER_DB_PATH").unwrap_or_else(|| "warbler.db".into());
        let host = lookup("WARBLER_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = match lookup("WARBLER_PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("WARBLER_PORT is not a valid port: {raw}"))?,
            None => 5000,
        };

        Ok(Self {
            db_path: PathBuf::from(db_path),
            host,
            port,
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
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
    fn defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.db_path, PathBuf::from("warbler.db"));
        assert_eq!(cfg.addr().unwrap().to_string(), "0.0.0.0:5000");
    }

    #[test]
    fn overrides() {
        let cfg = config(&[
            ("WARBLER_DB_PATH", "/tmp/w.db"),
            ("WARBLER_HOST", "127.0.0.1"),
            ("WARBLER_PORT", "8080"),
        ])
        .unwrap();
        assert_eq!(cfg.db_path, PathBuf::from("/tmp/w.db"));
        assert_eq!(cfg.addr().unwrap().to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn bad_port_is_an_error() {
        assert!(config(&[("WARBLER_PORT", "warbler")]).is_err());
    }
}
