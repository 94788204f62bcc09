use std::{env, net::SocketAddr, path::PathBuf};

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_PORT: u16 = 8080;

/// Process settings, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_vars(env::var("APP_DATA_DIR").ok(), env::var("PORT").ok())
    }

    fn from_vars(data_dir: Option<String>, port: Option<String>) -> Self {
        let data_dir = data_dir
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let port = port
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        Self { data_dir, port }
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset_or_invalid() {
        let config = Config::from_vars(None, Some("not-a-port".to_string()));
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn explicit_values_win() {
        let config = Config::from_vars(Some("/tmp/epoch".to_string()), Some("9000".to_string()));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/epoch"));
        assert_eq!(config.addr().port(), 9000);
    }
}
