use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::accounts::{DEFAULT_ACCOUNT_COUNT, DEFAULT_BALANCE_ETH};
use crate::chain::DEFAULT_GAS_LIMIT;
use crate::domain::CallParams;

const STATE_FILE_NAME: &str = ".chop_state.json";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub gas_limit: u64,
    pub account_count: usize,
    pub initial_balance_eth: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            gas_limit: DEFAULT_GAS_LIMIT,
            account_count: DEFAULT_ACCOUNT_COUNT,
            initial_balance_eth: DEFAULT_BALANCE_ETH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Per-field defaults used when the editor resets parameters.
    pub call: CallParams,
    pub chain: ChainConfig,
    pub state_file: Option<PathBuf>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            call: CallParams::default(),
            chain: ChainConfig::default(),
            state_file: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn state_file_path(&self) -> Option<PathBuf> {
        self.state_file.clone().or_else(default_state_file)
    }
}

pub fn load() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(_) => return Config::default(),
    };
    parse(&content)
}

/// Parse TOML, falling back to defaults when the document is invalid.
pub fn parse(content: &str) -> Config {
    toml::from_str::<Config>(content).unwrap_or_default()
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("CHOP_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("chop").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".config").join("chop").join("config.toml"));
    }

    directories::ProjectDirs::from("io", "chop", "chop")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

pub fn data_dir() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").map(PathBuf::from) {
        return Some(xdg.join("chop"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".local").join("share").join("chop"));
    }
    directories::ProjectDirs::from("io", "chop", "chop").map(|dirs| dirs.data_dir().to_path_buf())
}

pub fn log_dir() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("logs"))
}

pub fn exports_dir() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("exports"))
}

fn default_state_file() -> Option<PathBuf> {
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(STATE_FILE_NAME));
    }
    directories::BaseDirs::new().map(|dirs| dirs.home_dir().join(STATE_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CallType;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = parse(
            r#"
            log_level = "debug"
            state_file = "/tmp/chop.json"

            [call]
            callType = "CREATE"
            gasLimit = "1000000"

            [chain]
            account_count = 3
            "#,
        );
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.call.call_type, CallType::Create);
        assert_eq!(config.call.gas_limit, "1000000");
        assert_eq!(config.call.caller, CallParams::default().caller);
        assert_eq!(config.chain.account_count, 3);
        assert_eq!(config.chain.gas_limit, DEFAULT_GAS_LIMIT);
        assert_eq!(config.state_file_path(), Some(PathBuf::from("/tmp/chop.json")));
    }

    #[test]
    fn test_invalid_config_falls_back() {
        assert_eq!(parse("chain = 5"), Config::default());
    }
}
