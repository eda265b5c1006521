//! Configuration management for the wallet engine
//!
//! Loads configuration from TOML files with environment variable substitution.

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the configuration file
pub const CONFIG_ENV: &str = "EVM_WALLET_CONFIG";

lazy_static! {
    static ref ENV_VAR: Regex = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub gas: GasConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    pub name: String,
    pub chain_id: u64,
    pub rpc_urls: Vec<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl NetworkConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: "Sepolia Testnet".to_string(),
            chain_id: 11_155_111,
            rpc_urls: vec!["https://rpc.sepolia.org".to_string()],
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct GasConfig {
    /// Buffer added to network gas estimates (e.g., 10 = 10%)
    #[serde(default = "default_buffer_percent")]
    pub limit_buffer_percent: u64,
    /// Gas limit used when estimation fails
    #[serde(default = "default_fallback_gas_limit")]
    pub fallback_gas_limit: u64,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            limit_buffer_percent: default_buffer_percent(),
            fallback_gas_limit: default_fallback_gas_limit(),
        }
    }
}

fn default_buffer_percent() -> u64 {
    10
}

fn default_fallback_gas_limit() -> u64 {
    crate::tx::TRANSFER_GAS_LIMIT
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
}

impl Settings {
    /// Load settings from the file named by `EVM_WALLET_CONFIG`, falling back
    /// to built-in defaults when the default path does not exist
    pub fn load() -> Result<Self> {
        match env::var(CONFIG_ENV) {
            Ok(path) => Self::load_from(Path::new(&path)),
            Err(_) => {
                let default_path = PathBuf::from("config/default.toml");
                if default_path.exists() {
                    Self::load_from(&default_path)
                } else {
                    let settings = Settings::default();
                    settings.validate()?;
                    Ok(settings)
                }
            }
        }
    }

    /// Load settings from a specific file
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        Self::parse(&config_str)
    }

    /// Parse settings from TOML text
    pub fn parse(config_str: &str) -> Result<Self> {
        // Substitute environment variables
        let config_str = substitute_env_vars(config_str);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.network.chain_id == 0 {
            anyhow::bail!("Network {} has chain_id 0", self.network.name);
        }

        if self.network.rpc_urls.is_empty() {
            anyhow::bail!("Network {} has no RPC URLs configured", self.network.name);
        }

        if self.network.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be positive");
        }

        if self.gas.fallback_gas_limit < crate::tx::TRANSFER_GAS_LIMIT {
            tracing::warn!(
                "fallback_gas_limit {} is below the cost of a plain transfer",
                self.gas.fallback_gas_limit
            );
        }

        Ok(())
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    let mut result = input.to_string();

    for cap in ENV_VAR.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_env_var_substitution() {
        env::set_var("EVM_WALLET_TEST_VAR", "test_value");
        let input = "url = \"https://api.example.com/${EVM_WALLET_TEST_VAR}/endpoint\"";
        let result = substitute_env_vars(input);
        assert_eq!(result, "url = \"https://api.example.com/test_value/endpoint\"");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let settings = Settings::parse(
            r#"
            [network]
            name = "Mainnet"
            chain_id = 1
            rpc_urls = ["https://eth.example.org"]
            "#,
        )
        .unwrap();

        assert_eq!(settings.network.chain_id, 1);
        assert_eq!(settings.network.request_timeout_secs, 30);
        assert_eq!(settings.gas.limit_buffer_percent, 10);
        assert_eq!(settings.gas.fallback_gas_limit, 21_000);
        assert!(!settings.metrics.enabled);
    }

    #[test]
    fn test_rejects_missing_rpc_urls() {
        let err = Settings::parse(
            r#"
            [network]
            name = "Broken"
            chain_id = 5
            rpc_urls = []
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("no RPC URLs"));
    }

    #[test]
    fn test_load_from_file() {
        env::set_var("EVM_WALLET_TEST_RPC", "https://rpc.internal.example");
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [network]
            name = "Sepolia"
            chain_id = 11155111
            rpc_urls = ["${{EVM_WALLET_TEST_RPC}}"]
            request_timeout_secs = 5

            [gas]
            limit_buffer_percent = 25

            [metrics]
            enabled = true
            "#
        )
        .unwrap();

        let settings = Settings::load_from(file.path()).unwrap();
        assert_eq!(settings.network.rpc_urls, vec!["https://rpc.internal.example"]);
        assert_eq!(settings.network.request_timeout(), Duration::from_secs(5));
        assert_eq!(settings.gas.limit_buffer_percent, 25);
        assert!(settings.metrics.enabled);
    }
}
