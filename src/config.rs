use crate::constants::{
    DEFAULT_LISTEN_ADDR, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_PROXY_URL,
    DEFAULT_SESSION_STORE_URL, DEFAULT_TEMPERATURE, MAX_DOCUMENT_CHARS, UPSTREAM_API_URL,
};
use crate::errors::{FundChatError, FundChatResult};
use log::debug;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, path::PathBuf};

/// Runtime settings shared by the proxy server and the chat client.
///
/// The upstream bearer credential is deliberately absent: the proxy reads it
/// from the environment on every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub upstream_url: String,
    pub listen_addr: String,
    pub proxy_url: String,
    pub session_store_url: String,
    pub data_dir: PathBuf,
    pub default_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_document_chars: usize,
    pub request_timeout_secs: u64,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fundchat");

        Self {
            upstream_url: UPSTREAM_API_URL.to_string(),
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            proxy_url: DEFAULT_PROXY_URL.to_string(),
            session_store_url: DEFAULT_SESSION_STORE_URL.to_string(),
            data_dir,
            default_model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            max_document_chars: MAX_DOCUMENT_CHARS,
            request_timeout_secs: 120,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Loads the user config, creating it with defaults on first run, then
    /// applies `FUNDCHAT_*` environment overrides.
    pub fn load() -> FundChatResult<Self> {
        let config_path = get_config_path()?;

        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            let config = Config::default();
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent).map_err(|e| {
                    FundChatError::config_error(format!(
                        "Failed to create config directory: {}",
                        e
                    ))
                })?;
            }
            let config_str = serde_json::to_string_pretty(&config).map_err(|e| {
                FundChatError::config_error(format!("Failed to serialize config: {}", e))
            })?;
            fs::write(&config_path, config_str).map_err(|e| {
                FundChatError::config_error(format!("Failed to write config file: {}", e))
            })?;
            debug!("Wrote default config to {}", config_path.display());
            config
        };

        config.apply_env_overrides(|key| env::var(key).ok())?;
        validate_config(&config)?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> FundChatResult<Self> {
        let config_str = fs::read_to_string(path).map_err(|e| {
            FundChatError::config_error(format!("Failed to read config file: {}", e))
        })?;

        let config: Config = serde_json::from_str(&config_str)
            .map_err(|e| FundChatError::config_error(format!("Failed to parse config: {}", e)))?;

        validate_config(&config)?;
        Ok(config)
    }

    /// Applies overrides from a variable lookup; `env::var` in production.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> FundChatResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("FUNDCHAT_UPSTREAM_URL") {
            self.upstream_url = v;
        }
        if let Some(v) = lookup("FUNDCHAT_LISTEN_ADDR") {
            self.listen_addr = v;
        }
        if let Some(v) = lookup("FUNDCHAT_PROXY_URL") {
            self.proxy_url = v;
        }
        if let Some(v) = lookup("FUNDCHAT_SESSION_STORE_URL") {
            self.session_store_url = v;
        }
        if let Some(v) = lookup("FUNDCHAT_DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("FUNDCHAT_MODEL") {
            self.default_model = v;
        }
        if let Some(v) = lookup("FUNDCHAT_LOG_LEVEL") {
            self.log_level = v;
        }
        if let Some(v) = lookup("FUNDCHAT_MAX_TOKENS") {
            self.max_tokens = v.parse().map_err(|_| {
                FundChatError::config_error(format!("FUNDCHAT_MAX_TOKENS is not a number: {}", v))
            })?;
        }
        if let Some(v) = lookup("FUNDCHAT_TEMPERATURE") {
            self.temperature = v.parse().map_err(|_| {
                FundChatError::config_error(format!("FUNDCHAT_TEMPERATURE is not a number: {}", v))
            })?;
        }
        Ok(())
    }
}

fn get_config_path() -> FundChatResult<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| FundChatError::config_error("Could not determine home directory"))?;

    Ok(home_dir.join(".config").join("fundchat").join("config.json"))
}

pub fn validate_config(config: &Config) -> FundChatResult<()> {
    if config.upstream_url.is_empty() {
        return Err(FundChatError::config_error("upstream_url is required"));
    }

    if config.proxy_url.is_empty() {
        return Err(FundChatError::config_error("proxy_url is required"));
    }

    if config.session_store_url.is_empty() {
        return Err(FundChatError::config_error("session_store_url is required"));
    }

    if config.default_model.is_empty() {
        return Err(FundChatError::config_error("Model name is required"));
    }

    if !(0.0..=2.0).contains(&config.temperature) {
        return Err(FundChatError::config_error(
            "Temperature must be between 0.0 and 2.0",
        ));
    }

    if config.max_tokens == 0 {
        return Err(FundChatError::config_error("max_tokens must be greater than 0"));
    }

    if config.max_document_chars == 0 {
        return Err(FundChatError::config_error(
            "max_document_chars must be greater than 0",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_validate_config_valid() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_defaults_match_chat_parameters() {
        let config = Config::default();
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.max_tokens, 500);
        assert_eq!(config.max_document_chars, 131_872);
        assert_eq!(config.default_model, "openai/gpt-oss-20b:free");
    }

    #[test]
    fn test_validate_config_invalid_temperature() {
        let mut config = Config::default();
        config.temperature = 2.5;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_config_invalid_max_tokens() {
        let mut config = Config::default();
        config.max_tokens = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_fills_missing_fields_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "proxy_url": "http://proxy.local:8080" }"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.proxy_url, "http://proxy.local:8080");
        assert_eq!(config.upstream_url, UPSTREAM_API_URL);
    }

    #[test]
    fn test_load_from_rejects_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(FundChatError::Config(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("FUNDCHAT_PROXY_URL", "http://localhost:9999"),
            ("FUNDCHAT_MAX_TOKENS", "1024"),
            ("FUNDCHAT_DATA_DIR", "/tmp/fundchat-test"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.proxy_url, "http://localhost:9999");
        assert_eq!(config.max_tokens, 1024);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/fundchat-test"));
    }

    #[test]
    fn test_env_override_with_bad_number_fails() {
        let mut config = Config::default();
        let result = config.apply_env_overrides(|key| {
            (key == "FUNDCHAT_TEMPERATURE").then(|| "warm".to_string())
        });
        assert!(result.is_err());
    }
}
