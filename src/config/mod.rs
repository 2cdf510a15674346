// Configuration
//
// Loaded once at startup from ~/.scenelink/config.toml, with environment
// variables as overrides. A missing file just means defaults; a missing
// model credential only fails the agent subcommand.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::bridge::BridgeConfig;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub bridge: BridgeSettings,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub agent: AgentSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BridgeSettings {
    #[serde(default = "default_bridge_host")]
    pub host: String,
    #[serde(default = "default_bridge_port")]
    pub port: u16,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_asset_timeout_seconds")]
    pub asset_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentSettings {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
    /// Gemini API key; GEMINI_API_KEY overrides
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_bridge_host() -> String {
    "127.0.0.1".to_string()
}

fn default_bridge_port() -> u16 {
    9876
}

fn default_timeout_seconds() -> u64 {
    20
}

fn default_asset_timeout_seconds() -> u64 {
    300
}

fn default_bind_address() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_max_turns() -> usize {
    15
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            host: default_bridge_host(),
            port: default_bridge_port(),
            timeout_seconds: default_timeout_seconds(),
            asset_timeout_seconds: default_asset_timeout_seconds(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_turns: default_max_turns(),
            api_key: None,
        }
    }
}

impl Settings {
    /// Bridge client configuration derived from these settings
    pub fn bridge_config(&self) -> BridgeConfig {
        BridgeConfig {
            host: self.bridge.host.clone(),
            port: self.bridge.port,
            timeout: Duration::from_secs(self.bridge.timeout_seconds),
            asset_timeout: Duration::from_secs(self.bridge.asset_timeout_seconds),
        }
    }

    /// The Gemini credential, config file first, environment second.
    pub fn require_api_key(&self) -> Result<String> {
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            if !key.is_empty() {
                return Ok(key);
            }
        }
        match &self.agent.api_key {
            Some(key) if !key.is_empty() => Ok(key.clone()),
            _ => bail!(
                "No Gemini API key configured. Set GEMINI_API_KEY or add \
                 api_key under [agent] in ~/.scenelink/config.toml"
            ),
        }
    }
}

/// Load settings from the default config path, falling back to defaults
/// when the file does not exist.
pub fn load_settings() -> Result<Settings> {
    let path = match dirs::home_dir() {
        Some(home) => home.join(".scenelink/config.toml"),
        None => return Ok(apply_env_overrides(Settings::default())),
    };
    load_settings_from(&path)
}

/// Load settings from an explicit path (tests use a temp dir).
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    let settings = if path.exists() {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?
    } else {
        Settings::default()
    };
    Ok(apply_env_overrides(settings))
}

/// SCENELINK_BRIDGE_ADDR ("host:port") and SCENELINK_SERVER_ADDR
/// override the file.
fn apply_env_overrides(mut settings: Settings) -> Settings {
    if let Ok(addr) = std::env::var("SCENELINK_BRIDGE_ADDR") {
        if let Some((host, port)) = addr.rsplit_once(':') {
            if let Ok(port) = port.parse() {
                settings.bridge.host = host.to_string();
                settings.bridge.port = port;
            }
        }
    }
    if let Ok(addr) = std::env::var("SCENELINK_SERVER_ADDR") {
        if !addr.is_empty() {
            settings.server.bind_address = addr;
        }
    }
    settings
}
