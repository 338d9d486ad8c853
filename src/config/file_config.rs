use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// TOML configuration file. Every field is optional; anything set here
/// overrides the corresponding CLI argument.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub child_command: Option<String>,
    pub child_args: Option<Vec<String>>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub logging_level: Option<String>,
    pub call_timeout_sec: Option<u64>,
    pub auth: Option<AuthFileConfig>,
}

/// `[auth]` table of the configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthFileConfig {
    pub subdomain: Option<String>,
    pub client_token_secret: Option<String>,
    pub oauth_provider: Option<String>,
    pub oauth_issuer: Option<String>,
    pub oauth_client_ids: Option<Vec<String>>,
    pub userinfo_endpoint: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))
    }
}
