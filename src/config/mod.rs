//! Layered configuration.
//!
//! Three layers, weakest first: `MCP_*` environment variables (auth
//! settings only), CLI arguments, then the optional TOML file. Values
//! from the file override the CLI, which overrides the environment.
//! `AppConfig::resolve` merges the layers and fails fast on an invalid
//! combination so a misconfigured bridge never starts serving.

mod file_config;

pub use file_config::{AuthFileConfig, FileConfig};

use std::time::Duration;

use anyhow::{bail, Result};
use clap::ValueEnum;

use crate::auth::DEFAULT_USERINFO_ENDPOINT;
use crate::server::RequestsLoggingLevel;

/// OAuth providers accepted in `auth.oauth_provider`.
pub const OAUTH_PROVIDERS: &[&str] = &["azure", "gsuite", "okta", "onelogin"];

const ENV_SUBDOMAIN: &str = "MCP_SUBDOMAIN";
const ENV_CLIENT_TOKEN_SECRET: &str = "MCP_CLIENT_TOKEN_SECRET";
const ENV_OAUTH_PROVIDER: &str = "MCP_OAUTH_PROVIDER";
const ENV_OAUTH_ISSUER: &str = "MCP_OAUTH_ISSUER";
const ENV_OAUTH_CLIENT_IDS: &str = "MCP_OAUTH_CLIENT_IDS";

/// Values coming from the command line, before merging.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub child_command: Option<String>,
    pub host: String,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub call_timeout_sec: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            child_command: None,
            host: "127.0.0.1".to_string(),
            port: 8080,
            logging_level: RequestsLoggingLevel::Path,
            call_timeout_sec: 60,
        }
    }
}

/// Auth settings after merging. `oauth_provider` unset means OAuth
/// tokens are still introspected against the userinfo endpoint, just
/// without the startup provider check.
#[derive(Debug, Clone, Default)]
pub struct AuthSettings {
    pub subdomain: Option<String>,
    pub client_token_secret: Option<String>,
    pub oauth_provider: Option<String>,
    pub oauth_issuer: Option<String>,
    pub oauth_client_ids: Vec<String>,
    pub userinfo_endpoint: Option<String>,
}

/// Fully resolved configuration the rest of the process runs on.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub child_command: String,
    pub child_args: Vec<String>,
    pub host: String,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub call_timeout_sec: u64,
    pub auth: AuthSettings,
}

impl AppConfig {
    pub fn resolve(cli: &CliConfig, file: Option<FileConfig>) -> Result<Self> {
        Self::resolve_with_env(cli, file, |name| std::env::var(name).ok())
    }

    fn resolve_with_env(
        cli: &CliConfig,
        file: Option<FileConfig>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let file = file.unwrap_or_default();

        let Some(child_command) = file.child_command.or_else(|| cli.child_command.clone())
        else {
            bail!("child_command must be set, either with --child-command or in the config file");
        };

        let logging_level = match file.logging_level {
            Some(ref value) => match RequestsLoggingLevel::from_str(value, true) {
                Ok(level) => level,
                Err(_) => bail!("Invalid logging_level in config file: {}", value),
            },
            None => cli.logging_level.clone(),
        };

        let auth_file = file.auth.unwrap_or_default();
        let oauth_client_ids = match auth_file.oauth_client_ids {
            Some(ids) => ids,
            None => env(ENV_OAUTH_CLIENT_IDS)
                .map(|raw| {
                    raw.split(',')
                        .map(|id| id.trim().to_string())
                        .filter(|id| !id.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        };
        let auth = AuthSettings {
            subdomain: auth_file.subdomain.or_else(|| env(ENV_SUBDOMAIN)),
            client_token_secret: auth_file
                .client_token_secret
                .or_else(|| env(ENV_CLIENT_TOKEN_SECRET)),
            oauth_provider: auth_file.oauth_provider.or_else(|| env(ENV_OAUTH_PROVIDER)),
            oauth_issuer: auth_file.oauth_issuer.or_else(|| env(ENV_OAUTH_ISSUER)),
            oauth_client_ids,
            userinfo_endpoint: auth_file.userinfo_endpoint,
        };
        validate_auth(&auth)?;

        Ok(Self {
            child_command,
            child_args: file.child_args.unwrap_or_default(),
            host: file.host.unwrap_or_else(|| cli.host.clone()),
            port: file.port.unwrap_or(cli.port),
            logging_level,
            call_timeout_sec: file.call_timeout_sec.unwrap_or(cli.call_timeout_sec),
            auth,
        })
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_sec)
    }

    pub fn userinfo_endpoint(&self) -> &str {
        self.auth
            .userinfo_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_USERINFO_ENDPOINT)
    }
}

fn validate_auth(auth: &AuthSettings) -> Result<()> {
    if let Some(provider) = auth.oauth_provider.as_deref() {
        if !OAUTH_PROVIDERS.contains(&provider) {
            bail!(
                "Unsupported OAuth provider '{}', expected one of: {}",
                provider,
                OAUTH_PROVIDERS.join(", ")
            );
        }
        if provider != "gsuite" && auth.oauth_issuer.is_none() {
            bail!("oauth_issuer is required for OAuth provider '{}'", provider);
        }
        if auth.oauth_client_ids.is_empty() {
            bail!("oauth_client_ids must not be empty when an OAuth provider is set");
        }
    }
    Ok(())
}
