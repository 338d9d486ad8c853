use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mcp_bridge::auth::HttpAuthValidator;
use mcp_bridge::config::{AppConfig, CliConfig, FileConfig};
use mcp_bridge::server::{run_server, RequestsLoggingLevel, ServerConfig};
use mcp_bridge::SessionRegistry;

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Command to launch as the MCP child process.
    /// Can also be specified in config file.
    #[clap(long)]
    pub child_command: Option<String>,

    /// The address to listen on.
    #[clap(long, default_value = "127.0.0.1")]
    pub host: String,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 8080)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Timeout in seconds for each child process round trip.
    #[clap(long, default_value_t = 60)]
    pub call_timeout_sec: u64,
}

/// Convert CLI args to CliConfig for config resolution
impl From<&CliArgs> for CliConfig {
    fn from(args: &CliArgs) -> Self {
        CliConfig {
            child_command: args.child_command.clone(),
            host: args.host.clone(),
            port: args.port,
            logging_level: args.logging_level.clone(),
            call_timeout_sec: args.call_timeout_sec,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    // Load TOML config if provided
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };

    // Resolve final configuration (TOML overrides CLI, env fills auth)
    let cli_config: CliConfig = (&cli_args).into();
    let app_config = AppConfig::resolve(&cli_config, file_config)?;

    info!("mcp-bridge {} ({})", env!("CARGO_PKG_VERSION"), env!("GIT_HASH"));
    info!("Configuration loaded:");
    info!("  child_command: {}", app_config.child_command);
    info!("  child_args: {:?}", app_config.child_args);
    info!("  listen: {}:{}", app_config.host, app_config.port);
    info!("  call_timeout_sec: {}", app_config.call_timeout_sec);
    info!("  userinfo_endpoint: {}", app_config.userinfo_endpoint());
    if let Some(subdomain) = &app_config.auth.subdomain {
        info!("  subdomain: {}", subdomain);
    }

    let validator = Arc::new(HttpAuthValidator::new(
        app_config.userinfo_endpoint(),
        app_config.auth.client_token_secret.clone(),
    ));
    let registry = Arc::new(SessionRegistry::new(
        validator,
        app_config.child_command.clone(),
        app_config.child_args.clone(),
        app_config.call_timeout(),
    ));

    let server_config = ServerConfig {
        requests_logging_level: app_config.logging_level.clone(),
        host: app_config.host.clone(),
        port: app_config.port,
    };

    info!("Ready to serve at port {}!", app_config.port);

    tokio::select! {
        result = run_server(server_config, registry.clone()) => {
            info!("HTTP server stopped: {:?}", result);
            registry.close_all().await;
            result
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, initiating graceful shutdown");
            registry.close_all().await;
            Ok(())
        }
    }
}
