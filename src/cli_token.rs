//! Companion binary for minting and inspecting client tokens.
//!
//! Tokens minted here are what clients put in the `initialize` request
//! under `capabilities.auth` with type `CLIENT_TOKEN`.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use mcp_bridge::auth::client_token::{
    create_client_token, validate_client_token, DEFAULT_LIFETIME_SECS,
};

#[derive(Parser, Debug)]
#[clap(name = "cli-token")]
struct CliArgs {
    /// Shared secret, falls back to the MCP_CLIENT_TOKEN_SECRET env var.
    #[clap(long)]
    secret: Option<String>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mint a new client token.
    Mint {
        /// User context to embed, as a JSON object.
        #[clap(long, default_value = "{}")]
        user_context: String,

        /// Token lifetime in seconds.
        #[clap(long, default_value_t = DEFAULT_LIFETIME_SECS)]
        expires_in_secs: i64,
    },
    /// Verify a token and print its user context.
    Inspect { token: String },
}

fn main() -> Result<()> {
    let args = CliArgs::parse();

    let Some(secret) = args
        .secret
        .or_else(|| std::env::var("MCP_CLIENT_TOKEN_SECRET").ok())
    else {
        bail!("No secret: pass --secret or set MCP_CLIENT_TOKEN_SECRET");
    };

    match args.command {
        Command::Mint {
            user_context,
            expires_in_secs,
        } => {
            let user_context: serde_json::Value =
                serde_json::from_str(&user_context).context("user_context is not valid JSON")?;
            if !user_context.is_object() {
                bail!("user_context must be a JSON object");
            }
            let token = create_client_token(&secret, user_context, expires_in_secs)?;
            println!("{}", token);
        }
        Command::Inspect { token } => {
            let user_context = match validate_client_token(&secret, &token) {
                Ok(ctx) => ctx,
                Err(err) => bail!("Token rejected: {}", err),
            };
            println!("{}", serde_json::to_string_pretty(&user_context)?);
        }
    }

    Ok(())
}
