//! wayfarer address suggestion engine (CLI & MCP server)
//!
//! Dual-mode application:
//! - MCP Server Mode (default): JSON-RPC over stdio
//! - CLI Mode: Command-line utility for direct tool execution
//!
//! Implements two tools:
//! - `geocode(query)` - Live results from the configured geocoding provider
//! - `suggest(query)` - Reconciled suggestions with saved-address fallback

mod cli;
mod config;
mod controller;
mod dispatch;
mod error;
mod geocoding;
mod http;
mod mcp;
mod reconcile;
mod tools;

#[cfg(test)]
mod test_support;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use config::ProviderConfig;
use error::AppError;
use mcp::ToolResult;
use std::future::Future;
use tokio::time::timeout;
use tools::{ToolContext, TOOL_TIMEOUT};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Detect mode: CLI if args present, MCP server otherwise
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        run_cli_mode().await
    } else {
        run_mcp_mode().await
    }
}

/// Logs go to stderr so stdout carries only results. `RUST_LOG` wins over
/// the default level.
fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Run in CLI mode
async fn run_cli_mode() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    init_logging(log_level);

    let config = match ProviderConfig::resolve(cli.config.as_deref()) {
        Ok(config) => config.with_provider(cli.provider),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(AppError::from(e).exit_code());
        }
    };

    let result = match cli.command {
        Some(Commands::Search(args)) => {
            with_context(config, |ctx| async move {
                run_tool(tools::geocode::execute_geocode(args, &ctx)).await
            })
            .await
        }
        Some(Commands::Suggest(args)) => {
            with_context(config, |ctx| async move {
                run_tool(tools::suggest::execute_suggest(args, &ctx)).await
            })
            .await
        }
        Some(Commands::Session(args)) => {
            with_context(config, |ctx| async move {
                tools::session::run_session(args, &ctx)
                    .await
                    .map(|value| format!("Final value: {}", value))
            })
            .await
        }
        Some(Commands::Config) => serde_json::to_string_pretty(&config.redacted()).map_err(AppError::from),
        None => {
            eprintln!("Error: No command specified. Use --help for usage information.");
            std::process::exit(1);
        }
    };

    // Handle result and exit with appropriate code
    match result {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

async fn with_context<F, Fut>(config: ProviderConfig, run: F) -> Result<String, AppError>
where
    F: FnOnce(ToolContext) -> Fut,
    Fut: Future<Output = Result<String, AppError>>,
{
    let ctx = ToolContext::new(config)?;
    run(ctx).await
}

/// Run a one-shot tool under the tool timeout and extract its text
async fn run_tool<F>(tool: F) -> Result<String, AppError>
where
    F: Future<Output = Result<ToolResult, AppError>>,
{
    match timeout(TOOL_TIMEOUT, tool).await {
        Ok(Ok(tool_result)) => Ok(tool_result.first_text()),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(AppError::Timeout(format!(
            "Request exceeded {} second timeout",
            TOOL_TIMEOUT.as_secs()
        ))),
    }
}

/// Run in MCP server mode
async fn run_mcp_mode() -> Result<()> {
    init_logging("info");

    let config = ProviderConfig::resolve(None)?;
    info!("Starting wayfarer MCP server (provider: {})", config.geocoding_provider);

    let tools = ToolContext::new(config)?;
    mcp::handle_stdio(tools).await?;

    Ok(())
}
