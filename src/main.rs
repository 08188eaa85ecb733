//! codemenu-mcp: MCP server for CodeMenu snippets
//!
//! Bridges MCP tool calls from an AI assistant to the CodeMenu snippet API.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use codemenu_mcp::codemenu::CodeMenuClient;
use codemenu_mcp::config::{self, Overrides};
use codemenu_mcp::mcp::server::McpServer;
use codemenu_mcp::tools::Dispatcher;

/// MCP server for CodeMenu snippets.
///
/// Exposes CodeMenu snippets, tags and groups as MCP tools over stdio.
#[derive(Parser, Debug)]
#[command(name = "codemenu-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: ~/.codemenu-mcp/config.json, if present)
    #[arg(value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// CodeMenu API base URL
    #[arg(long, env = "CODEMENU_API_URL", value_name = "URL")]
    api_url: Option<String>,

    /// CodeMenu API key
    #[arg(long, env = "CODEMENU_API_KEY", value_name = "KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long)]
    quiet: bool,
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)] // Explicit "warn" arm for clarity
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN,
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Entry point for the codemenu-mcp server.
fn main() -> ExitCode {
    let args = Args::parse();

    let overrides = Overrides {
        api_url: args.api_url,
        api_key: args.api_key,
    };

    // Load configuration
    let config_path = args.config.as_deref();
    let cfg = match config::load_config(config_path, &overrides) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialise logging
    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(log_level);

    let settings = match cfg.api.client_settings() {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Invalid CodeMenu API settings");
            return ExitCode::FAILURE;
        }
    };

    // Startup diagnostics go to stderr; stdout belongs to the protocol.
    eprintln!("CodeMenu MCP server running on stdio");
    eprintln!("Connecting to CodeMenu API at: {}", settings.base_url);
    if settings.api_key.is_some() {
        eprintln!("Using API key authentication");
    } else {
        eprintln!("No API key configured (set CODEMENU_API_KEY if required)");
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        auth = ?settings.auth,
        snippet_lookup = ?settings.snippet_lookup,
        allow_mutations = cfg.tools.allow_mutations,
        "Starting codemenu-mcp server"
    );

    let client = match CodeMenuClient::new(settings) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Failed to create CodeMenu API client");
            return ExitCode::FAILURE;
        }
    };

    let mut server = McpServer::new(Dispatcher::new(client, cfg.tools));

    info!("MCP server ready, waiting for client connection...");

    // Run the server
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to create Tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(server.run());

    match result {
        Ok(()) => {
            info!("Server shut down gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}
