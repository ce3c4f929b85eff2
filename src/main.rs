//! mcp-learning-server: an educational MCP server
//!
//! Serves task tools, notes resources and prompt templates over stdio, or
//! runs a client demo against an in-process copy of the server.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

use mcp_learning_server::config::{self, Config};
use mcp_learning_server::demo;
use mcp_learning_server::error::RegistryError;
use mcp_learning_server::mcp::dispatcher::Dispatcher;
use mcp_learning_server::mcp::server::McpServer;
use mcp_learning_server::resources::seed_sample_notes;
use mcp_learning_server::tasks::TaskStore;

/// Educational MCP server exposing tools, resources and prompts.
///
/// Speaks JSON-RPC 2.0 over stdin/stdout by default. Use `demo` to watch a
/// client exercise every capability.
#[derive(Parser, Debug)]
#[command(name = "mcp-learning-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "CONFIG_FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Serve MCP over stdio (default)
    Serve,
    /// Run a client demo against an in-process server
    Demo {
        /// Read commands from stdin after the scripted walkthrough
        #[arg(short, long)]
        interactive: bool,
    },
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
            _ => Level::WARN, // Default to warn for unknown levels
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

/// Seeds sample data and assembles the dispatcher.
fn build_dispatcher(cfg: &Config) -> Result<Dispatcher, RegistryError> {
    if cfg.notes.seed_samples {
        match seed_sample_notes(&cfg.notes.dir) {
            Ok(written) => info!(dir = %cfg.notes.dir.display(), written, "Sample notes ready"),
            Err(e) => warn!(dir = %cfg.notes.dir.display(), error = %e, "Could not seed sample notes"),
        }
    }

    let store = if cfg.tasks.seed_samples {
        TaskStore::with_sample_tasks()
    } else {
        TaskStore::new()
    };

    Ok(Dispatcher::builder()
        .server_name(cfg.server_name.as_str())
        .task_store(store)
        .register_builtin_tools()?
        .register_builtin_resources(&cfg.notes.dir)?
        .register_builtin_prompts()?
        .build())
}

/// Entry point for the mcp-learning-server binary.
fn main() -> ExitCode {
    let args = Args::parse();

    // Load configuration
    let config_path = args.config.as_deref();
    let cfg = match config::load_config(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            if config_path.is_none() {
                if let Some(default_path) = config::default_config_path() {
                    eprintln!("\nConfig loaded from: {}", default_path.display());
                    eprintln!("Compare it with config/example-config.json");
                }
            }
            return ExitCode::FAILURE;
        }
    };

    // Initialise logging
    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(log_level);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        server_name = %cfg.server_name,
        "Starting mcp-learning-server"
    );

    let dispatcher = match build_dispatcher(&cfg) {
        Ok(dispatcher) => dispatcher,
        Err(e) => {
            error!(error = %e, "Failed to register capabilities");
            return ExitCode::FAILURE;
        }
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to create Tokio runtime");

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let mut server = McpServer::new(dispatcher);
            info!("MCP server ready, waiting for client connection...");

            match runtime.block_on(server.run()) {
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
        Command::Demo { interactive } => match runtime.block_on(demo::run(dispatcher, interactive)) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!(error = %e, "Demo failed");
                ExitCode::FAILURE
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn parse_demo_subcommand() {
        let args = Args::try_parse_from(["mcp-learning-server", "-vv", "demo", "--interactive"])
            .unwrap();
        assert_eq!(args.verbose, 2);
        assert_eq!(args.command, Some(Command::Demo { interactive: true }));
    }

    #[test]
    fn log_level_precedence() {
        assert_eq!(get_log_level(0, true, "trace"), Level::ERROR);
        assert_eq!(get_log_level(1, false, "error"), Level::INFO);
        assert_eq!(get_log_level(0, false, "debug"), Level::DEBUG);
        assert_eq!(get_log_level(0, false, "nonsense"), Level::WARN);
    }
}
