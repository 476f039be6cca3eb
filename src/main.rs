//! armory CLI entry point.

use std::process::ExitCode;

use armory::cli::{Cli, CommandDispatcher, Commands};
use armory::shell::is_ci;
use armory::ui::{create_ui, OutputMode};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Exit code when the batch could not start (bad catalog, no selection).
const EXIT_SETUP_ERROR: u8 = 2;

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("armory=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("armory=info"))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("armory starting with args: {:?}", cli);

    let output_mode = OutputMode::from_flags(cli.verbose, cli.quiet);

    let is_interactive = match &cli.command {
        Some(Commands::Run(args)) => !args.non_interactive && !args.json && !is_ci(),
        _ => !is_ci(),
    };

    let mut ui = create_ui(is_interactive, output_mode, cli.no_color);

    let cwd = std::env::current_dir().unwrap_or_default();
    let dispatcher = CommandDispatcher::new(cwd, cli.config.clone());

    match dispatcher.dispatch(&cli, ui.as_mut()) {
        Ok(result) => ExitCode::from(u8::try_from(result.exit_code).unwrap_or(1)),
        Err(e) => {
            ui.error(&format!("Error: {}", e));
            ExitCode::from(EXIT_SETUP_ERROR)
        }
    }
}
