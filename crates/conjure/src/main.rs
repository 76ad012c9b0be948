mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use conjure_core::{Dashboard, EchoStore};

use crate::cli::{Cli, Command, TriggersArgs, TriggersCommand};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a backend
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "conjure", &mut std::io::stdout());
            Ok(())
        }

        // All other commands talk to the backend
        cmd => {
            let resolved = config::resolve(&cli.global)?;

            // Only the live view keeps polling; everything else is one
            // request-response cycle.
            let live = matches!(
                cmd,
                Command::Triggers(TriggersArgs {
                    command: TriggersCommand::Watch { .. }
                })
            );
            let dashboard_config = if live {
                resolved.dashboard
            } else {
                resolved.dashboard.without_background_refresh()
            };

            let dashboard = Dashboard::new(
                dashboard_config,
                resolved.tokens,
                Arc::new(EchoStore::new()),
            )?;

            tracing::debug!(
                command = ?cmd,
                profile = %resolved.profile_name,
                "dispatching command"
            );
            let result = commands::dispatch(cmd, &dashboard, &cli.global).await;
            dashboard.shutdown();
            result
        }
    }
}
