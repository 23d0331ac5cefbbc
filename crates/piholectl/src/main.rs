mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pihole_core::{CancellationToken, Controller};

use crate::cli::{Cli, Command, SessionArgs, SessionCommand};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

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

/// Cancelled on the first Ctrl-C.
fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::debug!("interrupt received, cancelling");
            trigger.cancel();
        }
    });
    token
}

/// Tell an expired `--deadline` apart from Ctrl-C.
fn cancelled_error(interrupt: &CancellationToken, deadline: Option<u64>) -> CliError {
    match deadline {
        Some(secs) if !interrupt.is_cancelled() => CliError::DeadlineExceeded { secs },
        _ => CliError::Cancelled,
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need an appliance connection
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "piholectl", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let cfg = config::load()?;
            let (_, profile) = config::build_connection_profile(&cfg, &cli.global)?;

            let interrupt = interrupt_token();
            let cancel = match cli.global.deadline {
                Some(secs) => Controller::with_deadline(&interrupt, Duration::from_secs(secs)),
                None => interrupt.child_token(),
            };

            // Login counts against the deadline too.
            let controller = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    return Err(cancelled_error(&interrupt, cli.global.deadline));
                }
                res = Controller::connect(profile) => res?,
            };

            // `session id` hands its session to the caller, so it must survive exit.
            let keep_session = matches!(
                cmd,
                Command::Session(SessionArgs {
                    command: SessionCommand::Id
                })
            );
            let shutdown = CancellationToken::new();
            let logout = (!keep_session).then(|| controller.logout_on_shutdown(shutdown.clone()));

            tracing::debug!(command = ?cmd, "dispatching command");
            let result = commands::dispatch(cmd, &controller, &cli.global, &cancel).await;

            shutdown.cancel();
            if let Some(handle) = logout {
                let _ = handle.await;
            }

            match result {
                Err(CliError::Cancelled) => {
                    Err(cancelled_error(&interrupt, cli.global.deadline))
                }
                result => result,
            }
        }
    }
}
