//! Command dispatch: bridges CLI args -> controller calls -> output formatting.

pub mod clients;
pub mod cname;
pub mod config_cmd;
pub mod dns;
pub mod session;
pub mod util;

use pihole_core::{CancellationToken, Controller};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch an appliance-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    controller: &Controller,
    global: &GlobalOpts,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    match cmd {
        Command::Dns(args) => dns::handle(controller, args, global, cancel).await,
        Command::Cname(args) => cname::handle(controller, args, global, cancel).await,
        Command::Clients(args) => clients::handle(controller, args, global, cancel).await,
        Command::Session(args) => session::handle(controller, args, global, cancel).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
