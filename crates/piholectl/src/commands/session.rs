//! Session handlers.
//!
//! `session id` prints a live session id and leaves it open, so scripts can
//! export it as `__PIHOLE_SESSION_ID` and skip re-authenticating.

use pihole_core::{CancellationToken, Controller};

use crate::cli::{GlobalOpts, SessionArgs, SessionCommand};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    controller: &Controller,
    args: SessionArgs,
    global: &GlobalOpts,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    match args.command {
        SessionCommand::Id => {
            let sid = controller.session_id().ok_or(CliError::SessionMissing)?;
            output::print_output(&sid, global.quiet);
            Ok(())
        }

        SessionCommand::Logout => {
            controller.logout(cancel).await?;
            output::print_status("Logged out", global.quiet);
            Ok(())
        }
    }
}
