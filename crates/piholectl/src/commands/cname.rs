//! Local CNAME record handlers.

use pihole_core::{CancellationToken, CnameRecord, Controller, CreateOptions};
use tabled::Tabled;

use crate::cli::{CnameArgs, CnameCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct CnameRow {
    #[tabled(rename = "Domain")]
    domain: String,
    #[tabled(rename = "Target")]
    target: String,
}

impl From<&CnameRecord> for CnameRow {
    fn from(r: &CnameRecord) -> Self {
        Self {
            domain: r.domain.clone(),
            target: r.target.clone(),
        }
    }
}

fn detail(r: &CnameRecord) -> String {
    [format!("Domain: {}", r.domain), format!("Target: {}", r.target)].join("\n")
}

fn print_record(record: &CnameRecord, global: &GlobalOpts) {
    let out = output::render_single(&global.output, record, detail, |r| r.target.clone());
    output::print_output(&out, global.quiet);
}

pub async fn handle(
    controller: &Controller,
    args: CnameArgs,
    global: &GlobalOpts,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    match args.command {
        CnameCommand::List => {
            let records = controller.list_cname(cancel).await?;
            let out = output::render_list(
                &global.output,
                &records,
                |r| CnameRow::from(r),
                |r| format!("{},{}", r.domain, r.target),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        CnameCommand::Get { domain } => {
            let record = controller.get_cname(&domain, cancel).await?;
            print_record(&record, global);
            Ok(())
        }

        CnameCommand::Create {
            domain,
            target,
            force,
        } => {
            let opts = CreateOptions { force };
            let record = controller
                .create_cname(&domain, &target, opts, cancel)
                .await?;
            output::print_status(
                &format!("Created {} -> {}", record.domain, record.target),
                global.quiet,
            );
            Ok(())
        }

        CnameCommand::Delete { domain } => {
            if !util::confirm(&format!("Delete CNAME record for {domain}?"), global.yes)? {
                return Ok(());
            }
            controller.delete_cname(&domain, cancel).await?;
            output::print_status(&format!("Deleted {domain}"), global.quiet);
            Ok(())
        }

        CnameCommand::Replace { domain, target } => {
            let record = controller.replace_cname(&domain, &target, cancel).await?;
            print_record(&record, global);
            Ok(())
        }
    }
}
