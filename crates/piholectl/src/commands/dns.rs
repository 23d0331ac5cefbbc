//! Local DNS host record handlers.

use pihole_core::{CancellationToken, Controller, CreateOptions, DnsRecord};
use tabled::Tabled;

use crate::cli::{DnsArgs, DnsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DnsRow {
    #[tabled(rename = "Domain")]
    domain: String,
    #[tabled(rename = "IP")]
    ip: String,
}

impl From<&DnsRecord> for DnsRow {
    fn from(r: &DnsRecord) -> Self {
        Self {
            domain: r.domain.clone(),
            ip: r.ip.clone(),
        }
    }
}

fn detail(r: &DnsRecord) -> String {
    [format!("Domain: {}", r.domain), format!("IP:     {}", r.ip)].join("\n")
}

fn print_record(record: &DnsRecord, global: &GlobalOpts) {
    let out = output::render_single(&global.output, record, detail, |r| r.ip.clone());
    output::print_output(&out, global.quiet);
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: DnsArgs,
    global: &GlobalOpts,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    match args.command {
        DnsCommand::List => {
            let records = controller.list_dns(cancel).await?;
            let out = output::render_list(
                &global.output,
                &records,
                |r| DnsRow::from(r),
                |r| format!("{} {}", r.domain, r.ip),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DnsCommand::Get { domain } => {
            let record = controller.get_dns(&domain, cancel).await?;
            print_record(&record, global);
            Ok(())
        }

        DnsCommand::Create { domain, ip, force } => {
            let opts = CreateOptions { force };
            let record = controller.create_dns(&domain, &ip, opts, cancel).await?;
            output::print_status(
                &format!("Created {} -> {}", record.domain, record.ip),
                global.quiet,
            );
            Ok(())
        }

        DnsCommand::Delete { domain } => {
            if !util::confirm(&format!("Delete DNS record for {domain}?"), global.yes)? {
                return Ok(());
            }
            controller.delete_dns(&domain, cancel).await?;
            output::print_status(&format!("Deleted {domain}"), global.quiet);
            Ok(())
        }

        DnsCommand::Replace { domain, ip } => {
            let record = controller.replace_dns(&domain, &ip, cancel).await?;
            print_record(&record, global);
            Ok(())
        }
    }
}
