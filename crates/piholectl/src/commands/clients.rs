//! Client definition handlers.

use pihole_core::{CancellationToken, ClientRecord, Controller};
use tabled::Tabled;

use crate::cli::{ClientsArgs, ClientsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ClientRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Client")]
    client: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Comment")]
    comment: String,
    #[tabled(rename = "Groups")]
    groups: String,
}

impl From<&ClientRecord> for ClientRow {
    fn from(c: &ClientRecord) -> Self {
        Self {
            id: c.id,
            client: c.client.clone(),
            name: c.name.clone(),
            comment: c.comment.clone(),
            groups: join_groups(&c.groups),
        }
    }
}

fn join_groups(groups: &[i64]) -> String {
    groups
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn detail(c: &ClientRecord) -> String {
    [
        format!("Client:   {}", c.client),
        format!("ID:       {}", c.id),
        format!("Name:     {}", or_dash(&c.name)),
        format!("Comment:  {}", or_dash(&c.comment)),
        format!("Groups:   {}", or_dash(&join_groups(&c.groups))),
        format!("Added:    {}", c.date_added.format("%Y-%m-%d %H:%M:%S UTC")),
        format!("Modified: {}", c.date_modified.format("%Y-%m-%d %H:%M:%S UTC")),
    ]
    .join("\n")
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() { "-" } else { s }
}

fn print_client(client: &ClientRecord, global: &GlobalOpts) {
    let out = output::render_single(&global.output, client, detail, |c| c.client.clone());
    output::print_output(&out, global.quiet);
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: ClientsArgs,
    global: &GlobalOpts,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    match args.command {
        ClientsCommand::List => {
            let clients = controller.list_clients(cancel).await?;
            let out = output::render_list(
                &global.output,
                &clients,
                |c| ClientRow::from(c),
                |c| c.client.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ClientsCommand::Get { client } => {
            let record = controller.get_client(&client, cancel).await?;
            print_client(&record, global);
            Ok(())
        }

        ClientsCommand::Create { client, comment } => {
            let record = controller.create_client(&client, &comment, cancel).await?;
            print_client(&record, global);
            Ok(())
        }

        ClientsCommand::Update { client, comment } => {
            let record = controller.update_client(&client, &comment, cancel).await?;
            print_client(&record, global);
            Ok(())
        }

        ClientsCommand::Delete { client } => {
            if !util::confirm(&format!("Delete client {client}?"), global.yes)? {
                return Ok(());
            }
            controller.delete_client(&client, cancel).await?;
            output::print_status(&format!("Deleted client {client}"), global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_render_comma_separated() {
        assert_eq!(join_groups(&[0, 3, 7]), "0,3,7");
        assert_eq!(or_dash(&join_groups(&[])), "-");
    }
}
