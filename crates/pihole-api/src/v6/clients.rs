// Client-identity endpoints
//
// `/api/clients[/<escaped identifier>]`. Every response, single or list,
// wraps records as `{"clients": [...]}`. Records are keyed directly by the
// identifier, so no read-before-write is needed; a 404 is reported as
// `ClientNotFound` rather than absorbed.

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Error;
use crate::records::ClientRecord;
use crate::service::ClientManagement;
use crate::v6::client::{V6Client, expect_status, keyed_path, null_as_empty, read_json};

pub(crate) const CLIENTS_PATH: &str = "/api/clients";

/// A client entry as the appliance serializes it.
#[derive(Debug, Deserialize)]
struct ClientEntry {
    client: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    comment: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    groups: Vec<i64>,
    #[serde(default)]
    id: i64,
    #[serde(default)]
    date_added: i64,
    #[serde(default)]
    date_modified: i64,
}

#[derive(Debug, Deserialize)]
struct ClientsResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    clients: Vec<ClientEntry>,
}

#[derive(Debug, Serialize)]
struct CreateClientBody<'a> {
    client: &'a str,
    comment: &'a str,
}

#[derive(Debug, Serialize)]
struct UpdateClientBody<'a> {
    comment: &'a str,
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

impl From<ClientEntry> for ClientRecord {
    fn from(e: ClientEntry) -> Self {
        Self {
            client: e.client,
            name: e.name.unwrap_or_default(),
            comment: e.comment.unwrap_or_default(),
            groups: e.groups,
            id: e.id,
            date_added: timestamp(e.date_added),
            date_modified: timestamp(e.date_modified),
        }
    }
}

/// Client record service over a [`V6Client`].
#[derive(Clone, Copy)]
pub struct ClientService<'a> {
    client: &'a V6Client,
}

impl<'a> ClientService<'a> {
    pub fn new(client: &'a V6Client) -> Self {
        Self { client }
    }
}

fn not_found(client: &str) -> Error {
    Error::ClientNotFound {
        client: client.to_owned(),
    }
}

/// The first record of a single-client response.
fn first_client(parsed: ClientsResponse) -> Option<ClientRecord> {
    parsed.clients.into_iter().next().map(ClientRecord::from)
}

impl ClientManagement for ClientService<'_> {
    async fn list(&self) -> Result<Vec<ClientRecord>, Error> {
        debug!("listing clients");
        let resp = self.client.get(CLIENTS_PATH).await?;
        let resp = expect_status(resp, &[StatusCode::OK], "200").await?;
        let parsed: ClientsResponse = read_json(resp).await?;
        Ok(parsed.clients.into_iter().map(ClientRecord::from).collect())
    }

    async fn get(&self, client: &str) -> Result<ClientRecord, Error> {
        let resp = self.client.get(&keyed_path(CLIENTS_PATH, client)).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(not_found(client));
        }
        let resp = expect_status(resp, &[StatusCode::OK], "200").await?;
        let parsed: ClientsResponse = read_json(resp).await?;
        first_client(parsed).ok_or_else(|| not_found(client))
    }

    async fn create(&self, client: &str, comment: &str) -> Result<ClientRecord, Error> {
        debug!(client, "creating client");
        let body = CreateClientBody { client, comment };
        let resp = self.client.post(CLIENTS_PATH, &body).await?;
        let resp = expect_status(resp, &[StatusCode::OK, StatusCode::CREATED], "200 or 201").await?;
        let parsed: ClientsResponse = read_json(resp).await?;
        first_client(parsed).ok_or(Error::NoClientReturned)
    }

    async fn update(&self, client: &str, comment: &str) -> Result<ClientRecord, Error> {
        debug!(client, "updating client");
        let body = UpdateClientBody { comment };
        let resp = self
            .client
            .put(&keyed_path(CLIENTS_PATH, client), Some(&body))
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(not_found(client));
        }
        let resp = expect_status(resp, &[StatusCode::OK], "200").await?;
        let parsed: ClientsResponse = read_json(resp).await?;
        first_client(parsed).ok_or(Error::NoClientReturned)
    }

    async fn delete(&self, client: &str) -> Result<(), Error> {
        debug!(client, "deleting client");
        let resp = self.client.delete(&keyed_path(CLIENTS_PATH, client)).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(not_found(client));
        }
        expect_status(resp, &[StatusCode::NO_CONTENT], "204").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_with_nulls_maps_to_empty_strings() {
        let parsed: ClientsResponse = serde_json::from_str(
            r#"{"clients":[{"client":"10.0.0.9","name":null,"comment":null,
                "groups":[0,3],"id":7,"date_added":1700000000,"date_modified":1700000100}]}"#,
        )
        .expect("valid payload");
        let record = first_client(parsed).expect("one client");
        assert_eq!(record.client, "10.0.0.9");
        assert_eq!(record.name, "");
        assert_eq!(record.comment, "");
        assert_eq!(record.groups, vec![0, 3]);
        assert_eq!(record.id, 7);
        assert_eq!(record.date_added.timestamp(), 1_700_000_000);
        assert_eq!(record.date_modified.timestamp(), 1_700_000_100);
    }

    #[test]
    fn empty_response_has_no_first_client() {
        let parsed: ClientsResponse = serde_json::from_str(r#"{"clients":[]}"#).expect("valid");
        assert!(first_client(parsed).is_none());
    }

    #[test]
    fn null_groups_and_clients_read_as_empty() {
        let parsed: ClientsResponse = serde_json::from_str(
            r#"{"clients":[{"client":"lab","groups":null,"id":1}]}"#,
        )
        .expect("null groups accepted");
        let record = first_client(parsed).expect("one client");
        assert!(record.groups.is_empty());

        let parsed: ClientsResponse =
            serde_json::from_str(r#"{"clients":null}"#).expect("null clients accepted");
        assert!(first_client(parsed).is_none());
    }
}
