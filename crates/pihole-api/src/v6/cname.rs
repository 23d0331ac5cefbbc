// Local CNAME endpoints
//
// Same shape as the host endpoints, with `"<domain>,<target>"` entries
// under `config.dns.cnameRecords`.

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::error::Error;
use crate::records::{CnameRecord, CreateOptions, decode_cnames};
use crate::retry::{ALREADY_PRESENT, DUPLICATE_CNAME};
use crate::service::LocalCname;
use crate::v6::client::{V6Client, expect_status, keyed_path, null_as_empty, read_json};

pub(crate) const CNAME_RECORDS_PATH: &str = "/api/config/dns/cnameRecords";

#[derive(Debug, Deserialize)]
struct CnameResponse {
    config: CnameConfig,
}

#[derive(Debug, Deserialize)]
struct CnameConfig {
    dns: CnameDns,
}

#[derive(Debug, Deserialize)]
struct CnameDns {
    #[serde(default, rename = "cnameRecords", deserialize_with = "null_as_empty")]
    cname_records: Vec<String>,
}

/// Local CNAME record service over a [`V6Client`].
#[derive(Clone, Copy)]
pub struct CnameService<'a> {
    client: &'a V6Client,
}

impl<'a> CnameService<'a> {
    pub fn new(client: &'a V6Client) -> Self {
        Self { client }
    }

    fn entry_path(record: &CnameRecord) -> String {
        keyed_path(CNAME_RECORDS_PATH, &record.encode())
    }
}

impl LocalCname for CnameService<'_> {
    async fn list(&self) -> Result<Vec<CnameRecord>, Error> {
        debug!("listing local CNAME records");
        let resp = self.client.get(CNAME_RECORDS_PATH).await?;
        let resp = expect_status(resp, &[StatusCode::OK], "200").await?;
        let parsed: CnameResponse = read_json(resp).await?;
        Ok(decode_cnames(&parsed.config.dns.cname_records))
    }

    async fn get(&self, domain: &str) -> Result<CnameRecord, Error> {
        self.list()
            .await?
            .into_iter()
            .find(|r| r.domain == domain)
            .ok_or_else(|| Error::CnameNotFound {
                domain: domain.to_owned(),
            })
    }

    async fn create(
        &self,
        domain: &str,
        target: &str,
        opts: CreateOptions,
    ) -> Result<CnameRecord, Error> {
        let record = CnameRecord::new(domain, target);

        let mut path = Self::entry_path(&record);
        if opts.force {
            path.push_str("?force=true");
        }

        debug!(domain, target, force = opts.force, "creating local CNAME record");
        self.client
            .create_with_retry(&path, &[DUPLICATE_CNAME, ALREADY_PRESENT])
            .await?;
        Ok(record)
    }

    async fn delete(&self, domain: &str) -> Result<(), Error> {
        let record = match self.get(domain).await {
            Ok(record) => record,
            Err(Error::CnameNotFound { .. }) => {
                debug!(domain, "local CNAME record already absent");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        debug!(domain, target = %record.target, "deleting local CNAME record");
        let resp = self.client.delete(&Self::entry_path(&record)).await?;
        expect_status(resp, &[StatusCode::NO_CONTENT, StatusCode::NOT_FOUND], "204").await?;
        Ok(())
    }
}
