// Local DNS host endpoints
//
// `GET /api/config/dns/hosts` returns every mapping as an `"<ip> <domain>"`
// string; create and delete address one entry by its full escaped string.
// There is no per-domain read endpoint, so get filters the full list.

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::Error;
use crate::records::{CreateOptions, DnsRecord, decode_dns_hosts};
use crate::retry::ALREADY_PRESENT;
use crate::service::LocalDns;
use crate::v6::client::{V6Client, expect_status, keyed_path, null_as_empty, read_json};

pub(crate) const DNS_HOSTS_PATH: &str = "/api/config/dns/hosts";

#[derive(Debug, Deserialize)]
struct HostsResponse {
    config: HostsConfig,
}

#[derive(Debug, Deserialize)]
struct HostsConfig {
    dns: HostsDns,
}

#[derive(Debug, Deserialize)]
struct HostsDns {
    #[serde(default, deserialize_with = "null_as_empty")]
    hosts: Vec<String>,
}

/// Local DNS record service over a [`V6Client`].
#[derive(Clone, Copy)]
pub struct DnsService<'a> {
    client: &'a V6Client,
}

impl<'a> DnsService<'a> {
    pub fn new(client: &'a V6Client) -> Self {
        Self { client }
    }

    fn entry_path(record: &DnsRecord) -> String {
        keyed_path(DNS_HOSTS_PATH, &record.encode())
    }
}

impl LocalDns for DnsService<'_> {
    async fn list(&self) -> Result<Vec<DnsRecord>, Error> {
        debug!("listing local DNS records");
        let resp = self.client.get(DNS_HOSTS_PATH).await?;
        let resp = expect_status(resp, &[StatusCode::OK], "200").await?;
        let parsed: HostsResponse = read_json(resp).await?;
        Ok(decode_dns_hosts(&parsed.config.dns.hosts))
    }

    async fn get(&self, domain: &str) -> Result<DnsRecord, Error> {
        self.list()
            .await?
            .into_iter()
            .find(|r| r.domain == domain)
            .ok_or_else(|| Error::DnsNotFound {
                domain: domain.to_owned(),
            })
    }

    async fn create(&self, domain: &str, ip: &str, opts: CreateOptions) -> Result<DnsRecord, Error> {
        let record = DnsRecord::new(domain, ip);

        if opts.force {
            // The appliance ignores `force` for hosts, so clear any existing
            // mapping for this domain ourselves.
            match self.get(domain).await {
                Ok(existing) => {
                    debug!(domain, ip = %existing.ip, "force: removing existing record");
                    self.delete(domain).await.inspect_err(|e| {
                        warn!(domain, error = %e, "force delete failed");
                    })?;
                    let settle = self.client.retry_policy().settle_delay;
                    if !settle.is_zero() {
                        tokio::time::sleep(settle).await;
                    }
                }
                Err(Error::DnsNotFound { .. }) => debug!(domain, "force: nothing to remove"),
                Err(e) => return Err(e),
            }
        }

        let mut path = Self::entry_path(&record);
        if opts.force {
            path.push_str("?force=true");
        }

        debug!(domain, ip, "creating local DNS record");
        self.client
            .create_with_retry(&path, &[ALREADY_PRESENT])
            .await?;
        Ok(record)
    }

    async fn delete(&self, domain: &str) -> Result<(), Error> {
        // The delete endpoint is keyed by the full "<ip> <domain>" string.
        let record = match self.get(domain).await {
            Ok(record) => record,
            Err(Error::DnsNotFound { .. }) => {
                debug!(domain, "local DNS record already absent");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        debug!(domain, ip = %record.ip, "deleting local DNS record");
        let resp = self.client.delete(&Self::entry_path(&record)).await?;
        // 404: someone else removed it between our read and this delete.
        expect_status(resp, &[StatusCode::NO_CONTENT, StatusCode::NOT_FOUND], "204").await?;
        Ok(())
    }
}
