// Record types and the appliance's compact wire encodings.
//
// DNS host mappings travel as `"<ip> <domain>"` and CNAME mappings as
// `"<domain>,<target>"`. Entries that do not split into exactly two parts
// are dropped during decode rather than reported.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const DNS_SEPARATOR: char = ' ';
const CNAME_SEPARATOR: char = ',';

/// A local DNS A/AAAA record (domain -> IP mapping).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DnsRecord {
    pub domain: String,
    pub ip: String,
}

impl DnsRecord {
    pub fn new(domain: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            ip: ip.into(),
        }
    }

    /// Wire form: `"<ip> <domain>"`.
    pub fn encode(&self) -> String {
        format!("{}{DNS_SEPARATOR}{}", self.ip, self.domain)
    }

    /// Parse a single `"<ip> <domain>"` entry. `None` when the separator is missing.
    pub fn decode(entry: &str) -> Option<Self> {
        let (ip, domain) = entry.split_once(DNS_SEPARATOR)?;
        Some(Self::new(domain, ip))
    }
}

/// A local CNAME record (domain -> target domain mapping).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CnameRecord {
    pub domain: String,
    pub target: String,
}

impl CnameRecord {
    pub fn new(domain: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            target: target.into(),
        }
    }

    /// Wire form: `"<domain>,<target>"`.
    pub fn encode(&self) -> String {
        format!("{}{CNAME_SEPARATOR}{}", self.domain, self.target)
    }

    /// Parse a single `"<domain>,<target>"` entry. `None` when the separator is missing.
    pub fn decode(entry: &str) -> Option<Self> {
        let (domain, target) = entry.split_once(CNAME_SEPARATOR)?;
        Some(Self::new(domain, target))
    }
}

/// Decode every well-formed DNS host entry, skipping malformed ones.
pub fn decode_dns_hosts<S: AsRef<str>>(entries: &[S]) -> Vec<DnsRecord> {
    entries
        .iter()
        .filter_map(|e| DnsRecord::decode(e.as_ref()))
        .collect()
}

/// Decode every well-formed CNAME entry, skipping malformed ones.
pub fn decode_cnames<S: AsRef<str>>(entries: &[S]) -> Vec<CnameRecord> {
    entries
        .iter()
        .filter_map(|e| CnameRecord::decode(e.as_ref()))
        .collect()
}

/// A client-identity record.
///
/// Identity is the caller-supplied `client` identifier (IP, MAC, hostname,
/// CIDR range, or interface name); `id` is the appliance's internal row id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRecord {
    pub client: String,
    pub name: String,
    pub comment: String,
    pub groups: Vec<i64>,
    pub id: i64,
    pub date_added: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
}

/// Options for record creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreateOptions {
    /// Ask the appliance to override a conflicting entry. Sent as
    /// `?force=true`; DNS creation additionally removes an existing
    /// record for the same domain first.
    pub force: bool,
}

impl CreateOptions {
    pub fn forced() -> Self {
        Self { force: true }
    }
}
