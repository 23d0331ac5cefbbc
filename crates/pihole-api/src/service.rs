// Capability traits for an appliance API generation.
//
// Each API generation implements `Appliance` and hands out lightweight
// service views for the three record kinds. Callers (the core controller,
// test fakes) depend only on these traits, never on a concrete client.

use std::future::Future;

use crate::error::Error;
use crate::records::{ClientRecord, CnameRecord, CreateOptions, DnsRecord};

/// Local DNS host mappings (domain -> IP).
pub trait LocalDns: Send + Sync {
    fn list(&self) -> impl Future<Output = Result<Vec<DnsRecord>, Error>> + Send;

    /// Fails with [`Error::DnsNotFound`] when no record has this domain.
    fn get(&self, domain: &str) -> impl Future<Output = Result<DnsRecord, Error>> + Send;

    fn create(
        &self,
        domain: &str,
        ip: &str,
        opts: CreateOptions,
    ) -> impl Future<Output = Result<DnsRecord, Error>> + Send;

    /// Idempotent: deleting an absent domain succeeds.
    fn delete(&self, domain: &str) -> impl Future<Output = Result<(), Error>> + Send;
}

/// Local CNAME mappings (domain -> target).
pub trait LocalCname: Send + Sync {
    fn list(&self) -> impl Future<Output = Result<Vec<CnameRecord>, Error>> + Send;

    /// Fails with [`Error::CnameNotFound`] when no record has this domain.
    fn get(&self, domain: &str) -> impl Future<Output = Result<CnameRecord, Error>> + Send;

    fn create(
        &self,
        domain: &str,
        target: &str,
        opts: CreateOptions,
    ) -> impl Future<Output = Result<CnameRecord, Error>> + Send;

    /// Idempotent: deleting an absent domain succeeds.
    fn delete(&self, domain: &str) -> impl Future<Output = Result<(), Error>> + Send;
}

/// Client-identity records, keyed by the caller-supplied identifier.
///
/// Unlike DNS/CNAME, a missing client is reported as
/// [`Error::ClientNotFound`] from get, update, and delete.
pub trait ClientManagement: Send + Sync {
    fn list(&self) -> impl Future<Output = Result<Vec<ClientRecord>, Error>> + Send;

    fn get(&self, client: &str) -> impl Future<Output = Result<ClientRecord, Error>> + Send;

    fn create(
        &self,
        client: &str,
        comment: &str,
    ) -> impl Future<Output = Result<ClientRecord, Error>> + Send;

    fn update(
        &self,
        client: &str,
        comment: &str,
    ) -> impl Future<Output = Result<ClientRecord, Error>> + Send;

    fn delete(&self, client: &str) -> impl Future<Output = Result<(), Error>> + Send;
}

/// One authenticated connection to an appliance.
pub trait Appliance: Send + Sync {
    fn dns(&self) -> impl LocalDns + '_;

    fn cname(&self) -> impl LocalCname + '_;

    fn clients(&self) -> impl ClientManagement + '_;

    /// The current session id, for reuse by another process or client.
    fn session_id(&self) -> Option<String>;

    /// End the session on the appliance, freeing its session slot.
    fn logout(&self) -> impl Future<Output = Result<(), Error>> + Send;
}
