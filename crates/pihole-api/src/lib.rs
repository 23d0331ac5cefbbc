// pihole-api: Async Rust client for the Pi-hole configuration API (v6 generation)

pub mod error;
pub mod records;
pub mod retry;
pub mod service;
pub mod transport;
pub mod v6;

pub use error::Error;
pub use records::{ClientRecord, CnameRecord, CreateOptions, DnsRecord};
pub use retry::RetryPolicy;
pub use service::{Appliance, ClientManagement, LocalCname, LocalDns};
pub use transport::{TlsMode, TransportConfig};
pub use v6::V6Client;
