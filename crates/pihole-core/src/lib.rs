// pihole-core: Serialized, cancellable record management between pihole-api and hosts.

pub mod config;
pub mod controller;
pub mod coordinator;
pub mod error;
pub mod validation;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::ConnectionProfile;
pub use controller::{Controller, TERMINATE_TIMEOUT};
pub use coordinator::{Coordinator, Permit};
pub use error::{CoreError, RecordKind};

// Record types hosts work with, so they need not depend on pihole-api directly.
pub use pihole_api::{ClientRecord, CnameRecord, CreateOptions, DnsRecord, RetryPolicy};
pub use tokio_util::sync::CancellationToken;
