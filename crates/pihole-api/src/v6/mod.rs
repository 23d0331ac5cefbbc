// Pi-hole v6 API client modules
//
// Session-authenticated REST client for the v6 (FTL-embedded) API. The
// request executor lives in `client`; authentication in `session`; each
// record kind gets its own service view over the shared client.

pub mod client;
pub mod clients;
pub mod cname;
pub mod dns;
pub mod session;

pub use client::V6Client;
pub use clients::ClientService;
pub use cname::CnameService;
pub use dns::DnsService;
