// Input predicates checked before any request leaves the process.

use std::net::IpAddr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

const MAX_DOMAIN_LEN: usize = 253;

/// Dot-separated labels of alphanumerics, `-` and `_`, never starting or
/// ending a label with a separator.
static DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([a-zA-Z0-9]([a-zA-Z0-9_-]*[a-zA-Z0-9])?\.)*[a-zA-Z0-9]([a-zA-Z0-9_-]*[a-zA-Z0-9])?$",
    )
    .expect("domain pattern compiles")
});

pub fn is_valid_domain(domain: &str) -> bool {
    !domain.is_empty() && domain.len() <= MAX_DOMAIN_LEN && DOMAIN_RE.is_match(domain)
}

pub fn is_valid_ip(ip: &str) -> bool {
    ip.parse::<IpAddr>().is_ok()
}

pub fn validate_domain(domain: &str) -> Result<(), CoreError> {
    if is_valid_domain(domain) {
        Ok(())
    } else {
        Err(CoreError::validation(format!("invalid domain name: {domain:?}")))
    }
}

pub fn validate_ip(ip: &str) -> Result<(), CoreError> {
    if is_valid_ip(ip) {
        Ok(())
    } else {
        Err(CoreError::validation(format!("invalid IP address: {ip:?}")))
    }
}

/// Client identifiers (IP, MAC, hostname, CIDR, interface) are free-form
/// on the appliance; only emptiness is rejected here.
pub fn validate_client_id(client: &str) -> Result<(), CoreError> {
    if client.trim().is_empty() {
        Err(CoreError::validation("client identifier must not be empty"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_domains() {
        for d in ["example.local", "nas", "my_host.lan", "a-b.c-d.example.com", "x1.y2"] {
            assert!(is_valid_domain(d), "{d} should be valid");
        }
    }

    #[test]
    fn rejects_malformed_domains() {
        for d in ["", ".local", "local.", "-a.local", "a-.local", "a..b", "has space.local", "a,b"] {
            assert!(!is_valid_domain(d), "{d:?} should be invalid");
        }
    }

    #[test]
    fn rejects_overlong_domains() {
        let label = "a".repeat(63);
        let long = [label.as_str(); 5].join(".");
        assert!(long.len() > MAX_DOMAIN_LEN);
        assert!(!is_valid_domain(&long));
    }

    #[test]
    fn ip_accepts_v4_and_v6() {
        assert!(is_valid_ip("10.0.0.5"));
        assert!(is_valid_ip("fd00::1"));
        assert!(!is_valid_ip("10.0.0.256"));
        assert!(!is_valid_ip("example.local"));
    }

    #[test]
    fn client_id_must_not_be_blank() {
        assert!(validate_client_id("aa:bb:cc:dd:ee:ff").is_ok());
        assert!(matches!(
            validate_client_id("  "),
            Err(CoreError::Validation { .. })
        ));
    }
}
