// Retry policy for create calls that race a prior delete.
//
// dnsmasq on the appliance can still hold an entry for a moment after the
// API acknowledged its removal. Creates hitting that window answer
// HTTP 400 with an "already present" style body and succeed once retried.

use std::time::Duration;

use reqwest::StatusCode;

/// Body marker the appliance uses for a duplicate DNS host or CNAME.
pub const ALREADY_PRESENT: &str = "already present";

/// Body marker dnsmasq uses for a conflicting CNAME.
pub const DUPLICATE_CNAME: &str = "duplicate CNAME";

/// Bounded exponential backoff for create conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total create attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each one after.
    pub base_delay: Duration,
    /// Pause between a forced pre-delete and the create that follows it.
    pub settle_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(200),
            settle_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// A policy with no waiting at all, for tests and scripted hosts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            settle_delay: Duration::ZERO,
        }
    }

    /// Delay to wait before `attempt` (0-based). The first attempt never waits.
    ///
    /// 200ms, 400ms, 800ms, 1600ms, ... with the default base.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

/// Whether a failed create response is the transient duplicate condition.
///
/// Only HTTP 400 bodies are inspected; any other status is never retried.
pub fn is_transient_conflict(status: StatusCode, body: &str, markers: &[&str]) -> bool {
    status == StatusCode::BAD_REQUEST && markers.iter().any(|m| body.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_delays_double_from_200ms() {
        let policy = RetryPolicy::default();
        let delays: Vec<u128> = (0..5).map(|a| policy.delay_before(a).as_millis()).collect();
        assert_eq!(delays, vec![0, 200, 400, 800, 1600]);
    }

    #[test]
    fn delays_strictly_increase_after_first_retry() {
        let policy = RetryPolicy::default();
        for attempt in 1..policy.max_attempts {
            assert!(policy.delay_before(attempt + 1) > policy.delay_before(attempt));
        }
    }

    #[test]
    fn huge_attempt_numbers_saturate() {
        let policy = RetryPolicy::default();
        assert!(policy.delay_before(64) >= policy.delay_before(31));
    }

    #[test]
    fn only_bad_request_with_marker_is_transient() {
        let markers = [ALREADY_PRESENT, DUPLICATE_CNAME];
        assert!(is_transient_conflict(
            StatusCode::BAD_REQUEST,
            r#"{"error":{"message":"Item already present"}}"#,
            &markers,
        ));
        assert!(is_transient_conflict(
            StatusCode::BAD_REQUEST,
            "dnsmasq: duplicate CNAME alias.local",
            &markers,
        ));
        assert!(!is_transient_conflict(
            StatusCode::BAD_REQUEST,
            "invalid domain",
            &markers
        ));
        assert!(!is_transient_conflict(
            StatusCode::CONFLICT,
            "already present",
            &markers
        ));
    }

    #[test]
    fn dns_markers_ignore_cname_wording() {
        assert!(!is_transient_conflict(
            StatusCode::BAD_REQUEST,
            "duplicate CNAME",
            &[ALREADY_PRESENT],
        ));
    }
}
