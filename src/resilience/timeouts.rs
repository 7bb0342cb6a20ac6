//! Timeout enforcement.
//!
//! # Responsibilities
//! - Bound an upstream call (send plus body read) by one deadline
//! - Convert configured seconds into a `Duration`
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - No deadline configured means the call may wait indefinitely
//! - Expiry drops the inner future, which aborts the connection

use std::future::Future;
use std::time::Duration;

/// The deadline that expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elapsed(pub Duration);

/// Run `fut`, giving up after `limit` when one is set.
pub async fn with_timeout<F>(limit: Option<Duration>, fut: F) -> Result<F::Output, Elapsed>
where
    F: Future,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| Elapsed(limit)),
        None => Ok(fut.await),
    }
}

/// Seconds from configuration; `None` for non-positive or non-finite values.
pub fn timeout_from_secs(secs: f64) -> Option<Duration> {
    (secs.is_finite() && secs > 0.0).then(|| Duration::from_secs_f64(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_limit_waits() {
        let out = with_timeout(None, async { 7 }).await;
        assert_eq!(out, Ok(7));
    }

    #[tokio::test]
    async fn test_limit_expires() {
        let limit = Duration::from_millis(10);
        let out = with_timeout(Some(limit), tokio::time::sleep(Duration::from_secs(5))).await;
        assert_eq!(out, Err(Elapsed(limit)));
    }

    #[test]
    fn test_timeout_from_secs() {
        assert_eq!(timeout_from_secs(1.5), Some(Duration::from_millis(1500)));
        assert_eq!(timeout_from_secs(0.0), None);
        assert_eq!(timeout_from_secs(f64::NAN), None);
    }
}
