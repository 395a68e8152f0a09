//! Limiter backed by the `governor` crate's GCRA implementation.

use std::num::NonZeroU32;
use std::sync::Arc;

use ::governor::clock::DefaultClock;
use ::governor::state::keyed::DefaultKeyedStateStore;
use ::governor::{Quota, RateLimiter as Gcra};
use dashmap::DashMap;

use super::{Key, RateLimiter, RateSpec, RequestInfo};

type KeyedLimiter = Gcra<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// In-process limiter with one keyed GCRA limiter per `(group, rate)`.
///
/// A rate of `N/period` allows a burst of N and then one request every
/// `period / N`. Dry runs never consume capacity and report "not limited".
#[derive(Default)]
pub struct GovernorLimiter {
    buckets: DashMap<(String, String), Arc<KeyedLimiter>>,
}

impl GovernorLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    fn bucket(&self, group: &str, rate: &str) -> Option<Arc<KeyedLimiter>> {
        let id = (group.to_string(), rate.to_string());
        if let Some(limiter) = self.buckets.get(&id) {
            return Some(limiter.clone());
        }

        let spec: RateSpec = match rate.parse() {
            Ok(spec) => spec,
            Err(e) => {
                tracing::warn!(group, rate, error = %e, "Invalid rate, not limiting");
                return None;
            }
        };
        let quota = quota_for(&spec)?;

        let limiter = self
            .buckets
            .entry(id)
            .or_insert_with(|| Arc::new(KeyedLimiter::keyed(quota)))
            .clone();
        Some(limiter)
    }

    /// Number of caller keys currently holding limiter state.
    pub fn tracked_keys(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.len()).sum()
    }
}

fn quota_for(spec: &RateSpec) -> Option<Quota> {
    let burst = NonZeroU32::new(spec.count)?;
    let quota = Quota::with_period(spec.period / spec.count)
        .unwrap_or_else(|| Quota::per_second(burst));
    Some(quota.allow_burst(burst))
}

impl RateLimiter for GovernorLimiter {
    fn is_ratelimited(
        &self,
        info: &RequestInfo<'_>,
        group: &str,
        key: Key,
        rate: &str,
        increment: bool,
    ) -> bool {
        if !increment {
            return false;
        }
        let Some(bucket) = self.bucket(group, rate) else {
            return false;
        };
        bucket.check_key(&key.value_of(info)).is_err()
    }

    fn retain_recent(&self) {
        for bucket in self.buckets.iter() {
            bucket.retain_recent();
            bucket.shrink_to_fit();
        }
        tracing::debug!(keys = self.tracked_keys(), "Pruned limiter state");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::limiter::FORWARDED_FOR;
    use axum::http::{HeaderMap, HeaderValue, Method};

    fn headers(client: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(FORWARDED_FOR, HeaderValue::from_str(client).unwrap());
        h
    }

    static GET: Method = Method::GET;

    fn info(headers: &HeaderMap) -> RequestInfo<'_> {
        RequestInfo {
            method: &GET,
            path: "/",
            headers,
            peer: None,
        }
    }

    const XFF: Key = Key::Header(FORWARDED_FOR);

    #[test]
    fn test_limits_after_burst() {
        let limiter = GovernorLimiter::new();
        let h = headers("198.51.100.1");

        assert!(!limiter.is_ratelimited(&info(&h), "cms.page", XFF, "2/m", true));
        assert!(!limiter.is_ratelimited(&info(&h), "cms.page", XFF, "2/m", true));
        assert!(limiter.is_ratelimited(&info(&h), "cms.page", XFF, "2/m", true));
    }

    #[test]
    fn test_callers_and_groups_are_independent() {
        let limiter = GovernorLimiter::new();
        let a = headers("198.51.100.1");
        let b = headers("198.51.100.2");

        assert!(!limiter.is_ratelimited(&info(&a), "blog", XFF, "1/m", true));
        assert!(limiter.is_ratelimited(&info(&a), "blog", XFF, "1/m", true));
        assert!(!limiter.is_ratelimited(&info(&b), "blog", XFF, "1/m", true));
        assert!(!limiter.is_ratelimited(&info(&a), "shop", XFF, "1/m", true));
    }

    #[test]
    fn test_dry_run_does_not_consume() {
        let limiter = GovernorLimiter::new();
        let h = headers("198.51.100.1");

        assert!(!limiter.is_ratelimited(&info(&h), "g", XFF, "1/m", false));
        assert!(!limiter.is_ratelimited(&info(&h), "g", XFF, "1/m", false));
        assert!(!limiter.is_ratelimited(&info(&h), "g", XFF, "1/m", true));
        assert!(limiter.is_ratelimited(&info(&h), "g", XFF, "1/m", true));
        assert!(!limiter.is_ratelimited(&info(&h), "g", XFF, "1/m", false));
    }

    #[test]
    fn test_retain_recent_prunes_idle_callers() {
        let limiter = GovernorLimiter::new();
        for i in 0..500 {
            let h = headers(&format!("198.51.{}.{}", i / 250, i % 250));
            limiter.is_ratelimited(&info(&h), "g", XFF, "1000/s", true);
        }
        assert_eq!(limiter.tracked_keys(), 500);

        std::thread::sleep(Duration::from_millis(20));
        RateLimiter::retain_recent(&limiter);
        assert_eq!(limiter.tracked_keys(), 0);
    }

    #[test]
    fn test_invalid_rate_never_limits() {
        let limiter = GovernorLimiter::new();
        let h = headers("198.51.100.1");
        for _ in 0..5 {
            assert!(!limiter.is_ratelimited(&info(&h), "g", XFF, "often", true));
        }
    }
}
