//! Per-client request quota keyed by the caller's real IP.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::clock::Clock;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

use crate::error::AppError;

/// Forwarding headers consulted for the client address, most trusted first.
const REAL_IP_HEADERS: [&str; 3] = ["true-client-ip", "x-real-ip", "x-forwarded-for"];

/// Tracked clients above which idle buckets are dropped.
const RETAIN_THRESHOLD: usize = 10_000;

/// Token bucket per client IP.
pub struct ClientRateLimiter {
    limiter: DefaultKeyedRateLimiter<IpAddr>,
}

impl ClientRateLimiter {
    pub fn per_minute(requests: NonZeroU32) -> Self {
        Self {
            limiter: RateLimiter::keyed(Quota::per_minute(requests)),
        }
    }

    /// Take one request from `client`'s bucket, or return the whole seconds
    /// until the next one is allowed.
    pub fn check(&self, client: IpAddr) -> Result<(), u64> {
        let outcome = self.limiter.check_key(&client).map_err(|not_until| {
            let wait = not_until.wait_time_from(self.limiter.clock().now());
            wait.as_secs().max(1)
        });

        if self.limiter.len() > RETAIN_THRESHOLD {
            self.limiter.retain_recent();
        }

        outcome
    }
}

/// Client address from the forwarding headers, else the socket peer.
/// Requests with neither share the unspecified address.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> IpAddr {
    REAL_IP_HEADERS
        .iter()
        .filter_map(|name| headers.get(*name)?.to_str().ok())
        .filter_map(|value| value.split(',').next()?.trim().parse::<IpAddr>().ok())
        .next()
        .or_else(|| peer.map(|addr| addr.ip()))
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

pub async fn limit_by_client_ip(
    State(limiter): State<Arc<ClientRateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_ip(request.headers(), peer);

    match limiter.check(client) {
        Ok(()) => next.run(request).await,
        Err(retry_after_secs) => {
            tracing::debug!(%client, retry_after_secs, "client rate limit exceeded");
            AppError::RateLimited { retry_after_secs }.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use rstest::rstest;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(*name, HeaderValue::from_static(value));
        }
        headers
    }

    #[rstest]
    #[case(&[("x-forwarded-for", "203.0.113.7, 10.0.0.1")], "203.0.113.7")]
    #[case(&[("x-real-ip", "198.51.100.2"), ("x-forwarded-for", "203.0.113.7")], "198.51.100.2")]
    #[case(&[("true-client-ip", "2001:db8::1"), ("x-real-ip", "198.51.100.2")], "2001:db8::1")]
    #[case(&[("x-real-ip", "not-an-ip")], "192.0.2.10")]
    #[case(&[], "192.0.2.10")]
    fn real_ip_resolution(#[case] pairs: &[(&'static str, &'static str)], #[case] expected: &str) {
        let peer: SocketAddr = "192.0.2.10:51000".parse().unwrap();

        let ip = client_ip(&headers(pairs), Some(peer));

        assert_eq!(ip, expected.parse::<IpAddr>().unwrap());
    }

    #[test]
    fn unknown_client_falls_back_to_unspecified() {
        assert_eq!(
            client_ip(&HeaderMap::new(), None),
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        );
    }

    #[test]
    fn quota_is_tracked_per_client() {
        let limiter = ClientRateLimiter::per_minute(NonZeroU32::new(2).unwrap());
        let first: IpAddr = "203.0.113.7".parse().unwrap();
        let second: IpAddr = "203.0.113.8".parse().unwrap();

        assert!(limiter.check(first).is_ok());
        assert!(limiter.check(first).is_ok());
        let retry_after = limiter.check(first).unwrap_err();
        assert!((1..=60).contains(&retry_after));

        assert!(limiter.check(second).is_ok());
    }
}
