//! Per-client rate limiting on top of `governor`.
//!
//! Clients are keyed by IP. The peer address from the connection is the
//! default key; `x-forwarded-for` is only consulted when the peer is one of
//! the configured trusted proxies. State lives in process, so several API
//! instances behind one load balancer each enforce their own budget.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use governor::{DefaultKeyedRateLimiter, Quota};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::RateLimitConfig;
use crate::error::AppError;
use crate::state::AppState;

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Key used when the request carries no connection info.
pub const UNKNOWN_CLIENT: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Keyed GCRA limiter: `max_requests` may burst at once, and the budget
/// refills evenly over `window`.
pub struct RateLimiter {
    limiter: DefaultKeyedRateLimiter<IpAddr>,
    trusted_proxies: Vec<IpAddr>,
    sweep_every: Duration,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        let burst = NonZeroU32::new(config.max_requests).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::with_period(config.window / burst.get())
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst);

        Self {
            limiter: governor::RateLimiter::keyed(quota),
            trusted_proxies: config.trusted_proxies.clone(),
            sweep_every: config.window,
        }
    }

    /// Spend one request from `client`'s budget. Returns `false` when the
    /// budget is exhausted.
    pub fn check(&self, client: IpAddr) -> bool {
        self.limiter.check_key(&client).is_ok()
    }

    /// Resolve the client for a request.
    ///
    /// A trusted peer's `x-forwarded-for` chain is walked from the right,
    /// skipping further trusted proxies; the first other address is the
    /// client. Anyone else is keyed by their own address.
    pub fn client_ip(&self, req: &Request) -> IpAddr {
        let Some(ConnectInfo(peer)) = req.extensions().get::<ConnectInfo<SocketAddr>>() else {
            return UNKNOWN_CLIENT;
        };
        let peer = peer.ip();
        if !self.trusted_proxies.contains(&peer) {
            return peer;
        }

        let hops = forwarded_hops(req.headers());
        let mut client = peer;
        for hop in hops.iter().rev() {
            match hop.parse::<IpAddr>() {
                Ok(ip) => {
                    client = ip;
                    if !self.trusted_proxies.contains(&ip) {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
        client
    }

    /// Forget clients whose budget has fully refilled. Returns how many were
    /// removed.
    pub fn sweep(&self) -> usize {
        let before = self.limiter.len();
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        before.saturating_sub(self.limiter.len())
    }

    pub fn tracked_keys(&self) -> usize {
        self.limiter.len()
    }

    /// Run [`sweep`](Self::sweep) once per window until `cancel` fires.
    pub fn spawn_sweeper(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.sweep_every);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                tokio::select! {
                    () = cancel.cancelled() => {
                        tracing::debug!("Rate limit sweeper stopped");
                        break;
                    }
                    _ = interval.tick() => {
                        let removed = self.sweep();
                        if removed > 0 {
                            tracing::debug!(removed, "Pruned idle rate limit keys");
                        }
                    }
                }
            }
        })
    }
}

/// Every `x-forwarded-for` entry, left to right across repeated headers.
fn forwarded_hops(headers: &HeaderMap) -> Vec<&str> {
    headers
        .get_all(FORWARDED_FOR)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .collect()
}

/// Axum middleware enforcing [`AppState::rate_limiter`].
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let client = state.rate_limiter.client_ip(&req);
    if !state.rate_limiter.check(client) {
        tracing::warn!(client = %client, "Rate limit exceeded");
        return AppError::RateLimited.into_response();
    }
    next.run(req).await
}
