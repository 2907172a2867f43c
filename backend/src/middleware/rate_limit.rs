//! Fixed-window request limiter keyed by client IP.
//!
//! Every client address gets `max_requests` per window. Requests over the
//! budget are answered with `429 Too Many Requests`, a `Retry-After` header
//! and the JSON error envelope. Paths under `/health` are never counted.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::RETRY_AFTER;
use actix_web::{Error, ResponseError};
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use futures_util::future::{LocalBoxFuture, Ready, ready};
use mockable::Clock;
use tracing::{debug, warn};

use crate::domain::Error as ApiError;

const EXEMPT_PREFIX: &str = "/health";
const PRUNE_EVERY: u64 = 1024;

/// Outcome of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: DateTime<Utc>,
    count: u32,
}

/// Shared per-client counters.
pub struct RateLimiter {
    max_requests: u32,
    window: TimeDelta,
    counters: DashMap<String, Window>,
    checks: AtomicU64,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Limiter admitting `max_requests` per `window` for each key.
    pub fn new(max_requests: u32, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window: TimeDelta::from_std(window)
                .unwrap_or(TimeDelta::seconds(60))
                .max(TimeDelta::seconds(1)),
            counters: DashMap::new(),
            checks: AtomicU64::new(0),
            clock,
        }
    }

    /// Count one request from `key`.
    pub fn check(&self, key: &str) -> RateDecision {
        let now = self.clock.utc();
        if self.checks.fetch_add(1, Ordering::Relaxed) % PRUNE_EVERY == PRUNE_EVERY - 1 {
            self.prune_at(now);
        }

        let mut entry = self.counters.entry(key.to_owned()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now - entry.started >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }
        if entry.count >= self.max_requests {
            let remaining = self.window - (now - entry.started);
            let secs = remaining.num_seconds() + i64::from(remaining.subsec_nanos() > 0);
            return RateDecision::Limited {
                retry_after: Duration::from_secs(u64::try_from(secs.max(1)).unwrap_or(1)),
            };
        }
        entry.count += 1;
        RateDecision::Allowed {
            remaining: self.max_requests - entry.count,
        }
    }

    /// Drop counters whose window has elapsed.
    pub fn prune(&self) {
        self.prune_at(self.clock.utc());
    }

    fn prune_at(&self, now: DateTime<Utc>) {
        let before = self.counters.len();
        self.counters
            .retain(|_, window| now - window.started < self.window);
        debug!(
            removed = before.saturating_sub(self.counters.len()),
            "rate limiter counters pruned"
        );
    }

    /// Number of tracked clients.
    pub fn tracked_clients(&self) -> usize {
        self.counters.len()
    }
}

/// Middleware applying a shared [`RateLimiter`].
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use actix_web::App;
/// use mockable::DefaultClock;
/// use store_backend::middleware::{RateLimit, RateLimiter};
///
/// let limiter = Arc::new(RateLimiter::new(100, Duration::from_secs(60), Arc::new(DefaultClock)));
/// let _app = App::new().wrap(RateLimit::new(limiter));
/// ```
#[derive(Clone)]
pub struct RateLimit {
    limiter: Arc<RateLimiter>,
}

impl RateLimit {
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self { limiter }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service,
            limiter: self.limiter.clone(),
        }))
    }
}

/// Service wrapper produced by [`RateLimit`].
pub struct RateLimitMiddleware<S> {
    service: S,
    limiter: Arc<RateLimiter>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if req.path().starts_with(EXEMPT_PREFIX) {
            let fut = self.service.call(req);
            return Box::pin(async move { Ok(fut.await?.map_into_left_body()) });
        }

        let client = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_owned();
        match self.limiter.check(&client) {
            RateDecision::Allowed { .. } => {
                let fut = self.service.call(req);
                Box::pin(async move { Ok(fut.await?.map_into_left_body()) })
            }
            RateDecision::Limited { retry_after } => {
                warn!(%client, path = req.path(), "rate limit exceeded");
                let mut response =
                    ApiError::too_many_requests("too many requests, slow down").error_response();
                response.headers_mut().insert(
                    RETRY_AFTER,
                    actix_web::http::header::HeaderValue::from(retry_after.as_secs()),
                );
                Box::pin(ready(Ok(req.into_response(response).map_into_right_body())))
            }
        }
    }
}
