use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{HeaderName, Request, Response, StatusCode};
use axum::response::IntoResponse;
use dashmap::DashMap;
use tower::{Layer, Service};
use tracing::{debug, warn};

/// How often dropped requests are reported and idle buckets are swept.
const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(60);

/// A bucket untouched this long has refilled completely, so forgetting it
/// changes nothing for its client.
const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(600);

/// Header set by Cloudflare with the original client address.
pub const DEFAULT_CLIENT_IP_HEADER: &str = "cf-connecting-ip";

/// Per-client token bucket keyed on a proxy-supplied address header.
/// Requests without the header are not limited.
#[derive(Clone)]
pub struct RateLimiter<S> {
    inner: S,
    state: SharedState,
    client_header: HeaderName,
    policy: Policy,
}

#[derive(Clone, Copy, Debug)]
struct Policy {
    rate_per_sec: f64,
    burst: f64,
    idle_ttl: Duration,
}

#[derive(Clone)]
struct SharedState {
    buckets: Arc<DashMap<String, Bucket>>,
    rejected: Arc<AtomicU64>,
    last_maintenance: Arc<Mutex<Instant>>,
}

#[derive(Debug, Clone)]
struct Bucket {
    tokens: f64,
    touched: Instant,
}

impl Policy {
    /// Idle time after which a bucket may be dropped. Never shorter than a
    /// full refill, so eviction cannot hand a client back tokens early.
    fn eviction_age(&self) -> Duration {
        if self.rate_per_sec <= 0.0 {
            return self.idle_ttl;
        }
        let refill = Duration::from_secs_f64(self.burst / self.rate_per_sec);
        self.idle_ttl.max(refill)
    }
}

impl Bucket {
    fn full(policy: &Policy, now: Instant) -> Self {
        Self {
            tokens: policy.burst,
            touched: now,
        }
    }

    /// Refill for the time since the last visit, then spend one token.
    fn try_take(&mut self, policy: &Policy, now: Instant) -> bool {
        let idle = now.saturating_duration_since(self.touched).as_secs_f64();
        self.tokens = (self.tokens + idle * policy.rate_per_sec).min(policy.burst);
        self.touched = now;
        if self.tokens < 1.0 {
            return false;
        }
        self.tokens -= 1.0;
        true
    }
}

#[derive(Clone)]
pub struct RateLimiterLayer {
    client_header: HeaderName,
    policy: Policy,
}

impl RateLimiterLayer {
    pub fn new(rate_per_sec: u32, burst: u32) -> Self {
        Self {
            client_header: HeaderName::from_static(DEFAULT_CLIENT_IP_HEADER),
            policy: Policy {
                rate_per_sec: f64::from(rate_per_sec),
                burst: f64::from(burst),
                idle_ttl: DEFAULT_IDLE_TTL,
            },
        }
    }

    /// Forget clients that have not been seen for `ttl`.
    pub fn with_idle_ttl(mut self, ttl: Duration) -> Self {
        self.policy.idle_ttl = ttl;
        self
    }

    /// Identify clients by `header` instead of the default.
    pub fn with_client_header(mut self, header: HeaderName) -> Self {
        self.client_header = header;
        self
    }
}

impl<S> Layer<S> for RateLimiterLayer {
    type Service = RateLimiter<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimiter {
            inner,
            state: SharedState::new(),
            client_header: self.client_header.clone(),
            policy: self.policy,
        }
    }
}

impl<S, ReqBody> Service<Request<ReqBody>> for RateLimiter<S>
where
    S: Service<Request<ReqBody>, Response = Response<Body>> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let now = Instant::now();
        self.state.maintain(&self.policy, now);
        let admitted = client_id(&req, &self.client_header)
            .is_none_or(|client| self.state.admit(&client, &self.policy, now));
        if !admitted {
            self.state.rejected.fetch_add(1, Ordering::Relaxed);
            return Box::pin(async {
                Ok((StatusCode::TOO_MANY_REQUESTS, "rate limited").into_response())
            });
        }
        Box::pin(self.inner.call(req))
    }
}

fn client_id<B>(req: &Request<B>, header: &HeaderName) -> Option<String> {
    let raw = req.headers().get(header)?.to_str().ok()?;
    // Forwarding chains list the original client first.
    let first = raw.split(',').next()?.trim();
    (!first.is_empty()).then(|| first.to_string())
}

impl SharedState {
    fn new() -> Self {
        Self {
            buckets: Arc::new(DashMap::new()),
            rejected: Arc::new(AtomicU64::new(0)),
            last_maintenance: Arc::new(Mutex::new(Instant::now())),
        }
    }

    fn admit(&self, client: &str, policy: &Policy, now: Instant) -> bool {
        self.buckets
            .entry(client.to_string())
            .or_insert_with(|| Bucket::full(policy, now))
            .try_take(policy, now)
    }

    /// Once per interval: report rejections and drop idle buckets. Skipped
    /// when another request is already doing it.
    fn maintain(&self, policy: &Policy, now: Instant) {
        let Ok(mut last) = self.last_maintenance.try_lock() else {
            return;
        };
        if now.saturating_duration_since(*last) < MAINTENANCE_INTERVAL {
            return;
        }
        *last = now;
        drop(last);

        let rejected = self.rejected.swap(0, Ordering::Relaxed);
        if rejected > 0 {
            warn!("rate limiter rejected {rejected} requests in the last minute");
        }
        let evicted = self.evict_idle(now, policy.eviction_age());
        if evicted > 0 {
            debug!(
                "rate limiter forgot {evicted} idle clients, {} tracked",
                self.buckets.len()
            );
        }
    }

    fn evict_idle(&self, now: Instant, ttl: Duration) -> usize {
        let before = self.buckets.len();
        self.buckets
            .retain(|_, bucket| now.saturating_duration_since(bucket.touched) < ttl);
        before.saturating_sub(self.buckets.len())
    }
}
