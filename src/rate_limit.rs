use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use crate::handler::error_response;
use crate::state::AppState;

/// Minimum interval between accepted sends from one client identity.
pub const COOLDOWN: Duration = Duration::from_secs(5);

/// How often the background task evicts stale entries.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

const UNKNOWN_IDENTITY: &str = "unknown";

pub struct RateLimiter {
    cooldown: Duration,
    entries: Mutex<HashMap<String, Instant>>,
}

impl RateLimiter {
    pub fn new(cooldown: Duration) -> Self {
        RateLimiter {
            cooldown,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Admits and records the request unless this identity sent another one
    /// within the cooldown window. A rejected request does not refresh the
    /// stored timestamp.
    pub fn try_acquire(&self, identity: &str) -> bool {
        self.try_acquire_at(identity, Instant::now())
    }

    fn try_acquire_at(&self, identity: &str, now: Instant) -> bool {
        let mut entries = self.entries.lock().unwrap();
        if let Some(&last) = entries.get(identity) {
            if now.duration_since(last) < self.cooldown {
                return false;
            }
        }
        entries.insert(identity.to_string(), now);
        true
    }

    /// Drops entries older than the cooldown window; those identities are no
    /// longer limited anyway. Returns the number of evicted entries.
    pub fn sweep_stale(&self) -> usize {
        self.sweep_stale_at(Instant::now())
    }

    fn sweep_stale_at(&self, now: Instant) -> usize {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|_, last| now.duration_since(*last) < self.cooldown);
        before - entries.len()
    }
}

/// Gate applied to the send routes only; everything else bypasses it.
pub async fn enforce(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let identity = client_identity(&request, state.config.trust_forwarded_for);

    if !state.limiter.try_acquire(&identity) {
        tracing::warn!("Rate limit exceeded for {}", identity);
        return error_response(
            "Rate limit exceeded",
            StatusCode::TOO_MANY_REQUESTS,
            "Please wait 5 seconds before sending another email",
        );
    }

    next.run(request).await
}

/// The key that partitions rate-limit state. Transport-level remote address
/// by default; the first `X-Forwarded-For` value when the deployment trusts
/// its reverse proxy.
pub fn client_identity(request: &Request, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty());

        if let Some(forwarded) = forwarded {
            return forwarded.to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| UNKNOWN_IDENTITY.to_string())
}

pub fn spawn_sweeper(limiter: Arc<RateLimiter>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            let removed = limiter.sweep_stale();
            if removed > 0 {
                tracing::debug!("Evicted {} stale rate limit entries", removed);
            }
        }
    });
}
