use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::Error;
use crate::extractors::session_key_from_headers;

const WINDOW: Duration = Duration::from_secs(1);
/// Expired windows are swept once this many clients are tracked.
const SWEEP_THRESHOLD: usize = 1024;

/// Which bucket a request is counted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// One window for every request through the layer.
    Shared,
    /// One window per `X-Session-Key`. Requests without a key share a
    /// single anonymous window.
    PerSessionKey,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    start: Instant,
    count: u32,
}

#[derive(Clone, Debug)]
pub struct RateLimiter {
    rps: u32,
    scope: Scope,
    windows: Arc<Mutex<HashMap<String, Window>>>,
}

impl RateLimiter {
    pub fn new(rps: u32, scope: Scope) -> Self {
        Self {
            rps: rps.max(1),
            scope,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn bucket(&self, headers: &HeaderMap) -> String {
        match self.scope {
            Scope::Shared => String::new(),
            Scope::PerSessionKey => session_key_from_headers(headers)
                .map(|key| format!("key:{}", key))
                .unwrap_or_default(),
        }
    }

    fn allow_at(&self, bucket: &str, now: Instant) -> bool {
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if windows.len() >= SWEEP_THRESHOLD {
            windows.retain(|_, w| now.duration_since(w.start) < WINDOW);
        }

        let window = windows
            .entry(bucket.to_string())
            .or_insert(Window { start: now, count: 0 });
        if now.duration_since(window.start) >= WINDOW {
            *window = Window { start: now, count: 0 };
        }
        if window.count < self.rps {
            window.count += 1;
            true
        } else {
            false
        }
    }

    fn allow(&self, headers: &HeaderMap) -> bool {
        self.allow_at(&self.bucket(headers), Instant::now())
    }
}

pub async fn rps_middleware(
    State(limiter): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !limiter.allow(req.headers()) {
        tracing::debug!(path = %req.uri().path(), scope = ?limiter.scope, "Rate limit exceeded");
        return Error::RateLimited.into_response();
    }
    next.run(req).await
}
