//! In-memory fixed-window request limiter keyed by client address.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

use tokio::task::JoinHandle;

use crate::config::AppConfig;

pub const PURGE_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    /// Zero when allowed.
    pub retry_after: Duration,
}

impl RateLimitDecision {
    /// `Retry-After` value in whole seconds, rounded up.
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.retry_after.as_secs();
        if self.retry_after.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }
}

pub trait RateLimiter: Send + Sync {
    fn check(&self, client_id: &str) -> RateLimitDecision;
}

#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: u32,
    started: Instant,
}

#[derive(Debug)]
pub struct FixedWindowRateLimiter {
    max_requests: u32,
    window: Duration,
    entries: Mutex<HashMap<String, WindowEntry>>,
}

impl FixedWindowRateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Self {
        Self::new(cfg.rate_limit_max, cfg.rate_limit_window())
    }

    pub fn check_at(&self, client_id: &str, now: Instant) -> RateLimitDecision {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        let entry = entries
            .entry(client_id.to_string())
            .or_insert(WindowEntry {
                count: 0,
                started: now,
            });

        let elapsed = now.saturating_duration_since(entry.started);
        if entry.count == 0 || elapsed > self.window {
            *entry = WindowEntry {
                count: 1,
                started: now,
            };
            return RateLimitDecision {
                allowed: true,
                remaining: self.max_requests.saturating_sub(1),
                retry_after: Duration::ZERO,
            };
        }

        if entry.count >= self.max_requests {
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
                retry_after: self.window.saturating_sub(elapsed),
            };
        }

        entry.count += 1;
        RateLimitDecision {
            allowed: true,
            remaining: self.max_requests - entry.count,
            retry_after: Duration::ZERO,
        }
    }

    /// Drops entries whose window started more than two windows ago.
    pub fn purge_stale_at(&self, now: Instant) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        let horizon = self.window * 2;
        entries.retain(|_, entry| now.saturating_duration_since(entry.started) <= horizon);
        before - entries.len()
    }

    pub fn purge_stale(&self) -> usize {
        self.purge_stale_at(Instant::now())
    }

    pub fn tracked_clients(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn spawn_purge_task(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let purged = limiter.purge_stale();
                if purged > 0 {
                    tracing::debug!(purged, "purged stale rate limit entries");
                }
            }
        })
    }
}

impl RateLimiter for FixedWindowRateLimiter {
    fn check(&self, client_id: &str) -> RateLimitDecision {
        self.check_at(client_id, Instant::now())
    }
}
