//! Sliding-window rate limiting for anonymous write endpoints.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::{RateLimitConfig, WindowConfig};
use crate::observability::metrics;

/// Per-client admission timestamps for one endpoint category.
///
/// Entries older than the window are dropped on every check, so the limit
/// slides continuously instead of resetting at bucket boundaries.
#[derive(Default)]
pub struct SlidingWindowLimiter {
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindowLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit and record one event for `client_id` if fewer than `max_count`
    /// were admitted within the trailing `window`.
    pub fn try_admit(&self, client_id: &str, max_count: usize, window: Duration) -> bool {
        self.try_admit_at(client_id, max_count, window, Instant::now())
    }

    pub fn try_admit_at(&self, client_id: &str, max_count: usize, window: Duration, now: Instant) -> bool {
        let mut windows = self.windows.lock().expect("rate limiter mutex poisoned");
        let hits = windows.entry(client_id.to_string()).or_default();
        prune(hits, window, now);

        if hits.len() < max_count {
            hits.push_back(now);
            true
        } else {
            false
        }
    }

    /// Drop clients with no admissions inside `window`. Returns how many
    /// were removed.
    pub fn sweep(&self, window: Duration) -> usize {
        self.sweep_at(window, Instant::now())
    }

    pub fn sweep_at(&self, window: Duration, now: Instant) -> usize {
        let mut windows = self.windows.lock().expect("rate limiter mutex poisoned");
        let before = windows.len();
        windows.retain(|_, hits| {
            prune(hits, window, now);
            !hits.is_empty()
        });
        before - windows.len()
    }

    /// Number of tracked client ids.
    pub fn tracked_clients(&self) -> usize {
        self.windows.lock().expect("rate limiter mutex poisoned").len()
    }
}

fn prune(hits: &mut VecDeque<Instant>, window: Duration, now: Instant) {
    while let Some(oldest) = hits.front() {
        if now.saturating_duration_since(*oldest) >= window {
            hits.pop_front();
        } else {
            break;
        }
    }
}

/// Protected endpoint categories; each has its own limit and window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Submission,
    Lead,
    Login,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Submission, Category::Lead, Category::Login];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Submission => "submission",
            Category::Lead => "lead",
            Category::Login => "login",
        }
    }

    /// Client-facing rejection message.
    pub fn rejection(&self) -> &'static str {
        match self {
            Category::Submission => "Too many submissions. Try later.",
            Category::Lead => "Too many messages. Try later.",
            Category::Login => "Too many login attempts. Try later.",
        }
    }
}

/// The limiter consulted by request handlers: one sliding window per category.
pub struct RateLimiter {
    enabled: bool,
    submissions: (SlidingWindowLimiter, WindowConfig),
    leads: (SlidingWindowLimiter, WindowConfig),
    logins: (SlidingWindowLimiter, WindowConfig),
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            enabled: config.enabled,
            submissions: (SlidingWindowLimiter::new(), config.submissions),
            leads: (SlidingWindowLimiter::new(), config.leads),
            logins: (SlidingWindowLimiter::new(), config.logins),
        }
    }

    fn slot(&self, category: Category) -> &(SlidingWindowLimiter, WindowConfig) {
        match category {
            Category::Submission => &self.submissions,
            Category::Lead => &self.leads,
            Category::Login => &self.logins,
        }
    }

    /// Admit one request from `client_id` in `category`.
    pub fn try_admit(&self, category: Category, client_id: &str) -> bool {
        if !self.enabled {
            return true;
        }
        let (limiter, policy) = self.slot(category);
        let admitted = limiter.try_admit(client_id, policy.max_requests, policy.window());
        if !admitted {
            tracing::warn!(client = %client_id, category = category.as_str(), "Rate limit exceeded");
            metrics::record_rate_limited(category.as_str());
        }
        admitted
    }

    /// Evict idle clients from every category.
    pub fn sweep(&self) -> usize {
        Category::ALL
            .iter()
            .map(|category| {
                let (limiter, policy) = self.slot(*category);
                limiter.sweep(policy.window())
            })
            .sum()
    }

    pub fn tracked_clients(&self) -> usize {
        Category::ALL
            .iter()
            .map(|category| self.slot(*category).0.tracked_clients())
            .sum()
    }
}
