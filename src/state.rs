use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::dto::StatsResponse;
use crate::rate_limit::RateLimiter;
use crate::service::EmailService;

/// Everything the handlers share, constructed once in `main` and cloned
/// into each request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub service: Arc<EmailService>,
    pub stats: Arc<Stats>,
    pub limiter: Arc<RateLimiter>,
}

pub struct Stats {
    started_at: DateTime<Utc>,
    total: AtomicU64,
    success: AtomicU64,
    failed: AtomicU64,
    last_email: Mutex<Option<DateTime<Utc>>>,
}

impl Stats {
    pub fn new() -> Self {
        Stats {
            started_at: Utc::now(),
            total: AtomicU64::new(0),
            success: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            last_email: Mutex::new(None),
        }
    }

    /// Called once a request passes validation, before its outcome is known.
    pub fn record_accepted(&self, now: DateTime<Utc>) {
        self.total.fetch_add(1, Ordering::Relaxed);
        *self.last_email.lock().unwrap() = Some(now);
    }

    pub fn record_success(&self) {
        self.success.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsResponse {
        StatsResponse {
            total_emails_sent: self.total.load(Ordering::Relaxed),
            successful_emails: self.success.load(Ordering::Relaxed),
            failed_emails: self.failed.load(Ordering::Relaxed),
            last_email_sent: *self.last_email.lock().unwrap(),
            uptime: format_uptime(Utc::now() - self.started_at),
        }
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

fn format_uptime(elapsed: chrono::Duration) -> String {
    let secs = elapsed.num_seconds().max(0);
    let (hours, mins, rem) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{hours}h{mins}m{rem}s")
    } else if mins > 0 {
        format!("{mins}m{rem}s")
    } else {
        format!("{rem}s")
    }
}
