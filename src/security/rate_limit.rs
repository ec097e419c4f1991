//! Sliding-window rate limiting with temporary blocking.
//!
//! # State Transitions (per client)
//! ```text
//! Unblocked → Blocked: recent requests in window >= requests_per_window
//! Blocked → Unblocked: block duration elapses (checked lazily on access)
//! ```
//!
//! Lifting a block does not clear the window. A client whose earlier
//! requests are still inside the window can be blocked again by its very
//! next request.
//!
//! Records are created on the first request from a client and never
//! evicted. Pruning happens only when a record is touched.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use dashmap::DashMap;

use crate::config::RateLimitConfig;
use crate::error::RateLimitReason;
use crate::observability::metrics;

/// Per-client request history and block state.
#[derive(Debug, Default)]
pub struct ClientRecord {
    /// Oldest first.
    recent: VecDeque<Instant>,
    blocked_until: Option<Instant>,
}

impl ClientRecord {
    /// Drop timestamps older than `now - window`.
    fn prune(&mut self, now: Instant, window: Duration) {
        let Some(cutoff) = now.checked_sub(window) else {
            return;
        };
        while self.recent.front().is_some_and(|ts| *ts < cutoff) {
            self.recent.pop_front();
        }
    }

    /// Returns true while a block is in force, clearing it once expired.
    fn block_active(&mut self, now: Instant) -> bool {
        match self.blocked_until {
            Some(until) if now < until => true,
            Some(_) => {
                self.blocked_until = None;
                false
            }
            None => false,
        }
    }

    /// Count this request against the window, or start a block if the quota is spent.
    fn try_record(&mut self, now: Instant, settings: &RateLimitSettings) -> bool {
        self.prune(now, settings.window);
        if self.recent.len() >= settings.requests_per_window {
            self.blocked_until = Some(now + settings.block);
            return false;
        }
        self.recent.push_back(now);
        true
    }

    pub fn recent_requests(&self) -> usize {
        self.recent.len()
    }

    pub fn blocked_until(&self) -> Option<Instant> {
        self.blocked_until
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSettings {
    pub requests_per_window: usize,
    pub window: Duration,
    pub block: Duration,
}

impl From<&RateLimitConfig> for RateLimitSettings {
    fn from(config: &RateLimitConfig) -> Self {
        Self {
            requests_per_window: config.requests_per_window as usize,
            window: Duration::from_secs(config.window_secs),
            block: Duration::from_secs(config.block_secs),
        }
    }
}

/// Per-client sliding window limiter.
///
/// Each client's record sits behind its own map shard lock, so the
/// read-modify-write of a single decision can't interleave with another
/// request from the same client.
pub struct RateLimiter {
    clients: DashMap<String, ClientRecord>,
    settings: ArcSwap<RateLimitSettings>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            clients: DashMap::new(),
            settings: ArcSwap::from_pointee(config.into()),
        }
    }

    /// Replace thresholds. Existing client records are kept.
    pub fn reconfigure(&self, config: &RateLimitConfig) {
        self.settings.store(Arc::new(config.into()));
    }

    pub fn settings(&self) -> RateLimitSettings {
        **self.settings.load()
    }

    pub fn is_blocked(&self, client: &str) -> bool {
        self.is_blocked_at(client, Instant::now())
    }

    /// True while `client` is serving a block. An expired block is cleared here.
    pub fn is_blocked_at(&self, client: &str, now: Instant) -> bool {
        match self.clients.get_mut(client) {
            Some(mut record) => record.block_active(now),
            None => false,
        }
    }

    pub fn check_and_record(&self, client: &str) -> bool {
        self.check_and_record_at(client, Instant::now())
    }

    /// Record a request if the client still has quota. When the quota is
    /// spent the client is blocked and the request is not recorded.
    pub fn check_and_record_at(&self, client: &str, now: Instant) -> bool {
        let settings = self.settings();
        let mut record = self.clients.entry(client.to_owned()).or_default();
        let allowed = record.try_record(now, &settings);
        drop(record);
        metrics::record_tracked_clients(self.tracked_clients());
        allowed
    }

    pub fn check(&self, client: &str) -> Result<(), RateLimitReason> {
        self.check_at(client, Instant::now())
    }

    /// Block test followed by quota check, both under one lock on the client's record.
    pub fn check_at(&self, client: &str, now: Instant) -> Result<(), RateLimitReason> {
        let settings = self.settings();
        let mut record = self.clients.entry(client.to_owned()).or_default();
        let outcome = if record.block_active(now) {
            Err(RateLimitReason::Blocked)
        } else if record.try_record(now, &settings) {
            Ok(())
        } else {
            Err(RateLimitReason::Exceeded)
        };
        drop(record);
        metrics::record_tracked_clients(self.tracked_clients());
        outcome
    }

    /// Number of client identifiers seen since startup.
    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }

    /// Recent request count and block expiry for `client`, without pruning.
    pub fn inspect(&self, client: &str) -> Option<(usize, Option<Instant>)> {
        self.clients
            .get(client)
            .map(|r| (r.recent_requests(), r.blocked_until()))
    }
}
