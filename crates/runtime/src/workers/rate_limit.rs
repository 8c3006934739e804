//! Per-actor request throttling.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use inventory_core::{ActorId, RequestClass};

/// Fixed-window counters per actor and request class.
///
/// Each (actor, class) pair gets `quota` requests per `window`; the window
/// starts with the first request after the previous one expired. Expired
/// windows are swept at most once per window length.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    window: Duration,
    mutation_quota: u32,
    query_quota: u32,
    resync_quota: u32,
    windows: HashMap<(ActorId, RequestClass), (Instant, u32)>,
    last_sweep: Option<Instant>,
}

impl RateLimiter {
    pub fn new(window: Duration, mutation_quota: u32, query_quota: u32, resync_quota: u32) -> Self {
        Self {
            window,
            mutation_quota,
            query_quota,
            resync_quota,
            windows: HashMap::new(),
            last_sweep: None,
        }
    }

    pub fn quota(&self, class: RequestClass) -> u32 {
        match class {
            RequestClass::Mutation => self.mutation_quota,
            RequestClass::Query => self.query_quota,
            RequestClass::Resync => self.resync_quota,
        }
    }

    /// Counts one request; returns `false` once the actor is over quota.
    pub fn check(&mut self, actor: ActorId, class: RequestClass, now: Instant) -> bool {
        self.sweep(now);

        let quota = self.quota(class);
        let (started, count) = self.windows.entry((actor, class)).or_insert((now, 0));

        if now.saturating_duration_since(*started) >= self.window {
            *started = now;
            *count = 0;
        }
        if *count >= quota {
            return false;
        }
        *count += 1;
        true
    }

    /// Drops all counters of a disconnected actor.
    pub fn forget(&mut self, actor: ActorId) {
        self.windows.retain(|(tracked, _), _| *tracked != actor);
    }

    /// Number of live (actor, class) windows.
    pub fn tracked(&self) -> usize {
        self.windows.len()
    }

    fn sweep(&mut self, now: Instant) {
        if let Some(last) = self.last_sweep
            && now.saturating_duration_since(last) < self.window
        {
            return;
        }
        let window = self.window;
        self.windows
            .retain(|_, (started, _)| now.saturating_duration_since(*started) < window);
        self.last_sweep = Some(now);
    }
}
