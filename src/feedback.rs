//! Short-lived per-element flags, such as the "copied" badge on a bubble.
//!
//! Each target holds at most one expiry. Triggering again replaces it, so the
//! newest trigger always decides when the flag clears.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::time::Instant;

pub const DEFAULT_FEEDBACK_DURATION: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
pub struct FeedbackTimer<K> {
    duration: Duration,
    flags: HashMap<K, Instant>,
}

impl<K> Default for FeedbackTimer<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new(DEFAULT_FEEDBACK_DURATION)
    }
}

impl<K> FeedbackTimer<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            flags: HashMap::new(),
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn trigger(&mut self, target: K) {
        self.trigger_at(target, Instant::now());
    }

    /// Flag `target` as of `now`, restarting any expiry already running for it.
    pub fn trigger_at(&mut self, target: K, now: Instant) {
        self.flags.insert(target, now + self.duration);
    }

    pub fn is_active(&self, target: &K) -> bool {
        self.is_active_at(target, Instant::now())
    }

    pub fn is_active_at(&self, target: &K, now: Instant) -> bool {
        self.flags.get(target).is_some_and(|expires_at| now < *expires_at)
    }

    /// Drop every expired flag, returning the targets that were cleared.
    pub fn sweep(&mut self) -> Vec<K> {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&mut self, now: Instant) -> Vec<K> {
        let expired: Vec<K> = self
            .flags
            .iter()
            .filter(|(_, expires_at)| now >= **expires_at)
            .map(|(target, _)| target.clone())
            .collect();
        for target in &expired {
            self.flags.remove(target);
        }
        expired
    }

    /// Flags still lit at `now`; expired but unswept flags are not counted.
    pub fn active_count_at(&self, now: Instant) -> usize {
        self.flags.values().filter(|expires_at| now < **expires_at).count()
    }

    pub fn active_count(&self) -> usize {
        self.active_count_at(Instant::now())
    }
}
