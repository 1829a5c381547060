//! Per-provider rate-limit cool-down.
//!
//! A provider that answers `RateLimited` is skipped for a fixed window. The
//! tracker is keyed by provider name and is shared by every resolver of one
//! engine, so throttling seen while geocoding also pauses routing calls to
//! the same service.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

/// Default cool-down window after a provider reports rate limiting.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

/// Tracks which providers are cooling down and until when.
#[derive(Debug)]
pub struct CooldownTracker {
    window: Duration,
    until: Mutex<HashMap<String, Instant>>,
}

impl Default for CooldownTracker {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

impl CooldownTracker {
    /// Create a tracker with the given window. A zero window disables
    /// cool-downs.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            until: Mutex::new(HashMap::new()),
        }
    }

    /// Length of the cool-down window.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Start (or restart) the cool-down for `provider`.
    pub fn start(&self, provider: &str) {
        if self.window.is_zero() {
            return;
        }
        let Some(until) = Instant::now().checked_add(self.window) else {
            return;
        };
        log::warn!("{provider} is rate limited; skipping it for {:?}", self.window);
        self.until.lock().insert(provider.to_owned(), until);
    }

    /// Time left before `provider` may be called again, if it is cooling
    /// down. Elapsed entries are forgotten.
    #[must_use]
    pub fn remaining(&self, provider: &str) -> Option<Duration> {
        let now = Instant::now();
        let mut until = self.until.lock();
        let deadline = *until.get(provider)?;
        if deadline <= now {
            until.remove(provider);
            return None;
        }
        Some(deadline.saturating_duration_since(now))
    }

    /// Whether `provider` is currently cooling down.
    #[must_use]
    pub fn is_cooling(&self, provider: &str) -> bool {
        self.remaining(provider).is_some()
    }

    /// Forget every cool-down.
    pub fn reset(&self) {
        self.until.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn cooldown_expires_after_window() {
        let tracker = CooldownTracker::new(Duration::from_secs(60));
        tracker.start("graphhopper");

        assert_eq!(tracker.remaining("graphhopper"), Some(Duration::from_secs(60)));
        assert!(!tracker.is_cooling("nominatim"));

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(tracker.is_cooling("graphhopper"));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(!tracker.is_cooling("graphhopper"));
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn restarting_extends_the_window() {
        let tracker = CooldownTracker::new(Duration::from_secs(10));
        tracker.start("osrm");
        tokio::time::advance(Duration::from_secs(8)).await;
        tracker.start("osrm");
        tokio::time::advance(Duration::from_secs(8)).await;

        assert_eq!(tracker.remaining("osrm"), Some(Duration::from_secs(2)));
    }

    #[rstest]
    fn zero_window_never_cools_down() {
        let tracker = CooldownTracker::new(Duration::ZERO);
        tracker.start("osrm");
        assert!(!tracker.is_cooling("osrm"));
    }

    #[rstest]
    fn reset_clears_everything() {
        let tracker = CooldownTracker::default();
        tracker.start("osrm");
        tracker.reset();
        assert!(!tracker.is_cooling("osrm"));
    }
}
