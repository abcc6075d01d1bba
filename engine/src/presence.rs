//! Presence confirmation for an accepted tag.
//!
//! Full discovery cycles are expensive and would re-activate the tag, so
//! once a tag is accepted the engine only wakes it with short-frame probes
//! at a fixed cadence, tolerating a bounded run of misses before declaring
//! it removed.

use std::time::Duration;

use tokio::time;
use tracing::debug;

use crate::rf::RfPoller;

/// Outcome of one probe cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Present,
    Removed,
}

/// Bounded run of consecutive probe misses.
#[derive(Debug)]
struct MissCounter {
    threshold: u32,
    misses: u32,
}

impl MissCounter {
    fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            misses: 0,
        }
    }

    fn hit(&mut self) {
        self.misses = 0;
    }

    /// Records one miss. Returns true when the run reaches the threshold;
    /// the counter is then reset for the next dwell.
    fn miss(&mut self) -> bool {
        self.misses += 1;
        if self.misses >= self.threshold {
            self.misses = 0;
            return true;
        }
        false
    }
}

pub struct PresenceMonitor {
    period: Duration,
    counter: MissCounter,
}

impl PresenceMonitor {
    pub fn new(period: Duration, threshold: u32) -> Self {
        Self {
            period,
            counter: MissCounter::new(threshold),
        }
    }

    /// Clears the miss run at the start of a dwell.
    pub fn reset(&mut self) {
        self.counter.hit();
    }

    /// Runs one probe cycle: probe, account the outcome, then hold for one
    /// cadence interval. This is the lifecycle loop's only sleeping point
    /// while a tag is present. Declaring removal returns immediately since
    /// there is no next probe to pace.
    pub async fn check<R: RfPoller>(&mut self, rf: &mut R) -> Presence {
        if rf.probe_presence().await {
            // The probe woke the tag; halt it again so the next full
            // discovery pass does not re-activate it.
            rf.sleep().await;
            self.counter.hit();
        } else if self.counter.miss() {
            debug!("presence lost");
            return Presence::Removed;
        } else {
            debug!(misses = self.counter.misses, "tag not found");
        }
        time::sleep(self.period).await;
        Presence::Present
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rf::{ActiveDevice, RfPoller};

    #[test]
    fn removal_takes_exactly_threshold_misses() {
        let mut counter = MissCounter::new(5);
        for _ in 0..4 {
            assert!(!counter.miss());
        }
        assert!(counter.miss());
    }

    #[test]
    fn hit_resets_the_run() {
        let mut counter = MissCounter::new(5);
        for _ in 0..4 {
            assert!(!counter.miss());
        }
        counter.hit();
        for _ in 0..4 {
            assert!(!counter.miss());
        }
        assert!(counter.miss());
    }

    #[test]
    fn counter_resets_after_removal() {
        let mut counter = MissCounter::new(2);
        assert!(!counter.miss());
        assert!(counter.miss());
        assert!(!counter.miss());
        assert!(counter.miss());
    }

    #[test]
    fn zero_threshold_is_clamped() {
        let mut counter = MissCounter::new(0);
        assert!(counter.miss());
    }

    struct ProbeScript {
        outcomes: Vec<bool>,
        sleeps: u32,
    }

    impl RfPoller for ProbeScript {
        type Error = ();

        async fn discover(&mut self) -> Option<ActiveDevice> {
            None
        }

        async fn deactivate(&mut self, _active: bool) {}

        async fn probe_presence(&mut self) -> bool {
            if self.outcomes.is_empty() {
                false
            } else {
                self.outcomes.remove(0)
            }
        }

        async fn sleep(&mut self) {
            self.sleeps += 1;
        }

        async fn reinitialize(&mut self) -> Result<(), ()> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn check_paces_one_period_and_halts_on_hit() {
        let mut rf = ProbeScript {
            outcomes: vec![true],
            sleeps: 0,
        };
        let mut monitor = PresenceMonitor::new(Duration::from_millis(200), 5);

        let before = time::Instant::now();
        assert_eq!(monitor.check(&mut rf).await, Presence::Present);
        assert_eq!(before.elapsed(), Duration::from_millis(200));
        assert_eq!(rf.sleeps, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn removal_returns_without_trailing_sleep() {
        let mut rf = ProbeScript {
            outcomes: Vec::new(),
            sleeps: 0,
        };
        let mut monitor = PresenceMonitor::new(Duration::from_millis(200), 2);

        let before = time::Instant::now();
        assert_eq!(monitor.check(&mut rf).await, Presence::Present);
        assert_eq!(monitor.check(&mut rf).await, Presence::Removed);
        assert_eq!(before.elapsed(), Duration::from_millis(200));
        assert_eq!(rf.sleeps, 0);
    }
}
