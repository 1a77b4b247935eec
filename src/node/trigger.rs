//! Debounced trigger latch.
//!
//! The hardware edge-to-flag pattern, generalized: an interrupt (or any
//! event source) may only set this latch; all real work happens when the
//! control loop observes and takes it. Repeated edges before consumption
//! coalesce into one pending trigger — an event queue of one.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct TriggerLatch {
    debounce: Duration,
    pending: bool,
    last_edge: Option<Instant>,
}

impl TriggerLatch {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            pending: false,
            last_edge: None,
        }
    }

    /// Registers an edge; edges inside the debounce window are ignored.
    pub fn press(&mut self, now: Instant) {
        if let Some(last) = self.last_edge
            && now.duration_since(last) < self.debounce
        {
            return;
        }
        self.last_edge = Some(now);
        self.pending = true;
    }

    /// Consumes the pending trigger, if any.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEBOUNCE: Duration = Duration::from_millis(200);

    #[test]
    fn test_press_sets_and_take_clears() {
        let mut latch = TriggerLatch::new(DEBOUNCE);
        assert!(!latch.take());

        latch.press(Instant::now());
        assert!(latch.is_pending());
        assert!(latch.take());
        assert!(!latch.take());
    }

    #[test]
    fn test_bounced_edges_are_ignored() {
        let mut latch = TriggerLatch::new(DEBOUNCE);
        let t0 = Instant::now();

        latch.press(t0);
        assert!(latch.take());

        // Within the debounce window the second edge does nothing
        latch.press(t0 + Duration::from_millis(50));
        assert!(!latch.is_pending());

        // Past the window it registers again
        latch.press(t0 + Duration::from_millis(200));
        assert!(latch.take());
    }

    #[test]
    fn test_repeated_presses_coalesce() {
        let mut latch = TriggerLatch::new(DEBOUNCE);
        let t0 = Instant::now();

        latch.press(t0);
        latch.press(t0 + Duration::from_millis(300));
        latch.press(t0 + Duration::from_millis(600));

        // All collapse into a single pending trigger
        assert!(latch.take());
        assert!(!latch.take());
    }
}
