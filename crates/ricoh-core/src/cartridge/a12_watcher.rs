//! PPU A12 edge detection for MMC3-style scanline counters.
//!
//! The counter clocks on rising edges of PPU address line A12. During a
//! scanline A12 toggles rapidly between nametable and pattern fetches, so the
//! chip only accepts a rise after A12 has been low for a while. This watcher
//! measures that low time in PPU dots.

/// Minimum low time, in PPU dots, before a rise counts.
const MIN_LOW_DOTS: u64 = 10;

#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct A12Watcher {
    /// PPU dot at which A12 was first seen low, `None` while high.
    low_since: Option<u64>,
}

impl A12Watcher {
    pub const fn new() -> Self {
        Self { low_since: None }
    }

    pub fn reset(&mut self) {
        self.low_since = None;
    }

    /// Observes a pattern-table address put on the bus at PPU dot `dot`
    /// (a monotonically increasing count). Returns `true` on an accepted
    /// rising edge.
    pub fn observe(&mut self, addr: u16, dot: u64) -> bool {
        let high = addr & 0x1000 != 0;
        match (high, self.low_since) {
            (false, None) => {
                self.low_since = Some(dot);
                false
            }
            (false, Some(_)) => false,
            (true, Some(since)) => {
                self.low_since = None;
                dot.saturating_sub(since) > MIN_LOW_DOTS
            }
            (true, None) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_low_pulses_are_filtered() {
        let mut w = A12Watcher::new();
        assert!(!w.observe(0x1000, 0));
        assert!(!w.observe(0x0000, 1));
        assert!(!w.observe(0x0000, 5));
        // Low for 5 dots only.
        assert!(!w.observe(0x1000, 6));

        assert!(!w.observe(0x0FF0, 10));
        assert!(!w.observe(0x0000, 20));
        assert!(w.observe(0x1FF0, 26));
        // Staying high is not another edge.
        assert!(!w.observe(0x1000, 40));
    }
}
