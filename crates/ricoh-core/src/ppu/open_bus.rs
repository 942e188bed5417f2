/// Frames after which an undriven bit of the PPU's I/O latch reads back 0
/// (about one second of NTSC video).
const DECAY_FRAMES: u64 = 60;

/// The PPU data-bus latch behind `$2000-$2007`.
///
/// Every register write and read drives some or all of its bits. Bits not
/// refreshed for [`DECAY_FRAMES`] frames fade to 0.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub(crate) struct PpuOpenBus {
    value: u8,
    refreshed: [u64; 8],
}

impl PpuOpenBus {
    /// Drives the bits in `mask` to `value`.
    pub(crate) fn drive(&mut self, mask: u8, value: u8, frame: u64) {
        self.value = (self.value & !mask) | (value & mask);
        for (bit, stamp) in self.refreshed.iter_mut().enumerate() {
            if mask >> bit & 1 != 0 {
                *stamp = frame;
            }
        }
    }

    /// Latch contents as seen at `frame`.
    pub(crate) fn value(&self, frame: u64) -> u8 {
        self.refreshed
            .iter()
            .enumerate()
            .filter(|&(_, &stamp)| frame.saturating_sub(stamp) <= DECAY_FRAMES)
            .fold(0, |acc, (bit, _)| acc | (self.value & (1 << bit)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undriven_bits_decay() {
        let mut bus = PpuOpenBus::default();
        bus.drive(0xFF, 0xAA, 0);
        bus.drive(0x0F, 0x05, 50);
        assert_eq!(bus.value(50), 0xA5);
        assert_eq!(bus.value(61), 0x05);
        assert_eq!(bus.value(200), 0x00);
    }
}
