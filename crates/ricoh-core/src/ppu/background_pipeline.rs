/// Background shifters and the fetch latches that feed them.
///
/// Two 16-bit pattern shifters and two palette shifters. The high byte is
/// the tile on screen, the low byte the next one. Fine X picks which bit is
/// sampled, so the shift cadence never changes with scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub(crate) struct BgPipeline {
    pattern: [u16; 2],
    palette: [u16; 2],
    /// Latches filled by the 8-dot fetch cycle.
    pub(crate) next_tile: u8,
    pub(crate) next_palette: u8,
    pub(crate) next_low: u8,
    pub(crate) next_high: u8,
}

impl BgPipeline {
    /// Moves the fetched tile into the low byte of every shifter.
    pub(crate) fn reload(&mut self) {
        self.pattern[0] = (self.pattern[0] & 0xFF00) | self.next_low as u16;
        self.pattern[1] = (self.pattern[1] & 0xFF00) | self.next_high as u16;
        for bit in 0..2 {
            let fill = if self.next_palette >> bit & 1 != 0 { 0xFF } else { 0x00 };
            self.palette[bit] = (self.palette[bit] & 0xFF00) | fill;
        }
    }

    pub(crate) fn shift(&mut self) {
        for reg in self.pattern.iter_mut().chain(self.palette.iter_mut()) {
            *reg <<= 1;
        }
    }

    /// `(palette, color)` of the current pixel; color 0 is transparent.
    pub(crate) fn sample(&self, fine_x: u8) -> (u8, u8) {
        let bit = 15 - (fine_x & 7);
        let pick = |reg: u16| ((reg >> bit) & 1) as u8;
        (
            pick(self.palette[1]) << 1 | pick(self.palette[0]),
            pick(self.pattern[1]) << 1 | pick(self.pattern[0]),
        )
    }
}
