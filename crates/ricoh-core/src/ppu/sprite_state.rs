//! Per-dot sprite evaluation into secondary OAM.
//!
//! Dots 1-64 fill secondary OAM with `$FF`. Dots 65-256 walk primary OAM,
//! one read/write pair per two dots: an in-range sprite costs four pairs, an
//! out-of-range one a single pair. Once eight sprites are found the walk
//! carries on with the hardware's diagonal `n`/`m` increment, so the
//! overflow flag reacts to tile, attribute and X bytes as well as Y.

use crate::memory::ppu as ppu_mem;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
enum Phase {
    #[default]
    ScanY,
    /// Copying bytes 1..=3 of an in-range sprite.
    Copy,
    OverflowScan,
    Done,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct SpriteEvaluation {
    phase: Phase,
    /// Primary OAM sprite index.
    n: u8,
    /// Byte within the sprite.
    m: u8,
    count: u8,
    sprite0_in_range: bool,
    secondary: [u8; ppu_mem::SECONDARY_OAM_SIZE],
}

impl Default for SpriteEvaluation {
    fn default() -> Self {
        Self {
            phase: Phase::ScanY,
            n: 0,
            m: 0,
            count: 0,
            sprite0_in_range: false,
            secondary: [0xFF; ppu_mem::SECONDARY_OAM_SIZE],
        }
    }
}

impl SpriteEvaluation {
    /// Dots 1-64. One byte cleared every other dot.
    pub(crate) fn clear_step(&mut self, dot: u16) {
        if dot & 1 == 0 {
            self.secondary[((dot - 1) / 2) as usize] = 0xFF;
        }
        if dot == 64 {
            self.phase = Phase::ScanY;
            self.n = 0;
            self.m = 0;
            self.count = 0;
            self.sprite0_in_range = false;
        }
    }

    /// One read/write pair (dots 66, 68, ..., 256). Returns `true` when the
    /// overflow condition is met.
    pub(crate) fn step(&mut self, oam: &[u8; ppu_mem::OAM_SIZE], scanline: u16, height: u16) -> bool {
        let in_range = |y: u8| scanline.wrapping_sub(y as u16) < height;
        let base = self.n as usize * 4;
        match self.phase {
            Phase::ScanY => {
                let y = oam[base];
                self.secondary[self.count as usize * 4] = y;
                if in_range(y) {
                    if self.n == 0 {
                        self.sprite0_in_range = true;
                    }
                    self.m = 1;
                    self.phase = Phase::Copy;
                } else {
                    self.next_sprite();
                }
            }
            Phase::Copy => {
                let m = self.m as usize;
                self.secondary[self.count as usize * 4 + m] = oam[base + m];
                self.m += 1;
                if self.m == 4 {
                    self.m = 0;
                    self.count += 1;
                    self.next_sprite();
                }
            }
            Phase::OverflowScan => {
                if in_range(oam[base + self.m as usize]) {
                    self.phase = Phase::Done;
                    return true;
                }
                self.m = (self.m + 1) & 3;
                self.n += 1;
                if self.n == 64 {
                    self.phase = Phase::Done;
                }
            }
            Phase::Done => {}
        }
        false
    }

    fn next_sprite(&mut self) {
        self.n += 1;
        self.phase = if self.n == 64 {
            Phase::Done
        } else if self.count == 8 {
            Phase::OverflowScan
        } else {
            Phase::ScanY
        };
    }

    pub(crate) fn count(&self) -> u8 {
        self.count
    }

    pub(crate) fn sprite0_in_range(&self) -> bool {
        self.sprite0_in_range
    }

    /// Bytes of secondary-OAM slot `i`: Y, tile, attributes, X.
    pub(crate) fn slot(&self, i: usize) -> [u8; 4] {
        let b = i * 4;
        [
            self.secondary[b],
            self.secondary[b + 1],
            self.secondary[b + 2],
            self.secondary[b + 3],
        ]
    }
}
