use core::fmt;

// yyy NN YYYYY XXXXX
//  |  |    |     +---- coarse X
//  |  |    +---------- coarse Y
//  |  +--------------- nametable select
//  +------------------ fine Y
const COARSE_X: u16 = 0x001F;
const COARSE_Y: u16 = 0x03E0;
const NAMETABLE_X: u16 = 0x0400;
const NAMETABLE_Y: u16 = 0x0800;
const NAMETABLE: u16 = NAMETABLE_X | NAMETABLE_Y;
const FINE_Y: u16 = 0x7000;
const ALL: u16 = 0x7FFF;

/// The PPU's 15-bit `v`/`t` scroll address.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub(crate) struct VramAddr(u16);

impl VramAddr {
    pub(crate) fn coarse_x(self) -> u16 {
        self.0 & COARSE_X
    }

    pub(crate) fn set_coarse_x(&mut self, cx: u8) {
        self.0 = (self.0 & !COARSE_X) | (cx as u16 & 0x1F);
    }

    pub(crate) fn coarse_y(self) -> u16 {
        (self.0 & COARSE_Y) >> 5
    }

    pub(crate) fn set_coarse_y(&mut self, cy: u8) {
        self.0 = (self.0 & !COARSE_Y) | ((cy as u16 & 0x1F) << 5);
    }

    pub(crate) fn set_nametable(&mut self, nt: u8) {
        self.0 = (self.0 & !NAMETABLE) | ((nt as u16 & 0b11) << 10);
    }

    pub(crate) fn fine_y(self) -> u16 {
        (self.0 & FINE_Y) >> 12
    }

    pub(crate) fn set_fine_y(&mut self, fy: u8) {
        self.0 = (self.0 & !FINE_Y) | ((fy as u16 & 0b111) << 12);
    }

    pub(crate) fn raw(self) -> u16 {
        self.0
    }

    pub(crate) fn set_raw(&mut self, v: u16) {
        self.0 = v & ALL;
    }

    /// Address on the 14-bit PPU bus.
    pub(crate) fn bus_addr(self) -> u16 {
        self.0 & 0x3FFF
    }

    pub(crate) fn increment(&mut self, step: u16) {
        self.0 = (self.0 + step) & ALL;
    }

    /// Nametable byte for the tile under `v`.
    pub(crate) fn tile_addr(self) -> u16 {
        0x2000 | (self.0 & 0x0FFF)
    }

    /// Attribute byte covering the tile under `v`.
    pub(crate) fn attribute_addr(self) -> u16 {
        0x23C0 | (self.0 & NAMETABLE) | ((self.0 >> 4) & 0x38) | ((self.0 >> 2) & 0x07)
    }

    /// Bit offset of this tile's quadrant inside its attribute byte.
    pub(crate) fn attribute_shift(self) -> u8 {
        (((self.coarse_y() & 0b10) << 1) | (self.coarse_x() & 0b10)) as u8
    }

    /// Coarse X step at the end of each fetched tile, wrapping into the
    /// horizontally adjacent nametable.
    pub(crate) fn increment_x(&mut self) {
        if self.coarse_x() == 31 {
            self.0 &= !COARSE_X;
            self.0 ^= NAMETABLE_X;
        } else {
            self.0 += 1;
        }
    }

    /// Fine Y step at dot 256. Row 29 wraps into the vertically adjacent
    /// nametable; rows 30 and 31 (attribute memory) wrap without switching.
    pub(crate) fn increment_y(&mut self) {
        if self.fine_y() < 7 {
            self.0 += 0x1000;
            return;
        }
        self.0 &= !FINE_Y;
        match self.coarse_y() {
            29 => {
                self.set_coarse_y(0);
                self.0 ^= NAMETABLE_Y;
            }
            31 => self.set_coarse_y(0),
            cy => self.set_coarse_y(cy as u8 + 1),
        }
    }

    pub(crate) fn copy_horizontal(&mut self, t: VramAddr) {
        let bits = COARSE_X | NAMETABLE_X;
        self.0 = (self.0 & !bits) | (t.0 & bits);
    }

    pub(crate) fn copy_vertical(&mut self, t: VramAddr) {
        let bits = COARSE_Y | NAMETABLE_Y | FINE_Y;
        self.0 = (self.0 & !bits) | (t.0 & bits);
    }
}

impl fmt::Debug for VramAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VramAddr")
            .field("raw", &format_args!("{:#06X}", self.0))
            .field("fine_y", &self.fine_y())
            .field("nametable", &((self.0 & NAMETABLE) >> 10))
            .field("coarse_y", &self.coarse_y())
            .field("coarse_x", &self.coarse_x())
            .finish()
    }
}
