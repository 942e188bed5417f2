//! `$2000-$2007` state plus the internal `v/t/x/w` scroll latches.

mod control;
mod mask;
mod status;
mod vram_addr;

pub(crate) use control::Control;
pub(crate) use mask::Mask;
pub(crate) use status::Status;
pub(crate) use vram_addr::VramAddr;

/// Internal scroll state, named as on the NESdev wiki.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub(crate) struct Scroll {
    /// Current VRAM address.
    pub(crate) v: VramAddr,
    /// Temporary address; top-left of the screen during rendering.
    pub(crate) t: VramAddr,
    /// Fine X, 0..=7.
    pub(crate) x: u8,
    /// First/second write toggle shared by `$2005` and `$2006`.
    pub(crate) w: bool,
}

impl Scroll {
    /// `$2005`: X then Y.
    pub(crate) fn write_scroll(&mut self, value: u8) {
        if self.w {
            self.t.set_coarse_y(value >> 3);
            self.t.set_fine_y(value & 0b111);
        } else {
            self.t.set_coarse_x(value >> 3);
            self.x = value & 0b111;
        }
        self.w = !self.w;
    }

    /// `$2006`: high byte (bit 14 cleared) then low byte, which also loads
    /// `v`.
    pub(crate) fn write_addr(&mut self, value: u8) {
        if self.w {
            self.t.set_raw((self.t.raw() & 0x7F00) | value as u16);
            self.v = self.t;
        } else {
            self.t
                .set_raw((self.t.raw() & 0x00FF) | ((value as u16 & 0x3F) << 8));
        }
        self.w = !self.w;
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Registers {
    pub(crate) control: Control,
    pub(crate) mask: Mask,
    pub(crate) status: Status,
    pub(crate) oam_addr: u8,
    pub(crate) scroll: Scroll,
    /// Delayed `$2007` read buffer.
    pub(crate) read_buffer: u8,
}

impl Registers {
    pub(crate) fn write_control(&mut self, value: u8) {
        self.control = Control::from_bits_retain(value);
        self.scroll.t.set_nametable(self.control.nametable_index());
    }

    /// Reset button: control, mask and the write toggle clear. Status and
    /// OAM address survive.
    pub(crate) fn reset(&mut self) {
        self.control = Control::empty();
        self.mask = Mask::empty();
        self.scroll.w = false;
        self.scroll.t = VramAddr::default();
        self.scroll.x = 0;
        self.read_buffer = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_writes_fill_t_and_fine_x() {
        let mut scroll = Scroll::default();
        scroll.write_scroll(0b0111_1101); // coarse X 15, fine X 5
        scroll.write_scroll(0b0101_1110); // coarse Y 11, fine Y 6
        assert_eq!(scroll.x, 5);
        assert_eq!(scroll.t.coarse_x(), 15);
        assert_eq!(scroll.t.coarse_y(), 11);
        assert_eq!(scroll.t.fine_y(), 6);
        assert!(!scroll.w);
    }

    #[test]
    fn scroll_ab_cd_splits_into_coarse_and_fine() {
        let mut scroll = Scroll::default();
        scroll.write_scroll(0xAB);
        assert_eq!(scroll.t.coarse_x(), 0x15);
        assert_eq!(scroll.x, 3);
        assert!(scroll.w);
        scroll.write_scroll(0xCD);
        assert_eq!(scroll.t.coarse_y(), 0x19);
        assert_eq!(scroll.t.fine_y(), 5);
        assert_eq!(scroll.t.coarse_x(), 0x15);
    }

    #[test]
    fn second_addr_write_copies_t_into_v() {
        let mut scroll = Scroll::default();
        scroll.write_addr(0xFF);
        assert_eq!(scroll.v.raw(), 0);
        scroll.write_addr(0x10);
        assert_eq!(scroll.v.raw(), 0x3F10);
    }

    #[test]
    fn control_write_sets_t_nametable() {
        let mut regs = Registers::default();
        regs.write_control(0b10);
        assert_eq!(regs.scroll.t.raw(), 0x0800);
    }
}
