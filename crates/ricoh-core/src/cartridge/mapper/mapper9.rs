//! Mapper 9 (MMC2, PxROM).
//!
//! PRG: one switchable 8 KiB bank at `$8000`, the last three banks fixed.
//! CHR: two 4 KiB windows, each with an FD and an FE bank register. Which one
//! is live is chosen by a latch per window that flips when the PPU fetches
//! the tiles at `$xFD8`/`$xFE8`. The latch changes after that fetch, so the
//! trigger tile itself still comes from the old bank.

use tracing::trace;

use crate::cartridge::{
    header::Mirroring,
    mapper::{Board, CHR_BANK_4K, PRG_BANK_8K},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Latch {
    Fd,
    Fe,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapper9 {
    pub(crate) board: Board,
    prg_bank: u8,
    /// `[FD, FE]` bank for `$0000-$0FFF`.
    chr_low: [u8; 2],
    /// `[FD, FE]` bank for `$1000-$1FFF`.
    chr_high: [u8; 2],
    latch_low: Latch,
    latch_high: Latch,
    mirroring: Mirroring,
}

impl Mapper9 {
    pub fn new(board: Board) -> Self {
        let mirroring = board.mirroring;
        Self {
            board,
            prg_bank: 0,
            chr_low: [0; 2],
            chr_high: [0; 2],
            latch_low: Latch::Fd,
            latch_high: Latch::Fe,
            mirroring,
        }
    }

    pub fn power_on(&mut self) {
        self.prg_bank = 0;
        self.chr_low = [0; 2];
        self.chr_high = [0; 2];
        self.latch_low = Latch::Fd;
        self.latch_high = Latch::Fe;
        self.mirroring = self.board.mirroring;
    }

    pub fn cpu_read(&self, addr: u16) -> Option<u8> {
        let rom = &self.board.prg_rom;
        match addr {
            0x6000..=0x7FFF => self.board.prg_ram.read(addr),
            0x8000..=0x9FFF => Some(rom.read(self.prg_bank as usize, PRG_BANK_8K, addr)),
            0xA000..=0xFFFF => {
                // `$A000` is the third-last bank, `$E000` the last.
                let from_end = 3 - ((addr - 0xA000) >> 13) as usize;
                let bank = rom.bank_count(PRG_BANK_8K).saturating_sub(from_end);
                Some(rom.read(bank, PRG_BANK_8K, addr))
            }
            _ => None,
        }
    }

    pub fn cpu_write(&mut self, addr: u16, value: u8) {
        match addr {
            0x6000..=0x7FFF => self.board.prg_ram.write(addr, value),
            0xA000..=0xAFFF => {
                self.prg_bank = value & 0x0F;
                trace!(bank = self.prg_bank, "MMC2 PRG bank");
            }
            0xB000..=0xBFFF => self.chr_low[0] = value & 0x1F,
            0xC000..=0xCFFF => self.chr_low[1] = value & 0x1F,
            0xD000..=0xDFFF => self.chr_high[0] = value & 0x1F,
            0xE000..=0xEFFF => self.chr_high[1] = value & 0x1F,
            0xF000..=0xFFFF => {
                self.mirroring = if value & 1 == 0 {
                    Mirroring::Vertical
                } else {
                    Mirroring::Horizontal
                };
            }
            _ => {}
        }
    }

    fn chr_bank(&self, addr: u16) -> usize {
        let (banks, latch) = if addr & 0x1000 == 0 {
            (&self.chr_low, self.latch_low)
        } else {
            (&self.chr_high, self.latch_high)
        };
        match latch {
            Latch::Fd => banks[0] as usize,
            Latch::Fe => banks[1] as usize,
        }
    }

    /// Pattern fetch; updates the latches after reading.
    pub fn ppu_read(&mut self, addr: u16) -> u8 {
        let value = self.ppu_peek(addr);
        match addr {
            0x0FD8 => self.latch_low = Latch::Fd,
            0x0FE8 => self.latch_low = Latch::Fe,
            0x1FD8..=0x1FDF => self.latch_high = Latch::Fd,
            0x1FE8..=0x1FEF => self.latch_high = Latch::Fe,
            _ => {}
        }
        value
    }

    pub fn ppu_peek(&self, addr: u16) -> u8 {
        self.board.chr.read(self.chr_bank(addr), CHR_BANK_4K, addr)
    }

    pub fn ppu_write(&mut self, addr: u16, value: u8) {
        let bank = self.chr_bank(addr);
        self.board.chr.write(bank, CHR_BANK_4K, addr, value);
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::{Cartridge, Mapper, tests::ines_image};

    fn mmc2() -> Mapper9 {
        // 8 x 16 KiB PRG = 16 x 8 KiB banks holding their index; 4 x 8 KiB CHR.
        let image = ines_image(9, 8, 4, 0, |i| (i / PRG_BANK_8K) as u8);
        let Mapper::Mmc2(m) = Cartridge::load(&image).unwrap().into_mapper() else {
            panic!("expected MMC2");
        };
        m
    }

    #[test]
    fn prg_layout() {
        let mut m = mmc2();
        m.cpu_write(0xA000, 5);
        assert_eq!(m.cpu_read(0x8000), Some(5));
        assert_eq!(m.cpu_read(0xA000), Some(13));
        assert_eq!(m.cpu_read(0xC000), Some(14));
        assert_eq!(m.cpu_read(0xFFFF), Some(15));
    }

    #[test]
    fn latch_switches_after_trigger_fetch() {
        let mut m = mmc2();
        m.cpu_write(0xB000, 1); // low FD
        m.cpu_write(0xC000, 2); // low FE
        // CHR bytes hold their 1 KiB bank index; 4 KiB bank n starts at 4n.
        assert_eq!(m.ppu_peek(0x0000), 4);

        assert_eq!(m.ppu_read(0x0FE8), 7);
        assert_eq!(m.ppu_peek(0x0000), 8);

        assert_eq!(m.ppu_read(0x0FD8), 11);
        assert_eq!(m.ppu_peek(0x0000), 4);
    }

    #[test]
    fn high_latch_triggers_on_a_range() {
        let mut m = mmc2();
        m.cpu_write(0xD000, 3); // high FD
        m.cpu_write(0xE000, 4); // high FE
        assert_eq!(m.ppu_peek(0x1000), 16);
        m.ppu_read(0x1FDC);
        assert_eq!(m.ppu_peek(0x1000), 12);
        m.ppu_read(0x1FEF);
        assert_eq!(m.ppu_peek(0x1000), 16);
        // Peeks never move a latch.
        m.ppu_peek(0x1FD8);
        assert_eq!(m.ppu_peek(0x1000), 16);
    }

    #[test]
    fn mirroring_register() {
        let mut m = mmc2();
        m.cpu_write(0xF000, 1);
        assert_eq!(m.mirroring(), Mirroring::Horizontal);
        m.cpu_write(0xF000, 0);
        assert_eq!(m.mirroring(), Mirroring::Vertical);
    }
}
