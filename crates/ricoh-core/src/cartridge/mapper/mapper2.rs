//! Mapper 2 (UxROM): a switchable 16 KiB PRG bank at `$8000`, the last bank
//! fixed at `$C000`, and 8 KiB of CHR RAM.

use crate::cartridge::{
    header::Mirroring,
    mapper::{Board, CHR_BANK_8K, PRG_BANK_16K},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapper2 {
    pub(crate) board: Board,
    bank: u8,
}

impl Mapper2 {
    pub fn new(board: Board) -> Self {
        Self { board, bank: 0 }
    }

    pub fn power_on(&mut self) {
        self.bank = 0;
    }

    pub fn cpu_read(&self, addr: u16) -> Option<u8> {
        let rom = &self.board.prg_rom;
        match addr {
            0x6000..=0x7FFF => self.board.prg_ram.read(addr),
            0x8000..=0xBFFF => Some(rom.read(self.bank as usize, PRG_BANK_16K, addr)),
            0xC000..=0xFFFF => Some(rom.read(rom.last_bank(PRG_BANK_16K), PRG_BANK_16K, addr)),
            _ => None,
        }
    }

    /// Any write to ROM space selects the bank. Bus conflicts are ignored.
    pub fn cpu_write(&mut self, addr: u16, value: u8) {
        match addr {
            0x6000..=0x7FFF => self.board.prg_ram.write(addr, value),
            0x8000..=0xFFFF => self.bank = value,
            _ => {}
        }
    }

    pub fn ppu_peek(&self, addr: u16) -> u8 {
        self.board.chr.read(0, CHR_BANK_8K, addr)
    }

    pub fn ppu_write(&mut self, addr: u16, value: u8) {
        self.board.chr.write(0, CHR_BANK_8K, addr, value);
    }

    pub fn mirroring(&self) -> Mirroring {
        self.board.mirroring
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::{Cartridge, Mapper, tests::ines_image};

    #[test]
    fn switches_low_window_only() {
        let image = ines_image(2, 4, 0, 0, |i| (i / PRG_BANK_16K) as u8);
        let Mapper::UxRom(mut m) = Cartridge::load(&image).unwrap().into_mapper() else {
            panic!("expected UxROM");
        };
        assert_eq!(m.cpu_read(0x8000), Some(0));
        assert_eq!(m.cpu_read(0xC000), Some(3));
        m.cpu_write(0x8000, 2);
        assert_eq!(m.cpu_read(0xBFFF), Some(2));
        assert_eq!(m.cpu_read(0xFFFF), Some(3));
        // Out-of-range banks wrap.
        m.cpu_write(0x8000, 5);
        assert_eq!(m.cpu_read(0x8000), Some(1));
    }
}
