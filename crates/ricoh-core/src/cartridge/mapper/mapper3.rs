//! Mapper 3 (CNROM): fixed PRG like NROM, with the whole 8 KiB CHR window
//! switched by writes to `$8000-$FFFF`.

use tracing::trace;

use crate::cartridge::{
    header::Mirroring,
    mapper::{Board, CHR_BANK_8K, PRG_BANK_32K},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapper3 {
    pub(crate) board: Board,
    chr_bank: u8,
}

impl Mapper3 {
    pub fn new(board: Board) -> Self {
        Self { board, chr_bank: 0 }
    }

    pub fn power_on(&mut self) {
        self.chr_bank = 0;
    }

    pub fn cpu_read(&self, addr: u16) -> Option<u8> {
        match addr {
            0x6000..=0x7FFF => self.board.prg_ram.read(addr),
            0x8000..=0xFFFF => Some(self.board.prg_rom.read(0, PRG_BANK_32K, addr)),
            _ => None,
        }
    }

    pub fn cpu_write(&mut self, addr: u16, value: u8) {
        match addr {
            0x6000..=0x7FFF => self.board.prg_ram.write(addr, value),
            0x8000..=0xFFFF => {
                self.chr_bank = value;
                trace!(bank = value, "CNROM CHR bank");
            }
            _ => {}
        }
    }

    pub fn ppu_peek(&self, addr: u16) -> u8 {
        self.board.chr.read(self.chr_bank as usize, CHR_BANK_8K, addr)
    }

    pub fn ppu_write(&mut self, addr: u16, value: u8) {
        self.board
            .chr
            .write(self.chr_bank as usize, CHR_BANK_8K, addr, value);
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
    fn selects_eight_k_chr_bank() {
        let image = ines_image(3, 1, 4, 0, |_| 0);
        let Mapper::CnRom(mut m) = Cartridge::load(&image).unwrap().into_mapper() else {
            panic!("expected CNROM");
        };
        // CHR bytes hold their 1 KiB bank index.
        assert_eq!(m.ppu_peek(0x0000), 0);
        m.cpu_write(0x8000, 2);
        assert_eq!(m.ppu_peek(0x0000), 16);
        assert_eq!(m.ppu_peek(0x1C00), 23);
        m.ppu_write(0x0000, 0xFF);
        assert_eq!(m.ppu_peek(0x0000), 16);
    }
}
