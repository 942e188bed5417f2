//! Mapper 7 (AxROM).
//!
//! One register at `$8000-$FFFF`: bits 0-2 pick a 32 KiB PRG bank and bit 4
//! picks which nametable page all four tables show. CHR is 8 KiB of RAM.

use tracing::trace;

use crate::cartridge::{
    header::Mirroring,
    mapper::{Board, CHR_BANK_8K, PRG_BANK_32K},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapper7 {
    pub(crate) board: Board,
    prg_bank: u8,
    upper_page: bool,
}

impl Mapper7 {
    pub fn new(board: Board) -> Self {
        Self {
            board,
            prg_bank: 0,
            upper_page: false,
        }
    }

    pub fn power_on(&mut self) {
        self.prg_bank = 0;
        self.upper_page = false;
    }

    pub fn cpu_read(&self, addr: u16) -> Option<u8> {
        match addr {
            0x6000..=0x7FFF => self.board.prg_ram.read(addr),
            0x8000..=0xFFFF => Some(self.board.prg_rom.read(
                self.prg_bank as usize,
                PRG_BANK_32K,
                addr,
            )),
            _ => None,
        }
    }

    pub fn cpu_write(&mut self, addr: u16, value: u8) {
        match addr {
            0x6000..=0x7FFF => self.board.prg_ram.write(addr, value),
            0x8000..=0xFFFF => {
                self.prg_bank = value & 0x07;
                self.upper_page = value & 0x10 != 0;
                trace!(prg = self.prg_bank, upper = self.upper_page, "AxROM select");
            }
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
        if self.upper_page {
            Mirroring::SingleScreenUpper
        } else {
            Mirroring::SingleScreenLower
        }
    }
}
