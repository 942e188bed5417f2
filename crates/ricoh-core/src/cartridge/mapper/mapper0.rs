//! Mapper 0 (NROM).
//!
//! No banking at all: 16 KiB or 32 KiB of PRG ROM at `$8000-$FFFF` (a 16 KiB
//! image appears twice) and 8 KiB of CHR at PPU `$0000-$1FFF`. Mirroring is
//! soldered on the board. Boards declared without CHR ROM get CHR RAM, and
//! only then do pattern writes stick.

use crate::cartridge::{
    header::Mirroring,
    mapper::{Board, CHR_BANK_8K, PRG_BANK_32K},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapper0 {
    pub(crate) board: Board,
}

impl Mapper0 {
    pub fn new(board: Board) -> Self {
        Self { board }
    }

    pub fn cpu_read(&self, addr: u16) -> Option<u8> {
        match addr {
            0x6000..=0x7FFF => self.board.prg_ram.read(addr),
            0x8000..=0xFFFF => Some(self.board.prg_rom.read(0, PRG_BANK_32K, addr)),
            _ => None,
        }
    }

    pub fn cpu_write(&mut self, addr: u16, value: u8) {
        if let 0x6000..=0x7FFF = addr {
            self.board.prg_ram.write(addr, value);
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

    pub fn power_on(&mut self) {}
}
