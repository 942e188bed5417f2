//! Mapper 1 (MMC1).
//!
//! Registers are loaded serially: each write to `$8000-$FFFF` shifts bit 0
//! into a 5-bit shift register, and the fifth write commits the collected
//! value to the register picked by address bits 13-14. A write with bit 7 set
//! clears the shift register and forces PRG mode 3.
//!
//! | Register | Address         | Bits                                          |
//! |----------|-----------------|-----------------------------------------------|
//! | Control  | `$8000-$9FFF`   | `CPPMM`: CHR mode, PRG mode, mirroring        |
//! | CHR 0    | `$A000-$BFFF`   | 4 KiB bank at PPU `$0000` (8 KiB when C=0)    |
//! | CHR 1    | `$C000-$DFFF`   | 4 KiB bank at PPU `$1000` (ignored when C=0)  |
//! | PRG      | `$E000-$FFFF`   | `RPPPP`: RAM disable, 16 KiB bank             |
//!
//! Real MMC1s also ignore a write on the cycle right after another write,
//! which only matters for read-modify-write instructions. Writes here are
//! instruction-level, so that filter does not exist.

use tracing::trace;

use crate::cartridge::{
    header::Mirroring,
    mapper::{Board, CHR_BANK_4K, PRG_BANK_16K, PRG_BANK_32K},
};

const CONTROL_POWER_ON: u8 = 0x0C;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapper1 {
    pub(crate) board: Board,
    shift: u8,
    /// Bits collected since the last commit or reset write.
    shift_count: u8,
    control: u8,
    chr0: u8,
    chr1: u8,
    prg: u8,
}

impl Mapper1 {
    pub fn new(board: Board) -> Self {
        let mut mapper = Self {
            board,
            shift: 0,
            shift_count: 0,
            control: 0,
            chr0: 0,
            chr1: 0,
            prg: 0,
        };
        mapper.power_on();
        mapper
    }

    pub fn power_on(&mut self) {
        self.shift = 0;
        self.shift_count = 0;
        self.control = CONTROL_POWER_ON;
        self.chr0 = 0;
        self.chr1 = 0;
        self.prg = 0;
    }

    /// The reset line clears the shift register and selects PRG mode 3.
    pub fn reset(&mut self) {
        self.shift = 0;
        self.shift_count = 0;
        self.control |= CONTROL_POWER_ON;
    }

    pub fn control(&self) -> u8 {
        self.control
    }

    fn prg_mode(&self) -> u8 {
        (self.control >> 2) & 0b11
    }

    fn chr_4k_mode(&self) -> bool {
        self.control & 0x10 != 0
    }

    fn prg_ram_enabled(&self) -> bool {
        self.prg & 0x10 == 0
    }

    pub fn cpu_read(&self, addr: u16) -> Option<u8> {
        match addr {
            0x6000..=0x7FFF if self.prg_ram_enabled() => self.board.prg_ram.read(addr),
            0x8000..=0xFFFF => Some(self.read_prg(addr)),
            _ => None,
        }
    }

    fn read_prg(&self, addr: u16) -> u8 {
        let rom = &self.board.prg_rom;
        let bank = (self.prg & 0x0F) as usize;
        match self.prg_mode() {
            0 | 1 => rom.read(bank >> 1, PRG_BANK_32K, addr),
            2 if addr < 0xC000 => rom.read(0, PRG_BANK_16K, addr),
            2 => rom.read(bank, PRG_BANK_16K, addr),
            // The low window ignores bit 0 while the last bank is fixed.
            _ if addr < 0xC000 => rom.read(bank & 0x0E, PRG_BANK_16K, addr),
            _ => rom.read(rom.last_bank(PRG_BANK_16K), PRG_BANK_16K, addr),
        }
    }

    pub fn cpu_write(&mut self, addr: u16, value: u8) {
        match addr {
            0x6000..=0x7FFF if self.prg_ram_enabled() => self.board.prg_ram.write(addr, value),
            0x8000..=0xFFFF => self.write_serial(addr, value),
            _ => {}
        }
    }

    fn write_serial(&mut self, addr: u16, value: u8) {
        if value & 0x80 != 0 {
            self.reset();
            return;
        }
        self.shift |= (value & 0x01) << self.shift_count;
        self.shift_count += 1;
        if self.shift_count < 5 {
            return;
        }

        let committed = self.shift;
        self.shift = 0;
        self.shift_count = 0;
        match (addr >> 13) & 0b11 {
            0 => self.control = committed,
            1 => self.chr0 = committed,
            2 => self.chr1 = committed,
            _ => self.prg = committed,
        }
        trace!(
            addr = format_args!("{addr:04X}"),
            value = format_args!("{committed:05b}"),
            "MMC1 register commit"
        );
    }

    fn chr_bank(&self, addr: u16) -> usize {
        if self.chr_4k_mode() {
            let bank = if addr < 0x1000 { self.chr0 } else { self.chr1 };
            bank as usize
        } else {
            ((self.chr0 & !1) as usize) + (addr >= 0x1000) as usize
        }
    }

    pub fn ppu_peek(&self, addr: u16) -> u8 {
        self.board.chr.read(self.chr_bank(addr), CHR_BANK_4K, addr)
    }

    pub fn ppu_write(&mut self, addr: u16, value: u8) {
        let bank = self.chr_bank(addr);
        self.board.chr.write(bank, CHR_BANK_4K, addr, value);
    }

    pub fn mirroring(&self) -> Mirroring {
        match self.control & 0b11 {
            0 => Mirroring::SingleScreenLower,
            1 => Mirroring::SingleScreenUpper,
            2 => Mirroring::Vertical,
            _ => Mirroring::Horizontal,
        }
    }
}
