//! Mapper 4 (MMC3).
//!
//! | Area | Address range   | Behaviour                                          |
//! |------|-----------------|----------------------------------------------------|
//! | CPU  | `$6000-$7FFF`   | PRG RAM with enable and write-protect bits         |
//! | CPU  | `$8000-$9FFF`   | 8 KiB PRG (R6, or second-last); bank select/data   |
//! | CPU  | `$A000-$BFFF`   | 8 KiB PRG (R7); mirroring, PRG RAM protect         |
//! | CPU  | `$C000-$DFFF`   | 8 KiB PRG (second-last, or R6); IRQ latch/reload   |
//! | CPU  | `$E000-$FFFF`   | 8 KiB PRG fixed to the last bank; IRQ disable/enable|
//! | PPU  | `$0000-$1FFF`   | 2x2 KiB + 4x1 KiB CHR, halves swapped by bit 7     |
//!
//! The scanline counter is clocked by filtered rising edges of PPU A12 (see
//! [`A12Watcher`]). On a clock it reloads from the latch when it is zero or a
//! reload was requested, otherwise decrements; reaching zero with IRQs
//! enabled asserts the IRQ line until `$E000` is written.

use tracing::trace;

use crate::cartridge::{
    a12_watcher::A12Watcher,
    header::Mirroring,
    mapper::{Board, CHR_BANK_1K, PRG_BANK_8K},
};

/// CPU-visible registers, decoded from the 8 KiB window and address bit 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Register {
    BankSelect,
    BankData,
    Mirroring,
    PrgRamProtect,
    IrqLatch,
    IrqReload,
    IrqDisable,
    IrqEnable,
}

impl Register {
    fn from_addr(addr: u16) -> Option<Self> {
        let odd = addr & 1 != 0;
        let reg = match (addr, odd) {
            (0x8000..=0x9FFF, false) => Register::BankSelect,
            (0x8000..=0x9FFF, true) => Register::BankData,
            (0xA000..=0xBFFF, false) => Register::Mirroring,
            (0xA000..=0xBFFF, true) => Register::PrgRamProtect,
            (0xC000..=0xDFFF, false) => Register::IrqLatch,
            (0xC000..=0xDFFF, true) => Register::IrqReload,
            (0xE000..=0xFFFF, false) => Register::IrqDisable,
            (0xE000..=0xFFFF, true) => Register::IrqEnable,
            _ => return None,
        };
        Some(reg)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapper4 {
    pub(crate) board: Board,
    /// `$8000`: bits 0-2 target register, bit 6 PRG mode, bit 7 CHR inversion.
    bank_select: u8,
    /// R0-R7.
    banks: [u8; 8],
    mirroring: Mirroring,
    prg_ram_enabled: bool,
    prg_ram_write_protect: bool,

    irq_latch: u8,
    irq_counter: u8,
    irq_reload: bool,
    irq_enabled: bool,
    irq_line: bool,
    a12: A12Watcher,
}

impl Mapper4 {
    pub fn new(board: Board) -> Self {
        let mirroring = board.mirroring;
        let mut mapper = Self {
            board,
            bank_select: 0,
            banks: [0; 8],
            mirroring,
            prg_ram_enabled: true,
            prg_ram_write_protect: false,
            irq_latch: 0,
            irq_counter: 0,
            irq_reload: false,
            irq_enabled: false,
            irq_line: false,
            a12: A12Watcher::new(),
        };
        mapper.power_on();
        mapper
    }

    pub fn power_on(&mut self) {
        self.bank_select = 0;
        self.banks = [0, 2, 4, 5, 6, 7, 0, 1];
        self.mirroring = self.board.mirroring;
        self.prg_ram_enabled = true;
        self.prg_ram_write_protect = false;
        self.irq_latch = 0;
        self.irq_counter = 0;
        self.irq_reload = false;
        self.irq_enabled = false;
        self.irq_line = false;
        self.a12.reset();
    }

    pub fn irq(&self) -> bool {
        self.irq_line
    }

    fn prg_bank(&self, addr: u16) -> usize {
        let rom = &self.board.prg_rom;
        let second_last = rom.bank_count(PRG_BANK_8K).saturating_sub(2);
        let swap_c000 = self.bank_select & 0x40 != 0;
        match (addr >> 13) & 0b11 {
            0 if swap_c000 => second_last,
            0 => self.banks[6] as usize,
            1 => self.banks[7] as usize,
            2 if swap_c000 => self.banks[6] as usize,
            2 => second_last,
            _ => rom.last_bank(PRG_BANK_8K),
        }
    }

    pub fn cpu_read(&self, addr: u16) -> Option<u8> {
        match addr {
            0x6000..=0x7FFF if self.prg_ram_enabled => self.board.prg_ram.read(addr),
            0x8000..=0xFFFF => Some(
                self.board
                    .prg_rom
                    .read(self.prg_bank(addr), PRG_BANK_8K, addr),
            ),
            _ => None,
        }
    }

    pub fn cpu_write(&mut self, addr: u16, value: u8) {
        if let 0x6000..=0x7FFF = addr {
            if self.prg_ram_enabled && !self.prg_ram_write_protect {
                self.board.prg_ram.write(addr, value);
            }
            return;
        }
        let Some(reg) = Register::from_addr(addr) else {
            return;
        };
        match reg {
            Register::BankSelect => self.bank_select = value,
            Register::BankData => {
                let target = (self.bank_select & 0x07) as usize;
                self.banks[target] = value;
                trace!(target, bank = value, "MMC3 bank");
            }
            Register::Mirroring => {
                // Four-screen boards hardwire their nametables.
                if self.board.mirroring != Mirroring::FourScreen {
                    self.mirroring = if value & 1 == 0 {
                        Mirroring::Vertical
                    } else {
                        Mirroring::Horizontal
                    };
                }
            }
            Register::PrgRamProtect => {
                self.prg_ram_enabled = value & 0x80 != 0;
                self.prg_ram_write_protect = value & 0x40 != 0;
            }
            Register::IrqLatch => self.irq_latch = value,
            Register::IrqReload => {
                self.irq_counter = 0;
                self.irq_reload = true;
            }
            Register::IrqDisable => {
                self.irq_enabled = false;
                self.irq_line = false;
            }
            Register::IrqEnable => self.irq_enabled = true,
        }
    }

    /// CHR bank, in 1 KiB units, behind `addr`.
    fn chr_bank(&self, addr: u16) -> usize {
        let inverted = self.bank_select & 0x80 != 0;
        // Flip A12 so both layouts decode through the same table.
        let slot = ((addr ^ if inverted { 0x1000 } else { 0 }) >> 10) & 0x07;
        match slot {
            0 => (self.banks[0] & !1) as usize,
            1 => (self.banks[0] | 1) as usize,
            2 => (self.banks[1] & !1) as usize,
            3 => (self.banks[1] | 1) as usize,
            n => self.banks[n as usize - 2] as usize,
        }
    }

    pub(crate) fn observe_a12(&mut self, addr: u16, dot: u64) {
        if self.a12.observe(addr, dot) {
            self.clock_counter();
        }
    }

    fn clock_counter(&mut self) {
        if self.irq_counter == 0 || self.irq_reload {
            self.irq_counter = self.irq_latch;
            self.irq_reload = false;
        } else {
            self.irq_counter -= 1;
        }
        if self.irq_counter == 0 && self.irq_enabled && !self.irq_line {
            self.irq_line = true;
            trace!("MMC3 IRQ asserted");
        }
    }

    pub fn ppu_read(&mut self, addr: u16, dot: u64) -> u8 {
        self.observe_a12(addr, dot);
        self.ppu_peek(addr)
    }

    pub fn ppu_peek(&self, addr: u16) -> u8 {
        self.board.chr.read(self.chr_bank(addr), CHR_BANK_1K, addr)
    }

    pub fn ppu_write(&mut self, addr: u16, value: u8) {
        let bank = self.chr_bank(addr);
        self.board.chr.write(bank, CHR_BANK_1K, addr, value);
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::{Cartridge, Mapper, tests::ines_image};

    fn mmc3() -> Mapper4 {
        // 4 x 16 KiB PRG = 8 x 8 KiB banks holding their index; 8 KiB x 4 CHR.
        let image = ines_image(4, 4, 4, 0, |i| (i / PRG_BANK_8K) as u8);
        match Cartridge::load(&image).unwrap().into_mapper() {
            Mapper::Mmc3(m) => m,
            other => panic!("unexpected {other:?}"),
        }
    }

    /// One scanline's worth of A12 activity: low for background fetches,
    /// then a rise for sprite fetches.
    fn scanline(m: &mut Mapper4, line: u64) {
        let base = line * 341;
        m.ppu_read(0x0000, base + 1);
        m.ppu_read(0x0000, base + 250);
        m.ppu_read(0x1000, base + 260);
    }

    #[test]
    fn prg_modes() {
        let mut m = mmc3();
        m.cpu_write(0x8000, 6);
        m.cpu_write(0x8001, 3);
        m.cpu_write(0x8000, 7);
        m.cpu_write(0x8001, 4);
        assert_eq!(m.cpu_read(0x8000), Some(3));
        assert_eq!(m.cpu_read(0xA000), Some(4));
        assert_eq!(m.cpu_read(0xC000), Some(6));
        assert_eq!(m.cpu_read(0xE000), Some(7));

        m.cpu_write(0x8000, 0x40);
        assert_eq!(m.cpu_read(0x8000), Some(6));
        assert_eq!(m.cpu_read(0xC000), Some(3));
        assert_eq!(m.cpu_read(0xE000), Some(7));
    }

    #[test]
    fn chr_inversion_swaps_halves() {
        let mut m = mmc3();
        m.cpu_write(0x8000, 0);
        m.cpu_write(0x8001, 8);
        m.cpu_write(0x8000, 2);
        m.cpu_write(0x8001, 20);
        // CHR bytes hold their 1 KiB bank index.
        assert_eq!(m.ppu_peek(0x0000), 8);
        assert_eq!(m.ppu_peek(0x0400), 9);
        assert_eq!(m.ppu_peek(0x1000), 20);

        m.cpu_write(0x8000, 0x80);
        assert_eq!(m.ppu_peek(0x1000), 8);
        assert_eq!(m.ppu_peek(0x1400), 9);
        assert_eq!(m.ppu_peek(0x0000), 20);
    }

    #[test]
    fn mirroring_register() {
        let mut m = mmc3();
        m.cpu_write(0xA000, 1);
        assert_eq!(m.mirroring(), Mirroring::Horizontal);
        m.cpu_write(0xA000, 0);
        assert_eq!(m.mirroring(), Mirroring::Vertical);
    }

    #[test]
    fn irq_fires_after_latch_plus_one_scanlines() {
        let mut m = mmc3();
        m.cpu_write(0xC000, 2);
        m.cpu_write(0xC001, 0);
        m.cpu_write(0xE001, 0);

        // Reload to 2, then 1, then 0.
        scanline(&mut m, 0);
        assert!(!m.irq());
        scanline(&mut m, 1);
        assert!(!m.irq());
        scanline(&mut m, 2);
        assert!(m.irq());

        m.cpu_write(0xE000, 0);
        assert!(!m.irq());
    }

    #[test]
    fn rapid_a12_toggles_do_not_clock() {
        let mut m = mmc3();
        m.cpu_write(0xC000, 0);
        m.cpu_write(0xE001, 0);
        m.ppu_read(0x1000, 0);
        m.ppu_read(0x0000, 2);
        m.ppu_read(0x1000, 4);
        assert!(!m.irq());
    }

    #[test]
    fn prg_ram_protect() {
        let mut m = mmc3();
        m.cpu_write(0x6000, 1);
        assert_eq!(m.cpu_read(0x6000), Some(1));
        m.cpu_write(0xA001, 0xC0);
        m.cpu_write(0x6000, 2);
        assert_eq!(m.cpu_read(0x6000), Some(1));
        m.cpu_write(0xA001, 0x00);
        assert_eq!(m.cpu_read(0x6000), None);
    }
}
