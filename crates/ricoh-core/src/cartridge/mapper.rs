//! Cartridge boards.
//!
//! The supported boards form a closed set, so [`Mapper`] is an enum and every
//! access is a `match`. Each variant owns a [`Board`] holding the memories
//! every cartridge has, plus its own bank registers.

use std::ops::RangeInclusive;

use crate::{
    cartridge::header::{Header, Mirroring},
    error::CartridgeError,
    memory::cpu as cpu_mem,
};

mod chr_storage;
mod mapper0;
mod mapper1;
mod mapper2;
mod mapper3;
mod mapper4;
mod mapper7;
mod mapper9;

pub use chr_storage::ChrStorage;
pub use mapper0::Mapper0;
pub use mapper1::Mapper1;
pub use mapper2::Mapper2;
pub use mapper3::Mapper3;
pub use mapper4::Mapper4;
pub use mapper7::Mapper7;
pub use mapper9::Mapper9;

pub(crate) const PRG_BANK_8K: usize = 8 * 1024;
pub(crate) const PRG_BANK_16K: usize = 16 * 1024;
pub(crate) const PRG_BANK_32K: usize = 32 * 1024;
pub(crate) const CHR_BANK_1K: usize = 1024;
pub(crate) const CHR_BANK_4K: usize = 4 * 1024;
pub(crate) const CHR_BANK_8K: usize = 8 * 1024;

/// Program ROM addressed in banks. Out-of-range bank numbers wrap modulo the
/// bank count; images smaller than one bank repeat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrgRom(Box<[u8]>);

impl PrgRom {
    pub fn new(data: Box<[u8]>) -> Self {
        Self(data)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn bank_count(&self, bank_size: usize) -> usize {
        (self.len() / bank_size).max(1)
    }

    /// Index of the last bank, used by the fixed windows.
    pub fn last_bank(&self, bank_size: usize) -> usize {
        self.bank_count(bank_size) - 1
    }

    pub fn read(&self, bank: usize, bank_size: usize, addr: u16) -> u8 {
        let bank = bank % self.bank_count(bank_size);
        let idx = bank * bank_size + (addr as usize % bank_size);
        self.0[idx % self.len()]
    }
}

/// Work RAM at `$6000-$7FFF`. Empty when the board has none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrgRam(Box<[u8]>);

impl PrgRam {
    pub fn new(size: usize) -> Self {
        Self(vec![0; size].into_boxed_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.0
    }

    fn offset(&self, addr: u16) -> usize {
        (addr.wrapping_sub(cpu_mem::PRG_RAM_START)) as usize % self.0.len()
    }

    pub fn read(&self, addr: u16) -> Option<u8> {
        (!self.is_empty()).then(|| self.0[self.offset(addr)])
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        if !self.is_empty() {
            let idx = self.offset(addr);
            self.0[idx] = value;
        }
    }
}

/// Memories shared by every board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pub prg_rom: PrgRom,
    pub prg_ram: PrgRam,
    pub chr: ChrStorage,
    /// Wiring from the header; boards with mirroring control start here.
    pub mirroring: Mirroring,
}

impl Board {
    pub fn new(header: &Header, prg_rom: Box<[u8]>, chr_rom: Box<[u8]>) -> Self {
        let ram_size = if header.battery {
            header.prg_ram_size.max(cpu_mem::PRG_RAM_SIZE)
        } else {
            header.prg_ram_size
        };
        Self {
            prg_rom: PrgRom::new(prg_rom),
            prg_ram: PrgRam::new(ram_size.min(cpu_mem::PRG_RAM_SIZE)),
            chr: ChrStorage::new(chr_rom, header.chr_ram_size),
            mirroring: header.mirroring,
        }
    }
}

/// Every supported board, by iNES mapper number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mapper {
    /// 0: NROM.
    Nrom(Mapper0),
    /// 1: MMC1 (SxROM).
    Mmc1(Mapper1),
    /// 2: UxROM.
    UxRom(Mapper2),
    /// 3: CNROM.
    CnRom(Mapper3),
    /// 4: MMC3 (TxROM).
    Mmc3(Mapper4),
    /// 7: AxROM.
    AxRom(Mapper7),
    /// 9: MMC2 (PxROM).
    Mmc2(Mapper9),
}

macro_rules! dispatch {
    ($self:expr, $m:ident => $body:expr) => {
        match $self {
            Mapper::Nrom($m) => $body,
            Mapper::Mmc1($m) => $body,
            Mapper::UxRom($m) => $body,
            Mapper::CnRom($m) => $body,
            Mapper::Mmc3($m) => $body,
            Mapper::AxRom($m) => $body,
            Mapper::Mmc2($m) => $body,
        }
    };
}

impl Mapper {
    pub fn new(header: &Header, board: Board) -> Result<Self, CartridgeError> {
        let mapper = match header.mapper {
            0 => Mapper::Nrom(Mapper0::new(board)),
            1 => Mapper::Mmc1(Mapper1::new(board)),
            2 => Mapper::UxRom(Mapper2::new(board)),
            3 => Mapper::CnRom(Mapper3::new(board)),
            4 => Mapper::Mmc3(Mapper4::new(board)),
            7 => Mapper::AxRom(Mapper7::new(board)),
            9 => Mapper::Mmc2(Mapper9::new(board)),
            other => return Err(CartridgeError::UnsupportedMapper(other)),
        };
        Ok(mapper)
    }

    pub fn id(&self) -> u16 {
        match self {
            Mapper::Nrom(_) => 0,
            Mapper::Mmc1(_) => 1,
            Mapper::UxRom(_) => 2,
            Mapper::CnRom(_) => 3,
            Mapper::Mmc3(_) => 4,
            Mapper::AxRom(_) => 7,
            Mapper::Mmc2(_) => 9,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mapper::Nrom(_) => "NROM",
            Mapper::Mmc1(_) => "MMC1",
            Mapper::UxRom(_) => "UxROM",
            Mapper::CnRom(_) => "CNROM",
            Mapper::Mmc3(_) => "MMC3",
            Mapper::AxRom(_) => "AxROM",
            Mapper::Mmc2(_) => "MMC2",
        }
    }

    pub fn board(&self) -> &Board {
        dispatch!(self, m => &m.board)
    }

    pub fn board_mut(&mut self) -> &mut Board {
        dispatch!(self, m => &mut m.board)
    }

    /// CPU windows this board decodes.
    pub fn cpu_mappings(&self) -> Vec<RangeInclusive<u16>> {
        let mut ranges = Vec::with_capacity(2);
        if !self.board().prg_ram.is_empty() {
            ranges.push(cpu_mem::PRG_RAM_START..=cpu_mem::PRG_RAM_END);
        }
        ranges.push(cpu_mem::PRG_ROM_START..=cpu_mem::CPU_ADDR_END);
        ranges
    }

    /// `None` leaves the CPU data bus floating.
    pub fn cpu_read(&self, addr: u16) -> Option<u8> {
        dispatch!(self, m => m.cpu_read(addr))
    }

    pub fn cpu_write(&mut self, addr: u16, value: u8) {
        dispatch!(self, m => m.cpu_write(addr, value))
    }

    /// Pattern fetch at `addr` (`$0000-$1FFF`) during PPU dot `dot`. Boards
    /// that snoop the PPU bus (MMC2 latches, MMC3 A12) update here.
    pub fn ppu_read(&mut self, addr: u16, dot: u64) -> u8 {
        match self {
            Mapper::Mmc3(m) => m.ppu_read(addr, dot),
            Mapper::Mmc2(m) => m.ppu_read(addr),
            other => other.ppu_peek(addr),
        }
    }

    pub fn ppu_peek(&self, addr: u16) -> u8 {
        dispatch!(self, m => m.ppu_peek(addr))
    }

    pub fn ppu_write(&mut self, addr: u16, value: u8, dot: u64) {
        if let Mapper::Mmc3(m) = self {
            m.observe_a12(addr, dot);
        }
        dispatch!(self, m => m.ppu_write(addr, value))
    }

    pub fn mirroring(&self) -> Mirroring {
        dispatch!(self, m => m.mirroring())
    }

    /// Level of the board's IRQ output.
    pub fn irq(&self) -> bool {
        match self {
            Mapper::Mmc3(m) => m.irq(),
            _ => false,
        }
    }

    /// Console reset button. Only MMC1's shift register notices.
    pub fn reset(&mut self) {
        if let Mapper::Mmc1(m) = self {
            m.reset();
        }
    }

    /// Register state back to power-on values. RAM contents are untouched.
    pub fn power_on(&mut self) {
        dispatch!(self, m => m.power_on())
    }
}
