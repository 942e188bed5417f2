//! iNES / NES 2.0 image loading and the cartridge slot.
//!
//! [`Cartridge`] owns the parsed [`Header`] and the board ([`Mapper`]) built
//! from it. The buses talk to the board only through this type so that
//! mirroring changes can be forwarded to the PPU's nametable routing.

use std::{fs, ops::RangeInclusive, path::Path};

use tracing::debug;

use crate::{
    cartridge::header::{Header, Mirroring, NES_HEADER_LEN},
    error::CartridgeError,
    memory::ppu as ppu_mem,
};

pub mod a12_watcher;
pub mod header;
pub mod mapper;

pub use mapper::{Board, ChrStorage, Mapper, PrgRam, PrgRom};

pub const TRAINER_SIZE: usize = 512;
/// Trainers are loaded at `$7000`.
const TRAINER_OFFSET: usize = 0x1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cartridge {
    header: Header,
    mapper: Mapper,
    /// Mirroring as last reported to the PPU.
    routed_mirroring: Mirroring,
    pending_mirroring: Option<Mirroring>,
}

impl Cartridge {
    /// Parses an in-memory image.
    pub fn load(bytes: &[u8]) -> Result<Self, CartridgeError> {
        let header = Header::parse(bytes)?;
        let mut cursor = NES_HEADER_LEN;
        let trainer = if header.trainer {
            Some(section(bytes, &mut cursor, TRAINER_SIZE, "trainer")?)
        } else {
            None
        };
        let prg_rom = section(bytes, &mut cursor, header.prg_rom_size, "PRG ROM")?;
        let chr_rom = section(bytes, &mut cursor, header.chr_rom_size, "CHR ROM")?;

        let mut board = Board::new(&header, prg_rom.into(), chr_rom.into());
        if let Some(trainer) = trainer {
            let ram = board.prg_ram.as_mut_slice();
            if let Some(dst) = ram.get_mut(TRAINER_OFFSET..TRAINER_OFFSET + TRAINER_SIZE) {
                dst.copy_from_slice(trainer);
            }
        }
        let mapper = Mapper::new(&header, board)?;

        debug!(
            mapper = mapper.id(),
            board = mapper.name(),
            format = ?header.format,
            prg_rom = header.prg_rom_size,
            chr_rom = header.chr_rom_size,
            mirroring = ?header.mirroring,
            "cartridge loaded"
        );

        let routed_mirroring = mapper.mirroring();
        Ok(Self {
            header,
            mapper,
            routed_mirroring,
            pending_mirroring: None,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CartridgeError> {
        let bytes = fs::read(path)?;
        Self::load(&bytes)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn mapper(&self) -> &Mapper {
        &self.mapper
    }

    pub fn mapper_mut(&mut self) -> &mut Mapper {
        &mut self.mapper
    }

    pub fn into_mapper(self) -> Mapper {
        self.mapper
    }

    /// CPU windows the board decodes; everything else in `$4020-$FFFF` is
    /// open bus.
    pub fn cpu_mappings(&self) -> Vec<RangeInclusive<u16>> {
        self.mapper.cpu_mappings()
    }

    /// PPU window the board decodes.
    pub fn ppu_mappings(&self) -> RangeInclusive<u16> {
        0x0000..=ppu_mem::PATTERN_TABLE_END
    }

    pub fn cpu_read(&self, addr: u16) -> Option<u8> {
        self.mapper.cpu_read(addr)
    }

    /// Side-effect free read for debuggers. No board reacts to CPU reads, so
    /// this is the same as [`Cartridge::cpu_read`].
    pub fn cpu_peek(&self, addr: u16) -> Option<u8> {
        self.mapper.cpu_read(addr)
    }

    pub fn cpu_write(&mut self, addr: u16, value: u8) {
        self.mapper.cpu_write(addr, value);
        let mirroring = self.mapper.mirroring();
        if mirroring != self.routed_mirroring {
            self.routed_mirroring = mirroring;
            self.pending_mirroring = Some(mirroring);
        }
    }

    /// Mirroring change caused by the last CPU writes, if any.
    pub fn take_mirroring_update(&mut self) -> Option<Mirroring> {
        self.pending_mirroring.take()
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mapper.mirroring()
    }

    pub fn ppu_read(&mut self, addr: u16, dot: u64) -> u8 {
        self.mapper.ppu_read(addr, dot)
    }

    pub fn ppu_peek(&self, addr: u16) -> u8 {
        self.mapper.ppu_peek(addr)
    }

    pub fn ppu_write(&mut self, addr: u16, value: u8, dot: u64) {
        self.mapper.ppu_write(addr, value, dot);
    }

    pub fn irq(&self) -> bool {
        self.mapper.irq()
    }

    pub fn reset(&mut self) {
        self.mapper.reset();
        self.sync_mirroring();
    }

    pub fn power_on(&mut self) {
        self.mapper.power_on();
        self.sync_mirroring();
    }

    fn sync_mirroring(&mut self) {
        let mirroring = self.mapper.mirroring();
        if mirroring != self.routed_mirroring {
            self.routed_mirroring = mirroring;
            self.pending_mirroring = Some(mirroring);
        }
    }

    pub fn has_battery(&self) -> bool {
        self.header.battery
    }

    /// Battery-backed PRG RAM, for the host to persist.
    pub fn battery_ram(&self) -> Option<&[u8]> {
        let ram = &self.mapper.board().prg_ram;
        (self.header.battery && !ram.is_empty()).then(|| ram.as_slice())
    }

    /// Restores saved PRG RAM. Extra bytes are ignored, missing ones stay
    /// as they were.
    pub fn load_battery_ram(&mut self, data: &[u8]) {
        let ram = self.mapper.board_mut().prg_ram.as_mut_slice();
        let len = ram.len().min(data.len());
        ram[..len].copy_from_slice(&data[..len]);
    }
}

fn section<'a>(
    bytes: &'a [u8],
    cursor: &mut usize,
    len: usize,
    name: &'static str,
) -> Result<&'a [u8], CartridgeError> {
    let start = *cursor;
    let slice = start
        .checked_add(len)
        .and_then(|end| bytes.get(start..end))
        .ok_or(CartridgeError::SectionTooShort {
            section: name,
            expected: len,
            actual: bytes.len().saturating_sub(start),
        })?;
    *cursor += len;
    Ok(slice)
}
