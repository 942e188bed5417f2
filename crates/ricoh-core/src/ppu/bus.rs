//! PPU address decode: pattern tables on the cartridge, nametables in
//! console RAM, and palette RAM, with their mirrors.

use std::ops::RangeInclusive;

use crate::{
    bus::{Access, AddressMap, Device},
    cartridge::{Cartridge, header::Mirroring},
    error::RegistrationError,
    memory::ppu as ppu_mem,
};

/// Owners of PPU address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PpuDevice {
    Chr,
    Nametables,
    Palette,
}

impl Device for PpuDevice {
    fn name(self) -> &'static str {
        match self {
            PpuDevice::Chr => "cartridge CHR",
            PpuDevice::Nametables => "nametable RAM",
            PpuDevice::Palette => "palette RAM",
        }
    }
}

/// Builds the 14-bit PPU map. `chr_window` is what the cartridge decodes
/// (see [`Cartridge::ppu_mappings`]).
pub fn ppu_address_map(
    chr_window: RangeInclusive<u16>,
) -> Result<AddressMap<PpuDevice>, RegistrationError> {
    let mut map = AddressMap::new(ppu_mem::ADDRESS_SPACE);

    map.claim(chr_window, Access::ReadWrite, PpuDevice::Chr)?;
    map.claim(
        ppu_mem::NAMETABLE_BASE..=ppu_mem::NAMETABLE_END,
        Access::ReadWrite,
        PpuDevice::Nametables,
    )?;
    map.mirror(
        ppu_mem::NAMETABLE_MIRROR_BASE..=ppu_mem::NAMETABLE_MIRROR_END,
        |addr| addr - 0x1000,
    )?;

    let palette_end = ppu_mem::PALETTE_BASE + ppu_mem::PALETTE_RAM_SIZE as u16 - 1;
    map.claim(
        ppu_mem::PALETTE_BASE..=palette_end,
        Access::ReadWrite,
        PpuDevice::Palette,
    )?;
    map.mirror(palette_end + 1..=ppu_mem::PALETTE_END, |addr| {
        ppu_mem::PALETTE_BASE | (addr & 0x1F)
    })?;
    // Sprite backdrop entries alias the background ones. The upper mirror
    // lands on these and is folded again when the map is sealed.
    for entry in [0x3F10, 0x3F14, 0x3F18, 0x3F1C] {
        map.mirror(entry..=entry, |addr| addr - 0x10)?;
    }

    map.seal()?;
    Ok(map)
}

/// Console-side PPU memory plus the decode table that routes to it.
#[derive(Clone)]
pub struct PpuBus {
    map: AddressMap<PpuDevice>,
    ciram: Box<[u8]>,
    /// Physical CIRAM page behind each logical nametable.
    pages: [usize; 4],
    palette: [u8; ppu_mem::PALETTE_RAM_SIZE],
}

impl std::fmt::Debug for PpuBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PpuBus")
            .field("pages", &self.pages)
            .field("palette", &self.palette)
            .finish_non_exhaustive()
    }
}

impl PpuBus {
    pub fn new(chr_window: RangeInclusive<u16>) -> Result<Self, RegistrationError> {
        Ok(Self {
            map: ppu_address_map(chr_window)?,
            ciram: vec![0; ppu_mem::CIRAM_SIZE].into_boxed_slice(),
            pages: Mirroring::Horizontal.pages(),
            palette: [0; ppu_mem::PALETTE_RAM_SIZE],
        })
    }

    pub fn route_nametables(&mut self, mirroring: Mirroring) {
        self.pages = mirroring.pages();
    }

    pub fn clear(&mut self) {
        self.ciram.fill(0);
        self.palette.fill(0);
    }

    fn ciram_index(&self, canonical: u16) -> usize {
        let offset = (canonical - ppu_mem::NAMETABLE_BASE) as usize;
        let table = offset / ppu_mem::NAMETABLE_SIZE as usize;
        self.pages[table & 3] * ppu_mem::NAMETABLE_SIZE as usize
            + offset % ppu_mem::NAMETABLE_SIZE as usize
    }

    /// Reads at `addr` during PPU dot `dot`. Pattern reads reach the mapper,
    /// which may snoop them.
    pub fn read(&mut self, addr: u16, cartridge: &mut Cartridge, dot: u64) -> u8 {
        let canonical = self.map.resolve(addr & ppu_mem::ADDRESS_MASK);
        match self.map.reader(canonical) {
            Some(PpuDevice::Chr) => cartridge.ppu_read(canonical, dot),
            Some(PpuDevice::Nametables) => self.ciram[self.ciram_index(canonical)],
            Some(PpuDevice::Palette) => self.palette[(canonical & 0x1F) as usize],
            // Undecoded: the low address byte is left on the multiplexed bus.
            None => canonical as u8,
        }
    }

    pub fn peek(&self, addr: u16, cartridge: &Cartridge) -> u8 {
        let canonical = self.map.resolve(addr & ppu_mem::ADDRESS_MASK);
        match self.map.reader(canonical) {
            Some(PpuDevice::Chr) => cartridge.ppu_peek(canonical),
            Some(PpuDevice::Nametables) => self.ciram[self.ciram_index(canonical)],
            Some(PpuDevice::Palette) => self.palette[(canonical & 0x1F) as usize],
            None => canonical as u8,
        }
    }

    pub fn write(&mut self, addr: u16, value: u8, cartridge: &mut Cartridge, dot: u64) {
        let canonical = self.map.resolve(addr & ppu_mem::ADDRESS_MASK);
        match self.map.writer(canonical) {
            Some(PpuDevice::Chr) => cartridge.ppu_write(canonical, value, dot),
            Some(PpuDevice::Nametables) => {
                let idx = self.ciram_index(canonical);
                self.ciram[idx] = value;
            }
            Some(PpuDevice::Palette) => self.palette[(canonical & 0x1F) as usize] = value & 0x3F,
            None => {}
        }
    }

    /// Palette RAM through its mirrors; `addr` is anywhere in `$3F00-$3FFF`.
    pub fn palette_entry(&self, addr: u16) -> u8 {
        let canonical = self.map.resolve(addr & ppu_mem::ADDRESS_MASK);
        self.palette[(canonical & 0x1F) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_mirrors_resolve_transitively() {
        let map = ppu_address_map(0..=0x1FFF).unwrap();
        assert_eq!(map.resolve(0x3F10), 0x3F00);
        assert_eq!(map.resolve(0x3F30), 0x3F00);
        assert_eq!(map.resolve(0x3FF4), 0x3F04);
        assert_eq!(map.resolve(0x3F35), 0x3F15);
        assert_eq!(map.resolve(0x3123), 0x2123);
    }

    #[test]
    fn chr_window_cannot_overlap_nametables() {
        let err = ppu_address_map(0..=0x2000).unwrap_err();
        assert!(matches!(err, RegistrationError::AlreadyClaimed { addr: 0x2000, .. }));
    }

    #[test]
    fn nametable_routing_follows_mirroring() {
        let mut bus = PpuBus::new(0..=0x1FFF).unwrap();
        bus.route_nametables(Mirroring::Vertical);
        let v = bus.ciram_index(0x2805);
        assert_eq!(v, bus.ciram_index(0x2005));
        bus.route_nametables(Mirroring::Horizontal);
        assert_eq!(bus.ciram_index(0x2405), bus.ciram_index(0x2005));
        assert_ne!(bus.ciram_index(0x2805), bus.ciram_index(0x2005));
        bus.route_nametables(Mirroring::FourScreen);
        assert_eq!(bus.ciram_index(0x2C00), 0xC00);
    }
}
