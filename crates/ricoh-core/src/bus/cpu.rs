use std::ops::RangeInclusive;

use crate::{
    apu::Apu,
    bus::{Access, AddressMap, Bus, Device, OpenBus},
    cartridge::Cartridge,
    controller::Controller,
    error::RegistrationError,
    memory::{cpu as cpu_mem, ppu as ppu_mem},
    ppu::Ppu,
};

/// Owners of CPU address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CpuDevice {
    Ram,
    PpuRegisters,
    Apu,
    OamDma,
    /// `$4016` writes latch both pads.
    ControllerStrobe,
    Controller1,
    Controller2,
    TestMode,
    Cartridge,
}

impl Device for CpuDevice {
    fn name(self) -> &'static str {
        match self {
            CpuDevice::Ram => "work RAM",
            CpuDevice::PpuRegisters => "PPU registers",
            CpuDevice::Apu => "APU",
            CpuDevice::OamDma => "OAM DMA",
            CpuDevice::ControllerStrobe => "controller strobe",
            CpuDevice::Controller1 => "controller 1",
            CpuDevice::Controller2 => "controller 2",
            CpuDevice::TestMode => "test mode",
            CpuDevice::Cartridge => "cartridge",
        }
    }
}

/// Builds the console's CPU address map. `cartridge_ranges` are the windows
/// the inserted board decodes (see [`Cartridge::cpu_mappings`]).
pub fn cpu_address_map(
    cartridge_ranges: &[RangeInclusive<u16>],
) -> Result<AddressMap<CpuDevice>, RegistrationError> {
    use Access::*;

    let mut map = AddressMap::new(cpu_mem::ADDRESS_SPACE);

    map.claim(0x0000..=cpu_mem::INTERNAL_RAM_END, ReadWrite, CpuDevice::Ram)?;
    map.mirror(
        cpu_mem::INTERNAL_RAM_END + 1..=cpu_mem::INTERNAL_RAM_MIRROR_END,
        |addr| addr & cpu_mem::INTERNAL_RAM_END,
    )?;

    map.claim(
        cpu_mem::PPU_REGISTER_BASE..=cpu_mem::PPU_REGISTER_END,
        ReadWrite,
        CpuDevice::PpuRegisters,
    )?;
    map.mirror(
        cpu_mem::PPU_REGISTER_END + 1..=cpu_mem::PPU_REGISTER_MIRROR_END,
        |addr| cpu_mem::PPU_REGISTER_BASE | (addr & 0x0007),
    )?;

    // Channel registers are write-only; reads fall through to open bus.
    map.claim(
        cpu_mem::APU_REGISTER_BASE..=cpu_mem::APU_REGISTER_END,
        Write,
        CpuDevice::Apu,
    )?;
    map.claim(cpu_mem::OAM_DMA..=cpu_mem::OAM_DMA, Write, CpuDevice::OamDma)?;
    map.claim(
        cpu_mem::APU_STATUS..=cpu_mem::APU_STATUS,
        ReadWrite,
        CpuDevice::Apu,
    )?;
    map.claim(
        cpu_mem::CONTROLLER_PORT_1..=cpu_mem::CONTROLLER_PORT_1,
        Write,
        CpuDevice::ControllerStrobe,
    )?;
    map.claim(
        cpu_mem::CONTROLLER_PORT_1..=cpu_mem::CONTROLLER_PORT_1,
        Read,
        CpuDevice::Controller1,
    )?;
    map.claim(
        cpu_mem::CONTROLLER_PORT_2..=cpu_mem::CONTROLLER_PORT_2,
        Read,
        CpuDevice::Controller2,
    )?;
    map.claim(
        cpu_mem::CONTROLLER_PORT_2..=cpu_mem::CONTROLLER_PORT_2,
        Write,
        CpuDevice::Apu,
    )?;
    map.claim(
        cpu_mem::TEST_MODE_BASE..=cpu_mem::TEST_MODE_END,
        ReadWrite,
        CpuDevice::TestMode,
    )?;

    for range in cartridge_ranges {
        if *range.start() < cpu_mem::CARTRIDGE_SPACE_BASE {
            return Err(RegistrationError::AlreadyClaimed {
                addr: *range.start(),
                owner: "console",
            });
        }
        map.claim(range.clone(), ReadWrite, CpuDevice::Cartridge)?;
    }

    map.seal()?;
    Ok(map)
}

/// CPU-visible bus. Borrows every component from the owning [`crate::Core`]
/// for the duration of one instruction (or one DMA transfer).
#[derive(Debug)]
pub struct CpuBus<'a> {
    pub(crate) map: &'a AddressMap<CpuDevice>,
    pub(crate) ram: &'a mut [u8; cpu_mem::INTERNAL_RAM_SIZE],
    pub(crate) ppu: &'a mut Ppu,
    pub(crate) apu: &'a mut Apu,
    pub(crate) cartridge: &'a mut Cartridge,
    pub(crate) controllers: &'a mut [Controller; 2],
    pub(crate) open_bus: &'a mut OpenBus,
    pub(crate) oam_dma_request: &'a mut Option<u8>,
    /// CPU cycle at the start of the current instruction; the APU uses its
    /// parity to time frame-counter writes.
    pub(crate) cpu_cycle: u64,
}

impl CpuBus<'_> {
    fn read_device(&mut self, addr: u16) -> Option<u8> {
        let canonical = self.map.resolve(addr);
        let value = match self.map.reader(canonical)? {
            CpuDevice::Ram => self.ram[canonical as usize],
            CpuDevice::PpuRegisters => {
                let reg = ppu_mem::Register::from_cpu_addr(canonical);
                self.ppu.cpu_read(reg, self.cartridge)
            }
            // Bit 5 of $4015 is not driven.
            CpuDevice::Apu => (self.apu.read_status() & !0x20) | (self.open_bus.sample() & 0x20),
            CpuDevice::Controller1 => self.controllers[0].read(),
            CpuDevice::Controller2 => self.controllers[1].read(),
            CpuDevice::Cartridge => self.cartridge.cpu_read(canonical)?,
            CpuDevice::TestMode | CpuDevice::OamDma | CpuDevice::ControllerStrobe => return None,
        };
        Some(value)
    }

    fn write_device(&mut self, addr: u16, value: u8) {
        let canonical = self.map.resolve(addr);
        match self.map.writer(canonical) {
            Some(CpuDevice::Ram) => self.ram[canonical as usize] = value,
            Some(CpuDevice::PpuRegisters) => {
                let reg = ppu_mem::Register::from_cpu_addr(canonical);
                self.ppu.cpu_write(reg, value, self.cartridge);
            }
            Some(CpuDevice::Apu) => self.apu.cpu_write(canonical, value, self.cpu_cycle),
            Some(CpuDevice::OamDma) => *self.oam_dma_request = Some(value),
            Some(CpuDevice::ControllerStrobe) => {
                for pad in self.controllers.iter_mut() {
                    pad.write_strobe(value);
                }
            }
            Some(CpuDevice::Cartridge) => {
                self.cartridge.cpu_write(canonical, value);
                if let Some(mirroring) = self.cartridge.take_mirroring_update() {
                    self.ppu.route_nametables(mirroring);
                }
            }
            Some(CpuDevice::Controller1 | CpuDevice::Controller2 | CpuDevice::TestMode) | None => {
                tracing::trace!(addr = format_args!("{addr:#06X}"), value, "dropped write");
            }
        }
    }
}

impl Bus for CpuBus<'_> {
    fn read(&mut self, addr: u16) -> u8 {
        match self.read_device(addr) {
            Some(value) => self.open_bus.latch(value),
            None => self.open_bus.sample(),
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.open_bus.latch(value);
        self.write_device(addr, value);
    }

    fn peek(&self, addr: u16) -> u8 {
        let canonical = self.map.resolve(addr);
        let value = match self.map.reader(canonical) {
            Some(CpuDevice::Ram) => Some(self.ram[canonical as usize]),
            Some(CpuDevice::PpuRegisters) => Some(
                self.ppu
                    .peek_register(ppu_mem::Register::from_cpu_addr(canonical)),
            ),
            Some(CpuDevice::Apu) => Some(self.apu.peek_status()),
            Some(CpuDevice::Controller1) => Some(self.controllers[0].peek()),
            Some(CpuDevice::Controller2) => Some(self.controllers[1].peek()),
            Some(CpuDevice::Cartridge) => self.cartridge.cpu_peek(canonical),
            _ => None,
        };
        value.unwrap_or_else(|| self.open_bus.sample())
    }
}
