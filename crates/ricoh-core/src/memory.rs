//! Address constants for the two NES buses.
//!
//! Every module that decodes an address pulls its ranges from here so the
//! console's memory map lives in exactly one place.

/// CPU memory map.
pub mod cpu {
    /// First address of the hardware stack page.
    pub const STACK_PAGE_START: u16 = 0x0100;

    /// NMI vector (`$FFFA/$FFFB`).
    pub const NMI_VECTOR: u16 = 0xFFFA;
    /// Reset vector (`$FFFC/$FFFD`).
    pub const RESET_VECTOR: u16 = 0xFFFC;
    /// IRQ/BRK vector (`$FFFE/$FFFF`).
    pub const IRQ_VECTOR: u16 = 0xFFFE;

    /// 2 KiB of work RAM, mirrored every `0x0800` up to `$1FFF`.
    pub const INTERNAL_RAM_SIZE: usize = 0x0800;
    pub const INTERNAL_RAM_END: u16 = 0x07FF;
    pub const INTERNAL_RAM_MIRROR_END: u16 = 0x1FFF;

    /// PPU registers, mirrored every 8 bytes through `$3FFF`.
    pub const PPU_REGISTER_BASE: u16 = 0x2000;
    pub const PPU_REGISTER_END: u16 = 0x2007;
    pub const PPU_REGISTER_MIRROR_END: u16 = 0x3FFF;

    /// APU channel registers (`$4000-$4013`).
    pub const APU_REGISTER_BASE: u16 = 0x4000;
    pub const APU_REGISTER_END: u16 = 0x4013;
    /// Sprite DMA trigger.
    pub const OAM_DMA: u16 = 0x4014;
    /// APU status / channel enable.
    pub const APU_STATUS: u16 = 0x4015;
    /// Controller strobe (write) and port 1 data (read).
    pub const CONTROLLER_PORT_1: u16 = 0x4016;
    /// APU frame counter (write) and port 2 data (read).
    pub const CONTROLLER_PORT_2: u16 = 0x4017;

    /// Disabled CPU test-mode registers.
    pub const TEST_MODE_BASE: u16 = 0x4018;
    pub const TEST_MODE_END: u16 = 0x401F;

    /// Everything from here up is routed to the cartridge.
    pub const CARTRIDGE_SPACE_BASE: u16 = 0x4020;
    pub const PRG_RAM_START: u16 = 0x6000;
    pub const PRG_RAM_END: u16 = 0x7FFF;
    pub const PRG_RAM_SIZE: usize = 0x2000;
    pub const PRG_ROM_START: u16 = 0x8000;
    pub const CPU_ADDR_END: u16 = 0xFFFF;

    /// Size of the full CPU address space.
    pub const ADDRESS_SPACE: usize = 0x1_0000;
}

/// PPU memory map and register decode.
pub mod ppu {
    /// Pattern tables (CHR) occupy `$0000-$1FFF`.
    pub const PATTERN_TABLE_END: u16 = 0x1FFF;
    pub const PATTERN_TABLE_1: u16 = 0x1000;

    /// Four logical 1 KiB nametables.
    pub const NAMETABLE_BASE: u16 = 0x2000;
    pub const NAMETABLE_END: u16 = 0x2FFF;
    pub const NAMETABLE_SIZE: u16 = 0x0400;
    /// Offset of the attribute table inside a nametable.
    pub const ATTRIBUTE_OFFSET: u16 = 0x03C0;
    /// `$3000-$3EFF` mirrors `$2000-$2EFF`.
    pub const NAMETABLE_MIRROR_BASE: u16 = 0x3000;
    pub const NAMETABLE_MIRROR_END: u16 = 0x3EFF;

    /// Console RAM backing the nametables: two pages on the board plus two
    /// more for cartridges wired for four-screen layouts.
    pub const CIRAM_SIZE: usize = 0x1000;

    pub const PALETTE_BASE: u16 = 0x3F00;
    pub const PALETTE_END: u16 = 0x3FFF;
    pub const PALETTE_RAM_SIZE: usize = 0x20;

    /// The PPU bus is 14 bits wide.
    pub const ADDRESS_MASK: u16 = 0x3FFF;
    pub const ADDRESS_SPACE: usize = 0x4000;

    pub const OAM_SIZE: usize = 0x100;
    pub const SECONDARY_OAM_SIZE: usize = 0x20;

    /// CPU-visible PPU register identifiers.
    #[repr(u16)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum Register {
        /// `$2000` PPUCTRL
        Control = 0x2000,
        /// `$2001` PPUMASK
        Mask = 0x2001,
        /// `$2002` PPUSTATUS
        Status = 0x2002,
        /// `$2003` OAMADDR
        OamAddr = 0x2003,
        /// `$2004` OAMDATA
        OamData = 0x2004,
        /// `$2005` PPUSCROLL
        Scroll = 0x2005,
        /// `$2006` PPUADDR
        Addr = 0x2006,
        /// `$2007` PPUDATA
        Data = 0x2007,
    }

    impl Register {
        pub const fn addr(self) -> u16 {
            self as u16
        }

        /// Decodes any address in `$2000-$3FFF` to its register.
        pub const fn from_cpu_addr(addr: u16) -> Self {
            match addr & 0x0007 {
                0 => Self::Control,
                1 => Self::Mask,
                2 => Self::Status,
                3 => Self::OamAddr,
                4 => Self::OamData,
                5 => Self::Scroll,
                6 => Self::Addr,
                _ => Self::Data,
            }
        }
    }
}

/// APU register file.
pub mod apu {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum Register {
        Pulse1Control,
        Pulse1Sweep,
        Pulse1TimerLow,
        Pulse1TimerHigh,
        Pulse2Control,
        Pulse2Sweep,
        Pulse2TimerLow,
        Pulse2TimerHigh,
        TriangleControl,
        TriangleTimerLow,
        TriangleTimerHigh,
        NoiseControl,
        NoiseModeAndPeriod,
        NoiseLength,
        DmcControl,
        DmcDirectLoad,
        DmcSampleAddress,
        DmcSampleLength,
        Status,
        FrameCounter,
    }

    impl Register {
        /// Maps a CPU address to the register it writes. `$4009`, `$400D`
        /// and `$4014` are not APU registers.
        pub const fn from_cpu_addr(addr: u16) -> Option<Self> {
            Some(match addr {
                0x4000 => Self::Pulse1Control,
                0x4001 => Self::Pulse1Sweep,
                0x4002 => Self::Pulse1TimerLow,
                0x4003 => Self::Pulse1TimerHigh,
                0x4004 => Self::Pulse2Control,
                0x4005 => Self::Pulse2Sweep,
                0x4006 => Self::Pulse2TimerLow,
                0x4007 => Self::Pulse2TimerHigh,
                0x4008 => Self::TriangleControl,
                0x400A => Self::TriangleTimerLow,
                0x400B => Self::TriangleTimerHigh,
                0x400C => Self::NoiseControl,
                0x400E => Self::NoiseModeAndPeriod,
                0x400F => Self::NoiseLength,
                0x4010 => Self::DmcControl,
                0x4011 => Self::DmcDirectLoad,
                0x4012 => Self::DmcSampleAddress,
                0x4013 => Self::DmcSampleLength,
                0x4015 => Self::Status,
                0x4017 => Self::FrameCounter,
                _ => return None,
            })
        }
    }

    /// DMC samples are fetched from `$C000 + 64 * A`.
    pub const DMC_SAMPLE_BASE: u16 = 0xC000;
}
