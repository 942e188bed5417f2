//! iNES / NES 2.0 header parsing.
//!
//! The first 16 bytes of a `.nes` image describe how much PRG and CHR data
//! follows, which board (mapper) the game expects and how the nametables are
//! wired. NES 2.0 reuses the same layout and repurposes bytes 8-15 for wider
//! size fields and timing information; both flavours parse into one
//! [`Header`].

use bitflags::bitflags;

use crate::error::CartridgeError;

const NES_MAGIC: &[u8; 4] = b"NES\x1A";

/// Size of the fixed header in bytes.
pub const NES_HEADER_LEN: usize = 16;

pub const PRG_ROM_UNIT: usize = 16 * 1024;
pub const CHR_ROM_UNIT: usize = 8 * 1024;
pub const PRG_RAM_UNIT: usize = 8 * 1024;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags6: u8 {
        const VERTICAL         = 0b0000_0001;
        const BATTERY          = 0b0000_0010;
        const TRAINER          = 0b0000_0100;
        const FOUR_SCREEN      = 0b0000_1000;
        const MAPPER_LOW_MASK  = 0b1111_0000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags7: u8 {
        const VS_UNISYSTEM     = 0b0000_0001;
        const PLAYCHOICE_10    = 0b0000_0010;
        const NES2_DETECTION   = 0b0000_1100;
        const MAPPER_HIGH_MASK = 0b1111_0000;
    }
}

/// How the four logical nametables map onto physical 1 KiB pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mirroring {
    /// `$2000=$2400`, `$2800=$2C00`.
    Horizontal,
    /// `$2000=$2800`, `$2400=$2C00`.
    Vertical,
    /// Every table shows page 0.
    SingleScreenLower,
    /// Every table shows page 1.
    SingleScreenUpper,
    /// Four distinct tables.
    FourScreen,
}

impl Mirroring {
    /// Physical page behind each logical table `$2000/$2400/$2800/$2C00`.
    pub const fn pages(self) -> [usize; 4] {
        match self {
            Mirroring::Horizontal => [0, 0, 1, 1],
            Mirroring::Vertical => [0, 1, 0, 1],
            Mirroring::SingleScreenLower => [0, 0, 0, 0],
            Mirroring::SingleScreenUpper => [1, 1, 1, 1],
            Mirroring::FourScreen => [0, 1, 2, 3],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RomFormat {
    INes,
    Nes20,
    /// Pre-standard dumps whose bytes 7-15 often carry junk (e.g. a ripper's
    /// signature). Parsed as iNES with the upper mapper nibble ignored.
    Archaic,
}

impl RomFormat {
    fn detect(bytes: &[u8]) -> Self {
        match (bytes[7] >> 2) & 0b11 {
            0b10 => Self::Nes20,
            0b00 if bytes[12..16].iter().all(|&b| b == 0) => Self::INes,
            _ => Self::Archaic,
        }
    }
}

/// Video timing declared by the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TvSystem {
    Ntsc,
    Pal,
    /// Runs on either timing.
    Dual,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Header {
    pub format: RomFormat,
    pub mapper: u16,
    /// NES 2.0 submapper; 0 for iNES images.
    pub submapper: u8,
    pub mirroring: Mirroring,
    pub battery: bool,
    /// A 512-byte trainer sits between the header and PRG ROM.
    pub trainer: bool,
    pub prg_rom_size: usize,
    /// 0 means the board carries CHR RAM instead.
    pub chr_rom_size: usize,
    /// Work RAM at `$6000-$7FFF` (volatile plus battery-backed).
    pub prg_ram_size: usize,
    pub chr_ram_size: usize,
    pub tv_system: TvSystem,
}

impl Header {
    pub fn parse(bytes: &[u8]) -> Result<Self, CartridgeError> {
        let bytes = bytes
            .get(..NES_HEADER_LEN)
            .ok_or(CartridgeError::TooShort {
                actual: bytes.len(),
            })?;
        if &bytes[0..4] != NES_MAGIC {
            return Err(CartridgeError::InvalidMagic);
        }

        let flags6 = Flags6::from_bits_truncate(bytes[6]);
        let flags7 = Flags7::from_bits_truncate(bytes[7]);
        let header = match RomFormat::detect(bytes) {
            RomFormat::Nes20 => Self::parse_nes20(bytes, flags6, flags7),
            format => Self::parse_ines(bytes, flags6, flags7, format),
        };
        if header.prg_rom_size == 0 {
            return Err(CartridgeError::MissingPrgRom);
        }
        Ok(header)
    }

    fn parse_ines(bytes: &[u8], flags6: Flags6, flags7: Flags7, format: RomFormat) -> Self {
        let chr_rom_size = bytes[5] as usize * CHR_ROM_UNIT;
        let mapper_high = if format == RomFormat::Archaic {
            Flags7::empty()
        } else {
            flags7
        };
        let tv_system = if format == RomFormat::INes && bytes[9] & 0x01 != 0 {
            TvSystem::Pal
        } else {
            TvSystem::Ntsc
        };

        Self {
            format,
            mapper: combine_mapper(flags6, mapper_high, 0),
            submapper: 0,
            mirroring: mirroring(flags6),
            battery: flags6.contains(Flags6::BATTERY),
            trainer: flags6.contains(Flags6::TRAINER),
            prg_rom_size: bytes[4] as usize * PRG_ROM_UNIT,
            chr_rom_size,
            // 0 here historically means "one bank".
            prg_ram_size: bytes[8].max(1) as usize * PRG_RAM_UNIT,
            chr_ram_size: if chr_rom_size == 0 { CHR_ROM_UNIT } else { 0 },
            tv_system,
        }
    }

    fn parse_nes20(bytes: &[u8], flags6: Flags6, flags7: Flags7) -> Self {
        let prg_rom_size = nes2_rom_size(bytes[4], bytes[9] & 0x0F, PRG_ROM_UNIT);
        let chr_rom_size = nes2_rom_size(bytes[5], bytes[9] >> 4, CHR_ROM_UNIT);
        let prg_ram_size = nes2_ram_size(bytes[10] & 0x0F) + nes2_ram_size(bytes[10] >> 4);
        let chr_ram_size = nes2_ram_size(bytes[11] & 0x0F) + nes2_ram_size(bytes[11] >> 4);
        let tv_system = match bytes[12] & 0b11 {
            0b00 => TvSystem::Ntsc,
            0b01 => TvSystem::Pal,
            0b10 => TvSystem::Dual,
            // Dendy timing is not emulated.
            _ => TvSystem::Unknown,
        };

        Self {
            format: RomFormat::Nes20,
            mapper: combine_mapper(flags6, flags7, bytes[8] & 0x0F),
            submapper: bytes[8] >> 4,
            mirroring: mirroring(flags6),
            battery: flags6.contains(Flags6::BATTERY),
            trainer: flags6.contains(Flags6::TRAINER),
            prg_rom_size,
            chr_rom_size,
            prg_ram_size,
            // A CHR-RAM board that forgot to declare its size still gets 8 KiB.
            chr_ram_size: if chr_rom_size == 0 && chr_ram_size == 0 {
                CHR_ROM_UNIT
            } else {
                chr_ram_size
            },
            tv_system,
        }
    }
}

fn mirroring(flags6: Flags6) -> Mirroring {
    if flags6.contains(Flags6::FOUR_SCREEN) {
        Mirroring::FourScreen
    } else if flags6.contains(Flags6::VERTICAL) {
        Mirroring::Vertical
    } else {
        Mirroring::Horizontal
    }
}

fn combine_mapper(flags6: Flags6, flags7: Flags7, upper: u8) -> u16 {
    let low = (flags6 & Flags6::MAPPER_LOW_MASK).bits() as u16 >> 4;
    let middle = (flags7 & Flags7::MAPPER_HIGH_MASK).bits() as u16;
    low | middle | ((upper as u16) << 8)
}

/// NES 2.0 ROM size: a 12-bit unit count, or `2^E * (2M + 1)` bytes when the
/// MSB nibble is `$F`.
fn nes2_rom_size(lsb: u8, msb: u8, unit: usize) -> usize {
    if msb != 0x0F {
        (((msb as usize) << 8) | lsb as usize) * unit
    } else {
        let exponent = (lsb >> 2) as u32;
        let multiplier = ((lsb & 0b11) as usize) * 2 + 1;
        1usize
            .checked_shl(exponent)
            .unwrap_or(0)
            .saturating_mul(multiplier)
    }
}

/// NES 2.0 RAM size nibble: `64 << n` bytes, 0 for none.
fn nes2_ram_size(nibble: u8) -> usize {
    if nibble == 0 { 0 } else { 64 << nibble }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(bytes_4_to_15: [u8; 12]) -> [u8; NES_HEADER_LEN] {
        let mut out = [0; NES_HEADER_LEN];
        out[..4].copy_from_slice(NES_MAGIC);
        out[4..].copy_from_slice(&bytes_4_to_15);
        out
    }

    #[test]
    fn parses_ines() {
        let bytes = header([2, 1, 0b0001_0011, 0b0100_0000, 0, 1, 0, 0, 0, 0, 0, 0]);
        let h = Header::parse(&bytes).unwrap();
        assert_eq!(h.format, RomFormat::INes);
        assert_eq!(h.mapper, 0x41);
        assert_eq!(h.prg_rom_size, 32 * 1024);
        assert_eq!(h.chr_rom_size, 8 * 1024);
        assert_eq!(h.chr_ram_size, 0);
        assert_eq!(h.mirroring, Mirroring::Vertical);
        assert!(h.battery);
        assert!(!h.trainer);
        assert_eq!(h.prg_ram_size, 8 * 1024);
        assert_eq!(h.tv_system, TvSystem::Pal);
    }

    #[test]
    fn four_screen_overrides_mirroring_bit() {
        let bytes = header([1, 0, 0b0000_1001, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        let h = Header::parse(&bytes).unwrap();
        assert_eq!(h.mirroring, Mirroring::FourScreen);
        assert_eq!(h.chr_ram_size, 8 * 1024);
    }

    #[test]
    fn archaic_header_ignores_upper_mapper_nibble() {
        let mut bytes = header([1, 1, 0x10, 0x40, 0, 0, 0, 0, 0, 0, 0, 0]);
        bytes[12..].copy_from_slice(b"Dude");
        let h = Header::parse(&bytes).unwrap();
        assert_eq!(h.format, RomFormat::Archaic);
        assert_eq!(h.mapper, 1);
    }

    #[test]
    fn parses_nes2() {
        let bytes = header([
            2,
            1,
            0b0000_0000,
            0b0000_1000,
            0b0011_0001, // submapper 3, mapper bits 8-11 = 1
            0b0001_0000, // CHR MSB 1
            0b0111_0000, // 8 KiB battery RAM
            0b0000_0000,
            0b0000_0010,
            0,
            0,
            0,
        ]);
        let h = Header::parse(&bytes).unwrap();
        assert_eq!(h.format, RomFormat::Nes20);
        assert_eq!(h.mapper, 0x100);
        assert_eq!(h.submapper, 3);
        assert_eq!(h.chr_rom_size, 257 * 8 * 1024);
        assert_eq!(h.prg_ram_size, 8 * 1024);
        assert_eq!(h.tv_system, TvSystem::Dual);
    }

    #[test]
    fn nes2_exponent_sizes() {
        // 2^4 * 3 = 48 bytes.
        assert_eq!(nes2_rom_size(0b0001_0001, 0x0F, PRG_ROM_UNIT), 48);
        assert_eq!(nes2_rom_size(2, 0, PRG_ROM_UNIT), 32 * 1024);
    }

    #[test]
    fn rejects_bad_images() {
        assert!(matches!(
            Header::parse(b"NES"),
            Err(CartridgeError::TooShort { actual: 3 })
        ));
        let mut bytes = header([1; 12]);
        bytes[0] = b'X';
        assert!(matches!(
            Header::parse(&bytes),
            Err(CartridgeError::InvalidMagic)
        ));
        let bytes = header([0; 12]);
        assert!(matches!(
            Header::parse(&bytes),
            Err(CartridgeError::MissingPrgRom)
        ));
    }
}
