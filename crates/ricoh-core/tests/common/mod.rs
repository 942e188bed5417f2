#![allow(dead_code)]

use std::path::Path;

use anyhow::{Context, Result, bail};
use ctor::ctor;
use ricoh_core::{Core, config::CoreConfig};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

pub const ROM_ROOT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/vendor/nes-test-roms");

const PRG_BANK: usize = 0x4000;
const CHR_BANK: usize = 0x2000;

#[ctor]
fn init_tracing() {
    let subscriber = FmtSubscriber::builder()
        .with_file(true)
        .with_line_number(true)
        .with_max_level(Level::INFO)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Builds iNES images in memory. PRG bank `n` is filled with the byte `n`,
/// so bank switches are visible from a single read.
#[derive(Debug, Clone)]
pub struct RomBuilder {
    mapper: u8,
    flags6: u8,
    pal: bool,
    prg: Vec<u8>,
    chr: Vec<u8>,
}

impl Default for RomBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RomBuilder {
    /// NROM-128 with 8 KiB of CHR ROM and all vectors pointing at `$C000`.
    pub fn new() -> Self {
        Self {
            mapper: 0,
            flags6: 0,
            pal: false,
            prg: vec![0; PRG_BANK],
            chr: vec![0; CHR_BANK],
        }
        .reset_vector(0xC000)
        .nmi_vector(0xC000)
        .irq_vector(0xC000)
    }

    pub fn mapper(mut self, mapper: u8) -> Self {
        self.mapper = mapper;
        self
    }

    /// Resizes PRG ROM to `banks` 16 KiB banks. Call before placing code.
    pub fn prg_banks(mut self, banks: usize) -> Self {
        self.prg = (0..banks * PRG_BANK)
            .map(|i| (i / PRG_BANK) as u8)
            .collect();
        self.reset_vector(0xC000)
            .nmi_vector(0xC000)
            .irq_vector(0xC000)
    }

    /// Zero CHR banks gives the board CHR RAM.
    pub fn chr_banks(mut self, banks: usize) -> Self {
        self.chr = vec![0; banks * CHR_BANK];
        self
    }

    pub fn chr(mut self, offset: usize, bytes: &[u8]) -> Self {
        self.chr[offset..offset + bytes.len()].copy_from_slice(bytes);
        self
    }

    pub fn vertical_mirroring(mut self) -> Self {
        self.flags6 |= 0x01;
        self
    }

    pub fn battery(mut self) -> Self {
        self.flags6 |= 0x02;
        self
    }

    pub fn pal(mut self) -> Self {
        self.pal = true;
        self
    }

    /// Writes `bytes` into the last PRG bank at the offset `addr` has inside
    /// a 16 KiB window. Boards with a fixed last bank see it at `$C000+`.
    pub fn code_at(mut self, addr: u16, bytes: &[u8]) -> Self {
        let start = self.prg.len() - PRG_BANK + (addr as usize & (PRG_BANK - 1));
        self.prg[start..start + bytes.len()].copy_from_slice(bytes);
        self
    }

    pub fn reset_vector(self, target: u16) -> Self {
        self.code_at(0xFFFC, &target.to_le_bytes())
    }

    pub fn nmi_vector(self, target: u16) -> Self {
        self.code_at(0xFFFA, &target.to_le_bytes())
    }

    pub fn irq_vector(self, target: u16) -> Self {
        self.code_at(0xFFFE, &target.to_le_bytes())
    }

    pub fn build(&self) -> Vec<u8> {
        let mut image = Vec::with_capacity(16 + self.prg.len() + self.chr.len());
        image.extend_from_slice(b"NES\x1A");
        image.push((self.prg.len() / PRG_BANK) as u8);
        image.push((self.chr.len() / CHR_BANK) as u8);
        image.push(self.flags6 | (self.mapper << 4));
        image.push(self.mapper & 0xF0);
        image.push(0);
        image.push(u8::from(self.pal));
        image.extend_from_slice(&[0; 6]);
        image.extend_from_slice(&self.prg);
        image.extend_from_slice(&self.chr);
        image
    }
}

/// Hand assembler for the handful of instructions the scenarios need.
#[derive(Debug, Clone)]
pub struct Asm {
    origin: u16,
    bytes: Vec<u8>,
}

impl Asm {
    pub fn new(origin: u16) -> Self {
        Self {
            origin,
            bytes: Vec::new(),
        }
    }

    /// Address of the next emitted byte.
    pub fn pc(&self) -> u16 {
        self.origin.wrapping_add(self.bytes.len() as u16)
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    fn abs(self, opcode: u8, addr: u16) -> Self {
        let [lo, hi] = addr.to_le_bytes();
        self.raw(&[opcode, lo, hi])
    }

    pub fn lda_imm(self, value: u8) -> Self {
        self.raw(&[0xA9, value])
    }

    pub fn ldx_imm(self, value: u8) -> Self {
        self.raw(&[0xA2, value])
    }

    pub fn lda_abs(self, addr: u16) -> Self {
        self.abs(0xAD, addr)
    }

    pub fn lda_abs_x(self, addr: u16) -> Self {
        self.abs(0xBD, addr)
    }

    pub fn sta_abs(self, addr: u16) -> Self {
        self.abs(0x8D, addr)
    }

    pub fn sta_zp(self, addr: u8) -> Self {
        self.raw(&[0x85, addr])
    }

    pub fn inx(self) -> Self {
        self.raw(&[0xE8])
    }

    pub fn inc_zp(self, addr: u8) -> Self {
        self.raw(&[0xE6, addr])
    }

    pub fn rti(self) -> Self {
        self.raw(&[0x40])
    }

    /// BNE back to `target`, which must be within branch range.
    pub fn bne_to(self, target: u16) -> Self {
        let next = self.pc().wrapping_add(2);
        let offset = target.wrapping_sub(next) as i16;
        self.raw(&[0xD0, offset as i8 as u8])
    }

    pub fn store(self, addr: u16, value: u8) -> Self {
        self.lda_imm(value).sta_abs(addr)
    }

    /// Loads `addr` into the PPU address register.
    pub fn ppu_addr(self, addr: u16) -> Self {
        let [lo, hi] = addr.to_le_bytes();
        self.store(0x2006, hi).store(0x2006, lo)
    }

    /// `JMP *`. Returns the spin address alongside the program.
    pub fn spin(self) -> (u16, Vec<u8>) {
        let at = self.pc();
        let program = self.abs(0x4C, at);
        (at, program.bytes)
    }

    pub fn bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Powered-on core with the default configuration.
pub fn boot(rom: &[u8]) -> Result<Core> {
    boot_with(rom, CoreConfig::default())
}

pub fn boot_with(rom: &[u8], config: CoreConfig) -> Result<Core> {
    Core::new(rom, config).context("building core")
}

/// Steps whole instructions until `done` holds, checking before each step.
pub fn run_until<F>(core: &mut Core, limit: usize, mut done: F) -> Result<()>
where
    F: FnMut(&Core) -> bool,
{
    for _ in 0..limit {
        if done(core) {
            return Ok(());
        }
        core.step_instruction()?;
    }
    if done(core) {
        return Ok(());
    }
    bail!(
        "condition not reached after {limit} instructions (pc ${:04X}, ppu {:?})",
        core.cpu().pc(),
        core.ppu().position()
    )
}

/// Runs until the CPU parks on `spin`.
pub fn run_to_spin(core: &mut Core, spin: u16) -> Result<()> {
    run_until(core, 100_000, |c| c.cpu().pc() == spin)
}

/// Reads a file from the vendored test suite.
pub fn vendor_rom(rel: &str) -> Result<Vec<u8>> {
    let path = Path::new(ROM_ROOT).join(rel);
    if !path.exists() {
        bail!("ROM not found: {}", path.display());
    }
    std::fs::read(&path).with_context(|| format!("reading {}", path.display()))
}
