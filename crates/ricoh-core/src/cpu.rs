use std::fmt::Display;

use tracing::{debug, trace, warn};

use crate::{
    bus::Bus,
    cpu::{
        addressing::resolve,
        interrupt::{Interrupt, InterruptLines},
    },
    error::{Error, Result},
    memory::cpu as cpu_mem,
};

mod addressing;
mod execute;
mod interrupt;
mod lookup;
mod mnemonic;
mod status;
mod timing;
mod trace;

pub use addressing::Addressing;
pub use lookup::{OPCODE_TABLE, Opcode};
pub use mnemonic::Mnemonic;
pub use status::Status;
pub use timing::Timing;
pub use trace::trace_line;

/// Cycles spent pushing PC/P and loading a vector.
const INTERRUPT_CYCLES: u8 = 7;
/// Cycles a jammed CPU reports per step so the rest of the console keeps
/// running.
const JAMMED_CYCLES: u8 = 2;

/// Execution switches that only matter for debugging and test runs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CpuOptions {
    /// Refuse opcodes whose bus behaviour is analog (SHA/SHS/SHX/SHY) and
    /// the JAM family.
    pub strict_opcodes: bool,
    /// Stop on BRK instead of taking the IRQ vector.
    pub break_on_brk: bool,
}

/// The 2A03's 6502 core, stepped one instruction at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cpu {
    pub(crate) a: u8,
    pub(crate) x: u8,
    pub(crate) y: u8,
    pub(crate) s: u8,
    pub(crate) p: Status,
    pub(crate) pc: u16,

    /// CPU cycles since power-on, stalls included.
    cycles: u64,
    /// Cycles the CPU must sit idle (OAM DMA) before its next instruction.
    stall: u16,
    lines: InterruptLines,
    /// I flag as sampled by the last instruction's interrupt poll. CLI, SEI
    /// and PLP change I after the poll, so their effect lags by one
    /// instruction.
    poll_masked: bool,
    pub(crate) jammed: bool,
    options: CpuOptions,
    /// One bit per opcode that already produced an "unstable opcode" warning.
    warned: [u64; 4],
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    /// A CPU with power-on register values. PC stays at zero until
    /// [`Cpu::power_on`] or [`Cpu::reset`] loads the reset vector.
    pub fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            s: 0xFD,
            p: Status::POWER_ON,
            pc: 0,
            cycles: 0,
            stall: 0,
            lines: InterruptLines::default(),
            poll_masked: true,
            jammed: false,
            options: CpuOptions::default(),
            warned: [0; 4],
        }
    }

    pub fn with_options(mut self, options: CpuOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> CpuOptions {
        self.options
    }

    /// Cold start: clears registers and latches, then runs the reset
    /// sequence.
    pub fn power_on(&mut self, bus: &mut impl Bus) {
        let options = self.options;
        *self = Self::new().with_options(options);
        // The reset sequence below takes SP from $00 to $FD.
        self.s = 0x00;
        self.reset(bus);
    }

    /// Warm reset: registers survive, SP drops by three, I is set and PC
    /// is reloaded from `$FFFC`.
    pub fn reset(&mut self, bus: &mut impl Bus) {
        self.s = self.s.wrapping_sub(3);
        self.p.insert(Status::INTERRUPT);
        self.pc = bus.read_word(Interrupt::Reset.vector());
        self.stall = 0;
        self.jammed = false;
        self.lines.clear();
        self.poll_masked = true;
        self.cycles += INTERRUPT_CYCLES as u64;
        debug!(pc = format_args!("{:04X}", self.pc), "cpu reset");
    }

    /// Runs one instruction, or services one pending interrupt, and returns
    /// the cycles it took.
    ///
    /// With [`CpuOptions::strict_opcodes`] or [`CpuOptions::break_on_brk`]
    /// set, the offending opcode is reported before any of its effects
    /// happen and PC keeps pointing at it.
    pub fn step(&mut self, bus: &mut impl Bus) -> Result<u8> {
        if self.jammed {
            self.cycles += JAMMED_CYCLES as u64;
            return Ok(JAMMED_CYCLES);
        }

        if let Some(interrupt) = self.lines.take(self.poll_masked) {
            self.service(bus, interrupt);
            self.cycles += INTERRUPT_CYCLES as u64;
            return Ok(INTERRUPT_CYCLES);
        }

        let pc = self.pc;
        let opcode = bus.read(pc);
        let decoded = OPCODE_TABLE[opcode as usize];
        let mnemonic = decoded.mnemonic;

        if mnemonic.is_unstable() {
            if self.options.strict_opcodes {
                return Err(Error::UnsupportedOpcode { opcode, pc });
            }
            self.warn_once(opcode, pc, mnemonic);
        }
        if mnemonic == Mnemonic::BRK && self.options.break_on_brk {
            return Err(Error::BreakEncountered { pc });
        }

        self.pc = pc.wrapping_add(1);
        let masked_before = self.p.contains(Status::INTERRUPT);
        let operand = resolve(self, bus, decoded.addressing);
        let taken = self.execute(bus, mnemonic, operand);

        self.poll_masked = match mnemonic {
            Mnemonic::CLI | Mnemonic::SEI | Mnemonic::PLP => masked_before,
            _ => self.p.contains(Status::INTERRUPT),
        };

        let cycles = decoded.timing.total_cycles(operand.page_crossed, taken);
        self.cycles += cycles as u64;
        Ok(cycles)
    }

    fn service(&mut self, bus: &mut impl Bus, interrupt: Interrupt) {
        let vector = interrupt.vector();
        self.push_word(bus, self.pc);
        self.push(bus, self.p.pushed(false));
        self.p.insert(Status::INTERRUPT);
        self.poll_masked = true;
        self.pc = bus.read_word(vector);
        trace!(
            ?interrupt,
            pc = format_args!("{:04X}", self.pc),
            "interrupt serviced"
        );
    }

    fn warn_once(&mut self, opcode: u8, pc: u16, mnemonic: Mnemonic) {
        let word = &mut self.warned[(opcode >> 6) as usize];
        let bit = 1u64 << (opcode & 0x3F);
        if *word & bit == 0 {
            *word |= bit;
            warn!(
                opcode = format_args!("{opcode:02X}"),
                pc = format_args!("{pc:04X}"),
                %mnemonic,
                "executing implementation-defined opcode"
            );
        }
    }

    /// Feeds the PPU's NMI output. A rising edge latches a request that is
    /// serviced at the next instruction boundary.
    pub fn set_nmi_line(&mut self, level: bool) {
        self.lines.set_nmi_level(level);
    }

    /// Feeds the combined IRQ level (APU frame counter, DMC, mapper).
    pub fn set_irq_line(&mut self, level: bool) {
        self.lines.set_irq_level(level);
    }

    pub fn nmi_pending(&self) -> bool {
        self.lines.nmi_pending()
    }

    /// Queues cycles during which the CPU does nothing (OAM DMA).
    pub fn add_stall(&mut self, cycles: u16) {
        self.stall = self.stall.saturating_add(cycles);
    }

    pub fn stalled(&self) -> bool {
        self.stall > 0
    }

    /// Burns one stall cycle. Returns `false` when there was none left.
    pub fn tick_stall(&mut self) -> bool {
        if self.stall == 0 {
            return false;
        }
        self.stall -= 1;
        self.cycles += 1;
        true
    }

    pub(crate) fn push(&mut self, bus: &mut impl Bus, value: u8) {
        bus.write(cpu_mem::STACK_PAGE_START | self.s as u16, value);
        self.s = self.s.wrapping_sub(1);
    }

    pub(crate) fn pull(&mut self, bus: &mut impl Bus) -> u8 {
        self.s = self.s.wrapping_add(1);
        bus.read(cpu_mem::STACK_PAGE_START | self.s as u16)
    }

    pub(crate) fn push_word(&mut self, bus: &mut impl Bus, value: u16) {
        self.push(bus, (value >> 8) as u8);
        self.push(bus, value as u8);
    }

    pub(crate) fn pull_word(&mut self, bus: &mut impl Bus) -> u16 {
        let lo = self.pull(bus) as u16;
        let hi = self.pull(bus) as u16;
        (hi << 8) | lo
    }

    pub fn a(&self) -> u8 {
        self.a
    }

    pub fn x(&self) -> u8 {
        self.x
    }

    pub fn y(&self) -> u8 {
        self.y
    }

    pub fn sp(&self) -> u8 {
        self.s
    }

    pub fn status(&self) -> Status {
        self.p
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn set_pc(&mut self, pc: u16) {
        self.pc = pc;
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn is_jammed(&self) -> bool {
        self.jammed
    }
}

impl Display for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} PC:{:04X}",
            self.a,
            self.x,
            self.y,
            self.p.bits(),
            self.s,
            self.pc
        )
    }
}
