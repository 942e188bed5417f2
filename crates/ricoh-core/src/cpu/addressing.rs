use std::fmt::Display;

use crate::{bus::Bus, cpu::Cpu};

/// The 6502 addressing modes.
///
/// A mode decides how many operand bytes follow the opcode and how they are
/// turned into an effective address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Addressing {
    /// No operand. `CLC`, `NOP`, `RTS`.
    Implied,
    /// Operates on A. `ASL A`.
    Accumulator,
    /// The operand byte is the value. `LDA #$42`.
    Immediate,
    /// Full 16-bit address. `LDA $1234`.
    Absolute,
    /// `addr + X`; reads pay a cycle when the sum leaves the page.
    AbsoluteX,
    /// `addr + Y`; same penalty rule as `AbsoluteX`.
    AbsoluteY,
    /// `JMP ($xxxx)` only. The high byte never carries into the next page.
    Indirect,
    /// Address in `$0000-$00FF`.
    ZeroPage,
    /// `(zp + X) & $FF`.
    ZeroPageX,
    /// `(zp + Y) & $FF`; used by LDX/STX/LAX/SAX.
    ZeroPageY,
    /// `($zp,X)`: pointer fetched from the zero page after indexing.
    IndirectX,
    /// `($zp),Y`: pointer fetched from the zero page, then Y is added.
    IndirectY,
    /// Signed 8-bit branch displacement from the next instruction.
    Relative,
}

impl Addressing {
    /// Operand bytes that follow the opcode.
    pub const fn operand_len(self) -> u16 {
        match self {
            Addressing::Implied | Addressing::Accumulator => 0,
            Addressing::Absolute
            | Addressing::AbsoluteX
            | Addressing::AbsoluteY
            | Addressing::Indirect => 2,
            _ => 1,
        }
    }
}

impl Display for Addressing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Addressing::Implied => "imp",
            Addressing::Accumulator => "acc",
            Addressing::Immediate => "imm",
            Addressing::Absolute => "abs",
            Addressing::AbsoluteX => "abs,x",
            Addressing::AbsoluteY => "abs,y",
            Addressing::Indirect => "ind",
            Addressing::ZeroPage => "zp",
            Addressing::ZeroPageX => "zp,x",
            Addressing::ZeroPageY => "zp,y",
            Addressing::IndirectX => "(ind,x)",
            Addressing::IndirectY => "(ind),y",
            Addressing::Relative => "rel",
        };
        f.write_str(s)
    }
}

/// Effective operand of one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Operand {
    /// Effective address, or `None` for implied/accumulator forms.
    pub(crate) addr: Option<u16>,
    /// Indexing or a branch target left the page of the base address.
    pub(crate) page_crossed: bool,
}

impl Operand {
    fn at(addr: u16) -> Self {
        Self {
            addr: Some(addr),
            page_crossed: false,
        }
    }

    fn indexed(base: u16, index: u8) -> Self {
        let addr = base.wrapping_add(index as u16);
        Self {
            addr: Some(addr),
            page_crossed: crosses_page(base, addr),
        }
    }
}

#[inline]
pub(crate) fn crosses_page(a: u16, b: u16) -> bool {
    a & 0xFF00 != b & 0xFF00
}

fn fetch_byte(cpu: &mut Cpu, bus: &mut impl Bus) -> u8 {
    let value = bus.read(cpu.pc);
    cpu.pc = cpu.pc.wrapping_add(1);
    value
}

fn fetch_word(cpu: &mut Cpu, bus: &mut impl Bus) -> u16 {
    let lo = fetch_byte(cpu, bus) as u16;
    let hi = fetch_byte(cpu, bus) as u16;
    (hi << 8) | lo
}

/// Reads a pointer from the zero page; the high byte wraps within page 0.
fn zero_page_pointer(bus: &mut impl Bus, zp: u8) -> u16 {
    let lo = bus.read(zp as u16) as u16;
    let hi = bus.read(zp.wrapping_add(1) as u16) as u16;
    (hi << 8) | lo
}

/// Consumes the operand bytes at PC and computes the effective address.
pub(crate) fn resolve(cpu: &mut Cpu, bus: &mut impl Bus, mode: Addressing) -> Operand {
    match mode {
        Addressing::Implied | Addressing::Accumulator => Operand::default(),
        Addressing::Immediate => {
            let addr = cpu.pc;
            cpu.pc = cpu.pc.wrapping_add(1);
            Operand::at(addr)
        }
        Addressing::ZeroPage => Operand::at(fetch_byte(cpu, bus) as u16),
        Addressing::ZeroPageX => Operand::at(fetch_byte(cpu, bus).wrapping_add(cpu.x) as u16),
        Addressing::ZeroPageY => Operand::at(fetch_byte(cpu, bus).wrapping_add(cpu.y) as u16),
        Addressing::Absolute => Operand::at(fetch_word(cpu, bus)),
        Addressing::AbsoluteX => {
            let base = fetch_word(cpu, bus);
            Operand::indexed(base, cpu.x)
        }
        Addressing::AbsoluteY => {
            let base = fetch_word(cpu, bus);
            Operand::indexed(base, cpu.y)
        }
        Addressing::Indirect => {
            let ptr = fetch_word(cpu, bus);
            let lo = bus.read(ptr) as u16;
            // The pointer's high byte is fetched without carry: JMP ($02FF)
            // reads $02FF and $0200.
            let hi_addr = (ptr & 0xFF00) | (ptr.wrapping_add(1) & 0x00FF);
            let hi = bus.read(hi_addr) as u16;
            Operand::at((hi << 8) | lo)
        }
        Addressing::IndirectX => {
            let zp = fetch_byte(cpu, bus).wrapping_add(cpu.x);
            Operand::at(zero_page_pointer(bus, zp))
        }
        Addressing::IndirectY => {
            let zp = fetch_byte(cpu, bus);
            let base = zero_page_pointer(bus, zp);
            Operand::indexed(base, cpu.y)
        }
        Addressing::Relative => {
            let offset = fetch_byte(cpu, bus) as i8;
            let next = cpu.pc;
            let target = next.wrapping_add(offset as i16 as u16);
            Operand {
                addr: Some(target),
                page_crossed: crosses_page(next, target),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::mock::FlatBus;

    fn cpu_at(pc: u16) -> Cpu {
        let mut cpu = Cpu::new();
        cpu.pc = pc;
        cpu
    }

    #[test]
    fn indirect_jump_wraps_within_page() {
        let mut bus = FlatBus::new();
        bus.load(0x8000, &[0xFF, 0x02]);
        bus.mem[0x02FF] = 0x34;
        bus.mem[0x0200] = 0x12;
        bus.mem[0x0300] = 0x99;
        let mut cpu = cpu_at(0x8000);
        let op = resolve(&mut cpu, &mut bus, Addressing::Indirect);
        assert_eq!(op.addr, Some(0x1234));
        assert_eq!(cpu.pc, 0x8002);
    }

    #[test]
    fn zero_page_index_wraps() {
        let mut bus = FlatBus::new();
        bus.load(0x8000, &[0xF0]);
        let mut cpu = cpu_at(0x8000);
        cpu.x = 0x20;
        let op = resolve(&mut cpu, &mut bus, Addressing::ZeroPageX);
        assert_eq!(op.addr, Some(0x0010));
    }

    #[test]
    fn indirect_y_reports_page_cross() {
        let mut bus = FlatBus::new();
        bus.load(0x8000, &[0xFF]);
        bus.mem[0x00FF] = 0xF0;
        bus.mem[0x0000] = 0x12; // pointer high byte wraps to $00
        let mut cpu = cpu_at(0x8000);
        cpu.y = 0x20;
        let op = resolve(&mut cpu, &mut bus, Addressing::IndirectY);
        assert_eq!(op.addr, Some(0x1310));
        assert!(op.page_crossed);
    }

    #[test]
    fn relative_targets_are_signed() {
        let mut bus = FlatBus::new();
        bus.load(0x80F0, &[0x80, 0x7F]);
        let mut cpu = cpu_at(0x80F0);
        let back = resolve(&mut cpu, &mut bus, Addressing::Relative);
        assert_eq!(back.addr, Some(0x8071));
        assert!(!back.page_crossed);

        let forward = resolve(&mut cpu, &mut bus, Addressing::Relative);
        assert_eq!(forward.addr, Some(0x80F2 + 0x7F));
        assert!(forward.page_crossed);
    }
}
