use crate::{
    bus::Bus,
    cpu::{Cpu, addressing::Addressing, lookup::OPCODE_TABLE},
};

/// Renders the instruction at PC as a nestest-style log line:
///
/// ```text
/// C000  4C F5 C5  JMP $C5F5                       A:00 X:00 Y:00 P:24 SP:FD
/// ```
///
/// Unofficial opcodes get a `*` in front of the mnemonic. Memory is sampled
/// with [`Bus::peek`], so producing a line never disturbs the machine.
pub fn trace_line(cpu: &Cpu, bus: &impl Bus) -> String {
    let pc = cpu.pc;
    let opcode = bus.peek(pc);
    let decoded = OPCODE_TABLE[opcode as usize];
    let len = decoded.addressing.operand_len();

    let b1 = bus.peek(pc.wrapping_add(1));
    let b2 = bus.peek(pc.wrapping_add(2));
    let bytes = match len {
        0 => format!("{opcode:02X}"),
        1 => format!("{opcode:02X} {b1:02X}"),
        _ => format!("{opcode:02X} {b1:02X} {b2:02X}"),
    };

    let word = u16::from_le_bytes([b1, b2]);
    let operand = match decoded.addressing {
        Addressing::Implied => String::new(),
        Addressing::Accumulator => "A".to_string(),
        Addressing::Immediate => format!("#${b1:02X}"),
        Addressing::ZeroPage => format!("${b1:02X}"),
        Addressing::ZeroPageX => format!("${b1:02X},X"),
        Addressing::ZeroPageY => format!("${b1:02X},Y"),
        Addressing::Absolute => format!("${word:04X}"),
        Addressing::AbsoluteX => format!("${word:04X},X"),
        Addressing::AbsoluteY => format!("${word:04X},Y"),
        Addressing::Indirect => format!("(${word:04X})"),
        Addressing::IndirectX => format!("(${b1:02X},X)"),
        Addressing::IndirectY => format!("(${b1:02X}),Y"),
        Addressing::Relative => {
            let target = pc.wrapping_add(2).wrapping_add(b1 as i8 as i16 as u16);
            format!("${target:04X}")
        }
    };

    let marker = if decoded.is_official(opcode) { ' ' } else { '*' };
    let asm = if operand.is_empty() {
        decoded.mnemonic.to_string()
    } else {
        format!("{} {operand}", decoded.mnemonic)
    };

    format!(
        "{pc:04X}  {bytes:<8} {marker}{asm:<32}A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X}",
        cpu.a,
        cpu.x,
        cpu.y,
        cpu.p.bits(),
        cpu.s
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::mock::FlatBus;

    #[test]
    fn formats_like_nestest() {
        let mut bus = FlatBus::with_program(0xC000, &[0x4C, 0xF5, 0xC5]);
        let mut cpu = Cpu::new();
        cpu.power_on(&mut bus);
        assert_eq!(
            trace_line(&cpu, &bus),
            "C000  4C F5 C5  JMP $C5F5                       A:00 X:00 Y:00 P:24 SP:FD"
        );
    }

    #[test]
    fn marks_unofficial_opcodes() {
        let mut bus = FlatBus::with_program(0xC000, &[0xA7, 0x10, 0x80, 0x00]);
        let mut cpu = Cpu::new();
        cpu.power_on(&mut bus);
        assert!(trace_line(&cpu, &bus).starts_with("C000  A7 10    *LAX $10"));

        cpu.set_pc(0xC002);
        assert!(trace_line(&cpu, &bus).contains("*NOP #$00"));
    }
}
