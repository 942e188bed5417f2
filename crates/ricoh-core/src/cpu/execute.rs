//! Instruction semantics.
//!
//! Every operation is a small method on [`Cpu`]; unofficial read-modify-write
//! combos are built from the same primitives their official halves use.

use crate::{
    bus::Bus,
    cpu::{Cpu, addressing::Operand, mnemonic::Mnemonic, status::Status},
};

/// Constant OR'd into A by the unstable XAA/LXA opcodes. Real chips vary;
/// `$EE` matches the most commonly measured value.
const UNSTABLE_MAGIC: u8 = 0xEE;

impl Cpu {
    /// Runs one decoded instruction. Returns whether a branch was taken.
    pub(super) fn execute(
        &mut self,
        bus: &mut impl Bus,
        mnemonic: Mnemonic,
        operand: Operand,
    ) -> bool {
        use Mnemonic::*;

        let addr = operand.addr.unwrap_or_default();
        match mnemonic {
            // Load/store
            LDA => {
                self.a = bus.read(addr);
                self.p.update_zn(self.a);
            }
            LDX => {
                self.x = bus.read(addr);
                self.p.update_zn(self.x);
            }
            LDY => {
                self.y = bus.read(addr);
                self.p.update_zn(self.y);
            }
            LAX => {
                let value = bus.read(addr);
                self.a = value;
                self.x = value;
                self.p.update_zn(value);
            }
            LXA => {
                let value = (self.a | UNSTABLE_MAGIC) & bus.read(addr);
                self.a = value;
                self.x = value;
                self.p.update_zn(value);
            }
            LAS => {
                let value = bus.read(addr) & self.s;
                self.a = value;
                self.x = value;
                self.s = value;
                self.p.update_zn(value);
            }
            STA => bus.write(addr, self.a),
            STX => bus.write(addr, self.x),
            STY => bus.write(addr, self.y),
            SAX => bus.write(addr, self.a & self.x),
            SHA => bus.write(addr, self.a & self.x & high_plus_one(addr)),
            SHX => bus.write(addr, self.x & high_plus_one(addr)),
            SHY => bus.write(addr, self.y & high_plus_one(addr)),
            SHS => {
                self.s = self.a & self.x;
                bus.write(addr, self.s & high_plus_one(addr));
            }

            // Transfer
            TAX => {
                self.x = self.a;
                self.p.update_zn(self.x);
            }
            TAY => {
                self.y = self.a;
                self.p.update_zn(self.y);
            }
            TXA => {
                self.a = self.x;
                self.p.update_zn(self.a);
            }
            TYA => {
                self.a = self.y;
                self.p.update_zn(self.a);
            }
            TSX => {
                self.x = self.s;
                self.p.update_zn(self.x);
            }
            TXS => self.s = self.x,

            // Stack
            PHA => self.push(bus, self.a),
            PHP => self.push(bus, self.p.pushed(true)),
            PLA => {
                self.a = self.pull(bus);
                self.p.update_zn(self.a);
            }
            PLP => {
                let value = self.pull(bus);
                self.p = Status::pulled(value);
            }

            // Shifts
            ASL | LSR | ROL | ROR if operand.addr.is_none() => {
                self.a = self.shift(mnemonic, self.a);
            }
            ASL | LSR | ROL | ROR => {
                let value = bus.read(addr);
                let result = self.shift(mnemonic, value);
                bus.write(addr, result);
            }

            // Logic
            AND => {
                self.a &= bus.read(addr);
                self.p.update_zn(self.a);
            }
            ORA => {
                self.a |= bus.read(addr);
                self.p.update_zn(self.a);
            }
            EOR => {
                self.a ^= bus.read(addr);
                self.p.update_zn(self.a);
            }
            BIT => {
                let value = bus.read(addr);
                self.p.set(Status::ZERO, self.a & value == 0);
                self.p.set(Status::OVERFLOW, value & 0x40 != 0);
                self.p.set(Status::NEGATIVE, value & 0x80 != 0);
            }

            // Arithmetic
            ADC => {
                let value = bus.read(addr);
                self.add(value);
            }
            SBC => {
                let value = bus.read(addr);
                self.subtract(value);
            }
            CMP => {
                let value = bus.read(addr);
                self.compare(self.a, value);
            }
            CPX => {
                let value = bus.read(addr);
                self.compare(self.x, value);
            }
            CPY => {
                let value = bus.read(addr);
                self.compare(self.y, value);
            }
            ANC => {
                self.a &= bus.read(addr);
                self.p.update_zn(self.a);
                self.p.set(Status::CARRY, self.a & 0x80 != 0);
            }
            ASR => {
                self.a &= bus.read(addr);
                self.a = self.shift(LSR, self.a);
            }
            ARR => {
                self.a &= bus.read(addr);
                self.a = self.shift(ROR, self.a);
                let bit6 = self.a & 0x40 != 0;
                let bit5 = self.a & 0x20 != 0;
                self.p.set(Status::CARRY, bit6);
                self.p.set(Status::OVERFLOW, bit6 ^ bit5);
            }
            SBX => {
                let value = bus.read(addr);
                let base = self.a & self.x;
                self.p.set(Status::CARRY, base >= value);
                self.x = base.wrapping_sub(value);
                self.p.update_zn(self.x);
            }
            XAA => {
                self.a = (self.a | UNSTABLE_MAGIC) & self.x & bus.read(addr);
                self.p.update_zn(self.a);
            }

            // Increment/decrement
            INC => {
                let value = bus.read(addr).wrapping_add(1);
                bus.write(addr, value);
                self.p.update_zn(value);
            }
            DEC => {
                let value = bus.read(addr).wrapping_sub(1);
                bus.write(addr, value);
                self.p.update_zn(value);
            }
            INX => {
                self.x = self.x.wrapping_add(1);
                self.p.update_zn(self.x);
            }
            INY => {
                self.y = self.y.wrapping_add(1);
                self.p.update_zn(self.y);
            }
            DEX => {
                self.x = self.x.wrapping_sub(1);
                self.p.update_zn(self.x);
            }
            DEY => {
                self.y = self.y.wrapping_sub(1);
                self.p.update_zn(self.y);
            }

            // Read-modify-write + ALU
            SLO => {
                let value = self.shift(ASL, bus.read(addr));
                bus.write(addr, value);
                self.a |= value;
                self.p.update_zn(self.a);
            }
            RLA => {
                let value = self.shift(ROL, bus.read(addr));
                bus.write(addr, value);
                self.a &= value;
                self.p.update_zn(self.a);
            }
            SRE => {
                let value = self.shift(LSR, bus.read(addr));
                bus.write(addr, value);
                self.a ^= value;
                self.p.update_zn(self.a);
            }
            RRA => {
                let value = self.shift(ROR, bus.read(addr));
                bus.write(addr, value);
                self.add(value);
            }
            DCP => {
                let value = bus.read(addr).wrapping_sub(1);
                bus.write(addr, value);
                self.compare(self.a, value);
            }
            ISC => {
                let value = bus.read(addr).wrapping_add(1);
                bus.write(addr, value);
                self.subtract(value);
            }

            // Control
            BRK => {
                // The byte after BRK is padding; the pushed PC skips it.
                let ret = self.pc.wrapping_add(1);
                self.push_word(bus, ret);
                self.push(bus, self.p.pushed(true));
                self.p.insert(Status::INTERRUPT);
                self.pc = bus.read_word(crate::memory::cpu::IRQ_VECTOR);
            }
            JMP => self.pc = addr,
            JSR => {
                let ret = self.pc.wrapping_sub(1);
                self.push_word(bus, ret);
                self.pc = addr;
            }
            RTS => {
                self.pc = self.pull_word(bus).wrapping_add(1);
            }
            RTI => {
                let value = self.pull(bus);
                self.p = Status::pulled(value);
                self.pc = self.pull_word(bus);
            }

            // Branches
            BCC => return self.branch(!self.p.contains(Status::CARRY), addr),
            BCS => return self.branch(self.p.contains(Status::CARRY), addr),
            BNE => return self.branch(!self.p.contains(Status::ZERO), addr),
            BEQ => return self.branch(self.p.contains(Status::ZERO), addr),
            BPL => return self.branch(!self.p.contains(Status::NEGATIVE), addr),
            BMI => return self.branch(self.p.contains(Status::NEGATIVE), addr),
            BVC => return self.branch(!self.p.contains(Status::OVERFLOW), addr),
            BVS => return self.branch(self.p.contains(Status::OVERFLOW), addr),

            // Flags
            CLC => self.p.remove(Status::CARRY),
            SEC => self.p.insert(Status::CARRY),
            CLI => self.p.remove(Status::INTERRUPT),
            SEI => self.p.insert(Status::INTERRUPT),
            CLD => self.p.remove(Status::DECIMAL),
            SED => self.p.insert(Status::DECIMAL),
            CLV => self.p.remove(Status::OVERFLOW),

            NOP => {
                // Multi-byte NOPs still perform their read.
                if let Some(addr) = operand.addr {
                    let _ = bus.read(addr);
                }
            }
            JAM => {
                self.jammed = true;
                // Stay on the JAM byte so a debugger shows where it stopped.
                self.pc = self.pc.wrapping_sub(1);
            }
        }
        false
    }

    fn branch(&mut self, condition: bool, target: u16) -> bool {
        if condition {
            self.pc = target;
        }
        condition
    }

    fn shift(&mut self, kind: Mnemonic, value: u8) -> u8 {
        let carry_in = self.p.carry();
        let (result, carry_out) = match kind {
            Mnemonic::ASL => (value << 1, value & 0x80 != 0),
            Mnemonic::LSR => (value >> 1, value & 0x01 != 0),
            Mnemonic::ROL => ((value << 1) | carry_in, value & 0x80 != 0),
            _ => ((value >> 1) | (carry_in << 7), value & 0x01 != 0),
        };
        self.p.set(Status::CARRY, carry_out);
        self.p.update_zn(result);
        result
    }

    fn compare(&mut self, register: u8, value: u8) {
        let result = register.wrapping_sub(value);
        self.p.set(Status::CARRY, register >= value);
        self.p.update_zn(result);
    }

    /// Binary add with carry. The 2A03 has no BCD adder; decimal mode only
    /// exists behind the `decimal-mode` feature.
    fn add(&mut self, value: u8) {
        #[cfg(feature = "decimal-mode")]
        if self.p.contains(Status::DECIMAL) {
            self.add_decimal(value);
            return;
        }
        self.add_binary(value);
    }

    fn subtract(&mut self, value: u8) {
        #[cfg(feature = "decimal-mode")]
        if self.p.contains(Status::DECIMAL) {
            self.subtract_decimal(value);
            return;
        }
        // A - M - !C == A + !M + C
        self.add_binary(value ^ 0xFF);
    }

    fn add_binary(&mut self, value: u8) {
        let sum = self.a as u16 + value as u16 + self.p.carry() as u16;
        let result = sum as u8;
        self.p.set(Status::CARRY, sum > 0xFF);
        self.p.set(
            Status::OVERFLOW,
            (!(self.a ^ value) & (self.a ^ result) & 0x80) != 0,
        );
        self.a = result;
        self.p.update_zn(result);
    }

    #[cfg(feature = "decimal-mode")]
    fn add_decimal(&mut self, value: u8) {
        let a = self.a;
        let binary = a.wrapping_add(value).wrapping_add(self.p.carry());
        let mut lo = (a & 0x0F) + (value & 0x0F) + self.p.carry();
        let mut hi = (a >> 4) + (value >> 4);
        if lo > 0x09 {
            lo += 0x06;
        }
        if lo > 0x0F {
            hi += 1;
        }
        // N and V come from the high nibble before its decimal adjust.
        let intermediate = hi << 4;
        self.p.set(Status::ZERO, binary == 0);
        self.p.set(Status::NEGATIVE, intermediate & 0x80 != 0);
        self.p.set(
            Status::OVERFLOW,
            ((intermediate ^ a) & !(a ^ value) & 0x80) != 0,
        );
        if hi > 0x09 {
            hi += 0x06;
        }
        self.p.set(Status::CARRY, hi > 0x0F);
        self.a = (hi << 4) | (lo & 0x0F);
    }

    #[cfg(feature = "decimal-mode")]
    fn subtract_decimal(&mut self, value: u8) {
        let a = self.a;
        let borrow = 1 - self.p.carry() as i16;
        // Flags follow the binary result.
        self.add_binary(value ^ 0xFF);
        let mut lo = (a & 0x0F) as i16 - (value & 0x0F) as i16 - borrow;
        let mut hi = (a >> 4) as i16 - (value >> 4) as i16;
        if lo < 0 {
            lo -= 0x06;
            hi -= 1;
        }
        if hi < 0 {
            hi -= 0x06;
        }
        self.a = (((hi << 4) | (lo & 0x0F)) & 0xFF) as u8;
    }
}

/// `H + 1` term of the SHx family: high byte of the target plus one.
fn high_plus_one(addr: u16) -> u8 {
    ((addr >> 8) as u8).wrapping_add(1)
}
