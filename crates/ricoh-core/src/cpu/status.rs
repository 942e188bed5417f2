use bitflags::bitflags;

bitflags! {
    /// Processor status register (P).
    ///
    /// ```text
    /// 7 6 5 4 3 2 1 0
    /// N V U B D I Z C
    /// ```
    ///
    /// `B` and `U` do not exist as storage in the chip; they only appear in
    /// the byte pushed to the stack. They are kept here so that pushes and
    /// pulls round-trip through a single type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status: u8 {
        /// Carry out of bit 7, or "no borrow" after a subtraction.
        const CARRY     = 0b0000_0001;
        /// Result was zero.
        const ZERO      = 0b0000_0010;
        /// Masks IRQ (not NMI).
        const INTERRUPT = 0b0000_0100;
        /// Latched and pushed, but the 2A03 adder ignores it.
        const DECIMAL   = 0b0000_1000;
        /// Set in the pushed copy by BRK and PHP.
        const BREAK     = 0b0001_0000;
        /// Always reads back as 1.
        const UNUSED    = 0b0010_0000;
        /// Signed overflow.
        const OVERFLOW  = 0b0100_0000;
        /// Bit 7 of the last result.
        const NEGATIVE  = 0b1000_0000;
    }
}

impl Status {
    /// Power-up value: interrupts masked, unused bit set.
    pub const POWER_ON: Status = Status::INTERRUPT.union(Status::UNUSED);

    pub fn update_zero(&mut self, value: u8) {
        self.set(Status::ZERO, value == 0);
    }

    pub fn update_negative(&mut self, value: u8) {
        self.set(Status::NEGATIVE, value & 0x80 != 0);
    }

    pub fn update_zn(&mut self, value: u8) {
        self.update_zero(value);
        self.update_negative(value);
    }

    /// Byte pushed by PHP/BRK (`B` set) or by an NMI/IRQ entry (`B` clear).
    pub fn pushed(self, brk: bool) -> u8 {
        let mut value = self | Status::UNUSED;
        value.set(Status::BREAK, brk);
        value.bits()
    }

    /// Value restored by PLP/RTI: `B` dropped, `U` forced on.
    pub fn pulled(byte: u8) -> Self {
        (Status::from_bits_truncate(byte) - Status::BREAK) | Status::UNUSED
    }

    pub fn carry(self) -> u8 {
        (self & Status::CARRY).bits()
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::POWER_ON
    }
}
