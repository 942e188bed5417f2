//! Delta modulation channel.
//!
//! Sample bytes are read through a caller-supplied reader over the CPU
//! address space. Fetches do not stall the CPU.

use crate::memory::apu::DMC_SAMPLE_BASE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct Dmc {
    rates: &'static [u16; 16],
    irq_enable: bool,
    irq_flag: bool,
    loop_flag: bool,
    output_level: u8,
    sample_address: u16,
    sample_length: u16,
    current_address: u16,
    bytes_remaining: u16,
    sample_buffer: Option<u8>,
    shift_register: u8,
    bits_remaining: u8,
    silence: bool,
    /// Down-counter in CPU cycles; reloads with `rate - 1`.
    timer: u16,
    timer_period: u16,
}

impl Dmc {
    pub(super) fn new(rates: &'static [u16; 16]) -> Self {
        Self {
            rates,
            irq_enable: false,
            irq_flag: false,
            loop_flag: false,
            output_level: 0,
            sample_address: DMC_SAMPLE_BASE,
            sample_length: 1,
            current_address: DMC_SAMPLE_BASE,
            bytes_remaining: 0,
            sample_buffer: None,
            shift_register: 0,
            bits_remaining: 8,
            silence: true,
            timer: rates[0] - 1,
            timer_period: rates[0] - 1,
        }
    }

    /// `$4010`: `IL-- RRRR`. Clearing the IRQ enable also acknowledges.
    pub(super) fn write_control(&mut self, value: u8) {
        self.irq_enable = value & 0b1000_0000 != 0;
        if !self.irq_enable {
            self.irq_flag = false;
        }
        self.loop_flag = value & 0b0100_0000 != 0;
        self.timer_period = self.rates[(value & 0x0F) as usize] - 1;
    }

    /// `$4011`: direct 7-bit DAC load.
    pub(super) fn write_direct_load(&mut self, value: u8) {
        self.output_level = value & 0x7F;
    }

    /// `$4012`: sample at `$C000 + 64 * A`.
    pub(super) fn write_sample_address(&mut self, value: u8) {
        self.sample_address = DMC_SAMPLE_BASE | ((value as u16) << 6);
    }

    /// `$4013`: `16 * L + 1` bytes.
    pub(super) fn write_sample_length(&mut self, value: u8) {
        self.sample_length = ((value as u16) << 4) + 1;
    }

    /// Bit 4 of `$4015`. Always acknowledges a pending DMC IRQ.
    pub(super) fn set_enabled(&mut self, enabled: bool) {
        self.irq_flag = false;
        if !enabled {
            self.bytes_remaining = 0;
        } else if self.bytes_remaining == 0 {
            self.restart_sample();
        }
    }

    pub(super) fn active(&self) -> bool {
        self.bytes_remaining > 0
    }

    pub(super) fn irq(&self) -> bool {
        self.irq_flag
    }

    pub(super) fn output(&self) -> u8 {
        self.output_level
    }

    /// One CPU cycle. `read` fetches a sample byte from CPU space.
    pub(super) fn clock(&mut self, read: &mut impl FnMut(u16) -> u8) {
        if self.sample_buffer.is_none() && self.bytes_remaining > 0 {
            self.fetch(read);
        }
        if self.timer == 0 {
            self.timer = self.timer_period;
            self.shift_output();
        } else {
            self.timer -= 1;
        }
    }

    fn restart_sample(&mut self) {
        self.current_address = self.sample_address;
        self.bytes_remaining = self.sample_length;
    }

    fn fetch(&mut self, read: &mut impl FnMut(u16) -> u8) {
        self.sample_buffer = Some(read(self.current_address));
        // Address wraps from $FFFF to $8000.
        self.current_address = match self.current_address {
            0xFFFF => 0x8000,
            addr => addr + 1,
        };
        self.bytes_remaining -= 1;
        if self.bytes_remaining == 0 {
            if self.loop_flag {
                self.restart_sample();
            } else if self.irq_enable {
                self.irq_flag = true;
            }
        }
    }

    fn shift_output(&mut self) {
        if !self.silence {
            if self.shift_register & 1 != 0 {
                if self.output_level <= 125 {
                    self.output_level += 2;
                }
            } else if self.output_level >= 2 {
                self.output_level -= 2;
            }
            self.shift_register >>= 1;
        }

        self.bits_remaining -= 1;
        if self.bits_remaining == 0 {
            self.bits_remaining = 8;
            match self.sample_buffer.take() {
                Some(sample) => {
                    self.shift_register = sample;
                    self.silence = false;
                }
                None => self.silence = true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apu::tables::DMC_RATE_NTSC;

    #[test]
    fn one_shot_sample_raises_irq() {
        let mut dmc = Dmc::new(&DMC_RATE_NTSC);
        dmc.write_control(0x8F);
        dmc.write_sample_address(0x00);
        dmc.write_sample_length(0x00); // one byte
        dmc.set_enabled(true);
        assert!(dmc.active());

        let mut fetched = Vec::new();
        let mut read = |addr: u16| {
            fetched.push(addr);
            0xFF
        };
        dmc.clock(&mut read);
        assert_eq!(fetched, [0xC000]);
        assert!(!dmc.active());
        assert!(dmc.irq());

        dmc.set_enabled(false);
        assert!(!dmc.irq());
    }

    #[test]
    fn looping_sample_restarts_without_irq() {
        let mut dmc = Dmc::new(&DMC_RATE_NTSC);
        dmc.write_control(0xC0);
        dmc.write_sample_length(0x00);
        dmc.set_enabled(true);
        dmc.clock(&mut |_| 0);
        assert!(dmc.active());
        assert!(!dmc.irq());
    }

    #[test]
    fn ones_raise_the_output_level() {
        let mut dmc = Dmc::new(&DMC_RATE_NTSC);
        dmc.write_control(0x0F); // 54 cycles per bit
        dmc.write_direct_load(0x40);
        dmc.write_sample_length(0x00);
        dmc.set_enabled(true);
        for _ in 0..54 * 20 {
            dmc.clock(&mut |_| 0xFF);
        }
        assert!(dmc.output() > 0x40);
    }

    #[test]
    fn address_wraps_to_8000() {
        let mut dmc = Dmc::new(&DMC_RATE_NTSC);
        dmc.write_sample_address(0xFF); // $FFC0
        dmc.write_sample_length(0x04); // 65 bytes
        dmc.set_enabled(true);
        let mut last = 0;
        for _ in 0..65 {
            dmc.sample_buffer = None;
            dmc.clock(&mut |addr| {
                last = addr;
                0
            });
        }
        assert_eq!(last, 0x8000);
    }
}
