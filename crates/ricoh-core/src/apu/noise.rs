//! Noise channel: a 15-bit LFSR gated by envelope and length counter.

use super::{envelope::Envelope, length_counter::LengthCounter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct Noise {
    enabled: bool,
    periods: &'static [u16; 16],
    envelope: Envelope,
    length: LengthCounter,
    /// Short mode taps bit 6 instead of bit 1.
    short_mode: bool,
    timer: u16,
    timer_period: u16,
    shift_register: u16,
}

impl Noise {
    pub(super) fn new(periods: &'static [u16; 16]) -> Self {
        Self {
            enabled: false,
            periods,
            envelope: Envelope::default(),
            length: LengthCounter::default(),
            short_mode: false,
            timer: 0,
            timer_period: periods[0] - 1,
            shift_register: 1,
        }
    }

    /// `$400C`: `--LC VVVV`.
    pub(super) fn write_control(&mut self, value: u8) {
        self.envelope.configure(value);
    }

    /// `$400E`: `M--- PPPP`.
    pub(super) fn write_mode_and_period(&mut self, value: u8) {
        self.short_mode = value & 0x80 != 0;
        self.timer_period = self.periods[(value & 0x0F) as usize] - 1;
    }

    /// `$400F`.
    pub(super) fn write_length(&mut self, value: u8) {
        self.length.load(value >> 3, self.enabled);
        self.envelope.restart();
    }

    pub(super) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.length.clear();
        }
    }

    /// Clocked every CPU cycle.
    pub(super) fn clock_timer(&mut self) {
        if self.timer == 0 {
            self.timer = self.timer_period;
            let tap = if self.short_mode { 6 } else { 1 };
            let feedback = (self.shift_register ^ (self.shift_register >> tap)) & 1;
            self.shift_register = (self.shift_register >> 1) | (feedback << 14);
        } else {
            self.timer -= 1;
        }
    }

    pub(super) fn clock_quarter(&mut self) {
        self.envelope.clock();
    }

    pub(super) fn clock_half(&mut self) {
        self.length.clock(self.envelope.halts_length());
    }

    pub(super) fn output(&self) -> u8 {
        if self.shift_register & 1 != 0 || !self.length.active() {
            0
        } else {
            self.envelope.output()
        }
    }

    pub(super) fn length_active(&self) -> bool {
        self.length.active()
    }
}
