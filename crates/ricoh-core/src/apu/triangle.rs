//! Triangle channel with its linear counter.

use super::{length_counter::LengthCounter, tables::TRIANGLE_SEQUENCE};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct Triangle {
    enabled: bool,
    /// Length halt and linear counter control.
    control: bool,
    linear_reload_value: u8,
    linear_counter: u8,
    linear_reload: bool,
    length: LengthCounter,
    timer: u16,
    timer_period: u16,
    sequence_pos: u8,
}

impl Triangle {
    /// `$4008`: `CRRR RRRR`.
    pub(super) fn write_control(&mut self, value: u8) {
        self.control = value & 0x80 != 0;
        self.linear_reload_value = value & 0x7F;
    }

    /// `$400A`.
    pub(super) fn write_timer_low(&mut self, value: u8) {
        self.timer_period = (self.timer_period & 0x0700) | value as u16;
    }

    /// `$400B`. The waveform position is not reset.
    pub(super) fn write_timer_high(&mut self, value: u8) {
        self.timer_period = (self.timer_period & 0x00FF) | (((value & 0b111) as u16) << 8);
        self.length.load(value >> 3, self.enabled);
        self.linear_reload = true;
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
            if self.length.active() && self.linear_counter > 0 {
                self.sequence_pos = (self.sequence_pos + 1) & 0x1F;
            }
        } else {
            self.timer -= 1;
        }
    }

    pub(super) fn clock_quarter(&mut self) {
        if self.linear_reload {
            self.linear_counter = self.linear_reload_value;
        } else if self.linear_counter > 0 {
            self.linear_counter -= 1;
        }
        if !self.control {
            self.linear_reload = false;
        }
    }

    pub(super) fn clock_half(&mut self) {
        self.length.clock(self.control);
    }

    /// The DAC holds its level while the sequencer is gated, so there is no
    /// mute path here.
    pub(super) fn output(&self) -> u8 {
        TRIANGLE_SEQUENCE[self.sequence_pos as usize]
    }

    pub(super) fn length_active(&self) -> bool {
        self.length.active()
    }
}
