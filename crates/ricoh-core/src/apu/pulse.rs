//! Pulse channels with envelope, sweep and length counter.

use super::{envelope::Envelope, length_counter::LengthCounter, tables::PULSE_DUTY_TABLE};

/// The two pulse channels differ only in how sweep negation rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) enum PulseChannel {
    /// Ones' complement negate: subtracts one more.
    Pulse1,
    Pulse2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Sweep {
    channel: PulseChannel,
    enabled: bool,
    negate: bool,
    shift: u8,
    period: u8,
    divider: u8,
    reload: bool,
}

impl Sweep {
    fn new(channel: PulseChannel) -> Self {
        Self {
            channel,
            enabled: false,
            negate: false,
            shift: 0,
            period: 0,
            divider: 0,
            reload: false,
        }
    }

    /// `EPPP NSSS`.
    fn write(&mut self, value: u8) {
        self.enabled = value & 0b1000_0000 != 0;
        self.period = (value >> 4) & 0b111;
        self.negate = value & 0b0000_1000 != 0;
        self.shift = value & 0b111;
        self.reload = true;
    }

    fn target_period(&self, timer_period: u16) -> u16 {
        let delta = timer_period >> self.shift;
        if !self.negate {
            return timer_period + delta;
        }
        match self.channel {
            PulseChannel::Pulse1 => timer_period.saturating_sub(delta + 1),
            PulseChannel::Pulse2 => timer_period.saturating_sub(delta),
        }
    }

    /// The sweep unit silences the channel even while disabled.
    fn mutes(&self, timer_period: u16) -> bool {
        timer_period < 8 || self.target_period(timer_period) > 0x07FF
    }

    /// Half-frame clock.
    fn clock(&mut self, timer_period: &mut u16) {
        if self.divider == 0 && self.enabled && self.shift > 0 && !self.mutes(*timer_period) {
            *timer_period = self.target_period(*timer_period);
        }
        if self.divider == 0 || self.reload {
            self.divider = self.period;
            self.reload = false;
        } else {
            self.divider -= 1;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct Pulse {
    enabled: bool,
    duty: u8,
    duty_pos: u8,
    timer: u16,
    timer_period: u16,
    envelope: Envelope,
    length: LengthCounter,
    sweep: Sweep,
}

impl Pulse {
    pub(super) fn new(channel: PulseChannel) -> Self {
        Self {
            enabled: false,
            duty: 0,
            duty_pos: 0,
            timer: 0,
            timer_period: 0,
            envelope: Envelope::default(),
            length: LengthCounter::default(),
            sweep: Sweep::new(channel),
        }
    }

    /// `$4000/$4004`: `DDLC VVVV`.
    pub(super) fn write_control(&mut self, value: u8) {
        self.duty = value >> 6;
        self.envelope.configure(value);
    }

    /// `$4001/$4005`.
    pub(super) fn write_sweep(&mut self, value: u8) {
        self.sweep.write(value);
    }

    /// `$4002/$4006`.
    pub(super) fn write_timer_low(&mut self, value: u8) {
        self.timer_period = (self.timer_period & 0x0700) | value as u16;
    }

    /// `$4003/$4007`: length index and timer high bits. Restarts the
    /// sequence and the envelope.
    pub(super) fn write_timer_high(&mut self, value: u8) {
        self.timer_period = (self.timer_period & 0x00FF) | (((value & 0b111) as u16) << 8);
        self.length.load(value >> 3, self.enabled);
        self.duty_pos = 0;
        self.envelope.restart();
    }

    pub(super) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.length.clear();
        }
    }

    /// Clocked every other CPU cycle.
    pub(super) fn clock_timer(&mut self) {
        if self.timer == 0 {
            self.timer = self.timer_period;
            self.duty_pos = (self.duty_pos + 1) & 0b111;
        } else {
            self.timer -= 1;
        }
    }

    pub(super) fn clock_quarter(&mut self) {
        self.envelope.clock();
    }

    pub(super) fn clock_half(&mut self) {
        self.length.clock(self.envelope.halts_length());
        self.sweep.clock(&mut self.timer_period);
    }

    pub(super) fn output(&self) -> u8 {
        let high = PULSE_DUTY_TABLE[self.duty as usize][self.duty_pos as usize] != 0;
        if !high || !self.length.active() || self.sweep.mutes(self.timer_period) {
            0
        } else {
            self.envelope.output()
        }
    }

    pub(super) fn length_active(&self) -> bool {
        self.length.active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running(channel: PulseChannel) -> Pulse {
        let mut p = Pulse::new(channel);
        p.set_enabled(true);
        p.write_control(0b1011_1111); // 50% duty, constant volume 15, halt
        p.write_timer_low(0x00);
        p.write_timer_high(0b0000_1001); // period 0x100
        p
    }

    #[test]
    fn negate_differs_between_channels() {
        let mut p1 = running(PulseChannel::Pulse1);
        let mut p2 = running(PulseChannel::Pulse2);
        for p in [&mut p1, &mut p2] {
            p.write_sweep(0b1000_1001); // enabled, period 0, negate, shift 1
            p.clock_half();
        }
        assert_eq!(p1.timer_period, 0x100 - 0x80 - 1);
        assert_eq!(p2.timer_period, 0x100 - 0x80);
    }

    #[test]
    fn low_periods_are_muted() {
        let mut p = running(PulseChannel::Pulse1);
        p.write_timer_high(0);
        p.write_timer_low(7);
        for _ in 0..64 {
            p.clock_timer();
            assert_eq!(p.output(), 0);
        }
    }

    #[test]
    fn duty_sequence_produces_output() {
        let mut p = running(PulseChannel::Pulse2);
        p.write_timer_high(0b0000_1000);
        p.write_timer_low(8);
        let mut seen_high = false;
        for _ in 0..9 * 8 {
            p.clock_timer();
            seen_high |= p.output() == 15;
        }
        assert!(seen_high);
    }
}
