//! Envelope generator shared by the pulse and noise channels.

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct Envelope {
    /// Also the channel's length-counter halt flag.
    loop_flag: bool,
    constant_volume: bool,
    /// Constant volume, or the divider period.
    volume: u8,
    start: bool,
    divider: u8,
    decay_level: u8,
}

impl Envelope {
    /// `--LC VVVV` from the channel's control register.
    pub(super) fn configure(&mut self, value: u8) {
        self.loop_flag = value & 0b0010_0000 != 0;
        self.constant_volume = value & 0b0001_0000 != 0;
        self.volume = value & 0b0000_1111;
    }

    pub(super) fn restart(&mut self) {
        self.start = true;
    }

    /// Quarter-frame clock.
    pub(super) fn clock(&mut self) {
        if self.start {
            self.start = false;
            self.decay_level = 15;
            self.divider = self.volume;
        } else if self.divider == 0 {
            self.divider = self.volume;
            if self.decay_level > 0 {
                self.decay_level -= 1;
            } else if self.loop_flag {
                self.decay_level = 15;
            }
        } else {
            self.divider -= 1;
        }
    }

    pub(super) fn output(&self) -> u8 {
        if self.constant_volume {
            self.volume
        } else {
            self.decay_level
        }
    }

    pub(super) fn halts_length(&self) -> bool {
        self.loop_flag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decays_from_fifteen_and_loops() {
        let mut env = Envelope::default();
        env.configure(0b0010_0000); // loop, period 0
        env.restart();
        env.clock();
        assert_eq!(env.output(), 15);
        for _ in 0..15 {
            env.clock();
        }
        assert_eq!(env.output(), 0);
        env.clock();
        assert_eq!(env.output(), 15);
    }

    #[test]
    fn constant_volume_ignores_decay() {
        let mut env = Envelope::default();
        env.configure(0b0001_0111);
        env.restart();
        env.clock();
        env.clock();
        assert_eq!(env.output(), 7);
    }
}
