//! Non-linear DAC approximation.
//!
//! The pulse and the triangle/noise/DMC groups each feed a resistor ladder
//! whose output is `95.52 / (8128 / n + 100)` and
//! `163.67 / (24329 / n + 100)` respectively. Both are tabulated once.

const PULSE_LEVELS: usize = 31;
const TND_LEVELS: usize = 203;

#[derive(Debug, Clone, PartialEq)]
pub(super) struct Mixer {
    pulse: [f32; PULSE_LEVELS],
    tnd: [f32; TND_LEVELS],
}

impl Mixer {
    pub(super) fn new() -> Self {
        let mut pulse = [0.0; PULSE_LEVELS];
        for (n, level) in pulse.iter_mut().enumerate().skip(1) {
            *level = 95.52 / (8128.0 / n as f32 + 100.0);
        }
        let mut tnd = [0.0; TND_LEVELS];
        for (n, level) in tnd.iter_mut().enumerate().skip(1) {
            *level = 163.67 / (24329.0 / n as f32 + 100.0);
        }
        Self { pulse, tnd }
    }

    /// Output in `0.0..1.0` for raw channel levels.
    pub(super) fn mix(&self, pulse1: u8, pulse2: u8, triangle: u8, noise: u8, dmc: u8) -> f32 {
        let pulse = (pulse1 + pulse2) as usize;
        let tnd = 3 * triangle as usize + 2 * noise as usize + dmc as usize;
        self.pulse[pulse] + self.tnd[tnd]
    }
}
