//! One-pole IIR stages approximating the NES analog output path: two
//! high-pass stages around 90 Hz and 440 Hz and a low-pass around 14 kHz.

use std::f32::consts::PI;

pub(super) const HIGH_PASS_1_HZ: f32 = 90.0;
pub(super) const HIGH_PASS_2_HZ: f32 = 440.0;
pub(super) const LOW_PASS_HZ: f32 = 14_000.0;

fn pole_coeff(sample_rate: f32, cutoff_hz: f32) -> f32 {
    (-2.0 * PI * cutoff_hz / sample_rate).exp()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct HighPass {
    coeff: f32,
    last_in: f32,
    state: f32,
}

impl HighPass {
    pub(super) fn new(sample_rate: f32, cutoff_hz: f32) -> Self {
        Self {
            coeff: pole_coeff(sample_rate, cutoff_hz),
            last_in: 0.0,
            state: 0.0,
        }
    }

    pub(super) fn process(&mut self, input: f32) -> f32 {
        self.state = self.coeff * (self.state + input - self.last_in);
        self.last_in = input;
        self.state
    }

    pub(super) fn clear(&mut self) {
        self.last_in = 0.0;
        self.state = 0.0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct LowPass {
    alpha: f32,
    state: f32,
}

impl LowPass {
    pub(super) fn new(sample_rate: f32, cutoff_hz: f32) -> Self {
        Self {
            alpha: 1.0 - pole_coeff(sample_rate, cutoff_hz),
            state: 0.0,
        }
    }

    pub(super) fn process(&mut self, input: f32) -> f32 {
        self.state += (input - self.state) * self.alpha;
        self.state
    }

    pub(super) fn clear(&mut self) {
        self.state = 0.0;
    }
}
