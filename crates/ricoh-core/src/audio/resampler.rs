use super::{
    OUTPUT_GAIN,
    filters::{HIGH_PASS_1_HZ, HIGH_PASS_2_HZ, HighPass, LOW_PASS_HZ, LowPass},
};

/// Box-filter decimator from the CPU clock down to the host rate.
///
/// Each host sample is the mean of the APU levels pushed since the previous
/// one. The fractional step keeps the long-run output rate exact.
#[derive(Debug, Clone, PartialEq)]
pub struct Resampler {
    /// CPU cycles per host sample.
    step: f64,
    /// Cycles left until the next host sample.
    remaining: f64,
    sum: f32,
    count: u32,
    high_pass_1: HighPass,
    high_pass_2: HighPass,
    low_pass: LowPass,
    out: Vec<i16>,
}

impl Resampler {
    pub fn new(clock_hz: f64, sample_rate: u32) -> Self {
        let sr = sample_rate.max(1) as f32;
        let step = clock_hz / sample_rate.max(1) as f64;
        Self {
            step,
            remaining: step,
            sum: 0.0,
            count: 0,
            high_pass_1: HighPass::new(sr, HIGH_PASS_1_HZ),
            high_pass_2: HighPass::new(sr, HIGH_PASS_2_HZ),
            low_pass: LowPass::new(sr, LOW_PASS_HZ),
            out: Vec::new(),
        }
    }

    /// Accumulates one CPU cycle's APU level (`0.0..1.0`).
    pub fn push(&mut self, level: f32) {
        self.sum += level;
        self.count += 1;
        self.remaining -= 1.0;
        if self.remaining <= 0.0 {
            self.remaining += self.step;
            let mean = self.sum / self.count as f32;
            self.sum = 0.0;
            self.count = 0;
            let sample = self.filter(mean);
            self.out.push(sample);
        }
    }

    fn filter(&mut self, level: f32) -> i16 {
        let x = self.high_pass_1.process(level);
        let x = self.high_pass_2.process(x);
        let x = self.low_pass.process(x);
        (x * OUTPUT_GAIN).clamp(i16::MIN as f32, i16::MAX as f32) as i16
    }

    /// Samples produced since the last drain.
    pub fn pending(&self) -> &[i16] {
        &self.out
    }

    pub fn clear_pending(&mut self) {
        self.out.clear();
    }

    /// Takes the pending samples, leaving the buffer's allocation in place.
    pub fn drain(&mut self) -> std::vec::Drain<'_, i16> {
        self.out.drain(..)
    }

    /// Drops partial sums, pending output and filter history.
    pub fn reset(&mut self) {
        self.remaining = self.step;
        self.sum = 0.0;
        self.count = 0;
        self.high_pass_1.clear();
        self.high_pass_2.clear();
        self.low_pass.clear();
        self.out.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_second_yields_sample_rate_samples() {
        let mut r = Resampler::new(1_789_773.0, 44_100);
        for _ in 0..1_789_773 {
            r.push(0.0);
        }
        let n = r.pending().len() as i64;
        assert!((n - 44_100).abs() <= 1, "{n}");
    }

    #[test]
    fn silence_stays_silent() {
        let mut r = Resampler::new(1_789_773.0, 48_000);
        for _ in 0..10_000 {
            r.push(0.0);
        }
        assert!(r.drain().all(|s| s == 0));
        assert!(r.pending().is_empty());
    }

    #[test]
    fn square_wave_is_audible() {
        let mut r = Resampler::new(1_789_773.0, 44_100);
        for i in 0..200_000u32 {
            // ~440 Hz square.
            let level = if (i / 2034) % 2 == 0 { 0.3 } else { 0.0 };
            r.push(level);
        }
        let peak = r.pending().iter().map(|s| s.unsigned_abs()).max().unwrap_or(0);
        assert!(peak > 1000, "{peak}");
    }
}
