//! Host-rate audio.
//!
//! The APU produces one mixed level per CPU cycle, roughly 1.79 MHz. The
//! [`Resampler`] averages those levels down to the host sample rate, runs
//! them through the console's analog output filters and emits `i16` PCM.

mod filters;
mod resampler;

pub use resampler::Resampler;

/// Peak `i16` amplitude for a full-scale APU output.
pub const OUTPUT_GAIN: f32 = 30_000.0;
