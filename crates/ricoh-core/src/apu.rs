//! Audio Processing Unit (APU).
//!
//! Five sound generators (two pulse, triangle, noise, DMC) behind the
//! `$4000-$4017` register file, a frame sequencer that clocks their
//! envelopes and counters, and the non-linear output mixer. The APU is
//! clocked once per CPU cycle.

mod dmc;
mod envelope;
mod frame_counter;
mod length_counter;
mod mixer;
mod noise;
mod pulse;
mod tables;
mod triangle;

use core::fmt;

use crate::{config::Region, memory::apu::Register};

pub use frame_counter::FrameCounterMode;

use dmc::Dmc;
use frame_counter::{FrameCounter, FrameTick};
use mixer::Mixer;
use noise::Noise;
use pulse::{Pulse, PulseChannel};
use triangle::Triangle;

#[derive(Clone)]
pub struct Apu {
    region: Region,
    frame_counter: FrameCounter,
    cycles: u64,
    pulse: [Pulse; 2],
    triangle: Triangle,
    noise: Noise,
    dmc: Dmc,
    mixer: Mixer,
}

impl fmt::Debug for Apu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Apu")
            .field("region", &self.region)
            .field("frame_counter", &self.frame_counter)
            .field("cycles", &self.cycles)
            .finish()
    }
}

impl Apu {
    pub fn new(region: Region) -> Self {
        let (noise_periods, dmc_rates) = if region.is_pal() {
            (&tables::NOISE_PERIOD_PAL, &tables::DMC_RATE_PAL)
        } else {
            (&tables::NOISE_PERIOD_NTSC, &tables::DMC_RATE_NTSC)
        };
        Self {
            region,
            frame_counter: FrameCounter::new(region),
            cycles: 0,
            pulse: [
                Pulse::new(PulseChannel::Pulse1),
                Pulse::new(PulseChannel::Pulse2),
            ],
            triangle: Triangle::default(),
            noise: Noise::new(noise_periods),
            dmc: Dmc::new(dmc_rates),
            mixer: Mixer::new(),
        }
    }

    /// Power cycle: every channel back to its initial state, four-step mode
    /// with IRQs enabled.
    pub fn power_on(&mut self) {
        *self = Self::new(self.region);
    }

    /// Reset button: channels are silenced as if `$4015` were cleared and the
    /// frame counter replays the last `$4017` write.
    pub fn reset(&mut self) {
        self.write_status(0);
        self.triangle = Triangle::default();
        self.frame_counter.reset();
    }

    /// Register write. `cpu_cycle` sets the `$4017` latency parity.
    pub fn cpu_write(&mut self, addr: u16, value: u8, cpu_cycle: u64) {
        let Some(reg) = Register::from_cpu_addr(addr) else {
            return;
        };
        match reg {
            Register::Pulse1Control => self.pulse[0].write_control(value),
            Register::Pulse1Sweep => self.pulse[0].write_sweep(value),
            Register::Pulse1TimerLow => self.pulse[0].write_timer_low(value),
            Register::Pulse1TimerHigh => self.pulse[0].write_timer_high(value),
            Register::Pulse2Control => self.pulse[1].write_control(value),
            Register::Pulse2Sweep => self.pulse[1].write_sweep(value),
            Register::Pulse2TimerLow => self.pulse[1].write_timer_low(value),
            Register::Pulse2TimerHigh => self.pulse[1].write_timer_high(value),
            Register::TriangleControl => self.triangle.write_control(value),
            Register::TriangleTimerLow => self.triangle.write_timer_low(value),
            Register::TriangleTimerHigh => self.triangle.write_timer_high(value),
            Register::NoiseControl => self.noise.write_control(value),
            Register::NoiseModeAndPeriod => self.noise.write_mode_and_period(value),
            Register::NoiseLength => self.noise.write_length(value),
            Register::DmcControl => self.dmc.write_control(value),
            Register::DmcDirectLoad => self.dmc.write_direct_load(value),
            Register::DmcSampleAddress => self.dmc.write_sample_address(value),
            Register::DmcSampleLength => self.dmc.write_sample_length(value),
            Register::Status => self.write_status(value),
            Register::FrameCounter => self.frame_counter.write(value, cpu_cycle),
        }
    }

    fn write_status(&mut self, value: u8) {
        self.pulse[0].set_enabled(value & 0b0000_0001 != 0);
        self.pulse[1].set_enabled(value & 0b0000_0010 != 0);
        self.triangle.set_enabled(value & 0b0000_0100 != 0);
        self.noise.set_enabled(value & 0b0000_1000 != 0);
        self.dmc.set_enabled(value & 0b0001_0000 != 0);
    }

    /// `$4015` read. Acknowledges the frame interrupt but not the DMC one.
    pub fn read_status(&mut self) -> u8 {
        let value = self.peek_status();
        self.frame_counter.clear_irq();
        value
    }

    /// `$4015` without the read side effect. Bit 5 is open bus and left 0.
    pub fn peek_status(&self) -> u8 {
        u8::from(self.pulse[0].length_active())
            | u8::from(self.pulse[1].length_active()) << 1
            | u8::from(self.triangle.length_active()) << 2
            | u8::from(self.noise.length_active()) << 3
            | u8::from(self.dmc.active()) << 4
            | u8::from(self.frame_counter.irq()) << 6
            | u8::from(self.dmc.irq()) << 7
    }

    /// Level of the APU's IRQ output.
    pub fn irq(&self) -> bool {
        self.frame_counter.irq() || self.dmc.irq()
    }

    pub fn frame_counter_mode(&self) -> FrameCounterMode {
        self.frame_counter.mode()
    }

    /// One CPU cycle. `read` serves DMC sample fetches from CPU space.
    pub fn clock(&mut self, read: &mut impl FnMut(u16) -> u8) {
        let tick = self.frame_counter.clock();
        self.apply_frame_tick(tick);

        // Pulse timers run at half the CPU rate.
        if self.cycles & 1 == 1 {
            for pulse in &mut self.pulse {
                pulse.clock_timer();
            }
        }
        self.triangle.clock_timer();
        self.noise.clock_timer();
        self.dmc.clock(read);
        self.cycles = self.cycles.wrapping_add(1);
    }

    fn apply_frame_tick(&mut self, tick: FrameTick) {
        if tick.quarter {
            for pulse in &mut self.pulse {
                pulse.clock_quarter();
            }
            self.triangle.clock_quarter();
            self.noise.clock_quarter();
        }
        if tick.half {
            for pulse in &mut self.pulse {
                pulse.clock_half();
            }
            self.triangle.clock_half();
            self.noise.clock_half();
        }
    }

    /// Current mixed output in `0.0..1.0`.
    pub fn output(&self) -> f32 {
        self.mixer.mix(
            self.pulse[0].output(),
            self.pulse[1].output(),
            self.triangle.output(),
            self.noise.output(),
            self.dmc.output(),
        )
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycles
    }
}
