//! Frame sequencer: clocks envelopes, linear counter, length counters and
//! sweep units at quarter- and half-frame points, and raises the frame IRQ.

use crate::config::Region;

/// Frame sequencer timing mode, bit 7 of `$4017`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrameCounterMode {
    #[default]
    FourStep,
    FiveStep,
}

/// Units to clock after one sequencer cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct FrameTick {
    pub(super) quarter: bool,
    pub(super) half: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Step {
    cycle: u32,
    quarter: bool,
    half: bool,
    irq: bool,
}

const fn step(cycle: u32, quarter: bool, half: bool, irq: bool) -> Step {
    Step {
        cycle,
        quarter,
        half,
        irq,
    }
}

/// The last entry of each table ends the sequence and restarts it.
const NTSC_FOUR_STEP: [Step; 6] = [
    step(7457, true, false, false),
    step(14913, true, true, false),
    step(22371, true, false, false),
    step(29828, false, false, true),
    step(29829, true, true, true),
    step(29830, false, false, true),
];
const NTSC_FIVE_STEP: [Step; 5] = [
    step(7457, true, false, false),
    step(14913, true, true, false),
    step(22371, true, false, false),
    step(37281, true, true, false),
    step(37282, false, false, false),
];
const PAL_FOUR_STEP: [Step; 6] = [
    step(8313, true, false, false),
    step(16627, true, true, false),
    step(24939, true, false, false),
    step(33252, false, false, true),
    step(33253, true, true, true),
    step(33254, false, false, true),
];
const PAL_FIVE_STEP: [Step; 5] = [
    step(8313, true, false, false),
    step(16627, true, true, false),
    step(24939, true, false, false),
    step(41565, true, true, false),
    step(41566, false, false, false),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct FrameCounter {
    pal: bool,
    mode: FrameCounterMode,
    irq_inhibit: bool,
    irq_flag: bool,
    /// CPU cycles since the sequence started.
    cycle: u32,
    step: usize,
    /// Last value written to `$4017`, re-applied on reset.
    last_write: u8,
    /// Pending `$4017` value and the CPU cycles until it takes effect.
    pending: Option<(u8, u8)>,
}

impl FrameCounter {
    pub(super) fn new(region: Region) -> Self {
        Self {
            pal: region.is_pal(),
            mode: FrameCounterMode::FourStep,
            irq_inhibit: false,
            irq_flag: false,
            cycle: 0,
            step: 0,
            last_write: 0,
            pending: None,
        }
    }

    fn steps(&self) -> &'static [Step] {
        match (self.pal, self.mode) {
            (false, FrameCounterMode::FourStep) => &NTSC_FOUR_STEP,
            (false, FrameCounterMode::FiveStep) => &NTSC_FIVE_STEP,
            (true, FrameCounterMode::FourStep) => &PAL_FOUR_STEP,
            (true, FrameCounterMode::FiveStep) => &PAL_FIVE_STEP,
        }
    }

    pub(super) fn mode(&self) -> FrameCounterMode {
        self.mode
    }

    pub(super) fn irq(&self) -> bool {
        self.irq_flag
    }

    /// Reading `$4015` acknowledges the frame IRQ.
    pub(super) fn clear_irq(&mut self) {
        self.irq_flag = false;
    }

    /// `$4017`: `MI-- ----`. The inhibit bit acts at once; the sequencer
    /// restarts 3 CPU cycles later on an even cycle, 4 on an odd one.
    pub(super) fn write(&mut self, value: u8, cpu_cycle: u64) {
        self.last_write = value;
        self.irq_inhibit = value & 0x40 != 0;
        if self.irq_inhibit {
            self.irq_flag = false;
        }
        let delay = if cpu_cycle & 1 == 0 { 3 } else { 4 };
        self.pending = Some((value, delay));
    }

    /// Warm reset replays the last `$4017` write.
    pub(super) fn reset(&mut self) {
        self.irq_flag = false;
        self.write(self.last_write, 0);
    }

    /// One CPU cycle.
    pub(super) fn clock(&mut self) -> FrameTick {
        let mut tick = FrameTick::default();

        if let Some((value, delay)) = self.pending {
            if delay > 1 {
                self.pending = Some((value, delay - 1));
            } else {
                self.pending = None;
                self.restart(value, &mut tick);
            }
        }

        self.cycle += 1;
        let steps = self.steps();
        let current = steps[self.step];
        if self.cycle == current.cycle {
            tick.quarter |= current.quarter;
            tick.half |= current.half;
            if current.irq && !self.irq_inhibit {
                self.irq_flag = true;
            }
            self.step += 1;
            if self.step == steps.len() {
                self.step = 0;
                self.cycle = 0;
            }
        }
        tick
    }

    fn restart(&mut self, value: u8, tick: &mut FrameTick) {
        self.mode = if value & 0x80 != 0 {
            FrameCounterMode::FiveStep
        } else {
            FrameCounterMode::FourStep
        };
        self.cycle = 0;
        self.step = 0;
        // Five-step mode clocks every unit as it starts.
        if self.mode == FrameCounterMode::FiveStep {
            tick.quarter = true;
            tick.half = true;
        }
    }
}
