//! Host-facing configuration for a [`Core`](crate::Core).

mod region;

pub use region::Region;

pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
pub const DEFAULT_MAX_SINK_FAILURES: u32 = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CoreConfig {
    pub region: Region,
    /// Host audio rate the APU output is resampled to.
    pub sample_rate: u32,
    /// Fail with `UnsupportedOpcode` on SHA/SHS/SHX/SHY and JAM.
    pub strict_opcodes: bool,
    /// Fail with `BreakEncountered` instead of executing BRK.
    pub break_on_brk: bool,
    /// Consecutive failures after which a sink is detached.
    pub max_sink_failures: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            region: Region::Auto,
            sample_rate: DEFAULT_SAMPLE_RATE,
            strict_opcodes: false,
            break_on_brk: false,
            max_sink_failures: DEFAULT_MAX_SINK_FAILURES,
        }
    }
}

impl CoreConfig {
    pub fn with_region(mut self, region: Region) -> Self {
        self.region = region;
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_strict_opcodes(mut self, strict: bool) -> Self {
        self.strict_opcodes = strict;
        self
    }

    pub fn with_break_on_brk(mut self, enabled: bool) -> Self {
        self.break_on_brk = enabled;
        self
    }

    pub fn with_max_sink_failures(mut self, failures: u32) -> Self {
        self.max_sink_failures = failures;
        self
    }
}
