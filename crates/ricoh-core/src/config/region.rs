use core::fmt;

use crate::cartridge::header::TvSystem;

/// Timing profile requested by the host.
///
/// `Auto` defers to the cartridge header; [`Region::resolve`] always produces
/// a concrete profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Region {
    #[default]
    Auto,
    Ntsc,
    Pal,
}

impl Region {
    /// A non-`Auto` choice wins; otherwise the header's TV system decides,
    /// with dual-region and unknown images running as NTSC.
    pub fn resolve(self, tv: TvSystem) -> Region {
        match self {
            Region::Auto => match tv {
                TvSystem::Pal => Region::Pal,
                TvSystem::Ntsc | TvSystem::Dual | TvSystem::Unknown => Region::Ntsc,
            },
            other => other,
        }
    }

    pub fn is_pal(self) -> bool {
        self == Region::Pal
    }

    /// Scanlines per frame, pre-render line included.
    pub fn scanlines(self) -> u16 {
        if self.is_pal() { 312 } else { 262 }
    }

    /// CPU clock in Hz.
    pub fn cpu_clock_hz(self) -> f64 {
        if self.is_pal() {
            1_662_607.0
        } else {
            1_789_773.0
        }
    }

    /// PPU dots per CPU cycle, as a fraction `num / den`.
    pub(crate) fn dots_per_cpu_cycle(self) -> (u32, u32) {
        if self.is_pal() { (16, 5) } else { (3, 1) }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Region::Auto => "auto",
            Region::Ntsc => "ntsc",
            Region::Pal => "pal",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_choice_beats_header() {
        assert_eq!(Region::Ntsc.resolve(TvSystem::Pal), Region::Ntsc);
        assert_eq!(Region::Auto.resolve(TvSystem::Pal), Region::Pal);
        assert_eq!(Region::Auto.resolve(TvSystem::Dual), Region::Ntsc);
    }

    #[test]
    fn pal_runs_sixteen_fifths_dots_per_cycle() {
        assert_eq!(Region::Pal.dots_per_cpu_cycle(), (16, 5));
        assert_eq!(Region::Ntsc.dots_per_cpu_cycle(), (3, 1));
        assert_eq!(Region::Pal.scanlines(), 312);
    }
}
