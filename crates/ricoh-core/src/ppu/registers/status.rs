use bitflags::bitflags;

bitflags! {
    /// `$2002` PPUSTATUS. The low five bits read back as open bus.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub(crate) struct Status: u8 {
        const SPRITE_OVERFLOW = 0b0010_0000;
        const SPRITE_ZERO_HIT = 0b0100_0000;
        /// Cleared by reading `$2002` and at the start of the pre-render line.
        const VERTICAL_BLANK = 0b1000_0000;
    }
}
