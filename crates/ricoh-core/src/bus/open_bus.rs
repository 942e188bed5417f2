/// Last value driven on the CPU data bus.
///
/// Reads from write-only registers or unclaimed addresses return this latch.
/// The CPU bus capacitance holds its charge far longer than any program
/// observes, so unlike the PPU latch this one never decays.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct OpenBus {
    value: u8,
}

impl OpenBus {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn latch(&mut self, value: u8) -> u8 {
        self.value = value;
        value
    }

    pub(crate) fn sample(&self) -> u8 {
        self.value
    }
}
