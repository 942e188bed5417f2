use crate::memory::cpu as cpu_mem;

/// Hardware interrupt sources, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interrupt {
    Reset,
    Nmi,
    Irq,
}

impl Interrupt {
    pub const fn vector(self) -> u16 {
        match self {
            Interrupt::Reset => cpu_mem::RESET_VECTOR,
            Interrupt::Nmi => cpu_mem::NMI_VECTOR,
            Interrupt::Irq => cpu_mem::IRQ_VECTOR,
        }
    }
}

/// Interrupt inputs as seen by the CPU.
///
/// NMI is edge-triggered: only a low-to-high change of the PPU's output
/// latches a request, which stays pending until serviced. IRQ is a level:
/// it is sampled at every instruction boundary and simply ignored while
/// `I` is set.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct InterruptLines {
    nmi_level: bool,
    nmi_pending: bool,
    irq_level: bool,
}

impl InterruptLines {
    /// Feeds the current NMI output level. Returns `true` when this call
    /// latched a new request.
    pub(crate) fn set_nmi_level(&mut self, level: bool) -> bool {
        let rising = level && !self.nmi_level;
        self.nmi_level = level;
        if rising {
            self.nmi_pending = true;
        }
        rising
    }

    pub(crate) fn set_irq_level(&mut self, level: bool) {
        self.irq_level = level;
    }

    pub(crate) fn nmi_pending(&self) -> bool {
        self.nmi_pending
    }

    /// Picks the interrupt to service at this boundary, consuming the NMI
    /// latch if that is the winner. `irq_masked` is the I flag as it was
    /// when the previous instruction polled.
    pub(crate) fn take(&mut self, irq_masked: bool) -> Option<Interrupt> {
        if self.nmi_pending {
            self.nmi_pending = false;
            return Some(Interrupt::Nmi);
        }
        if self.irq_level && !irq_masked {
            return Some(Interrupt::Irq);
        }
        None
    }

    /// Drops the NMI latch and edge history; used on power-on.
    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}
