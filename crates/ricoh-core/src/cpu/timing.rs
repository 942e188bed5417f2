/// Base cycle count of an opcode plus which penalty rules apply to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timing {
    /// Always the same count (stores and read-modify-write included).
    Fixed(u8),
    /// +1 when indexing crosses a page.
    PageCross(u8),
    /// +1 when taken, +1 more when the target is on another page.
    Branch(u8),
}

pub(super) const fn f(cycles: u8) -> Timing {
    Timing::Fixed(cycles)
}

pub(super) const fn p(cycles: u8) -> Timing {
    Timing::PageCross(cycles)
}

pub(super) const fn b(cycles: u8) -> Timing {
    Timing::Branch(cycles)
}

impl Timing {
    pub const fn base_cycles(self) -> u8 {
        match self {
            Timing::Fixed(c) | Timing::PageCross(c) | Timing::Branch(c) => c,
        }
    }

    pub const fn total_cycles(self, page_crossed: bool, branch_taken: bool) -> u8 {
        match self {
            Timing::Fixed(c) => c,
            Timing::PageCross(c) => c + page_crossed as u8,
            Timing::Branch(c) if branch_taken => c + 1 + page_crossed as u8,
            Timing::Branch(c) => c,
        }
    }
}

/// Base cycle counts, indexed by opcode. JAM entries are given 2 cycles so a
/// jammed CPU still lets the rest of the console run.
#[rustfmt::skip]
pub(super) const CYCLE_TABLE: [Timing; 256] = [
    f(7), f(6), f(2), f(8), f(3), f(3), f(5), f(5), f(3), f(2), f(2), f(2), f(4), f(4), f(6), f(6),
    b(2), p(5), f(2), f(8), f(4), f(4), f(6), f(6), f(2), p(4), f(2), f(7), p(4), p(4), f(7), f(7),
    f(6), f(6), f(2), f(8), f(3), f(3), f(5), f(5), f(4), f(2), f(2), f(2), f(4), f(4), f(6), f(6),
    b(2), p(5), f(2), f(8), f(4), f(4), f(6), f(6), f(2), p(4), f(2), f(7), p(4), p(4), f(7), f(7),
    f(6), f(6), f(2), f(8), f(3), f(3), f(5), f(5), f(3), f(2), f(2), f(2), f(3), f(4), f(6), f(6),
    b(2), p(5), f(2), f(8), f(4), f(4), f(6), f(6), f(2), p(4), f(2), f(7), p(4), p(4), f(7), f(7),
    f(6), f(6), f(2), f(8), f(3), f(3), f(5), f(5), f(4), f(2), f(2), f(2), f(5), f(4), f(6), f(6),
    b(2), p(5), f(2), f(8), f(4), f(4), f(6), f(6), f(2), p(4), f(2), f(7), p(4), p(4), f(7), f(7),
    f(2), f(6), f(2), f(6), f(3), f(3), f(3), f(3), f(2), f(2), f(2), f(2), f(4), f(4), f(4), f(4),
    b(2), f(6), f(2), f(6), f(4), f(4), f(4), f(4), f(2), f(5), f(2), f(5), f(5), f(5), f(5), f(5),
    f(2), f(6), f(2), f(6), f(3), f(3), f(3), f(3), f(2), f(2), f(2), f(2), f(4), f(4), f(4), f(4),
    b(2), p(5), f(2), p(5), f(4), f(4), f(4), f(4), f(2), p(4), f(2), p(4), p(4), p(4), p(4), p(4),
    f(2), f(6), f(2), f(8), f(3), f(3), f(5), f(5), f(2), f(2), f(2), f(2), f(4), f(4), f(6), f(6),
    b(2), p(5), f(2), f(8), f(4), f(4), f(6), f(6), f(2), p(4), f(2), f(7), p(4), p(4), f(7), f(7),
    f(2), f(6), f(2), f(8), f(3), f(3), f(5), f(5), f(2), f(2), f(2), f(2), f(4), f(4), f(6), f(6),
    b(2), p(5), f(2), f(8), f(4), f(4), f(6), f(6), f(2), p(4), f(2), f(7), p(4), p(4), f(7), f(7),
];
