//! CPU-side bus plumbing.
//!
//! [`AddressMap`] is the wiring table shared by both buses: devices claim
//! address ranges once at construction and mirror rules fold aliases back onto
//! canonical addresses. [`CpuBus`] is the borrowed view the CPU executes
//! against; it dispatches each access to whichever component owns it.

use std::fmt::Debug;

pub mod cpu;
pub(crate) mod map;
#[cfg(test)]
pub(crate) mod mock;
pub(crate) mod open_bus;

pub use cpu::{CpuBus, CpuDevice};
pub use map::{Access, AddressMap, Device};
pub(crate) use open_bus::OpenBus;

/// Memory interface the CPU core executes against.
pub trait Bus: Debug {
    /// Timed read with device side effects (register reads clear flags,
    /// controllers shift, and so on).
    fn read(&mut self, addr: u16) -> u8;

    fn write(&mut self, addr: u16, value: u8);

    /// Read without side effects. Used by tracing and debugger views.
    fn peek(&self, addr: u16) -> u8;

    /// Reads a little-endian word from two consecutive addresses.
    fn read_word(&mut self, addr: u16) -> u16 {
        let lo = self.read(addr) as u16;
        let hi = self.read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }
}
