use std::io;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the execution core.
#[derive(Debug, Error)]
pub enum Error {
    /// The cartridge image could not be turned into a working board.
    #[error("invalid cartridge: {0}")]
    InvalidCartridge(#[from] CartridgeError),
    /// Strict mode hit an opcode whose bus behaviour is not modelled.
    #[error("unsupported opcode ${opcode:02X} at ${pc:04X}")]
    UnsupportedOpcode { opcode: u8, pc: u16 },
    /// Debug runs stop on BRK instead of taking the IRQ vector.
    #[error("BRK encountered at ${pc:04X}")]
    BreakEncountered { pc: u16 },
    /// Two devices claimed the same address, or the mirror table loops.
    #[error("bad bus registration: {0}")]
    BadRegistration(#[from] RegistrationError),
    /// A host sink failed. The core keeps running; this only reaches the
    /// error hook.
    #[error(transparent)]
    HostBackend(#[from] HostBackendError),
}

/// Reasons a cartridge image is rejected.
#[derive(Debug, Error)]
pub enum CartridgeError {
    /// Fewer bytes than the 16-byte header.
    #[error("ROM image too short: {actual} bytes")]
    TooShort { actual: usize },
    /// Header does not start with `NES<EOF>`.
    #[error("missing NES<EOF> magic")]
    InvalidMagic,
    /// The header promises more data than the file holds.
    #[error("{section} section truncated: expected {expected} bytes, found {actual}")]
    SectionTooShort {
        section: &'static str,
        expected: usize,
        actual: usize,
    },
    /// The header declares no PRG ROM at all.
    #[error("image declares no PRG ROM")]
    MissingPrgRom,
    #[error("unsupported mapper {0}")]
    UnsupportedMapper(u16),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Bus wiring mistakes detected while building an address map.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("${addr:04X} already claimed by {owner}")]
    AlreadyClaimed { addr: u16, owner: &'static str },
    #[error("mirror chain through ${addr:04X} never terminates")]
    MirrorCycle { addr: u16 },
    #[error("${addr:04X} lies outside the bus")]
    OutOfRange { addr: u32 },
}

/// Failure reported by a host-side sink (video, audio, recorder).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{backend} backend failed: {message}")]
pub struct HostBackendError {
    pub backend: &'static str,
    pub message: String,
}

impl HostBackendError {
    pub fn new(backend: &'static str, message: impl Into<String>) -> Self {
        Self {
            backend,
            message: message.into(),
        }
    }
}
