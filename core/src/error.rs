use thiserror::Error;

/// Errors raised while turning a cartridge image into a running engine.
///
/// These are always recoverable: the caller picks another image and the
/// previously loaded session (if any) keeps running.
#[derive(Debug, Error)]
pub enum RomLoadError {
    /// Underlying I/O error (file not found, unreadable archive, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image ends before the header says it should.
    #[error("image truncated: expected at least {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// The first four bytes are not `NES\x1A`.
    #[error("not an iNES image (bad magic)")]
    BadMagic,

    /// The header names a mapper no engine implements.
    #[error("unsupported mapper {0}")]
    UnsupportedMapper(u8),

    /// Header is well-formed but describes something we cannot run.
    #[error("unsupported cartridge format: {0}")]
    UnsupportedFormat(String),
}

/// A fault raised by the engine while advancing a frame.
///
/// Fatal to the engine that raised it: the playback controller drops the
/// engine and returns to the empty state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmulationFault {
    /// The simulated CPU fetched an opcode it cannot execute.
    #[error("invalid instruction 0x{opcode:02X} at 0x{pc:04X}")]
    InvalidInstruction { opcode: u8, pc: u16 },

    /// Internal machine state became inconsistent.
    #[error("engine state corrupted: {0}")]
    Corrupted(String),
}
