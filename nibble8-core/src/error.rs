use thiserror::Error;

/// Failure to place a ROM image into the address space.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("ROM is too large ({size} bytes), max size is {max} bytes")]
    RomTooLarge { size: usize, max: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("memory access out of range at address {0:#06X}")]
    OutOfRange(u16),
}

/// Run-time faults. Any of these halts the interpreter for the rest of the
/// session; the caller decides what to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FatalError {
    #[error("unknown opcode {0:#06X}")]
    UnknownOpcode(u16),
    #[error("stack overflow: call depth already at 16")]
    StackOverflow,
    #[error("stack underflow: return with empty call stack")]
    StackUnderflow,
    #[error("invalid program counter {0:#06X}")]
    InvalidProgramCounter(u16),
    #[error("write to protected address {0:#06X}")]
    ProtectedWrite(u16),
    #[error("address {0:#06X} is outside of memory")]
    AddressOutOfRange(u16),
}

impl From<MemoryError> for FatalError {
    fn from(err: MemoryError) -> Self {
        match err {
            MemoryError::OutOfRange(addr) => FatalError::AddressOutOfRange(addr),
        }
    }
}
