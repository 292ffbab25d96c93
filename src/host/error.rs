//! Error types for the syscall host
//!
//! `HostError` carries the detail for host-side diagnostics. At the syscall
//! boundary it is collapsed into an [`Errno`] the guest can understand.

use super::abi::Errno;
use std::fmt;

/// Result type for host operations
pub type HostResult<T> = Result<T, HostError>;

/// Errors that can occur while loading, linking, or serving a guest module
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// Module binary is malformed or invalid
    InvalidModule { reason: String },

    /// Required export is missing
    MissingExport { name: String },

    /// Guest memory access out of bounds
    MemoryAccessOutOfBounds {
        address: u64,
        size: u64,
        memory_size: usize,
    },

    /// Guest memory export is not available to the host function
    NoMemory,

    /// Invalid file descriptor
    InvalidFd { fd: u32 },

    /// Maximum open files exceeded
    TooManyOpenFiles { max: usize },

    /// Underlying host I/O failed
    Io { message: String },

    /// Module compilation, linking, or instantiation failed
    Instantiation { reason: String },

    /// Guest trapped for a reason other than `proc_exit`
    Trap { reason: String },
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidModule { reason } => {
                write!(f, "invalid WASM module: {}", reason)
            }
            Self::MissingExport { name } => {
                write!(f, "missing required export: '{}'", name)
            }
            Self::MemoryAccessOutOfBounds {
                address,
                size,
                memory_size,
            } => {
                write!(
                    f,
                    "memory access out of bounds: address {} + size {} > memory size {}",
                    address, size, memory_size
                )
            }
            Self::NoMemory => write!(f, "guest does not export a linear memory"),
            Self::InvalidFd { fd } => {
                write!(f, "invalid file descriptor: {}", fd)
            }
            Self::TooManyOpenFiles { max } => {
                write!(f, "too many open files (max {})", max)
            }
            Self::Io { message } => {
                write!(f, "I/O error: {}", message)
            }
            Self::Instantiation { reason } => {
                write!(f, "module instantiation failed: {}", reason)
            }
            Self::Trap { reason } => {
                write!(f, "guest trapped: {}", reason)
            }
        }
    }
}

impl std::error::Error for HostError {}

impl From<std::io::Error> for HostError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

impl From<HostError> for Errno {
    fn from(err: HostError) -> Self {
        log::debug!("syscall failed: {}", err);
        match err {
            HostError::InvalidFd { .. } => Errno::BadF,
            _ => Errno::Io,
        }
    }
}

impl From<std::io::Error> for Errno {
    fn from(err: std::io::Error) -> Self {
        HostError::from(err).into()
    }
}

/// Outcome of running a guest to completion
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Exit code (0 = success)
    pub exit_code: i32,
    /// Whether the guest ended through `proc_exit` rather than returning
    pub exited: bool,
}

impl RunOutcome {
    /// Guest returned from its entry point
    pub fn returned() -> Self {
        Self {
            exit_code: 0,
            exited: false,
        }
    }

    /// Guest called `proc_exit(code)`
    pub fn exited(code: i32) -> Self {
        Self {
            exit_code: code,
            exited: true,
        }
    }

    /// Check if the guest succeeded
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}
