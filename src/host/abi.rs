//! WASI preview1 ABI types and constants
//!
//! This module defines the stable interface between the host and guest modules:
//! names, error codes, and the binary layout of every record that crosses the
//! boundary.

use bytemuck::{Pod, Zeroable};
use serde::Serialize;

/// Required export names
pub mod exports {
    /// The linear memory export name
    pub const MEMORY: &str = "memory";
    /// The default entry point
    pub const START: &str = "_start";
}

/// Import module namespace
pub const IMPORT_NAMESPACE: &str = "wasi_snapshot_preview1";

/// Standard file descriptors
pub mod fd {
    pub const STDIN: u32 = 0;
    pub const STDOUT: u32 = 1;
    pub const STDERR: u32 = 2;
    /// The fake preopened directory every path is resolved against
    pub const PREOPEN_DIR: u32 = 3;
    /// `path_readlink` with this fd runs its path as a shell command (-1 as i32)
    pub const SHELL: u32 = u32::MAX;
}

/// Status returned by a shell command that ended without an exit code
pub const ABNORMAL_EXIT: i32 = 256;

/// Status code for a successful syscall
pub const ESUCCESS: i32 = 0;

/// Every host function the guest may import.
///
/// The set is fixed: the linker registers each variant once, at link time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Syscall {
    ProcExit,
    FdClose,
    FdFdstatGet,
    PathOpen,
    PathOpen32,
    PathUnlinkFile,
    ArgsSizesGet,
    ArgsGet,
    FdPrestatGet,
    FdPrestatDirName,
    PathRemoveDirectory,
    EnvironSizesGet,
    EnvironGet,
    FdFdstatSetFlags,
    FdSeek,
    FdSeek32,
    FdRead,
    FdWrite,
    PathReadlink,
}

impl Syscall {
    pub const ALL: [Syscall; 19] = [
        Syscall::ProcExit,
        Syscall::FdClose,
        Syscall::FdFdstatGet,
        Syscall::PathOpen,
        Syscall::PathOpen32,
        Syscall::PathUnlinkFile,
        Syscall::ArgsSizesGet,
        Syscall::ArgsGet,
        Syscall::FdPrestatGet,
        Syscall::FdPrestatDirName,
        Syscall::PathRemoveDirectory,
        Syscall::EnvironSizesGet,
        Syscall::EnvironGet,
        Syscall::FdFdstatSetFlags,
        Syscall::FdSeek,
        Syscall::FdSeek32,
        Syscall::FdRead,
        Syscall::FdWrite,
        Syscall::PathReadlink,
    ];

    /// Import name inside [`IMPORT_NAMESPACE`]
    pub fn name(self) -> &'static str {
        match self {
            Syscall::ProcExit => "proc_exit",
            Syscall::FdClose => "fd_close",
            Syscall::FdFdstatGet => "fd_fdstat_get",
            Syscall::PathOpen => "path_open",
            Syscall::PathOpen32 => "path_open32",
            Syscall::PathUnlinkFile => "path_unlink_file",
            Syscall::ArgsSizesGet => "args_sizes_get",
            Syscall::ArgsGet => "args_get",
            Syscall::FdPrestatGet => "fd_prestat_get",
            Syscall::FdPrestatDirName => "fd_prestat_dir_name",
            Syscall::PathRemoveDirectory => "path_remove_directory",
            Syscall::EnvironSizesGet => "environ_sizes_get",
            Syscall::EnvironGet => "environ_get",
            Syscall::FdFdstatSetFlags => "fd_fdstat_set_flags",
            Syscall::FdSeek => "fd_seek",
            Syscall::FdSeek32 => "fd_seek32",
            Syscall::FdRead => "fd_read",
            Syscall::FdWrite => "fd_write",
            Syscall::PathReadlink => "path_readlink",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }
}

impl std::fmt::Display for Syscall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Error codes returned by syscalls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Errno {
    /// Bad file descriptor
    BadF = 8,
    /// Invalid argument or unsupported operation
    Inval = 28,
    /// Host I/O failure
    Io = 29,
    /// Function not implemented
    NoSys = 52,
}

impl Errno {
    pub fn code(&self) -> i32 {
        *self as i32
    }
}

impl std::fmt::Display for Errno {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Errno::BadF => "EBADF",
            Errno::Inval => "EINVAL",
            Errno::Io => "EIO",
            Errno::NoSys => "ENOSYS",
        };
        write!(f, "{} ({})", name, self.code())
    }
}

/// Result of a syscall that only reports success or an errno
pub type SyscallResult = Result<(), Errno>;

/// Conversion of a syscall outcome into the number handed back to the guest
pub trait IntoStatus {
    fn into_status(self) -> i32;
}

impl IntoStatus for Result<(), Errno> {
    fn into_status(self) -> i32 {
        match self {
            Ok(()) => ESUCCESS,
            Err(e) => e.code(),
        }
    }
}

impl IntoStatus for Result<i32, Errno> {
    fn into_status(self) -> i32 {
        match self {
            Ok(status) => status,
            Err(e) => e.code(),
        }
    }
}

/// File type tags reported by `fd_fdstat_get`
pub mod filetype {
    pub const DIRECTORY: u8 = 3;
    pub const REGULAR_FILE: u8 = 4;
}

/// Preopen tag for a directory (the only kind there is)
pub const PREOPEN_TYPE_DIR: u8 = 0;

/// Whence values for `fd_seek`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    Set,
    Cur,
    End,
}

impl Whence {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Whence::Set),
            1 => Some(Whence::Cur),
            2 => Some(Whence::End),
            _ => None,
        }
    }
}

/// Open flags for `path_open`. Only bit 0 is honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenFlags(pub u32);

impl OpenFlags {
    pub const READ: OpenFlags = OpenFlags(0);
    pub const WRITE: OpenFlags = OpenFlags(1);

    pub fn is_write(&self) -> bool {
        (self.0 & 1) != 0
    }
}

/// Scatter/gather buffer descriptor (8 bytes)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct Iovec {
    /// Guest offset of the buffer
    pub buf: u32,
    /// Length of the buffer in bytes
    pub buf_len: u32,
}

impl Iovec {
    pub const SIZE: u32 = 8;
}

/// `fd_fdstat_get` record (24 bytes)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct Fdstat {
    pub filetype: u8,
    _pad0: u8,
    pub flags: u16,
    _pad1: u32,
    pub rights_base: u64,
    pub rights_inheriting: u64,
}

impl Fdstat {
    pub const SIZE: u32 = 24;

    /// A record with every field zeroed except the file type
    pub fn of_type(filetype: u8) -> Self {
        Self {
            filetype,
            ..Self::default()
        }
    }
}

/// `fd_prestat_get` record (8 bytes)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct Prestat {
    pub tag: u8,
    _pad: [u8; 3],
    pub name_len: u32,
}

impl Prestat {
    pub const SIZE: u32 = 8;

    pub fn dir(name_len: u32) -> Self {
        Self {
            tag: PREOPEN_TYPE_DIR,
            _pad: [0; 3],
            name_len,
        }
    }
}
