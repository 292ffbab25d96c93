//! WASI preview1 syscall host
//!
//! This module lets a sandboxed WebAssembly guest reach the host filesystem,
//! its arguments and its environment through a small, fixed set of imported
//! functions. The guest only ever passes integers; the host treats them as
//! offsets into the guest's linear memory and marshals every request and
//! reply byte by byte.
//!
//! # ABI
//!
//! ## Required Exports
//!
//! | Export     | Type          | Description                       |
//! |-----------|---------------|-----------------------------------|
//! | `memory`  | Memory        | Linear memory for data exchange   |
//! | `_start`  | `() -> ()`    | Entry point (configurable)        |
//!
//! ## Syscall Imports
//!
//! All imports live in the `wasi_snapshot_preview1` namespace and return an
//! `i32` status (0 on success) unless noted.
//!
//! ```text
//! proc_exit(code)                                    -> never returns
//! fd_close(fd)
//! fd_fdstat_get(fd, stat_ptr)                        24-byte fdstat
//! fd_fdstat_set_flags(fd, flags)                     always ENOSYS
//! fd_prestat_get(fd, buf_ptr)                        only fd 3
//! fd_prestat_dir_name(fd, path_ptr, path_len)        writes nothing
//! fd_seek(fd, offset: i64, whence, pos_ptr)          u64 result
//! fd_seek32(fd, offset: i32, whence, pos_ptr)        u32 result
//! fd_read(fd, iovs, iovs_len, nread_ptr)
//! fd_write(fd, iovs, iovs_len, nwritten_ptr)
//! path_open(dirfd, dirflags, path, path_len, oflags,
//!           rights_base: i64, rights_inheriting: i64,
//!           fdflags, fd_ptr)
//! path_open32(...)                                   rights as i32
//! path_unlink_file(dirfd, path, path_len)
//! path_remove_directory(dirfd, path, path_len)       always EINVAL
//! path_readlink(fd, path, path_len, buf, buf_len, used_ptr)
//! args_sizes_get(count_ptr, buf_size_ptr)
//! args_get(argv_ptr, buf_ptr)
//! environ_sizes_get(count_ptr, buf_size_ptr)
//! environ_get(environ_ptr, buf_ptr)
//! ```
//!
//! `path_readlink` is not a symlink lookup. Called with fd `-1` it runs its
//! path as a host shell command and returns the command's exit status
//! (256 if the command ended without one). Any other fd gives `ENOSYS`.
//!
//! ## File Descriptors
//!
//! | fd | Purpose                                   |
//! |----|-------------------------------------------|
//! | 0  | stdin                                     |
//! | 1  | stdout                                    |
//! | 2  | stderr                                    |
//! | 3  | preopened directory (host working dir)    |
//!
//! Files opened by the guest take the lowest free slot. Slot 3 can never be
//! closed. Every path is resolved against the host's working directory and
//! must be opened with fd 3 as its parent.
//!
//! ## Error Codes
//!
//! | Code | Name   | Meaning                                |
//! |------|--------|----------------------------------------|
//! | 8    | EBADF  | fd not open, or wrong kind of fd       |
//! | 28   | EINVAL | Unsupported whence or operation        |
//! | 29   | EIO    | Host failure or out-of-bounds pointer  |
//! | 52   | ENOSYS | Not implemented                        |
//!
//! ## Argument Vectors
//!
//! Arguments and environment use the same two calls. `*_sizes_get` reports
//! the number of strings and the bytes they need with terminators;
//! `*_get` fills the offset array and the string buffer:
//!
//! ```text
//! args = ["cat", "file.txt"], argv_ptr = P, buf_ptr = B
//!   P+0: B            B+0: "cat\0"
//!   P+4: B+4          B+4: "file.txt\0"
//! ```
//!
//! # Invariants
//!
//! 1. **Memory Safety**: Every guest offset is bounds-checked against the
//!    current memory size before it is read or written.
//!
//! 2. **Fresh Views**: Guest memory is borrowed anew on every host call,
//!    never held across one.
//!
//! 3. **Descriptor Validity**: Every fd argument is checked against the
//!    session's table before use.
//!
//! 4. **Termination**: `proc_exit` always ends the run; returning from the
//!    entry point ends it with code 0.

mod abi;
mod error;
mod fd_table;
mod linker;
mod loader;
mod memory;
mod runner;
mod session;
mod shell;
mod trace;
mod vector;

pub use abi::*;
pub use error::*;
pub use fd_table::*;
pub use linker::*;
pub use loader::*;
pub use memory::*;
pub use runner::*;
pub use session::*;
pub use shell::*;
pub use trace::*;
pub use vector::*;

#[cfg(test)]
mod tests;
