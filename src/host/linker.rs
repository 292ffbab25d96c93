//! Syscall surface
//!
//! Registers every [`Syscall`] with the interpreter's linker under
//! [`IMPORT_NAMESPACE`]. Each host function:
//!
//! 1. obtains a fresh view of the caller's exported memory,
//! 2. reinterprets its integer arguments as unsigned offsets,
//! 3. runs the matching [`Session`] method,
//! 4. collapses the outcome into the status handed back to the guest.

use super::abi::{Errno, IMPORT_NAMESPACE, IntoStatus, Syscall, exports};
use super::error::{HostError, HostResult};
use super::memory::GuestMemory;
use super::session::Session;
use std::time::Instant;
use wasmi::core::Trap;
use wasmi::{Caller, Extern, Func, Linker, Store};

/// Run a syscall that needs guest memory
fn with_memory<R: IntoStatus>(
    caller: &mut Caller<'_, Session>,
    syscall: Syscall,
    args: &[i64],
    f: impl FnOnce(&mut Session, &mut GuestMemory<'_>) -> R,
) -> i32 {
    let start = Instant::now();
    let status = match caller
        .get_export(exports::MEMORY)
        .and_then(Extern::into_memory)
    {
        Some(memory) => {
            // Re-borrowed on every call: memory.grow may have moved it
            let (data, session) = memory.data_and_store_mut(&mut *caller);
            let mut mem = GuestMemory::new(data);
            f(session, &mut mem).into_status()
        }
        None => Errno::from(HostError::NoMemory).code(),
    };
    finish(caller, syscall, args, status, start)
}

/// Run a syscall that only touches host state
fn without_memory<R: IntoStatus>(
    caller: &mut Caller<'_, Session>,
    syscall: Syscall,
    args: &[i64],
    f: impl FnOnce(&mut Session) -> R,
) -> i32 {
    let start = Instant::now();
    let status = f(caller.data_mut()).into_status();
    finish(caller, syscall, args, status, start)
}

fn finish(
    caller: &mut Caller<'_, Session>,
    syscall: Syscall,
    args: &[i64],
    status: i32,
    start: Instant,
) -> i32 {
    log::trace!("{}{:?} -> {}", syscall, args, status);
    caller
        .data_mut()
        .record(syscall, args, status, start.elapsed());
    status
}

/// Build the host function backing `syscall`
fn host_func(store: &mut Store<Session>, syscall: Syscall) -> Func {
    match syscall {
        Syscall::ProcExit => Func::wrap(
            store,
            |mut caller: Caller<'_, Session>, code: i32| -> Result<(), Trap> {
                let start = Instant::now();
                caller.data_mut().proc_exit(code);
                finish(&mut caller, Syscall::ProcExit, &[code as i64], code, start);
                Err(Trap::i32_exit(code))
            },
        ),
        Syscall::FdClose => Func::wrap(store, |mut caller: Caller<'_, Session>, fd: i32| -> i32 {
            without_memory(&mut caller, Syscall::FdClose, &[fd as i64], |s| {
                s.fd_close(fd as u32)
            })
        }),
        Syscall::FdFdstatGet => Func::wrap(
            store,
            |mut caller: Caller<'_, Session>, fd: i32, stat: i32| -> i32 {
                let args = [fd as i64, stat as i64];
                with_memory(&mut caller, Syscall::FdFdstatGet, &args, |s, mem| {
                    s.fd_fdstat_get(mem, fd as u32, stat as u32)
                })
            },
        ),
        Syscall::PathOpen => Func::wrap(
            store,
            |mut caller: Caller<'_, Session>,
             parent_fd: i32,
             dirflags: i32,
             path: i32,
             path_len: i32,
             oflags: i32,
             rights_base: i64,
             rights_inheriting: i64,
             fdflags: i32,
             out_fd: i32|
             -> i32 {
                let args = [
                    parent_fd as i64,
                    dirflags as i64,
                    path as i64,
                    path_len as i64,
                    oflags as i64,
                    rights_base,
                    rights_inheriting,
                    fdflags as i64,
                    out_fd as i64,
                ];
                with_memory(&mut caller, Syscall::PathOpen, &args, |s, mem| {
                    s.path_open(
                        mem,
                        parent_fd as u32,
                        dirflags as u32,
                        path as u32,
                        path_len as u32,
                        oflags as u32,
                        rights_base as u64,
                        rights_inheriting as u64,
                        fdflags as u32,
                        out_fd as u32,
                    )
                })
            },
        ),
        Syscall::PathOpen32 => Func::wrap(
            store,
            |mut caller: Caller<'_, Session>,
             parent_fd: i32,
             dirflags: i32,
             path: i32,
             path_len: i32,
             oflags: i32,
             rights_base: i32,
             rights_inheriting: i32,
             fdflags: i32,
             out_fd: i32|
             -> i32 {
                let args = [
                    parent_fd as i64,
                    dirflags as i64,
                    path as i64,
                    path_len as i64,
                    oflags as i64,
                    rights_base as i64,
                    rights_inheriting as i64,
                    fdflags as i64,
                    out_fd as i64,
                ];
                with_memory(&mut caller, Syscall::PathOpen32, &args, |s, mem| {
                    s.path_open32(
                        mem,
                        parent_fd as u32,
                        dirflags as u32,
                        path as u32,
                        path_len as u32,
                        oflags as u32,
                        rights_base as u32,
                        rights_inheriting as u32,
                        fdflags as u32,
                        out_fd as u32,
                    )
                })
            },
        ),
        Syscall::PathUnlinkFile => Func::wrap(
            store,
            |mut caller: Caller<'_, Session>, parent_fd: i32, path: i32, path_len: i32| -> i32 {
                let args = [parent_fd as i64, path as i64, path_len as i64];
                with_memory(&mut caller, Syscall::PathUnlinkFile, &args, |s, mem| {
                    s.path_unlink_file(mem, parent_fd as u32, path as u32, path_len as u32)
                })
            },
        ),
        Syscall::ArgsSizesGet => Func::wrap(
            store,
            |mut caller: Caller<'_, Session>, count: i32, buf_size: i32| -> i32 {
                let args = [count as i64, buf_size as i64];
                with_memory(&mut caller, Syscall::ArgsSizesGet, &args, |s, mem| {
                    s.args_sizes_get(mem, count as u32, buf_size as u32)
                })
            },
        ),
        Syscall::ArgsGet => Func::wrap(
            store,
            |mut caller: Caller<'_, Session>, argv: i32, buf: i32| -> i32 {
                let args = [argv as i64, buf as i64];
                with_memory(&mut caller, Syscall::ArgsGet, &args, |s, mem| {
                    s.args_get(mem, argv as u32, buf as u32)
                })
            },
        ),
        Syscall::FdPrestatGet => Func::wrap(
            store,
            |mut caller: Caller<'_, Session>, fd: i32, buf: i32| -> i32 {
                let args = [fd as i64, buf as i64];
                with_memory(&mut caller, Syscall::FdPrestatGet, &args, |s, mem| {
                    s.fd_prestat_get(mem, fd as u32, buf as u32)
                })
            },
        ),
        Syscall::FdPrestatDirName => Func::wrap(
            store,
            |mut caller: Caller<'_, Session>, fd: i32, path: i32, path_len: i32| -> i32 {
                let args = [fd as i64, path as i64, path_len as i64];
                without_memory(&mut caller, Syscall::FdPrestatDirName, &args, |s| {
                    s.fd_prestat_dir_name(fd as u32, path as u32, path_len as u32)
                })
            },
        ),
        Syscall::PathRemoveDirectory => Func::wrap(
            store,
            |mut caller: Caller<'_, Session>, parent_fd: i32, path: i32, path_len: i32| -> i32 {
                let args = [parent_fd as i64, path as i64, path_len as i64];
                without_memory(&mut caller, Syscall::PathRemoveDirectory, &args, |s| {
                    s.path_remove_directory(parent_fd as u32, path as u32, path_len as u32)
                })
            },
        ),
        Syscall::EnvironSizesGet => Func::wrap(
            store,
            |mut caller: Caller<'_, Session>, count: i32, buf_size: i32| -> i32 {
                let args = [count as i64, buf_size as i64];
                with_memory(&mut caller, Syscall::EnvironSizesGet, &args, |s, mem| {
                    s.environ_sizes_get(mem, count as u32, buf_size as u32)
                })
            },
        ),
        Syscall::EnvironGet => Func::wrap(
            store,
            |mut caller: Caller<'_, Session>, environ: i32, buf: i32| -> i32 {
                let args = [environ as i64, buf as i64];
                with_memory(&mut caller, Syscall::EnvironGet, &args, |s, mem| {
                    s.environ_get(mem, environ as u32, buf as u32)
                })
            },
        ),
        Syscall::FdFdstatSetFlags => Func::wrap(
            store,
            |mut caller: Caller<'_, Session>, fd: i32, flags: i32| -> i32 {
                let args = [fd as i64, flags as i64];
                without_memory(&mut caller, Syscall::FdFdstatSetFlags, &args, |s| {
                    s.fd_fdstat_set_flags(fd as u32, flags as u32)
                })
            },
        ),
        Syscall::FdSeek => Func::wrap(
            store,
            |mut caller: Caller<'_, Session>, fd: i32, offset: i64, whence: i32, pos: i32| -> i32 {
                let args = [fd as i64, offset, whence as i64, pos as i64];
                with_memory(&mut caller, Syscall::FdSeek, &args, |s, mem| {
                    s.fd_seek(mem, fd as u32, offset, whence as u32, pos as u32)
                })
            },
        ),
        Syscall::FdSeek32 => Func::wrap(
            store,
            |mut caller: Caller<'_, Session>, fd: i32, offset: i32, whence: i32, pos: i32| -> i32 {
                let args = [fd as i64, offset as i64, whence as i64, pos as i64];
                with_memory(&mut caller, Syscall::FdSeek32, &args, |s, mem| {
                    s.fd_seek32(mem, fd as u32, offset, whence as u32, pos as u32)
                })
            },
        ),
        Syscall::FdRead => Func::wrap(
            store,
            |mut caller: Caller<'_, Session>, fd: i32, iovs: i32, iovs_len: i32, nread: i32| -> i32 {
                let args = [fd as i64, iovs as i64, iovs_len as i64, nread as i64];
                with_memory(&mut caller, Syscall::FdRead, &args, |s, mem| {
                    s.fd_read(mem, fd as u32, iovs as u32, iovs_len as u32, nread as u32)
                })
            },
        ),
        Syscall::FdWrite => Func::wrap(
            store,
            |mut caller: Caller<'_, Session>,
             fd: i32,
             iovs: i32,
             iovs_len: i32,
             nwritten: i32|
             -> i32 {
                let args = [fd as i64, iovs as i64, iovs_len as i64, nwritten as i64];
                with_memory(&mut caller, Syscall::FdWrite, &args, |s, mem| {
                    s.fd_write(mem, fd as u32, iovs as u32, iovs_len as u32, nwritten as u32)
                })
            },
        ),
        Syscall::PathReadlink => Func::wrap(
            store,
            |mut caller: Caller<'_, Session>,
             fd: i32,
             path: i32,
             path_len: i32,
             buf: i32,
             buf_len: i32,
             used: i32|
             -> i32 {
                let args = [
                    fd as i64,
                    path as i64,
                    path_len as i64,
                    buf as i64,
                    buf_len as i64,
                    used as i64,
                ];
                with_memory(&mut caller, Syscall::PathReadlink, &args, |s, mem| {
                    s.path_readlink(mem, fd as u32, path as u32, path_len as u32)
                })
            },
        ),
    }
}

/// Define every syscall in `linker`
pub fn define_syscalls(linker: &mut Linker<Session>, store: &mut Store<Session>) -> HostResult<()> {
    for syscall in Syscall::ALL {
        let func = host_func(store, syscall);
        linker
            .define(IMPORT_NAMESPACE, syscall.name(), func)
            .map_err(|e| HostError::Instantiation {
                reason: format!("define {}: {}", syscall, e),
            })?;
    }
    log::debug!(
        "registered {} host functions in '{}'",
        Syscall::ALL.len(),
        IMPORT_NAMESPACE
    );
    Ok(())
}
