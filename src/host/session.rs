//! Host session
//!
//! Holds all mutable state a guest can reach through its imports: the
//! descriptor table, the argument/environment snapshot and the exit code.
//! Every syscall is a method that receives a fresh [`GuestMemory`] view.

use super::abi::{
    Errno, Fdstat, Iovec, OpenFlags, Prestat, Syscall, SyscallResult, Whence, exports, fd,
};
use super::fd_table::{Descriptor, FdTable, OpenFile};
use super::memory::{GuestMemory, element_addr};
use super::shell;
use super::trace::{SyscallTrace, TRACE_BUFFER_SIZE};
use super::vector::{ArgEnvSnapshot, StringVector};
use std::fs::OpenOptions;
use std::time::Duration;

/// Settings for one guest run
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Exported function to call after instantiation
    pub entry: String,
    /// Arguments the guest sees, program name first
    pub args: Vec<String>,
    /// Environment as `KEY=VALUE` strings
    pub env: Vec<String>,
    /// Whether `path_readlink` may run host commands
    pub shell_enabled: bool,
    /// Ring buffer size when syscall tracing is on
    pub trace_capacity: Option<usize>,
}

impl HostConfig {
    pub fn builder() -> HostConfigBuilder {
        HostConfigBuilder::new()
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        HostConfigBuilder::new().build()
    }
}

/// Builder for configuring a [`HostConfig`]
pub struct HostConfigBuilder {
    entry: String,
    args: Vec<String>,
    env: Vec<String>,
    shell_enabled: bool,
    trace_capacity: Option<usize>,
}

impl HostConfigBuilder {
    pub fn new() -> Self {
        Self {
            entry: exports::START.to_string(),
            args: Vec::new(),
            env: Vec::new(),
            shell_enabled: true,
            trace_capacity: None,
        }
    }

    /// Set the entry point
    pub fn entry(mut self, name: &str) -> Self {
        self.entry = name.to_string();
        self
    }

    /// Append one argument
    pub fn arg(mut self, arg: &str) -> Self {
        self.args.push(arg.to_string());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable
    pub fn env(mut self, name: &str, value: &str) -> Self {
        self.env.push(format!("{}={}", name, value));
        self
    }

    /// Pass the host process environment through
    pub fn inherit_env(mut self) -> Self {
        self.env.extend(
            std::env::vars_os()
                .map(|(k, v)| format!("{}={}", k.to_string_lossy(), v.to_string_lossy())),
        );
        self
    }

    /// Enable or disable the shell escape hatch
    pub fn shell(mut self, enabled: bool) -> Self {
        self.shell_enabled = enabled;
        self
    }

    /// Record syscalls into a ring buffer of `capacity` events
    pub fn trace(mut self, capacity: usize) -> Self {
        self.trace_capacity = Some(capacity);
        self
    }

    /// Record syscalls with the default buffer size
    pub fn trace_default(self) -> Self {
        self.trace(TRACE_BUFFER_SIZE)
    }

    /// Build the config
    pub fn build(self) -> HostConfig {
        HostConfig {
            entry: self.entry,
            args: self.args,
            env: self.env,
            shell_enabled: self.shell_enabled,
            trace_capacity: self.trace_capacity,
        }
    }
}

impl Default for HostConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// State behind every host function of one guest instance
pub struct Session {
    /// File descriptor table
    fd_table: FdTable,

    /// Arguments and environment, fixed at creation
    snapshot: ArgEnvSnapshot,

    /// Whether `path_readlink` may run host commands
    shell_enabled: bool,

    /// Syscall recorder, if tracing
    trace: Option<SyscallTrace>,

    /// Exit code (if exited)
    exit_code: Option<i32>,
}

impl Session {
    pub fn new(config: &HostConfig) -> Self {
        Self {
            fd_table: FdTable::new(),
            snapshot: ArgEnvSnapshot::new(
                StringVector::new(config.args.iter().cloned()),
                StringVector::new(config.env.iter().cloned()),
            ),
            shell_enabled: config.shell_enabled,
            trace: config.trace_capacity.map(SyscallTrace::new),
            exit_code: None,
        }
    }

    pub fn fd_table(&self) -> &FdTable {
        &self.fd_table
    }

    pub fn snapshot(&self) -> &ArgEnvSnapshot {
        &self.snapshot
    }

    /// Check if the guest called `proc_exit`
    pub fn has_exited(&self) -> bool {
        self.exit_code.is_some()
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    pub fn is_tracing(&self) -> bool {
        self.trace.is_some()
    }

    /// Record a completed syscall if tracing is on
    pub fn record(&mut self, syscall: Syscall, args: &[i64], status: i32, elapsed: Duration) {
        if let Some(trace) = self.trace.as_mut() {
            trace.record(syscall, args, status, elapsed);
        }
    }

    pub fn trace(&self) -> Option<&SyscallTrace> {
        self.trace.as_ref()
    }

    pub fn take_trace(&mut self) -> Option<SyscallTrace> {
        self.trace.take()
    }

    // =========================================================================
    // Process
    // =========================================================================

    /// proc_exit(code): remember the code; the caller unwinds the guest
    pub fn proc_exit(&mut self, code: i32) {
        log::info!("guest called proc_exit({})", code);
        self.exit_code = Some(code);
    }

    /// Release every file still open, lowest fd first.
    ///
    /// Failures are logged and skipped.
    pub fn close_all(&mut self) {
        for (fd, descriptor) in self.fd_table.drain_files() {
            if let Err(e) = descriptor.release() {
                log::warn!("failed to close fd {} at teardown: {}", fd, e);
            }
        }
    }

    // =========================================================================
    // Arguments and environment
    // =========================================================================

    pub fn args_sizes_get(
        &self,
        mem: &mut GuestMemory<'_>,
        count_ptr: u32,
        buf_size_ptr: u32,
    ) -> SyscallResult {
        Ok(self.snapshot.args.write_sizes(mem, count_ptr, buf_size_ptr)?)
    }

    pub fn args_get(&self, mem: &mut GuestMemory<'_>, argv_ptr: u32, buf_ptr: u32) -> SyscallResult {
        Ok(self.snapshot.args.fill(mem, argv_ptr, buf_ptr)?)
    }

    pub fn environ_sizes_get(
        &self,
        mem: &mut GuestMemory<'_>,
        count_ptr: u32,
        buf_size_ptr: u32,
    ) -> SyscallResult {
        Ok(self.snapshot.env.write_sizes(mem, count_ptr, buf_size_ptr)?)
    }

    pub fn environ_get(
        &self,
        mem: &mut GuestMemory<'_>,
        environ_ptr: u32,
        buf_ptr: u32,
    ) -> SyscallResult {
        Ok(self.snapshot.env.fill(mem, environ_ptr, buf_ptr)?)
    }

    // =========================================================================
    // Descriptors
    // =========================================================================

    pub fn fd_close(&mut self, fd: u32) -> SyscallResult {
        let descriptor = self.fd_table.remove(fd)?;
        descriptor.release()?;
        Ok(())
    }

    pub fn fd_fdstat_get(&self, mem: &mut GuestMemory<'_>, fd: u32, stat_ptr: u32) -> SyscallResult {
        let filetype = self.fd_table.get(fd)?.filetype();
        mem.write_pod(stat_ptr, &Fdstat::of_type(filetype))?;
        Ok(())
    }

    pub fn fd_fdstat_set_flags(&mut self, _fd: u32, _flags: u32) -> SyscallResult {
        Err(Errno::NoSys)
    }

    pub fn fd_prestat_get(&self, mem: &mut GuestMemory<'_>, fd: u32, buf_ptr: u32) -> SyscallResult {
        if fd != fd::PREOPEN_DIR || !self.fd_table.is_directory(fd) {
            return Err(Errno::BadF);
        }
        mem.write_pod(buf_ptr, &Prestat::dir(0))?;
        Ok(())
    }

    /// The preopened directory has an empty name, so there is nothing to copy
    pub fn fd_prestat_dir_name(&self, _fd: u32, _path_ptr: u32, _path_len: u32) -> SyscallResult {
        Ok(())
    }

    // =========================================================================
    // Paths
    // =========================================================================

    fn check_parent(&self, parent_fd: u32) -> SyscallResult {
        if self.fd_table.is_directory(parent_fd) {
            Ok(())
        } else {
            Err(Errno::BadF)
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn path_open(
        &mut self,
        mem: &mut GuestMemory<'_>,
        parent_fd: u32,
        _dirflags: u32,
        path_ptr: u32,
        path_len: u32,
        oflags: u32,
        _rights_base: u64,
        _rights_inheriting: u64,
        _fdflags: u32,
        fd_ptr: u32,
    ) -> SyscallResult {
        self.check_parent(parent_fd)?;
        let path = mem.read_string(path_ptr, path_len)?;

        // Nothing is opened unless the new fd can be delivered
        if !mem.check_bounds(fd_ptr, 4) {
            return Err(Errno::Io);
        }

        let mut options = OpenOptions::new();
        if OpenFlags(oflags).is_write() {
            options.write(true).create(true).truncate(true);
        } else {
            options.read(true);
        }
        let handle = options.open(&path)?;
        let size = handle.metadata()?.len();

        let fd = self
            .fd_table
            .allocate(Descriptor::File(OpenFile::new(handle, size)))?;
        log::debug!("opened '{}' as fd {} (size {})", path, fd, size);
        mem.write_u32(fd_ptr, fd)?;
        Ok(())
    }

    /// `path_open` with rights legalized to 32 bits
    #[allow(clippy::too_many_arguments)]
    pub fn path_open32(
        &mut self,
        mem: &mut GuestMemory<'_>,
        parent_fd: u32,
        dirflags: u32,
        path_ptr: u32,
        path_len: u32,
        oflags: u32,
        rights_base: u32,
        rights_inheriting: u32,
        fdflags: u32,
        fd_ptr: u32,
    ) -> SyscallResult {
        self.path_open(
            mem,
            parent_fd,
            dirflags,
            path_ptr,
            path_len,
            oflags,
            rights_base as u64,
            rights_inheriting as u64,
            fdflags,
            fd_ptr,
        )
    }

    pub fn path_unlink_file(
        &mut self,
        mem: &mut GuestMemory<'_>,
        parent_fd: u32,
        path_ptr: u32,
        path_len: u32,
    ) -> SyscallResult {
        self.check_parent(parent_fd)?;
        let path = mem.read_string(path_ptr, path_len)?;
        std::fs::remove_file(&path)?;
        log::debug!("unlinked '{}'", path);
        Ok(())
    }

    /// Directories cannot be removed
    pub fn path_remove_directory(
        &mut self,
        _parent_fd: u32,
        _path_ptr: u32,
        _path_len: u32,
    ) -> SyscallResult {
        Err(Errno::Inval)
    }

    /// path_readlink(fd, path, ...): with the shell sentinel fd, run `path` as
    /// a host command and return its exit status
    pub fn path_readlink(
        &mut self,
        mem: &mut GuestMemory<'_>,
        fd: u32,
        path_ptr: u32,
        path_len: u32,
    ) -> Result<i32, Errno> {
        if fd != fd::SHELL || !self.shell_enabled {
            return Err(Errno::NoSys);
        }
        let command = mem.read_string(path_ptr, path_len)?;
        Ok(shell::run_command(&command)?)
    }

    // =========================================================================
    // Cursor and data
    // =========================================================================

    /// Resolve a seek without committing it
    fn seek_target(
        &mut self,
        fd: u32,
        offset: i64,
        whence: u32,
    ) -> Result<(&mut OpenFile, u64), Errno> {
        let file = match self.fd_table.get_mut(fd)? {
            Descriptor::File(file) => file,
            Descriptor::Directory => return Err(Errno::BadF),
            Descriptor::Stdio(_) => return Err(Errno::Inval),
        };
        let position = match Whence::from_raw(whence).ok_or(Errno::Inval)? {
            Whence::Set => offset as u64,
            Whence::Cur => file.position.wrapping_add(offset as u64),
            Whence::End => file.size,
        };
        Ok((file, position))
    }

    pub fn fd_seek(
        &mut self,
        mem: &mut GuestMemory<'_>,
        fd: u32,
        offset: i64,
        whence: u32,
        pos_ptr: u32,
    ) -> SyscallResult {
        let (file, position) = self.seek_target(fd, offset, whence)?;
        mem.write_u64(pos_ptr, position)?;
        file.position = position;
        Ok(())
    }

    /// `fd_seek` with a 32-bit offset and a truncated 32-bit result
    pub fn fd_seek32(
        &mut self,
        mem: &mut GuestMemory<'_>,
        fd: u32,
        offset: i32,
        whence: u32,
        pos_ptr: u32,
    ) -> SyscallResult {
        let (file, position) = self.seek_target(fd, offset as i64, whence)?;
        mem.write_u32(pos_ptr, position as u32)?;
        file.position = position;
        Ok(())
    }

    pub fn fd_read(
        &mut self,
        mem: &mut GuestMemory<'_>,
        fd: u32,
        iovs_ptr: u32,
        iovs_len: u32,
        nread_ptr: u32,
    ) -> SyscallResult {
        let descriptor = self.fd_table.get_mut(fd)?;
        if matches!(descriptor, Descriptor::Directory) {
            return Err(Errno::BadF);
        }

        let mut total: u32 = 0;
        for i in 0..iovs_len {
            let iov: Iovec = mem.read_pod(element_addr(iovs_ptr, i, Iovec::SIZE)?)?;
            let buf = mem.slice_mut(iov.buf, iov.buf_len)?;
            let n = descriptor.read(buf)?;
            total = total.wrapping_add(n as u32);
        }

        mem.write_u32(nread_ptr, total)?;
        Ok(())
    }

    pub fn fd_write(
        &mut self,
        mem: &mut GuestMemory<'_>,
        fd: u32,
        iovs_ptr: u32,
        iovs_len: u32,
        nwritten_ptr: u32,
    ) -> SyscallResult {
        let descriptor = self.fd_table.get_mut(fd)?;

        let mut total: u32 = 0;
        for i in 0..iovs_len {
            let iov: Iovec = mem.read_pod(element_addr(iovs_ptr, i, Iovec::SIZE)?)?;
            let buf = mem.slice(iov.buf, iov.buf_len)?;
            let n = descriptor.write(buf)?;
            total = total.wrapping_add(n as u32);
        }

        mem.write_u32(nwritten_ptr, total)?;
        Ok(())
    }
}
