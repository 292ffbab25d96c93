//! Guest file descriptor table
//!
//! Maps the small integers a guest uses onto host handles. Slots 0-2 are the
//! standard streams and slot 3 is the fake preopened directory; everything
//! above that (or any freed standard stream slot) is handed out to files on
//! a lowest-free-slot basis.

use super::abi::{fd, filetype};
use super::error::{HostError, HostResult};
use std::fs::File;
use std::io::{self, Read, Write};

/// One of the host process's standard streams
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdStream {
    Stdin,
    Stdout,
    Stderr,
}

/// A file opened by the guest
#[derive(Debug)]
pub struct OpenFile {
    handle: File,
    /// Guest-side cursor, independent of the host handle's own position
    pub position: u64,
    /// Size recorded when the file was opened
    pub size: u64,
}

impl OpenFile {
    pub fn new(handle: File, size: u64) -> Self {
        Self {
            handle,
            position: 0,
            size,
        }
    }

    #[cfg(unix)]
    fn read_at(&self, buf: &mut [u8], pos: u64) -> io::Result<usize> {
        use std::os::unix::fs::FileExt;
        self.handle.read_at(buf, pos)
    }

    #[cfg(windows)]
    fn read_at(&self, buf: &mut [u8], pos: u64) -> io::Result<usize> {
        use std::os::windows::fs::FileExt;
        self.handle.seek_read(buf, pos)
    }

    #[cfg(unix)]
    fn write_at(&self, buf: &[u8], pos: u64) -> io::Result<usize> {
        use std::os::unix::fs::FileExt;
        self.handle.write_at(buf, pos)
    }

    #[cfg(windows)]
    fn write_at(&self, buf: &[u8], pos: u64) -> io::Result<usize> {
        use std::os::windows::fs::FileExt;
        self.handle.seek_write(buf, pos)
    }
}

/// What a descriptor slot holds
#[derive(Debug)]
pub enum Descriptor {
    Stdio(StdStream),
    /// The fake preopened directory; has no host handle
    Directory,
    File(OpenFile),
}

impl Descriptor {
    /// File type tag for `fd_fdstat_get`
    pub fn filetype(&self) -> u8 {
        match self {
            Descriptor::Directory => filetype::DIRECTORY,
            _ => filetype::REGULAR_FILE,
        }
    }

    /// Read into `buf` at the current position, advancing it
    pub fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Descriptor::File(file) => {
                let n = file.read_at(buf, file.position)?;
                file.position = file.position.wrapping_add(n as u64);
                Ok(n)
            }
            Descriptor::Stdio(StdStream::Stdin) => io::stdin().read(buf),
            Descriptor::Stdio(_) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "output stream is not readable",
            )),
            Descriptor::Directory => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "directory has no host handle",
            )),
        }
    }

    /// Write `buf` at the current position, advancing it
    pub fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Descriptor::File(file) => {
                let n = file.write_at(buf, file.position)?;
                file.position = file.position.wrapping_add(n as u64);
                Ok(n)
            }
            Descriptor::Stdio(StdStream::Stdout) => {
                let mut out = io::stdout().lock();
                out.write_all(buf)?;
                out.flush()?;
                Ok(buf.len())
            }
            Descriptor::Stdio(StdStream::Stderr) => {
                io::stderr().write_all(buf)?;
                Ok(buf.len())
            }
            Descriptor::Stdio(StdStream::Stdin) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "input stream is not writable",
            )),
            Descriptor::Directory => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "directory has no host handle",
            )),
        }
    }

    /// Release the underlying host handle
    pub fn release(self) -> io::Result<()> {
        match self {
            Descriptor::File(file) => {
                drop(file.handle);
                Ok(())
            }
            Descriptor::Stdio(StdStream::Stdout) => io::stdout().flush(),
            Descriptor::Stdio(StdStream::Stderr) => io::stderr().flush(),
            Descriptor::Stdio(StdStream::Stdin) | Descriptor::Directory => Ok(()),
        }
    }
}

/// File descriptor table for a guest
pub struct FdTable {
    /// Entries: Some(descriptor) for open, None for free
    entries: Vec<Option<Descriptor>>,
}

impl FdTable {
    /// Maximum number of descriptor slots
    pub const MAX_FDS: usize = 1024;

    /// Create a new fd table with standard streams and the preopened directory
    pub fn new() -> Self {
        let mut entries = Vec::with_capacity(16);
        entries.push(Some(Descriptor::Stdio(StdStream::Stdin)));
        entries.push(Some(Descriptor::Stdio(StdStream::Stdout)));
        entries.push(Some(Descriptor::Stdio(StdStream::Stderr)));
        entries.push(Some(Descriptor::Directory));
        Self { entries }
    }

    /// Check if fd is occupied
    pub fn is_valid(&self, fd: u32) -> bool {
        self.get(fd).is_ok()
    }

    /// Check if fd is the preopened directory
    pub fn is_directory(&self, fd: u32) -> bool {
        matches!(self.get(fd), Ok(Descriptor::Directory))
    }

    pub fn get(&self, fd: u32) -> HostResult<&Descriptor> {
        self.entries
            .get(fd as usize)
            .and_then(|e| e.as_ref())
            .ok_or(HostError::InvalidFd { fd })
    }

    pub fn get_mut(&mut self, fd: u32) -> HostResult<&mut Descriptor> {
        self.entries
            .get_mut(fd as usize)
            .and_then(|e| e.as_mut())
            .ok_or(HostError::InvalidFd { fd })
    }

    /// The fd the next allocation would get
    pub fn next_free(&self) -> HostResult<u32> {
        match self.entries.iter().position(|e| e.is_none()) {
            Some(i) => Ok(i as u32),
            None if self.entries.len() < Self::MAX_FDS => Ok(self.entries.len() as u32),
            None => Err(HostError::TooManyOpenFiles { max: Self::MAX_FDS }),
        }
    }

    /// Place a descriptor in the lowest free slot
    pub fn allocate(&mut self, descriptor: Descriptor) -> HostResult<u32> {
        let fd = self.next_free()?;
        let slot = fd as usize;
        if slot == self.entries.len() {
            self.entries.push(Some(descriptor));
        } else {
            self.entries[slot] = Some(descriptor);
        }
        Ok(fd)
    }

    /// Free a slot, handing back what it held.
    ///
    /// The preopened directory cannot be removed.
    pub fn remove(&mut self, fd: u32) -> HostResult<Descriptor> {
        if fd == fd::PREOPEN_DIR {
            return Err(HostError::InvalidFd { fd });
        }
        self.entries
            .get_mut(fd as usize)
            .and_then(|e| e.take())
            .ok_or(HostError::InvalidFd { fd })
    }

    /// Take every open file out of the table, lowest fd first
    pub fn drain_files(&mut self) -> Vec<(u32, Descriptor)> {
        let mut drained = Vec::new();
        for (i, entry) in self.entries.iter_mut().enumerate() {
            if matches!(entry, Some(Descriptor::File(_))) {
                if let Some(descriptor) = entry.take() {
                    drained.push((i as u32, descriptor));
                }
            }
        }
        drained
    }

    /// Number of occupied slots
    pub fn open_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }
}

impl Default for FdTable {
    fn default() -> Self {
        Self::new()
    }
}
