//! Guest linear memory access
//!
//! A [`GuestMemory`] borrows the guest's memory for the duration of a single
//! host call. The guest can grow its memory between calls, which may move the
//! backing allocation, so a view is never kept across calls.

use super::error::{HostError, HostResult};
use bytemuck::{AnyBitPattern, NoUninit};

/// Bounds-checked view over guest linear memory
pub struct GuestMemory<'a> {
    data: &'a mut [u8],
}

impl<'a> GuestMemory<'a> {
    /// Page size in bytes (64KB)
    pub const PAGE_SIZE: u32 = 65536;

    pub fn new(data: &'a mut [u8]) -> Self {
        Self { data }
    }

    /// Get memory size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Check if an access is within bounds
    pub fn check_bounds(&self, offset: u32, len: u32) -> bool {
        (offset as u64 + len as u64) <= self.data.len() as u64
    }

    fn range(&self, offset: u32, len: u32) -> HostResult<std::ops::Range<usize>> {
        if !self.check_bounds(offset, len) {
            return Err(HostError::MemoryAccessOutOfBounds {
                address: offset as u64,
                size: len as u64,
                memory_size: self.data.len(),
            });
        }
        let start = offset as usize;
        Ok(start..start + len as usize)
    }

    /// Borrow `len` bytes starting at `offset`
    pub fn slice(&self, offset: u32, len: u32) -> HostResult<&[u8]> {
        let range = self.range(offset, len)?;
        Ok(&self.data[range])
    }

    /// Mutably borrow `len` bytes starting at `offset`
    pub fn slice_mut(&mut self, offset: u32, len: u32) -> HostResult<&mut [u8]> {
        let range = self.range(offset, len)?;
        Ok(&mut self.data[range])
    }

    /// Write bytes to memory
    pub fn write(&mut self, offset: u32, bytes: &[u8]) -> HostResult<()> {
        let len = u32::try_from(bytes.len()).map_err(|_| HostError::MemoryAccessOutOfBounds {
            address: offset as u64,
            size: bytes.len() as u64,
            memory_size: self.data.len(),
        })?;
        self.slice_mut(offset, len)?.copy_from_slice(bytes);
        Ok(())
    }

    pub fn write_u8(&mut self, offset: u32, value: u8) -> HostResult<()> {
        self.write(offset, &[value])
    }

    pub fn read_u32(&self, offset: u32) -> HostResult<u32> {
        self.read_pod(offset)
    }

    pub fn write_u32(&mut self, offset: u32, value: u32) -> HostResult<()> {
        self.write(offset, &value.to_le_bytes())
    }

    pub fn write_u64(&mut self, offset: u32, value: u64) -> HostResult<()> {
        self.write(offset, &value.to_le_bytes())
    }

    /// Read a plain-old-data record; guest offsets carry no alignment guarantee
    pub fn read_pod<T: AnyBitPattern>(&self, offset: u32) -> HostResult<T> {
        let bytes = self.slice(offset, std::mem::size_of::<T>() as u32)?;
        Ok(bytemuck::pod_read_unaligned(bytes))
    }

    /// Write a plain-old-data record
    pub fn write_pod<T: NoUninit>(&mut self, offset: u32, value: &T) -> HostResult<()> {
        self.write(offset, bytemuck::bytes_of(value))
    }

    /// Read a string with explicit length (lossy UTF-8)
    pub fn read_string(&self, ptr: u32, len: u32) -> HostResult<String> {
        let bytes = self.slice(ptr, len)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

/// Address of element `index` in a guest array starting at `base`
pub fn element_addr(base: u32, index: u32, elem_size: u32) -> HostResult<u32> {
    index
        .checked_mul(elem_size)
        .and_then(|off| base.checked_add(off))
        .ok_or(HostError::MemoryAccessOutOfBounds {
            address: base as u64 + index as u64 * elem_size as u64,
            size: elem_size as u64,
            memory_size: 0,
        })
}
