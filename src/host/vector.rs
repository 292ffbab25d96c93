//! Argument and environment marshaling
//!
//! Both vectors use the same two-phase protocol: the guest first asks for the
//! count and total byte size, allocates, then asks the host to fill an array
//! of string offsets and a buffer of null-terminated strings.

use super::error::{HostError, HostResult};
use super::memory::{GuestMemory, element_addr};

/// An immutable list of strings exposed to the guest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringVector {
    items: Vec<Vec<u8>>,
}

impl StringVector {
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            items: items.into_iter().map(|s| s.into().into_bytes()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total bytes needed for all strings, null terminators included
    pub fn buf_size(&self) -> usize {
        self.items.iter().map(|item| item.len() + 1).sum()
    }

    /// Answer a `*_sizes_get` call: write the count and the buffer size
    pub fn write_sizes(
        &self,
        mem: &mut GuestMemory<'_>,
        count_ptr: u32,
        buf_size_ptr: u32,
    ) -> HostResult<()> {
        mem.write_u32(count_ptr, self.len() as u32)?;
        mem.write_u32(buf_size_ptr, self.buf_size() as u32)?;
        Ok(())
    }

    /// Answer a `*_get` call: write each string's offset and the strings
    pub fn fill(&self, mem: &mut GuestMemory<'_>, offsets_ptr: u32, buf_ptr: u32) -> HostResult<()> {
        let mut cursor = buf_ptr;

        for (i, item) in self.items.iter().enumerate() {
            mem.write_u32(element_addr(offsets_ptr, i as u32, 4)?, cursor)?;
            mem.write(cursor, item)?;

            let terminator = cursor.checked_add(item.len() as u32).ok_or(
                HostError::MemoryAccessOutOfBounds {
                    address: cursor as u64,
                    size: item.len() as u64 + 1,
                    memory_size: mem.size(),
                },
            )?;
            mem.write_u8(terminator, 0)?;
            cursor = terminator.wrapping_add(1);
        }

        Ok(())
    }
}

/// Arguments and environment captured once at session start
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgEnvSnapshot {
    pub args: StringVector,
    pub env: StringVector,
}

impl ArgEnvSnapshot {
    pub fn new(args: StringVector, env: StringVector) -> Self {
        Self { args, env }
    }
}
