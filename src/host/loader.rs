//! Module loader
//!
//! Reads a guest module from disk and checks it against the host ABI before
//! the interpreter ever sees it.

use super::abi::exports;
use super::error::{HostError, HostResult};
use std::path::Path;

/// WASM magic number: \0asm
const WASM_MAGIC: [u8; 4] = [0x00, 0x61, 0x73, 0x6D];

/// WASM version 1
const WASM_VERSION: [u8; 4] = [0x01, 0x00, 0x00, 0x00];

/// Export section id
const SECTION_EXPORT: u8 = 7;

/// Export kinds
const EXPORT_FUNC: u8 = 0;
const EXPORT_MEMORY: u8 = 2;

/// Validates guest modules against the host ABI
pub struct ModuleValidator;

impl ModuleValidator {
    /// Validate a WASM module binary
    ///
    /// Checks:
    /// - Valid WASM magic number and version
    /// - Section sizes stay inside the binary
    /// - `memory` is exported as a memory and `entry` as a function
    pub fn validate(bytes: &[u8], entry: &str) -> HostResult<()> {
        if bytes.len() < 8 {
            return Err(invalid("module too small"));
        }

        if bytes[0..4] != WASM_MAGIC {
            return Err(invalid("invalid magic number"));
        }

        if bytes[4..8] != WASM_VERSION {
            return Err(invalid("unsupported WASM version"));
        }

        let mut has_memory_export = false;
        let mut has_entry_export = false;

        let mut offset = 8;
        while offset < bytes.len() {
            let section_id = bytes[offset];
            offset += 1;

            let (size, size_bytes) = read_leb128(&bytes[offset..])?;
            offset += size_bytes;

            let section_end = offset
                .checked_add(size as usize)
                .filter(|&end| end <= bytes.len())
                .ok_or_else(|| invalid("section extends past end of module"))?;

            if section_id == SECTION_EXPORT {
                for (name, kind, _index) in parse_export_section(&bytes[offset..section_end])? {
                    if name == exports::MEMORY && kind == EXPORT_MEMORY {
                        has_memory_export = true;
                    }
                    if name == entry && kind == EXPORT_FUNC {
                        has_entry_export = true;
                    }
                }
            }

            offset = section_end;
        }

        if !has_memory_export {
            return Err(HostError::MissingExport {
                name: exports::MEMORY.to_string(),
            });
        }

        if !has_entry_export {
            return Err(HostError::MissingExport {
                name: entry.to_string(),
            });
        }

        Ok(())
    }
}

fn invalid(reason: &str) -> HostError {
    HostError::InvalidModule {
        reason: reason.to_string(),
    }
}

/// Read an unsigned LEB128 value
fn read_leb128(bytes: &[u8]) -> HostResult<(u32, usize)> {
    let mut result = 0u32;
    let mut shift = 0;
    let mut bytes_read = 0;

    for &byte in bytes.iter().take(5) {
        bytes_read += 1;
        result |= ((byte & 0x7F) as u32) << shift;
        if byte & 0x80 == 0 {
            return Ok((result, bytes_read));
        }
        shift += 7;
    }

    Err(invalid("invalid LEB128"))
}

/// Parse export section, returns Vec<(name, kind, index)>
fn parse_export_section(data: &[u8]) -> HostResult<Vec<(String, u8, u32)>> {
    let mut exports = Vec::new();
    if data.is_empty() {
        return Ok(exports);
    }

    let (count, mut offset) = read_leb128(data)?;

    for _ in 0..count {
        let (name_len, len_bytes) = read_leb128(&data[offset..])?;
        offset += len_bytes;

        let name_end = offset + name_len as usize;
        if name_end > data.len() {
            return Err(invalid("export name extends past section"));
        }
        let name = String::from_utf8_lossy(&data[offset..name_end]).into_owned();
        offset = name_end;

        let kind = *data
            .get(offset)
            .ok_or_else(|| invalid("unexpected end of export section"))?;
        offset += 1;

        let (index, index_bytes) = read_leb128(&data[offset..])?;
        offset += index_bytes;

        exports.push((name, kind, index));
    }

    Ok(exports)
}

/// Read a module from disk and validate it
pub fn load_file(path: &Path, entry: &str) -> HostResult<Vec<u8>> {
    let bytes = std::fs::read(path).map_err(|e| HostError::Io {
        message: format!("{}: {}", path.display(), e),
    })?;
    ModuleValidator::validate(&bytes, entry)?;
    log::info!("loaded {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes)
}
