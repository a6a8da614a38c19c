//! HDF5 local heap: the name store of old-style (symbol table) groups.

use crate::codec::{align8, ensure_len, read_uint, to_usize, write_uint};
use crate::error::{FormatError, Result};

const HEAP_SIGNATURE: &[u8; 4] = b"HEAP";

/// Free-list head value meaning "no free blocks" (`H5HL_FREE_NULL`).
const FREE_LIST_NONE: u64 = 1;

/// Parsed local heap header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalHeap {
    /// Size of the data segment in bytes.
    pub data_segment_size: u64,
    /// Offset of the free list head within the data segment.
    pub free_list_head_offset: u64,
    /// File address of the data segment.
    pub data_segment_address: u64,
}

impl LocalHeap {
    /// Parse a local heap header at the given offset in the file data.
    pub fn parse(
        file_data: &[u8],
        offset: usize,
        offset_size: u8,
        length_size: u8,
    ) -> Result<LocalHeap> {
        let ls = length_size as usize;
        ensure_len(file_data, offset, 8 + 2 * ls + offset_size as usize)?;

        if &file_data[offset..offset + 4] != HEAP_SIGNATURE {
            return Err(FormatError::InvalidSignature { structure: "HEAP" });
        }
        let version = file_data[offset + 4];
        if version != 0 {
            return Err(FormatError::InvalidVersion { structure: "HEAP", version });
        }

        let pos = offset + 8;
        Ok(LocalHeap {
            data_segment_size: read_uint(file_data, pos, length_size)?,
            free_list_head_offset: read_uint(file_data, pos + ls, length_size)?,
            data_segment_address: read_uint(file_data, pos + 2 * ls, offset_size)?,
        })
    }

    /// Read a null-terminated string from the data segment at `string_offset`.
    pub fn read_string(&self, file_data: &[u8], string_offset: u64) -> Result<String> {
        if string_offset >= self.data_segment_size {
            return Err(FormatError::InvalidName(string_offset));
        }
        let seg_start = to_usize(self.data_segment_address)?;
        let seg_len = to_usize(self.data_segment_size)?;
        ensure_len(file_data, seg_start, seg_len)?;

        let segment = &file_data[seg_start..seg_start + seg_len];
        let tail = &segment[to_usize(string_offset)?..];
        let end = tail
            .iter()
            .position(|&b| b == 0)
            .ok_or(FormatError::InvalidName(string_offset))?;
        core::str::from_utf8(&tail[..end])
            .map(str::to_owned)
            .map_err(|_| FormatError::InvalidName(string_offset))
    }
}

/// Accumulates link names for a new local heap.
///
/// Offset 0 always holds the empty string, which B-tree key 0 refers to.
#[derive(Debug, Clone)]
pub struct LocalHeapBuilder {
    data: Vec<u8>,
}

impl Default for LocalHeapBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalHeapBuilder {
    pub fn new() -> Self {
        Self { data: vec![0u8; 8] }
    }

    /// Append a name and return its heap offset. Names are null-terminated
    /// and padded to 8-byte boundaries.
    pub fn insert(&mut self, name: &str) -> u64 {
        let offset = self.data.len() as u64;
        self.data.extend_from_slice(name.as_bytes());
        self.data.push(0);
        self.data.resize(align8(self.data.len()), 0);
        offset
    }

    /// Size of the header plus data segment.
    pub fn encoded_size(&self, offset_size: u8, length_size: u8) -> usize {
        Self::header_size(offset_size, length_size) + self.data.len()
    }

    fn header_size(offset_size: u8, length_size: u8) -> usize {
        8 + 2 * length_size as usize + offset_size as usize
    }

    /// Serialize header and data segment; the segment follows the header directly.
    pub fn serialize(&self, heap_address: u64, offset_size: u8, length_size: u8) -> Vec<u8> {
        let header_size = Self::header_size(offset_size, length_size);
        let mut buf = Vec::with_capacity(header_size + self.data.len());
        buf.extend_from_slice(HEAP_SIGNATURE);
        buf.extend_from_slice(&[0u8; 4]); // version 0 + reserved
        write_uint(&mut buf, self.data.len() as u64, length_size);
        write_uint(&mut buf, FREE_LIST_NONE, length_size);
        write_uint(&mut buf, heap_address + header_size as u64, offset_size);
        buf.extend_from_slice(&self.data);
        buf
    }
}
