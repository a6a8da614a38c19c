//! Symbol Table message (0x0011) and Symbol Table Node (SNOD) codecs.

use crate::codec::{ensure_len, read_u16, read_u32, read_uint, write_uint};
use crate::error::{FormatError, Result};

const SNOD_SIGNATURE: &[u8; 4] = b"SNOD";

/// Symbol Table message found in old-style group object headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTableMessage {
    /// Address of the group's v1 B-tree (type 0).
    pub btree_address: u64,
    /// Address of the group's local heap.
    pub local_heap_address: u64,
}

impl SymbolTableMessage {
    /// Parse a Symbol Table message from raw message data bytes.
    pub fn parse(data: &[u8], offset_size: u8) -> Result<SymbolTableMessage> {
        let os = offset_size as usize;
        ensure_len(data, 0, 2 * os)?;
        Ok(SymbolTableMessage {
            btree_address: read_uint(data, 0, offset_size)?,
            local_heap_address: read_uint(data, os, offset_size)?,
        })
    }

    /// Serialize to message bytes.
    pub fn serialize(&self, offset_size: u8) -> Vec<u8> {
        let mut buf = Vec::with_capacity(2 * offset_size as usize);
        write_uint(&mut buf, self.btree_address, offset_size);
        write_uint(&mut buf, self.local_heap_address, offset_size);
        buf
    }
}

/// A single entry in a Symbol Table Node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTableEntry {
    /// Byte offset of the link name in the group's local heap.
    pub link_name_offset: u64,
    /// Address of the child object's header.
    pub object_header_address: u64,
    /// Cache type: 0 = nothing cached, 1 = group (scratch holds B-tree + heap), 2 = soft link.
    pub cache_type: u32,
    /// 16-byte scratch pad.
    pub scratch_pad: [u8; 16],
}

impl SymbolTableEntry {
    /// Encoded size of one entry.
    pub fn encoded_size(offset_size: u8) -> usize {
        2 * offset_size as usize + 4 + 4 + 16
    }

    fn serialize_into(&self, buf: &mut Vec<u8>, offset_size: u8) {
        write_uint(buf, self.link_name_offset, offset_size);
        write_uint(buf, self.object_header_address, offset_size);
        buf.extend_from_slice(&self.cache_type.to_le_bytes());
        buf.extend_from_slice(&[0u8; 4]);
        buf.extend_from_slice(&self.scratch_pad);
    }
}

/// A parsed Symbol Table Node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTableNode {
    /// The used entries, in name order.
    pub entries: Vec<SymbolTableEntry>,
}

impl SymbolTableNode {
    /// Parse a Symbol Table Node at the given offset in the file data.
    pub fn parse(file_data: &[u8], offset: usize, offset_size: u8) -> Result<SymbolTableNode> {
        ensure_len(file_data, offset, 8)?;
        if &file_data[offset..offset + 4] != SNOD_SIGNATURE {
            return Err(FormatError::InvalidSignature { structure: "SNOD" });
        }
        let version = file_data[offset + 4];
        if version != 1 {
            return Err(FormatError::InvalidVersion { structure: "SNOD", version });
        }
        let num_symbols = read_u16(file_data, offset + 6)? as usize;

        let os = offset_size as usize;
        let entry_size = SymbolTableEntry::encoded_size(offset_size);
        ensure_len(file_data, offset + 8, num_symbols * entry_size)?;

        let mut entries = Vec::with_capacity(num_symbols);
        let mut pos = offset + 8;
        for _ in 0..num_symbols {
            let link_name_offset = read_uint(file_data, pos, offset_size)?;
            let object_header_address = read_uint(file_data, pos + os, offset_size)?;
            let cache_type = read_u32(file_data, pos + 2 * os)?;
            let mut scratch_pad = [0u8; 16];
            scratch_pad.copy_from_slice(&file_data[pos + 2 * os + 8..pos + 2 * os + 24]);
            entries.push(SymbolTableEntry {
                link_name_offset,
                object_header_address,
                cache_type,
                scratch_pad,
            });
            pos += entry_size;
        }

        Ok(SymbolTableNode { entries })
    }

    /// Encoded size of a node with room for `2 * leaf_k` entries.
    pub fn encoded_size(leaf_k: u16, offset_size: u8) -> usize {
        8 + 2 * leaf_k as usize * SymbolTableEntry::encoded_size(offset_size)
    }

    /// Serialize the node, zero-padding unused entry slots up to `2 * leaf_k`.
    pub fn serialize(&self, leaf_k: u16, offset_size: u8) -> Result<Vec<u8>> {
        let capacity = 2 * leaf_k as usize;
        if self.entries.len() > capacity {
            return Err(FormatError::TooLarge("symbol table node"));
        }
        let size = Self::encoded_size(leaf_k, offset_size);
        let mut buf = Vec::with_capacity(size);
        buf.extend_from_slice(SNOD_SIGNATURE);
        buf.push(1); // version
        buf.push(0); // reserved
        buf.extend_from_slice(&(self.entries.len() as u16).to_le_bytes());
        for entry in &self.entries {
            entry.serialize_into(&mut buf, offset_size);
        }
        buf.resize(size, 0);
        Ok(buf)
    }
}
