//! HDF5 superblock parsing (versions 0–3) and serialization (versions 0 and 3).

use byteorder::{ByteOrder, LittleEndian};

use crate::checksum::jenkins_lookup3;
use crate::codec::{ensure_len, read_addr, read_uint, validate_sizes, write_addr, write_uint};
use crate::error::{FormatError, Result};
use crate::signature::HDF5_SIGNATURE;
use crate::symbol_table::SymbolTableMessage;

/// Symbol table entry cache type: the scratch pad holds B-tree and heap addresses.
const CACHE_TYPE_STAB: u32 = 1;

/// Parsed HDF5 superblock (all versions).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Superblock {
    /// Superblock version (0–3).
    pub version: u8,
    /// Size of offsets in bytes (2, 4, or 8).
    pub offset_size: u8,
    /// Size of lengths in bytes (2, 4, or 8).
    pub length_size: u8,
    /// File base address.
    pub base_address: u64,
    /// End-of-file address.
    pub eof_address: u64,
    /// Root group object header address.
    pub root_group_address: u64,
    /// Group leaf node K (v0/v1 only).
    pub group_leaf_node_k: Option<u16>,
    /// Group internal node K (v0/v1 only).
    pub group_internal_node_k: Option<u16>,
    /// Cached root symbol table addresses from the root entry scratch pad (v0/v1).
    pub root_symbol_table: Option<SymbolTableMessage>,
    /// File consistency flags.
    pub consistency_flags: u32,
    /// Superblock extension address (v2/v3 only).
    pub superblock_extension_address: Option<u64>,
}

impl Superblock {
    /// Parse a superblock from `data` starting at `signature_offset`.
    pub fn parse(data: &[u8], signature_offset: usize) -> Result<Superblock> {
        ensure_len(data, signature_offset, 9)?;
        let d = &data[signature_offset..];
        if d[..8] != HDF5_SIGNATURE {
            return Err(FormatError::SignatureNotFound);
        }

        match d[8] {
            v @ (0 | 1) => Self::parse_v0v1(d, v),
            v @ (2 | 3) => Self::parse_v2v3(d, v),
            v => Err(FormatError::UnsupportedSuperblockVersion(v)),
        }
    }

    fn parse_v0v1(d: &[u8], version: u8) -> Result<Superblock> {
        // v1 inserts indexed storage K (2) + reserved (2) before the flags.
        let fixed = if version == 0 { 24 } else { 28 };
        ensure_len(d, 0, fixed)?;

        let offset_size = d[13];
        let length_size = d[14];
        validate_sizes(offset_size, length_size)?;

        let group_leaf_node_k = LittleEndian::read_u16(&d[16..18]);
        let group_internal_node_k = LittleEndian::read_u16(&d[18..20]);
        let consistency_flags = LittleEndian::read_u32(&d[fixed - 4..fixed]);

        let os = offset_size as usize;
        let entry_size = 2 * os + 4 + 4 + 16;
        ensure_len(d, fixed, 4 * os + entry_size)?;

        let mut pos = fixed;
        let base_address = read_uint(d, pos, offset_size)?;
        pos += os;
        // free-space info address is always undefined in practice
        pos += os;
        let eof_address = read_uint(d, pos, offset_size)?;
        pos += os;
        if read_addr(d, pos, offset_size)?.is_some() {
            return Err(FormatError::Unsupported("file driver info block".into()));
        }
        pos += os;

        // Root group symbol table entry: name offset, header address, cache type, reserved, scratch
        pos += os;
        let root_group_address = read_uint(d, pos, offset_size)?;
        pos += os;
        let cache_type = LittleEndian::read_u32(&d[pos..pos + 4]);
        pos += 8;
        let root_symbol_table = if cache_type == CACHE_TYPE_STAB {
            Some(SymbolTableMessage::parse(&d[pos..pos + 16], offset_size)?)
        } else {
            None
        };

        Ok(Superblock {
            version,
            offset_size,
            length_size,
            base_address,
            eof_address,
            root_group_address,
            group_leaf_node_k: Some(group_leaf_node_k),
            group_internal_node_k: Some(group_internal_node_k),
            root_symbol_table,
            consistency_flags,
            superblock_extension_address: None,
        })
    }

    fn parse_v2v3(d: &[u8], version: u8) -> Result<Superblock> {
        ensure_len(d, 0, 12)?;
        let offset_size = d[9];
        let length_size = d[10];
        validate_sizes(offset_size, length_size)?;
        let consistency_flags = d[11] as u32;

        let os = offset_size as usize;
        let checksum_pos = 12 + 4 * os;
        ensure_len(d, checksum_pos, 4)?;

        let stored = LittleEndian::read_u32(&d[checksum_pos..checksum_pos + 4]);
        let computed = jenkins_lookup3(&d[..checksum_pos]);
        if stored != computed {
            return Err(FormatError::ChecksumMismatch {
                structure: "superblock",
                expected: stored,
                computed,
            });
        }

        let base_address = read_uint(d, 12, offset_size)?;
        let superblock_extension_address = read_addr(d, 12 + os, offset_size)?;
        let eof_address = read_uint(d, 12 + 2 * os, offset_size)?;
        let root_group_address = read_uint(d, 12 + 3 * os, offset_size)?;

        if superblock_extension_address.is_some() {
            log::debug!("superblock extension present; its messages are ignored");
        }

        Ok(Superblock {
            version,
            offset_size,
            length_size,
            base_address,
            eof_address,
            root_group_address,
            group_leaf_node_k: None,
            group_internal_node_k: None,
            root_symbol_table: None,
            consistency_flags,
            superblock_extension_address,
        })
    }

    /// Size in bytes of [`Superblock::serialize`] output for the given version.
    pub fn encoded_size(version: u8, offset_size: u8) -> usize {
        let os = offset_size as usize;
        if version >= 2 {
            12 + 4 * os + 4
        } else {
            // fixed fields, four addresses, root symbol table entry
            24 + 4 * os + (2 * os + 24)
        }
    }

    /// Serialize the superblock. Versions below 2 are always written as
    /// version 0; versions 2 and 3 carry a checksum.
    pub fn serialize(&self) -> Vec<u8> {
        let os = self.offset_size;
        let mut buf = Vec::with_capacity(Self::encoded_size(self.version, os));
        buf.extend_from_slice(&HDF5_SIGNATURE);

        if self.version >= 2 {
            buf.push(self.version);
            buf.push(self.offset_size);
            buf.push(self.length_size);
            buf.push(self.consistency_flags as u8);
            write_uint(&mut buf, self.base_address, os);
            write_addr(&mut buf, self.superblock_extension_address, os);
            write_uint(&mut buf, self.eof_address, os);
            write_uint(&mut buf, self.root_group_address, os);
            let checksum = jenkins_lookup3(&buf);
            buf.extend_from_slice(&checksum.to_le_bytes());
            return buf;
        }

        buf.push(0); // version
        buf.push(0); // free-space storage version
        buf.push(0); // root group symbol table entry version
        buf.push(0); // reserved
        buf.push(0); // shared header message format version
        buf.push(self.offset_size);
        buf.push(self.length_size);
        buf.push(0); // reserved
        buf.extend_from_slice(&self.group_leaf_node_k.unwrap_or(4).to_le_bytes());
        buf.extend_from_slice(&self.group_internal_node_k.unwrap_or(16).to_le_bytes());
        buf.extend_from_slice(&self.consistency_flags.to_le_bytes());
        write_uint(&mut buf, self.base_address, os);
        write_addr(&mut buf, None, os); // free-space info
        write_uint(&mut buf, self.eof_address, os);
        write_addr(&mut buf, None, os); // driver info

        // Root group symbol table entry
        write_uint(&mut buf, 0, os);
        write_uint(&mut buf, self.root_group_address, os);
        match &self.root_symbol_table {
            Some(stab) => {
                buf.extend_from_slice(&CACHE_TYPE_STAB.to_le_bytes());
                buf.extend_from_slice(&[0u8; 4]);
                let mut scratch = stab.serialize(os);
                scratch.resize(16, 0);
                buf.extend_from_slice(&scratch);
            }
            None => {
                buf.extend_from_slice(&[0u8; 8]);
                buf.extend_from_slice(&[0u8; 16]);
            }
        }
        buf
    }
}
