//! HDF5 Link Info message (type 0x0002) of link-message groups.

use crate::codec::{ensure_len, read_addr, read_uint, write_addr};
use crate::error::{FormatError, Result};

const FLAG_TRACK_ORDER: u8 = 0x01;
const FLAG_INDEX_ORDER: u8 = 0x02;

/// Parsed Link Info message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkInfoMessage {
    /// Maximum creation order value, if tracked.
    pub max_creation_order: Option<u64>,
    /// Fractal heap of dense link storage; `None` means links are compact.
    pub fractal_heap_address: Option<u64>,
    /// v2 B-tree name index of dense storage.
    pub btree_name_index_address: Option<u64>,
    /// v2 B-tree creation-order index, if indexed.
    pub btree_creation_order_address: Option<u64>,
}

impl LinkInfoMessage {
    /// Whether links live in dense storage rather than Link messages.
    pub fn is_dense(&self) -> bool {
        self.fractal_heap_address.is_some()
    }

    /// Parse a Link Info message body.
    pub fn parse(data: &[u8], offset_size: u8) -> Result<LinkInfoMessage> {
        ensure_len(data, 0, 2)?;
        let version = data[0];
        if version != 0 {
            return Err(FormatError::InvalidVersion { structure: "link info", version });
        }
        let flags = data[1];
        let os = offset_size as usize;
        let mut pos = 2;

        let max_creation_order = if flags & FLAG_TRACK_ORDER != 0 {
            let v = read_uint(data, pos, 8)?;
            pos += 8;
            Some(v)
        } else {
            None
        };

        let fractal_heap_address = read_addr(data, pos, offset_size)?;
        pos += os;
        let btree_name_index_address = read_addr(data, pos, offset_size)?;
        pos += os;
        let btree_creation_order_address = if flags & FLAG_INDEX_ORDER != 0 {
            read_addr(data, pos, offset_size)?
        } else {
            None
        };

        Ok(LinkInfoMessage {
            max_creation_order,
            fractal_heap_address,
            btree_name_index_address,
            btree_creation_order_address,
        })
    }

    /// Serialize a compact-storage Link Info message without order tracking.
    pub fn serialize_compact(offset_size: u8) -> Vec<u8> {
        let mut buf = vec![0u8, 0];
        write_addr(&mut buf, None, offset_size);
        write_addr(&mut buf, None, offset_size);
        buf
    }
}
