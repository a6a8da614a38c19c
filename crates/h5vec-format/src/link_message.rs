//! HDF5 Link message (type 0x0006).

use crate::codec::{ensure_len, read_u16, read_uint, to_usize, write_uint};
use crate::error::{FormatError, Result};

const FLAG_CREATION_ORDER: u8 = 0x04;
const FLAG_LINK_TYPE: u8 = 0x08;
const FLAG_CHARSET: u8 = 0x10;

const LINK_TYPE_SOFT: u8 = 1;
const LINK_TYPE_EXTERNAL: u8 = 64;

/// What a link points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// Hard link to an object header address.
    Hard { object_header_address: u64 },
    /// Soft link holding a path inside the same file.
    Soft { target_path: String },
    /// Link into another file, or a user-defined link type.
    External { link_type: u8 },
}

/// A parsed Link message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkMessage {
    pub name: String,
    pub target: LinkTarget,
    /// Creation order, if tracked.
    pub creation_order: Option<u64>,
}

impl LinkMessage {
    /// A hard link without creation order.
    pub fn hard(name: impl Into<String>, object_header_address: u64) -> LinkMessage {
        LinkMessage {
            name: name.into(),
            target: LinkTarget::Hard { object_header_address },
            creation_order: None,
        }
    }

    /// Parse a Link message body.
    pub fn parse(data: &[u8], offset_size: u8) -> Result<LinkMessage> {
        ensure_len(data, 0, 2)?;
        let version = data[0];
        if version != 1 {
            return Err(FormatError::InvalidVersion { structure: "link", version });
        }
        let flags = data[1];
        let mut pos = 2;

        let link_type = if flags & FLAG_LINK_TYPE != 0 {
            ensure_len(data, pos, 1)?;
            pos += 1;
            data[pos - 1]
        } else {
            0
        };

        let creation_order = if flags & FLAG_CREATION_ORDER != 0 {
            let v = read_uint(data, pos, 8)?;
            pos += 8;
            Some(v)
        } else {
            None
        };

        if flags & FLAG_CHARSET != 0 {
            // ASCII or UTF-8; both decode as UTF-8.
            pos += 1;
        }

        let width = 1u8 << (flags & 0x03);
        let name_len = to_usize(read_uint(data, pos, width)?)?;
        pos += width as usize;
        ensure_len(data, pos, name_len)?;
        let name = core::str::from_utf8(&data[pos..pos + name_len])
            .map_err(|_| FormatError::InvalidName(pos as u64))?
            .to_owned();
        pos += name_len;

        let target = match link_type {
            0 => LinkTarget::Hard {
                object_header_address: read_uint(data, pos, offset_size)?,
            },
            LINK_TYPE_SOFT => {
                let len = read_u16(data, pos)? as usize;
                ensure_len(data, pos + 2, len)?;
                let path = String::from_utf8_lossy(&data[pos + 2..pos + 2 + len]).into_owned();
                LinkTarget::Soft { target_path: path }
            }
            other => LinkTarget::External { link_type: other },
        };

        Ok(LinkMessage {
            name,
            target,
            creation_order,
        })
    }

    /// Serialize a hard or soft link.
    pub fn serialize(&self, offset_size: u8) -> Result<Vec<u8>> {
        let name = self.name.as_bytes();
        let (width_bits, width) = match name.len() {
            0..=0xFF => (0u8, 1u8),
            0x100..=0xFFFF => (1, 2),
            _ => (2, 4),
        };

        let mut flags = width_bits;
        if self.creation_order.is_some() {
            flags |= FLAG_CREATION_ORDER;
        }
        if !matches!(self.target, LinkTarget::Hard { .. }) {
            flags |= FLAG_LINK_TYPE;
        }
        if !name.is_ascii() {
            flags |= FLAG_CHARSET;
        }

        let mut buf = vec![1u8, flags];
        match &self.target {
            LinkTarget::Hard { .. } => {}
            LinkTarget::Soft { .. } => buf.push(LINK_TYPE_SOFT),
            LinkTarget::External { .. } => {
                return Err(FormatError::Unsupported("writing external links".into()))
            }
        }
        if let Some(order) = self.creation_order {
            buf.extend_from_slice(&order.to_le_bytes());
        }
        if flags & FLAG_CHARSET != 0 {
            buf.push(1); // UTF-8
        }
        write_uint(&mut buf, name.len() as u64, width);
        buf.extend_from_slice(name);

        match &self.target {
            LinkTarget::Hard { object_header_address } => {
                write_uint(&mut buf, *object_header_address, offset_size)
            }
            LinkTarget::Soft { target_path } => {
                let len = u16::try_from(target_path.len())
                    .map_err(|_| FormatError::TooLarge("soft link path"))?;
                buf.extend_from_slice(&len.to_le_bytes());
                buf.extend_from_slice(target_path.as_bytes());
            }
            LinkTarget::External { .. } => {}
        }
        Ok(buf)
    }
}
