//! HDF5 Data Layout message (type 0x0008), versions 3 and 4.

use crate::codec::{ensure_len, read_addr, read_u16, read_uint, write_addr, write_uint};
use crate::error::{FormatError, Result};

/// Parsed data layout message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataLayout {
    /// Raw data stored inline in the message.
    Compact { data: Vec<u8> },
    /// Raw data stored in one block. `address` is `None` when never allocated.
    Contiguous { address: Option<u64>, size: u64 },
    /// Chunked storage; its index is not read.
    Chunked,
    /// Virtual dataset mapping (v4).
    Virtual,
}

impl DataLayout {
    /// Parse a data layout message body.
    pub fn parse(data: &[u8], offset_size: u8, length_size: u8) -> Result<DataLayout> {
        ensure_len(data, 0, 2)?;
        let version = data[0];
        if !(3..=4).contains(&version) {
            return Err(FormatError::InvalidVersion { structure: "data layout", version });
        }

        match data[1] {
            0 => {
                let size = read_u16(data, 2)? as usize;
                ensure_len(data, 4, size)?;
                Ok(DataLayout::Compact { data: data[4..4 + size].to_vec() })
            }
            1 => Ok(DataLayout::Contiguous {
                address: read_addr(data, 2, offset_size)?,
                size: read_uint(data, 2 + offset_size as usize, length_size)?,
            }),
            2 => Ok(DataLayout::Chunked),
            3 if version == 4 => Ok(DataLayout::Virtual),
            class => Err(FormatError::InvalidLayoutClass(class)),
        }
    }

    /// Serialize compact or contiguous layouts as the given message version.
    pub fn serialize(&self, version: u8, offset_size: u8, length_size: u8) -> Result<Vec<u8>> {
        if !(3..=4).contains(&version) {
            return Err(FormatError::InvalidVersion { structure: "data layout", version });
        }
        let mut buf = vec![version];
        match self {
            DataLayout::Compact { data } => {
                let size = u16::try_from(data.len())
                    .map_err(|_| FormatError::TooLarge("compact dataset"))?;
                buf.push(0);
                buf.extend_from_slice(&size.to_le_bytes());
                buf.extend_from_slice(data);
            }
            DataLayout::Contiguous { address, size } => {
                buf.push(1);
                write_addr(&mut buf, *address, offset_size);
                write_uint(&mut buf, *size, length_size);
            }
            DataLayout::Chunked => {
                return Err(FormatError::Unsupported("writing chunked layout".into()))
            }
            DataLayout::Virtual => {
                return Err(FormatError::Unsupported("writing virtual layout".into()))
            }
        }
        Ok(buf)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DataLayout::Compact { .. } => "compact",
            DataLayout::Contiguous { .. } => "contiguous",
            DataLayout::Chunked => "chunked",
            DataLayout::Virtual => "virtual",
        }
    }
}
