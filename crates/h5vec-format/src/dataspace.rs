//! HDF5 Dataspace message (type 0x0001), versions 1 and 2.

use crate::codec::{ensure_len, read_uint, write_uint};
use crate::error::{FormatError, Result};

/// Dataspace message flag: maximum dimensions are present.
const FLAG_MAX_DIMS: u8 = 0x01;

/// Type of dataspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataspaceType {
    /// Single element.
    Scalar,
    /// N-dimensional array.
    Simple,
    /// No data.
    Null,
}

/// Parsed dataspace message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataspace {
    pub space_type: DataspaceType,
    /// Current dimension sizes (empty for scalar and null).
    pub dimensions: Vec<u64>,
    /// Maximum dimension sizes, if stored. `u64::MAX` means unlimited.
    pub max_dimensions: Option<Vec<u64>>,
}

impl Dataspace {
    /// A one-dimensional simple dataspace of `len` elements.
    pub fn simple_1d(len: u64) -> Dataspace {
        Dataspace {
            space_type: DataspaceType::Simple,
            dimensions: vec![len],
            max_dimensions: None,
        }
    }

    pub fn rank(&self) -> usize {
        self.dimensions.len()
    }

    /// Parse a dataspace message body.
    pub fn parse(data: &[u8], length_size: u8) -> Result<Dataspace> {
        ensure_len(data, 0, 4)?;
        let version = data[0];
        let rank = data[1] as usize;
        let flags = data[2];

        let (space_type, mut pos) = match version {
            1 => {
                ensure_len(data, 0, 8)?;
                let st = if rank == 0 { DataspaceType::Scalar } else { DataspaceType::Simple };
                (st, 8usize)
            }
            2 => {
                let st = match data[3] {
                    0 => DataspaceType::Scalar,
                    1 => DataspaceType::Simple,
                    2 => DataspaceType::Null,
                    other => return Err(FormatError::InvalidDataspaceType(other)),
                };
                (st, 4usize)
            }
            _ => return Err(FormatError::InvalidVersion { structure: "dataspace", version }),
        };

        let ls = length_size as usize;
        let mut dimensions = Vec::with_capacity(rank);
        for _ in 0..rank {
            dimensions.push(read_uint(data, pos, length_size)?);
            pos += ls;
        }

        let max_dimensions = if flags & FLAG_MAX_DIMS != 0 {
            let mut max = Vec::with_capacity(rank);
            for _ in 0..rank {
                max.push(read_uint(data, pos, length_size)?);
                pos += ls;
            }
            Some(max)
        } else {
            None
        };

        Ok(Dataspace {
            space_type,
            dimensions,
            max_dimensions,
        })
    }

    /// Serialize as a version 1 or version 2 message.
    ///
    /// Version 1 has no null dataspace; it is rejected there.
    pub fn serialize(&self, version: u8, length_size: u8) -> Result<Vec<u8>> {
        let rank = u8::try_from(self.rank()).map_err(|_| FormatError::TooLarge("dataspace rank"))?;
        let flags = if self.max_dimensions.is_some() { FLAG_MAX_DIMS } else { 0 };
        let mut buf = vec![version, rank, flags];

        match version {
            1 => {
                if self.space_type == DataspaceType::Null {
                    return Err(FormatError::Unsupported("null dataspace in version 1".into()));
                }
                buf.extend_from_slice(&[0u8; 5]);
            }
            2 => buf.push(match self.space_type {
                DataspaceType::Scalar => 0,
                DataspaceType::Simple => 1,
                DataspaceType::Null => 2,
            }),
            _ => return Err(FormatError::InvalidVersion { structure: "dataspace", version }),
        }

        for &dim in &self.dimensions {
            write_uint(&mut buf, dim, length_size);
        }
        if let Some(max) = &self.max_dimensions {
            for &m in max {
                write_uint(&mut buf, m, length_size);
            }
        }
        Ok(buf)
    }

    /// Total number of elements. Scalar = 1, Null = 0.
    pub fn num_elements(&self) -> u64 {
        match self.space_type {
            DataspaceType::Null => 0,
            DataspaceType::Scalar => 1,
            DataspaceType::Simple => self.dimensions.iter().product(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v1_layout() {
        let bytes = Dataspace::simple_1d(5).serialize(1, 8).unwrap();
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[..4], &[1, 1, 0, 0]);
        let ds = Dataspace::parse(&bytes, 8).unwrap();
        assert_eq!(ds.dimensions, vec![5]);
        assert_eq!(ds.space_type, DataspaceType::Simple);
    }

    #[test]
    fn v2_with_max_dims() {
        let ds = Dataspace {
            space_type: DataspaceType::Simple,
            dimensions: vec![3, 4],
            max_dimensions: Some(vec![u64::MAX, 4]),
        };
        let bytes = ds.serialize(2, 8).unwrap();
        assert_eq!(bytes.len(), 4 + 32);
        let parsed = Dataspace::parse(&bytes, 8).unwrap();
        assert_eq!(parsed, ds);
        assert_eq!(parsed.num_elements(), 12);
    }

    #[test]
    fn v1_rank_zero_is_scalar() {
        let bytes = [1u8, 0, 0, 0, 0, 0, 0, 0];
        let ds = Dataspace::parse(&bytes, 8).unwrap();
        assert_eq!(ds.space_type, DataspaceType::Scalar);
        assert_eq!(ds.num_elements(), 1);
    }

    #[test]
    fn empty_simple_dataspace() {
        let bytes = Dataspace::simple_1d(0).serialize(2, 8).unwrap();
        let ds = Dataspace::parse(&bytes, 8).unwrap();
        assert_eq!(ds.num_elements(), 0);
        assert_eq!(ds.rank(), 1);
    }

    #[test]
    fn null_rejected_in_v1() {
        let ds = Dataspace {
            space_type: DataspaceType::Null,
            dimensions: vec![],
            max_dimensions: None,
        };
        assert!(ds.serialize(1, 8).is_err());
        assert_eq!(Dataspace::parse(&ds.serialize(2, 8).unwrap(), 8).unwrap(), ds);
    }

    #[test]
    fn invalid_type_byte() {
        assert_eq!(
            Dataspace::parse(&[2, 0, 0, 9], 8),
            Err(FormatError::InvalidDataspaceType(9))
        );
    }
}
