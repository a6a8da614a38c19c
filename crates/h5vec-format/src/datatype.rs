//! HDF5 Datatype message (type 0x0003).
//!
//! Fixed-point and floating-point classes are decoded in full. Every other
//! class is kept as [`Datatype::Other`] so that headers using them can
//! still be listed.

use byteorder::{ByteOrder, LittleEndian};

use crate::codec::ensure_len;
use crate::error::{FormatError, Result};

/// Byte order of numeric data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatatypeByteOrder {
    LittleEndian,
    BigEndian,
    Vax,
}

/// Parsed HDF5 datatype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Datatype {
    /// Class 0: integers.
    FixedPoint {
        size: u32,
        byte_order: DatatypeByteOrder,
        signed: bool,
        bit_offset: u16,
        bit_precision: u16,
    },
    /// Class 1: floating point.
    FloatingPoint {
        size: u32,
        byte_order: DatatypeByteOrder,
        bit_offset: u16,
        bit_precision: u16,
        exponent_location: u8,
        exponent_size: u8,
        mantissa_location: u8,
        mantissa_size: u8,
        exponent_bias: u32,
    },
    /// Any other class (string, compound, enum, ...), kept by class id and size.
    Other { class: u8, size: u32 },
}

impl Datatype {
    /// Little-endian integer of `size` bytes using all bits.
    pub fn integer(size: u32, signed: bool) -> Datatype {
        Datatype::FixedPoint {
            size,
            byte_order: DatatypeByteOrder::LittleEndian,
            signed,
            bit_offset: 0,
            bit_precision: (size * 8) as u16,
        }
    }

    /// Little-endian IEEE 754 single precision.
    pub fn ieee_f32() -> Datatype {
        Datatype::FloatingPoint {
            size: 4,
            byte_order: DatatypeByteOrder::LittleEndian,
            bit_offset: 0,
            bit_precision: 32,
            exponent_location: 23,
            exponent_size: 8,
            mantissa_location: 0,
            mantissa_size: 23,
            exponent_bias: 127,
        }
    }

    /// Little-endian IEEE 754 double precision.
    pub fn ieee_f64() -> Datatype {
        Datatype::FloatingPoint {
            size: 8,
            byte_order: DatatypeByteOrder::LittleEndian,
            bit_offset: 0,
            bit_precision: 64,
            exponent_location: 52,
            exponent_size: 11,
            mantissa_location: 0,
            mantissa_size: 52,
            exponent_bias: 1023,
        }
    }

    /// Parse a datatype message body.
    pub fn parse(data: &[u8]) -> Result<Datatype> {
        ensure_len(data, 0, 8)?;
        let class = data[0] & 0x0F;
        let version = data[0] >> 4;
        if !(1..=5).contains(&version) {
            return Err(FormatError::InvalidVersion { structure: "datatype", version });
        }
        let bf0 = data[1];
        let size = LittleEndian::read_u32(&data[4..8]);

        match class {
            0 => {
                ensure_len(data, 8, 4)?;
                Ok(Datatype::FixedPoint {
                    size,
                    byte_order: if bf0 & 0x01 == 0 {
                        DatatypeByteOrder::LittleEndian
                    } else {
                        DatatypeByteOrder::BigEndian
                    },
                    signed: bf0 & 0x08 != 0,
                    bit_offset: LittleEndian::read_u16(&data[8..10]),
                    bit_precision: LittleEndian::read_u16(&data[10..12]),
                })
            }
            1 => {
                ensure_len(data, 8, 12)?;
                let byte_order = match (bf0 & 0x40 != 0, bf0 & 0x01 != 0) {
                    (false, false) => DatatypeByteOrder::LittleEndian,
                    (false, true) => DatatypeByteOrder::BigEndian,
                    (true, _) => DatatypeByteOrder::Vax,
                };
                Ok(Datatype::FloatingPoint {
                    size,
                    byte_order,
                    bit_offset: LittleEndian::read_u16(&data[8..10]),
                    bit_precision: LittleEndian::read_u16(&data[10..12]),
                    exponent_location: data[12],
                    exponent_size: data[13],
                    mantissa_location: data[14],
                    mantissa_size: data[15],
                    exponent_bias: LittleEndian::read_u32(&data[16..20]),
                })
            }
            2..=11 => Ok(Datatype::Other { class, size }),
            _ => Err(FormatError::Unsupported(format!("datatype class {class}"))),
        }
    }

    /// Serialize as a version 1 datatype message.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        match *self {
            Datatype::FixedPoint {
                size,
                byte_order,
                signed,
                bit_offset,
                bit_precision,
            } => {
                let mut bf0 = 0u8;
                if byte_order == DatatypeByteOrder::BigEndian {
                    bf0 |= 0x01;
                }
                if signed {
                    bf0 |= 0x08;
                }
                let mut buf = header(0, [bf0, 0, 0], size);
                buf.extend_from_slice(&bit_offset.to_le_bytes());
                buf.extend_from_slice(&bit_precision.to_le_bytes());
                Ok(buf)
            }
            Datatype::FloatingPoint {
                size,
                byte_order,
                bit_offset,
                bit_precision,
                exponent_location,
                exponent_size,
                mantissa_location,
                mantissa_size,
                exponent_bias,
            } => {
                // Mantissa normalization 2: the leading one is implied.
                let mut bf0 = 0x20u8;
                match byte_order {
                    DatatypeByteOrder::LittleEndian => {}
                    DatatypeByteOrder::BigEndian => bf0 |= 0x01,
                    DatatypeByteOrder::Vax => bf0 |= 0x41,
                }
                // Second bit-field byte holds the sign bit position.
                let sign_location = bit_precision.saturating_sub(1) as u8;
                let mut buf = header(1, [bf0, sign_location, 0], size);
                buf.extend_from_slice(&bit_offset.to_le_bytes());
                buf.extend_from_slice(&bit_precision.to_le_bytes());
                buf.extend_from_slice(&[exponent_location, exponent_size, mantissa_location, mantissa_size]);
                buf.extend_from_slice(&exponent_bias.to_le_bytes());
                Ok(buf)
            }
            Datatype::Other { class, .. } => {
                Err(FormatError::Unsupported(format!("writing datatype class {class}")))
            }
        }
    }

    /// Size in bytes of one element.
    pub fn type_size(&self) -> u32 {
        match *self {
            Datatype::FixedPoint { size, .. }
            | Datatype::FloatingPoint { size, .. }
            | Datatype::Other { size, .. } => size,
        }
    }

    /// Human-readable class name, for diagnostics.
    pub fn class_name(&self) -> &'static str {
        match self {
            Datatype::FixedPoint { .. } => "integer",
            Datatype::FloatingPoint { .. } => "float",
            Datatype::Other { class, .. } => match class {
                2 => "time",
                3 => "string",
                4 => "bitfield",
                5 => "opaque",
                6 => "compound",
                7 => "reference",
                8 => "enum",
                9 => "variable-length",
                10 => "array",
                _ => "complex",
            },
        }
    }
}

fn header(class: u8, bf: [u8; 3], size: u32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(20);
    buf.push(class | (1 << 4));
    buf.extend_from_slice(&bf);
    buf.extend_from_slice(&size.to_le_bytes());
    buf
}
