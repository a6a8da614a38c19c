//! Mapping between Rust element types and HDF5 datatypes.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use num_traits::NumCast;

use h5vec_format::{Datatype, DatatypeByteOrder};

use crate::error::{Error, Result};

mod sealed {
    pub trait Sealed {}
}

/// A numeric element type that can be saved to and loaded from a dataset.
///
/// Implemented for `i8`, `u8`, `i16`, `u16`, `i32`, `u32`, `i64`, `u64`,
/// `f32` and `f64`. The trait is sealed.
pub trait H5Type: sealed::Sealed + NumCast + Copy + 'static {
    /// Rust name of the type, used in error messages.
    const NAME: &'static str;

    /// The little-endian HDF5 datatype this type is stored as.
    fn datatype() -> Datatype;

    /// Encode `values` as little-endian element bytes.
    fn encode(values: &[Self]) -> Vec<u8>;
}

impl sealed::Sealed for u8 {}
impl H5Type for u8 {
    const NAME: &'static str = "u8";

    fn datatype() -> Datatype {
        Datatype::integer(1, false)
    }

    fn encode(values: &[Self]) -> Vec<u8> {
        values.to_vec()
    }
}

impl sealed::Sealed for i8 {}
impl H5Type for i8 {
    const NAME: &'static str = "i8";

    fn datatype() -> Datatype {
        Datatype::integer(1, true)
    }

    fn encode(values: &[Self]) -> Vec<u8> {
        values.iter().map(|&v| v as u8).collect()
    }
}

macro_rules! impl_h5type {
    ($ty:ty, $datatype:expr, $write:ident) => {
        impl sealed::Sealed for $ty {}
        impl H5Type for $ty {
            const NAME: &'static str = stringify!($ty);

            fn datatype() -> Datatype {
                $datatype
            }

            fn encode(values: &[Self]) -> Vec<u8> {
                let mut buf = vec![0u8; std::mem::size_of_val(values)];
                LittleEndian::$write(values, &mut buf);
                buf
            }
        }
    };
}

impl_h5type!(i16, Datatype::integer(2, true), write_i16_into);
impl_h5type!(u16, Datatype::integer(2, false), write_u16_into);
impl_h5type!(i32, Datatype::integer(4, true), write_i32_into);
impl_h5type!(u32, Datatype::integer(4, false), write_u32_into);
impl_h5type!(i64, Datatype::integer(8, true), write_i64_into);
impl_h5type!(u64, Datatype::integer(8, false), write_u64_into);
impl_h5type!(f32, Datatype::ieee_f32(), write_f32_into);
impl_h5type!(f64, Datatype::ieee_f64(), write_f64_into);

/// Stored element encodings the reader can convert from.
#[derive(Debug, Clone, Copy)]
enum Stored {
    Int { size: usize, signed: bool, big_endian: bool },
    F32 { big_endian: bool },
    F64 { big_endian: bool },
}

fn describe(datatype: &Datatype) -> String {
    format!("{}-byte {}", datatype.type_size(), datatype.class_name())
}

fn stored_encoding(datatype: &Datatype) -> Option<Stored> {
    match *datatype {
        Datatype::FixedPoint { size, byte_order, signed, bit_offset: 0, bit_precision }
            if matches!(size, 1 | 2 | 4 | 8) && bit_precision as u32 == size * 8 =>
        {
            let big_endian = match byte_order {
                DatatypeByteOrder::LittleEndian => false,
                DatatypeByteOrder::BigEndian => true,
                DatatypeByteOrder::Vax => return None,
            };
            Some(Stored::Int { size: size as usize, signed, big_endian })
        }
        Datatype::FloatingPoint { size, byte_order, .. } => {
            let big_endian = match byte_order {
                DatatypeByteOrder::LittleEndian => false,
                DatatypeByteOrder::BigEndian => true,
                DatatypeByteOrder::Vax => return None,
            };
            match size {
                4 => Some(Stored::F32 { big_endian }),
                8 => Some(Stored::F64 { big_endian }),
                _ => None,
            }
        }
        _ => None,
    }
}

fn convert<T: H5Type>(raw: &[u8], stored: Stored) -> Option<T> {
    match stored {
        Stored::Int { size, signed: true, big_endian: false } => {
            <T as NumCast>::from(LittleEndian::read_int(raw, size))
        }
        Stored::Int { size, signed: true, big_endian: true } => {
            <T as NumCast>::from(BigEndian::read_int(raw, size))
        }
        Stored::Int { size, signed: false, big_endian: false } => {
            <T as NumCast>::from(LittleEndian::read_uint(raw, size))
        }
        Stored::Int { size, signed: false, big_endian: true } => {
            <T as NumCast>::from(BigEndian::read_uint(raw, size))
        }
        Stored::F32 { big_endian: false } => <T as NumCast>::from(LittleEndian::read_f32(raw)),
        Stored::F32 { big_endian: true } => <T as NumCast>::from(BigEndian::read_f32(raw)),
        Stored::F64 { big_endian: false } => <T as NumCast>::from(LittleEndian::read_f64(raw)),
        Stored::F64 { big_endian: true } => <T as NumCast>::from(BigEndian::read_f64(raw)),
    }
}

/// Decode stored elements of `datatype` into `T`.
///
/// Any integer or IEEE float of either byte order is accepted. Floats
/// convert to integers by truncation; values outside the range of `T`
/// (and NaN into an integer) fail with [`Error::Conversion`].
pub(crate) fn decode<T: H5Type>(datatype: &Datatype, data: &[u8], name: &str) -> Result<Vec<T>> {
    let stored = stored_encoding(datatype).ok_or_else(|| Error::TypeMismatch {
        name: name.to_owned(),
        stored: describe(datatype),
        requested: T::NAME,
    })?;
    let size = datatype.type_size() as usize;
    data.chunks_exact(size)
        .enumerate()
        .map(|(index, raw)| {
            convert::<T>(raw, stored).ok_or_else(|| Error::Conversion {
                name: name.to_owned(),
                index,
                requested: T::NAME,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datatypes() {
        assert_eq!(u8::datatype(), Datatype::integer(1, false));
        assert_eq!(i64::datatype(), Datatype::integer(8, true));
        assert_eq!(f32::datatype().type_size(), 4);
        assert_eq!(f64::datatype(), Datatype::ieee_f64());
        assert_eq!(u16::NAME, "u16");
    }

    #[test]
    fn encode_little_endian() {
        assert_eq!(i16::encode(&[1, -2]), vec![0x01, 0x00, 0xfe, 0xff]);
        assert_eq!(i8::encode(&[-1, 5]), vec![0xff, 0x05]);
        assert_eq!(f32::encode(&[1.0]), 1.0f32.to_le_bytes().to_vec());
        assert!(u64::encode(&[]).is_empty());
    }

    #[test]
    fn decode_same_type() {
        let values = [1.5f64, -0.25, 1e300];
        let got: Vec<f64> = decode(&f64::datatype(), &f64::encode(&values), "/x").unwrap();
        assert_eq!(got, values);
    }

    #[test]
    fn decode_big_endian() {
        let datatype = Datatype::FixedPoint {
            size: 4,
            byte_order: DatatypeByteOrder::BigEndian,
            signed: true,
            bit_offset: 0,
            bit_precision: 32,
        };
        let got: Vec<i32> = decode(&datatype, &[0, 0, 1, 0, 0xff, 0xff, 0xff, 0xfe], "/be").unwrap();
        assert_eq!(got, vec![256, -2]);
    }

    #[test]
    fn decode_widens_and_narrows() {
        let got: Vec<i64> = decode(&u8::datatype(), &[0, 200, 255], "/x").unwrap();
        assert_eq!(got, vec![0, 200, 255]);
        let got: Vec<u8> = decode(&i32::datatype(), &i32::encode(&[7, 255]), "/x").unwrap();
        assert_eq!(got, vec![7, 255]);
        let got: Vec<i32> = decode(&f64::datatype(), &f64::encode(&[2.75, -3.5]), "/x").unwrap();
        assert_eq!(got, vec![2, -3]);
    }

    #[test]
    fn out_of_range_fails() {
        let err = decode::<u8>(&i32::datatype(), &i32::encode(&[1, 256]), "/x").unwrap_err();
        assert!(matches!(err, Error::Conversion { index: 1, requested: "u8", .. }));
        let err = decode::<u32>(&i8::datatype(), &i8::encode(&[-1]), "/x").unwrap_err();
        assert!(matches!(err, Error::Conversion { index: 0, .. }));
        let err = decode::<i16>(&f32::datatype(), &f32::encode(&[f32::NAN]), "/x").unwrap_err();
        assert!(matches!(err, Error::Conversion { .. }));
    }

    #[test]
    fn non_numeric_rejected() {
        let err = decode::<f64>(&Datatype::Other { class: 3, size: 8 }, &[0; 8], "/s").unwrap_err();
        match err {
            Error::TypeMismatch { name, stored, requested } => {
                assert_eq!(name, "/s");
                assert_eq!(stored, "8-byte string");
                assert_eq!(requested, "f64");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn padded_integer_rejected() {
        let datatype = Datatype::FixedPoint {
            size: 4,
            byte_order: DatatypeByteOrder::LittleEndian,
            signed: false,
            bit_offset: 0,
            bit_precision: 12,
        };
        assert!(matches!(decode::<u32>(&datatype, &[0; 4], "/p"), Err(Error::TypeMismatch { .. })));
    }
}
