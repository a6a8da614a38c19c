//! Little-endian field helpers shared by every structure codec.
//!
//! HDF5 encodes addresses in `offset_size` bytes and lengths in
//! `length_size` bytes (both taken from the superblock). An address whose
//! bytes are all `0xFF` is the "undefined address".

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{FormatError, Result};

pub(crate) fn ensure_len(data: &[u8], pos: usize, needed: usize) -> Result<()> {
    match pos.checked_add(needed) {
        Some(end) if end <= data.len() => Ok(()),
        _ => Err(FormatError::UnexpectedEof {
            expected: pos.saturating_add(needed),
            available: data.len(),
        }),
    }
}

/// Read an unsigned little-endian integer of `size` bytes (1..=8).
pub(crate) fn read_uint(data: &[u8], pos: usize, size: u8) -> Result<u64> {
    if !(1..=8).contains(&size) {
        return Err(FormatError::InvalidOffsetSize(size));
    }
    ensure_len(data, pos, size as usize)?;
    Ok(LittleEndian::read_uint(&data[pos..], size as usize))
}

pub(crate) fn read_u16(data: &[u8], pos: usize) -> Result<u16> {
    ensure_len(data, pos, 2)?;
    Ok(LittleEndian::read_u16(&data[pos..]))
}

pub(crate) fn read_u32(data: &[u8], pos: usize) -> Result<u32> {
    ensure_len(data, pos, 4)?;
    Ok(LittleEndian::read_u32(&data[pos..]))
}

/// Read an address, mapping the all-ones pattern to `None`.
pub(crate) fn read_addr(data: &[u8], pos: usize, size: u8) -> Result<Option<u64>> {
    ensure_len(data, pos, size as usize)?;
    if data[pos..pos + size as usize].iter().all(|&b| b == 0xFF) {
        return Ok(None);
    }
    read_uint(data, pos, size).map(Some)
}

/// Append `val` as a little-endian integer of `size` bytes (1..=8).
pub(crate) fn write_uint(buf: &mut Vec<u8>, val: u64, size: u8) {
    let size = size.clamp(1, 8) as usize;
    let mut tmp = [0u8; 8];
    // Truncate to the field width; callers validate the width beforehand.
    let masked = if size == 8 { val } else { val & ((1u64 << (size * 8)) - 1) };
    LittleEndian::write_uint(&mut tmp[..size], masked, size);
    buf.extend_from_slice(&tmp[..size]);
}

/// Append an address; `None` is written as the undefined address.
pub(crate) fn write_addr(buf: &mut Vec<u8>, addr: Option<u64>, size: u8) {
    match addr {
        Some(a) => write_uint(buf, a, size),
        None => buf.extend(std::iter::repeat(0xFF).take(size as usize)),
    }
}

/// Convert a file address or length into a slice index.
pub(crate) fn to_usize(val: u64) -> Result<usize> {
    usize::try_from(val).map_err(|_| FormatError::AddressOverflow(val))
}

/// Round `n` up to the next multiple of 8.
pub(crate) fn align8(n: usize) -> usize {
    (n + 7) & !7
}

pub(crate) fn validate_sizes(offset_size: u8, length_size: u8) -> Result<()> {
    if !matches!(offset_size, 2 | 4 | 8) {
        return Err(FormatError::InvalidOffsetSize(offset_size));
    }
    if !matches!(length_size, 2 | 4 | 8) {
        return Err(FormatError::InvalidLengthSize(length_size));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uint_widths() {
        let mut buf = Vec::new();
        write_uint(&mut buf, 0x0102, 2);
        write_uint(&mut buf, 0x0304_0506, 4);
        write_uint(&mut buf, 7, 8);
        assert_eq!(buf.len(), 14);
        assert_eq!(read_uint(&buf, 0, 2).unwrap(), 0x0102);
        assert_eq!(read_uint(&buf, 2, 4).unwrap(), 0x0304_0506);
        assert_eq!(read_uint(&buf, 6, 8).unwrap(), 7);
    }

    #[test]
    fn undefined_address() {
        let mut buf = Vec::new();
        write_addr(&mut buf, None, 8);
        write_addr(&mut buf, Some(96), 4);
        assert_eq!(read_addr(&buf, 0, 8).unwrap(), None);
        assert_eq!(read_addr(&buf, 8, 4).unwrap(), Some(96));
    }

    #[test]
    fn short_read_is_eof() {
        assert!(matches!(
            read_uint(&[1, 2, 3], 0, 4),
            Err(FormatError::UnexpectedEof { expected: 4, available: 3 })
        ));
        assert!(matches!(
            ensure_len(&[], usize::MAX, 1),
            Err(FormatError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn alignment() {
        assert_eq!(align8(0), 0);
        assert_eq!(align8(1), 8);
        assert_eq!(align8(16), 16);
        assert_eq!(align8(17), 24);
    }
}
