//! HDF5 file signature (magic bytes) detection.

use crate::error::{FormatError, Result};

/// The 8-byte HDF5 magic signature.
pub const HDF5_SIGNATURE: [u8; 8] = [0x89, b'H', b'D', b'F', b'\r', b'\n', 0x1A, b'\n'];

/// Search for the HDF5 signature at the offsets the format allows:
/// 0, 512, 1024, 2048, ... (a user block may precede the superblock).
///
/// Returns the byte offset where the signature was found.
pub fn find_signature(data: &[u8]) -> Result<usize> {
    let mut offset = 0usize;
    while offset.saturating_add(8) <= data.len() {
        if data[offset..offset + 8] == HDF5_SIGNATURE {
            return Ok(offset);
        }
        offset = if offset == 0 { 512 } else { offset * 2 };
    }
    Err(FormatError::SignatureNotFound)
}
